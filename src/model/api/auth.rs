use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::db::Voter;

/// Google's token verification endpoint.
pub const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Sign-in request: an ID token obtained from Google on the client.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleLoginRequest {
    pub id_token: String,
}

/// Admin sign-in credentials.
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

/// The session view a signed-in voter sees of themselves.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub email: String,
    pub name: String,
    pub has_voted: bool,
}

impl From<&Voter> for SessionInfo {
    fn from(voter: &Voter) -> Self {
        Self {
            email: voter.email.clone(),
            name: voter.name.clone(),
            has_voted: voter.has_voted,
        }
    }
}

/// The identity claims we keep from a verified Google ID token.
#[derive(Debug)]
pub struct GoogleProfile {
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}

/// Relevant fields of the tokeninfo response.
#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    email: String,
    #[serde(default)]
    email_verified: String,
    #[serde(default)]
    name: String,
    picture: Option<String>,
}

/// Verify a Google ID token server-side and extract the profile.
///
/// The token must be valid (tokeninfo returns 200), issued for our OAuth
/// client, and carry a verified email. Anything else is an authentication
/// failure, not a validation error.
pub async fn verify_id_token(
    http: &reqwest::Client,
    id_token: &str,
    audience: &str,
) -> Result<GoogleProfile> {
    let response = http
        .get(TOKENINFO_URL)
        .query(&[("id_token", id_token)])
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(Error::unauthenticated("Google rejected the ID token"));
    }

    let info: TokenInfo = response.json().await?;
    if info.aud != audience {
        return Err(Error::unauthenticated(
            "ID token was issued for a different application",
        ));
    }
    if info.email_verified != "true" {
        return Err(Error::unauthenticated("Email address is not verified"));
    }

    Ok(GoogleProfile {
        email: info.email,
        name: info.name,
        picture: info.picture,
    })
}
