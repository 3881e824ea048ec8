use mongodb::bson::doc;
use rocket::{
    http::{Cookie, CookieJar},
    serde::json::Json,
    Route, State,
};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{
    api::auth::{verify_id_token, AdminCredentials, GoogleLoginRequest, SessionInfo},
    auth::{AuthToken, AUTH_TOKEN_COOKIE},
    db::{Admin, NewVoter, Voter},
    eligibility::Allowlist,
    mongodb::{Coll, Id},
};

pub fn routes() -> Vec<Route> {
    routes![google_login, get_session, logout, authenticate_admin]
}

/// Sign a voter in with a Google ID token.
///
/// Eligibility is enforced here, at sign-in, and nowhere else: an email
/// outside the institutional domain or off the allow-list never gets a
/// voter record or a session. The voter record is created on first sign-in
/// and its display fields refreshed on every later one; `has_voted` is
/// never written by this path.
#[post("/auth/google", data = "<request>", format = "json")]
async fn google_login(
    request: Json<GoogleLoginRequest>,
    cookies: &CookieJar<'_>,
    http: &State<reqwest::Client>,
    allowlist: &State<Allowlist>,
    config: &State<Config>,
    voters: Coll<Voter>,
    new_voters: Coll<NewVoter>,
) -> Result<Json<SessionInfo>> {
    let profile = verify_id_token(http, &request.id_token, config.google_client_id()).await?;

    if !allowlist.is_eligible(&profile.email) {
        return Err(Error::Ineligible);
    }

    let email = profile.email.to_lowercase();
    let voter = match voters.find_one(doc! { "email": &email }, None).await? {
        Some(mut voter) => {
            // Refresh the display fields from the provider.
            let mut fields = doc! { "name": &profile.name };
            if let Some(ref picture) = profile.picture {
                fields.insert("picture", picture);
            }
            voters
                .update_one(voter.id.as_doc(), doc! { "$set": fields }, None)
                .await?;
            voter.name = profile.name;
            if profile.picture.is_some() {
                voter.picture = profile.picture;
            }
            voter
        }
        None => {
            let new_voter = NewVoter::new(&email, profile.name, profile.picture);
            let id: Id = new_voters
                .insert_one(&new_voter, None)
                .await?
                .inserted_id
                .as_object_id()
                .unwrap() // Valid because the ID comes directly from the DB.
                .into();
            info!("Registered new voter {id}");
            Voter {
                id,
                voter: new_voter,
            }
        }
    };

    let token = AuthToken::new(&voter);
    cookies.add(token.into_cookie(config));

    Ok(Json(SessionInfo::from(&voter)))
}

/// The caller's own session, including whether they have voted yet.
#[get("/auth/session")]
async fn get_session(token: AuthToken<Voter>, voters: Coll<Voter>) -> Result<Json<SessionInfo>> {
    let voter = voters
        .find_one(token.id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found("No voter record for the current session".to_string()))?;
    Ok(Json(SessionInfo::from(&voter)))
}

#[post("/auth/logout")]
async fn logout(cookies: &CookieJar<'_>) {
    cookies.remove(Cookie::named(AUTH_TOKEN_COOKIE));
}

/// Authenticate an admin by username and password.
#[post("/auth/admin", data = "<credentials>", format = "json")]
async fn authenticate_admin(
    cookies: &CookieJar<'_>,
    credentials: Json<AdminCredentials>,
    admins: Coll<Admin>,
    config: &State<Config>,
) -> Result<()> {
    let with_username = doc! {
        "username": &credentials.username
    };

    let admin = admins
        .find_one(with_username, None)
        .await?
        .filter(|admin| admin.verify_password(&credentials.password))
        .ok_or_else(|| {
            Error::unauthenticated(
                "No admin found with the provided username and password combination",
            )
        })?;

    let token = AuthToken::new(&admin);
    cookies.add(token.into_cookie(config));

    Ok(())
}
