use std::ops::{Deref, DerefMut};

use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core voter data, as stored in the database.
///
/// `has_voted` starts false and flips to true exactly once, via the
/// conditional update in the vote transaction; nothing else writes it.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterCore {
    /// Verified institutional email, always lowercased. Unique.
    pub email: String,
    /// Display name from the identity provider.
    pub name: String,
    /// Profile picture URL, if the provider supplied one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    pub has_voted: bool,
    pub created_at: DateTime,
}

impl VoterCore {
    /// Create a new Voter who has not yet voted.
    pub fn new(email: impl AsRef<str>, name: impl Into<String>, picture: Option<String>) -> Self {
        Self {
            email: email.as_ref().to_lowercase(),
            name: name.into(),
            picture,
            has_voted: false,
            created_at: DateTime::now(),
        }
    }
}

/// A voter without an ID.
pub type NewVoter = VoterCore;

/// A voter from the database, with its unique ID.
#[derive(Debug, Serialize, Deserialize)]
pub struct Voter {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub voter: VoterCore,
}

impl Deref for Voter {
    type Target = VoterCore;

    fn deref(&self) -> &Self::Target {
        &self.voter
    }
}

impl DerefMut for Voter {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.voter
    }
}
