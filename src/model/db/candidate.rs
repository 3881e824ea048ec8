use std::ops::{Deref, DerefMut};

use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core candidate data, as stored in the database.
///
/// `vote_count` is a materialized tally: it starts at zero and only ever
/// grows, by exactly one per committed vote, inside the vote transaction.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateCore {
    pub name: String,
    pub position: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Name of the group this candidate runs in.
    pub group: String,
    pub vote_count: u64,
    pub created_at: DateTime,
}

impl CandidateCore {
    /// Create a new candidate with a zeroed tally.
    pub fn new(
        name: impl Into<String>,
        position: impl Into<String>,
        description: Option<String>,
        group: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            position: position.into(),
            description,
            group: group.into(),
            vote_count: 0,
            created_at: DateTime::now(),
        }
    }
}

/// A candidate without an ID.
pub type NewCandidate = CandidateCore;

/// A candidate from the database, with its unique ID.
#[derive(Debug, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub candidate: CandidateCore,
}

impl Deref for Candidate {
    type Target = CandidateCore;

    fn deref(&self) -> &Self::Target {
        &self.candidate
    }
}

impl DerefMut for Candidate {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.candidate
    }
}
