use std::ops::Deref;

use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// An immutable record of one committed vote.
///
/// The unique index on `voter_id` makes "this voter has an event" the
/// storage-level atomicity boundary for the vote-once invariant, and the
/// timestamps drive the genuine live-activity metrics. Events are only ever
/// appended, within the same transaction as the tally increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteEventCore {
    pub voter_id: Id,
    pub candidate_id: Id,
    pub cast_at: DateTime,
}

impl VoteEventCore {
    pub fn new(voter_id: Id, candidate_id: Id) -> Self {
        Self {
            voter_id,
            candidate_id,
            cast_at: DateTime::now(),
        }
    }
}

/// A vote event without an ID.
pub type NewVoteEvent = VoteEventCore;

/// A vote event from the database, with its unique ID.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VoteEvent {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub event: VoteEventCore,
}

impl Deref for VoteEvent {
    type Target = VoteEventCore;

    fn deref(&self) -> &Self::Target {
        &self.event
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl VoteEvent {
        pub fn example_at(candidate_id: Id, cast_at: chrono::DateTime<chrono::Utc>) -> Self {
            Self {
                id: Id::new(),
                event: VoteEventCore {
                    voter_id: Id::new(),
                    candidate_id,
                    cast_at: DateTime::from_chrono(cast_at),
                },
            }
        }
    }
}
