use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::mongodb::Id;

/// A vote the client wishes to cast.
///
/// `candidateId` is kept optional so that a missing field surfaces as our
/// own validation error rather than a body deserialization failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    candidate_id: Option<String>,
}

impl VoteRequest {
    /// Extract and parse the candidate ID, rejecting missing or malformed input.
    pub fn candidate_id(&self) -> Result<Id> {
        let raw = self
            .candidate_id
            .as_deref()
            .ok_or_else(|| Error::validation("candidateId is required"))?;
        raw.parse()
            .map_err(|_| Error::validation(format!("'{raw}' is not a valid candidate ID")))
    }
}

/// Acknowledgement of a committed vote. Does not echo the vote content.
#[derive(Debug, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub message: String,
}

impl Default for VoteReceipt {
    fn default() -> Self {
        Self {
            message: "Vote cast successfully".to_string(),
        }
    }
}
