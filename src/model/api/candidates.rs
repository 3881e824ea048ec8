use serde::{Deserialize, Serialize};

use crate::model::db::{Candidate, Group};

/// One candidate on the ballot paper.
///
/// The `_id` key (rather than `id`) is a compatibility quirk of the
/// original wire format for this endpoint; the results endpoints use `id`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateView {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub position: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub vote_count: u64,
}

impl From<&Candidate> for CandidateView {
    fn from(candidate: &Candidate) -> Self {
        Self {
            id: candidate.id.to_string(),
            name: candidate.name.clone(),
            position: candidate.position.clone(),
            description: candidate.description.clone(),
            vote_count: candidate.vote_count,
        }
    }
}

/// One contested office and its candidates.
#[derive(Debug, Serialize, Deserialize)]
pub struct CandidateGroup {
    pub group: String,
    pub description: String,
    pub candidates: Vec<CandidateView>,
}

/// The ballot paper: all active groups with their candidates.
#[derive(Debug, Serialize, Deserialize)]
pub struct CandidatesResponse {
    pub groups: Vec<CandidateGroup>,
}

impl CandidatesResponse {
    /// Partition candidates under their (already active-filtered) groups,
    /// preserving store order.
    pub fn build(groups: Vec<Group>, candidates: Vec<Candidate>) -> Self {
        let groups = groups
            .into_iter()
            .map(|group| {
                let members = candidates
                    .iter()
                    .filter(|candidate| candidate.group == group.name)
                    .map(CandidateView::from)
                    .collect();
                CandidateGroup {
                    group: group.group.name,
                    description: group.group.description,
                    candidates: members,
                }
            })
            .collect();
        Self { groups }
    }
}
