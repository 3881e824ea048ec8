use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::db::{Candidate, Group};

/// Order candidates by tally, highest first. Equal tallies fall back to
/// candidate ID ascending so the order (and therefore any winner derived
/// from it) is deterministic rather than an accident of read order.
pub fn sort_by_votes(candidates: &mut [Candidate]) {
    candidates.sort_by_key(|candidate| (Reverse(candidate.vote_count), candidate.id));
}

/// One candidate's standing in the results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateResult {
    pub id: String,
    pub name: String,
    pub position: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub vote_count: u64,
}

impl From<&Candidate> for CandidateResult {
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

/// Results for one contested office.
#[derive(Debug, Serialize, Deserialize)]
pub struct GroupResult {
    pub group: String,
    pub description: String,
    pub candidates: Vec<CandidateResult>,
}

/// The full aggregate results snapshot.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsResponse {
    pub results: Vec<GroupResult>,
    pub total_votes: u64,
    pub timestamp: DateTime<Utc>,
}

impl ResultsResponse {
    /// Project the stored groups and candidates into the results view.
    ///
    /// `groups` must already be filtered to active groups. The total is
    /// computed from the same candidate read, so it always equals the sum
    /// of the counts in the response.
    pub fn build(groups: Vec<Group>, mut candidates: Vec<Candidate>) -> Self {
        sort_by_votes(&mut candidates);
        let total_votes = candidates.iter().map(|candidate| candidate.vote_count).sum();

        let results = groups
            .into_iter()
            .map(|group| {
                let members = candidates
                    .iter()
                    .filter(|candidate| candidate.group == group.name)
                    .map(CandidateResult::from)
                    .collect();
                GroupResult {
                    group: group.group.name,
                    description: group.group.description,
                    candidates: members,
                }
            })
            .collect();

        Self {
            results,
            total_votes,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use mongodb::bson::DateTime as BsonDateTime;

    use crate::model::db::CandidateCore;
    use crate::model::mongodb::Id;

    pub fn candidate(id: &str, name: &str, group: &str, votes: u64) -> Candidate {
        let mut core = CandidateCore::new(name, format!("{group} Candidate"), None, group);
        core.vote_count = votes;
        Candidate {
            id: id.parse().unwrap(),
            candidate: core,
        }
    }

    pub fn group(name: &str) -> Group {
        Group {
            id: Id::new(),
            group: crate::model::db::GroupCore {
                name: name.to_string(),
                description: format!("Vote for the {name}"),
                is_active: true,
                created_at: BsonDateTime::now(),
            },
        }
    }

    #[test]
    fn sorted_descending_with_id_tie_break() {
        let mut candidates = vec![
            candidate("000000000000000000000002", "B", "President", 3),
            candidate("000000000000000000000003", "C", "President", 7),
            candidate("000000000000000000000001", "A", "President", 3),
        ];
        sort_by_votes(&mut candidates);
        let names: Vec<_> = candidates.iter().map(|c| c.name.as_str()).collect();
        // 7 first, then the two tied at 3 ordered by ID ascending.
        assert_eq!(names, ["C", "A", "B"]);
    }

    #[test]
    fn total_equals_sum_of_counts() {
        let groups = vec![group("President"), group("Secretary")];
        let candidates = vec![
            candidate("000000000000000000000001", "A", "President", 4),
            candidate("000000000000000000000002", "B", "President", 1),
            candidate("000000000000000000000003", "C", "Secretary", 2),
        ];
        let response = ResultsResponse::build(groups, candidates);
        assert_eq!(response.total_votes, 7);

        let summed: u64 = response
            .results
            .iter()
            .flat_map(|group| &group.candidates)
            .map(|candidate| candidate.vote_count)
            .sum();
        assert_eq!(summed, response.total_votes);
    }

    #[test]
    fn candidates_are_partitioned_by_group() {
        let groups = vec![group("President"), group("Secretary")];
        let candidates = vec![
            candidate("000000000000000000000001", "A", "President", 0),
            candidate("000000000000000000000002", "B", "Secretary", 0),
        ];
        let response = ResultsResponse::build(groups, candidates);
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[0].candidates.len(), 1);
        assert_eq!(response.results[0].candidates[0].name, "A");
        assert_eq!(response.results[1].candidates[0].name, "B");
    }

    #[test]
    fn empty_group_yields_empty_partition() {
        let groups = vec![group("President")];
        let response = ResultsResponse::build(groups, vec![]);
        assert_eq!(response.total_votes, 0);
        assert!(response.results[0].candidates.is_empty());
    }
}
