use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::db::{NewCandidate, NewGroup};

fn default_active() -> bool {
    true
}

/// A group to seed.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedGroup {
    pub name: String,
    pub description: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// A candidate to seed, referencing a group by name.
#[derive(Debug, Serialize, Deserialize)]
pub struct SeedCandidate {
    pub name: String,
    pub position: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub group: String,
}

/// A full reset-and-repopulate request for the election fixtures.
#[derive(Debug, Serialize, Deserialize)]
pub struct SeedRequest {
    pub groups: Vec<SeedGroup>,
    pub candidates: Vec<SeedCandidate>,
}

impl SeedRequest {
    /// Check internal consistency before anything is deleted.
    pub fn validate(&self) -> Result<(), String> {
        if self.groups.is_empty() {
            return Err("at least one group is required".to_string());
        }

        let mut names = HashSet::new();
        for group in &self.groups {
            if !names.insert(group.name.as_str()) {
                return Err(format!("duplicate group name '{}'", group.name));
            }
        }

        for candidate in &self.candidates {
            if !names.contains(candidate.group.as_str()) {
                return Err(format!(
                    "candidate '{}' references unknown group '{}'",
                    candidate.name, candidate.group
                ));
            }
        }

        Ok(())
    }

    pub fn new_groups(&self) -> Vec<NewGroup> {
        self.groups
            .iter()
            .map(|group| NewGroup::new(&group.name, &group.description, group.is_active))
            .collect()
    }

    /// Candidates to insert, all with zeroed tallies.
    pub fn new_candidates(&self) -> Vec<NewCandidate> {
        self.candidates
            .iter()
            .map(|candidate| {
                NewCandidate::new(
                    &candidate.name,
                    &candidate.position,
                    candidate.description.clone(),
                    &candidate.group,
                )
            })
            .collect()
    }
}

/// Acknowledgement of a completed seed.
#[derive(Debug, Serialize, Deserialize)]
pub struct SeedReceipt {
    pub message: String,
    pub groups: usize,
    pub candidates: usize,
}

impl SeedReceipt {
    pub fn new(groups: usize, candidates: usize) -> Self {
        Self {
            message: "Database seeded successfully".to_string(),
            groups,
            candidates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SeedRequest {
        serde_json::from_str(
            r#"{
                "groups": [
                    {"name": "Student President", "description": "Vote for the Student Council President"},
                    {"name": "Secretary", "description": "Vote for the Student Council Secretary", "isActive": false}
                ],
                "candidates": [
                    {"name": "Ananya Iyer", "position": "Student President Candidate", "group": "Student President"},
                    {"name": "Rohan Mehta", "position": "Secretary Candidate", "group": "Secretary"}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn valid_request_passes() {
        let request = request();
        assert!(request.validate().is_ok());
        assert!(request.groups[0].is_active);
        assert!(!request.groups[1].is_active);
    }

    #[test]
    fn unknown_group_reference_is_rejected() {
        let mut request = request();
        request.candidates[0].group = "Treasurer".to_string();
        assert!(request.validate().is_err());
    }

    #[test]
    fn duplicate_group_names_are_rejected() {
        let mut request = request();
        request.groups[1].name = request.groups[0].name.clone();
        assert!(request.validate().is_err());
    }

    #[test]
    fn empty_groups_are_rejected() {
        let mut request = request();
        request.groups.clear();
        request.candidates.clear();
        assert!(request.validate().is_err());
    }

    #[test]
    fn seeded_candidates_start_at_zero() {
        let request = request();
        assert!(request
            .new_candidates()
            .iter()
            .all(|candidate| candidate.vote_count == 0));
    }
}
