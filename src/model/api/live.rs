use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::model::db::{Candidate, Group, VoteEvent};
use crate::model::mongodb::Id;

use super::results::sort_by_votes;

/// How far back a vote still counts as "recent" activity.
pub const RECENT_WINDOW_MINUTES: i64 = 5;

pub fn recent_window() -> Duration {
    Duration::minutes(RECENT_WINDOW_MINUTES)
}

/// Tally recent vote events per candidate.
pub fn recent_counts(events: &[VoteEvent]) -> HashMap<Id, u64> {
    let mut counts = HashMap::new();
    for event in events {
        *counts.entry(event.candidate_id).or_insert(0) += 1;
    }
    counts
}

/// Votes per minute over the recent window, rounded to one decimal.
pub fn voting_rate(recent_events: usize) -> f64 {
    let rate = recent_events as f64 / RECENT_WINDOW_MINUTES as f64;
    (rate * 10.0).round() / 10.0
}

/// One candidate's live standing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveCandidate {
    pub id: String,
    pub name: String,
    pub position: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub vote_count: u64,
    /// Share of the group total, 0 when nobody in the group has any votes.
    pub vote_percentage: f64,
    /// Committed votes for this candidate within the recent window.
    pub recent_votes: u64,
}

/// One contested office with live standings.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveGroup {
    pub group: String,
    pub description: String,
    pub candidates: Vec<LiveCandidate>,
    pub total_votes: u64,
    /// Current leader. Absent while every tally in the group is zero; on a
    /// tie the candidate with the lowest ID leads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<LiveCandidate>,
}

impl LiveGroup {
    fn build(group: Group, candidates: &[Candidate], recent: &HashMap<Id, u64>) -> Self {
        let members: Vec<&Candidate> = candidates
            .iter()
            .filter(|candidate| candidate.group == group.name)
            .collect();
        let total_votes: u64 = members.iter().map(|candidate| candidate.vote_count).sum();

        // `candidates` is pre-sorted, so members are already in standing order.
        let standings: Vec<LiveCandidate> = members
            .iter()
            .map(|candidate| LiveCandidate {
                id: candidate.id.to_string(),
                name: candidate.name.clone(),
                position: candidate.position.clone(),
                description: candidate.description.clone(),
                vote_count: candidate.vote_count,
                vote_percentage: if total_votes > 0 {
                    candidate.vote_count as f64 / total_votes as f64 * 100.0
                } else {
                    0.0
                },
                recent_votes: recent.get(&candidate.id).copied().unwrap_or(0),
            })
            .collect();

        let winner = standings
            .first()
            .filter(|leader| leader.vote_count > 0)
            .cloned();

        Self {
            group: group.group.name,
            description: group.group.description,
            candidates: standings,
            total_votes,
            winner,
        }
    }
}

/// Election-wide live statistics, all derived from real data: voter flags
/// for turnout and vote event timestamps for activity.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStats {
    pub total_votes: u64,
    pub total_voters: u64,
    pub active_categories: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_vote_time: Option<DateTime<Utc>>,
    pub voting_rate: f64,
}

/// A full live snapshot, served by `/live` and pushed on `/live/stream`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveResponse {
    pub groups: Vec<LiveGroup>,
    pub stats: LiveStats,
    pub timestamp: DateTime<Utc>,
}

impl LiveResponse {
    /// Project stored state into the live view.
    ///
    /// `groups` must already be filtered to active groups and
    /// `recent_events` to the recent window.
    pub fn build(
        groups: Vec<Group>,
        mut candidates: Vec<Candidate>,
        total_voters: u64,
        recent_events: &[VoteEvent],
        last_vote_time: Option<DateTime<Utc>>,
    ) -> Self {
        sort_by_votes(&mut candidates);
        let total_votes = candidates.iter().map(|candidate| candidate.vote_count).sum();
        let recent = recent_counts(recent_events);
        let active_categories = groups.len() as u64;

        let live_groups = groups
            .into_iter()
            .map(|group| LiveGroup::build(group, &candidates, &recent))
            .collect();

        Self {
            groups: live_groups,
            stats: LiveStats {
                total_votes,
                total_voters,
                active_categories,
                last_vote_time,
                voting_rate: voting_rate(recent_events.len()),
            },
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::api::results::tests::{candidate, group};

    #[test]
    fn percentages_are_relative_to_the_group() {
        let groups = vec![group("President")];
        let candidates = vec![
            candidate("000000000000000000000001", "A", "President", 3),
            candidate("000000000000000000000002", "B", "President", 1),
        ];
        let response = LiveResponse::build(groups, candidates, 4, &[], None);

        let president = &response.groups[0];
        assert_eq!(president.total_votes, 4);
        assert!((president.candidates[0].vote_percentage - 75.0).abs() < f64::EPSILON);
        assert!((president.candidates[1].vote_percentage - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_vote_group_has_no_winner_and_zero_percentages() {
        let groups = vec![group("Secretary")];
        let candidates = vec![
            candidate("000000000000000000000001", "A", "Secretary", 0),
            candidate("000000000000000000000002", "B", "Secretary", 0),
        ];
        let response = LiveResponse::build(groups, candidates, 0, &[], None);

        let secretary = &response.groups[0];
        assert!(secretary.winner.is_none());
        assert!(secretary
            .candidates
            .iter()
            .all(|candidate| candidate.vote_percentage == 0.0));
    }

    #[test]
    fn winner_is_the_leader_with_lowest_id_on_tie() {
        let groups = vec![group("President")];
        let candidates = vec![
            candidate("000000000000000000000002", "B", "President", 5),
            candidate("000000000000000000000001", "A", "President", 5),
        ];
        let response = LiveResponse::build(groups, candidates, 10, &[], None);

        let winner = response.groups[0].winner.as_ref().unwrap();
        assert_eq!(winner.name, "A");
    }

    #[test]
    fn recent_votes_come_from_events() {
        let leader_id: Id = "000000000000000000000001".parse().unwrap();
        let groups = vec![group("President")];
        let candidates = vec![
            candidate("000000000000000000000001", "A", "President", 3),
            candidate("000000000000000000000002", "B", "President", 0),
        ];
        let now = Utc::now();
        let events = vec![
            VoteEvent::example_at(leader_id, now - Duration::seconds(30)),
            VoteEvent::example_at(leader_id, now - Duration::seconds(90)),
        ];
        let response = LiveResponse::build(groups, candidates, 3, &events, Some(now));

        let president = &response.groups[0];
        assert_eq!(president.candidates[0].recent_votes, 2);
        assert_eq!(president.candidates[1].recent_votes, 0);
        assert_eq!(response.stats.voting_rate, 0.4);
        assert_eq!(response.stats.last_vote_time, Some(now));
    }

    #[test]
    fn voting_rate_rounds_to_one_decimal() {
        assert_eq!(voting_rate(0), 0.0);
        assert_eq!(voting_rate(1), 0.2);
        assert_eq!(voting_rate(7), 1.4);
        assert_eq!(voting_rate(8), 1.6);
    }
}
