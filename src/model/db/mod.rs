//! DB-compatible (e.g. de/serialisable) types.
//!
//! The types in this module are serialised in a DB-friendly way, e.g.:
//!
//! - IDs and datetimes are serialised in MongoDB's own format.

mod admin;
pub use admin::{ensure_admin_exists, Admin, AdminCore, NewAdmin};

mod candidate;
pub use candidate::{Candidate, CandidateCore, NewCandidate};

mod group;
pub use group::{Group, GroupCore, NewGroup};

mod vote_event;
pub use vote_event::{NewVoteEvent, VoteEvent, VoteEventCore};

mod voter;
pub use voter::{NewVoter, Voter, VoterCore};
