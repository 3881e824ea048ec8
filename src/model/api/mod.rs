//! API-compatible types.
//!
//! The types in this module are serialised in an API-friendly way, e.g.:
//!
//! - IDs are serialised as hex strings.
//! - Datetimes are serialised as RFC 3339 timestamps.
//! - Field names are camelCase, matching the original wire format.

pub mod auth;
pub mod ballot;
pub mod candidates;
pub mod live;
pub mod results;
pub mod seed;
