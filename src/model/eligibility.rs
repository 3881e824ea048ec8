use std::{collections::HashSet, fs, io, path::Path};

use serde::Deserialize;
use thiserror::Error;

/// Failures while loading the allow-list artifact. Any of these aborts the
/// launch.
#[derive(Debug, Error)]
pub enum AllowlistError {
    #[error("failed to read allow-list: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse allow-list: {0}")]
    Parse(#[from] serde_json::Error),
}

/// On-disk shape of the allow-list artifact.
#[derive(Deserialize)]
struct AllowlistFile {
    emails: Vec<String>,
}

/// The eligibility gate: the set of identities permitted to sign in and vote.
///
/// Loaded once at launch into immutable managed state; a reload requires a
/// process restart. The predicate is pure: an email is eligible iff it ends
/// with the institutional domain suffix AND appears in the allow-list.
pub struct Allowlist {
    domain_suffix: String,
    emails: HashSet<String>,
}

impl Allowlist {
    /// Build an allow-list for the given institutional domain.
    /// Addresses are compared case-insensitively.
    pub fn new(domain: &str, emails: impl IntoIterator<Item = String>) -> Self {
        Self {
            domain_suffix: format!("@{}", domain.to_lowercase()),
            emails: emails.into_iter().map(|email| email.to_lowercase()).collect(),
        }
    }

    /// Load the allow-list from a JSON artifact `{ "emails": [...] }`.
    pub fn load(path: impl AsRef<Path>, domain: &str) -> Result<Self, AllowlistError> {
        let raw = fs::read_to_string(path)?;
        let file: AllowlistFile = serde_json::from_str(&raw)?;
        Ok(Self::new(domain, file.emails))
    }

    /// Is this email permitted to vote in the election?
    pub fn is_eligible(&self, email: &str) -> bool {
        let email = email.to_lowercase();
        email.ends_with(&self.domain_suffix) && self.emails.contains(&email)
    }

    /// Number of allow-listed addresses.
    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example() -> Allowlist {
        Allowlist::new(
            "nsut.ac.in",
            [
                "ananya.iyer@nsut.ac.in".to_string(),
                "Rohan.Mehta@nsut.ac.in".to_string(),
            ],
        )
    }

    #[test]
    fn listed_institutional_address_is_eligible() {
        assert!(example().is_eligible("ananya.iyer@nsut.ac.in"));
    }

    #[test]
    fn wrong_domain_is_ineligible() {
        // Listed or not, the domain suffix must match.
        let list = Allowlist::new("nsut.ac.in", ["student@otherdomain.com".to_string()]);
        assert!(!list.is_eligible("student@otherdomain.com"));
    }

    #[test]
    fn unlisted_institutional_address_is_ineligible() {
        assert!(!example().is_eligible("stranger@nsut.ac.in"));
    }

    #[test]
    fn comparison_is_case_insensitive() {
        let list = example();
        assert!(list.is_eligible("Ananya.Iyer@NSUT.AC.IN"));
        assert!(list.is_eligible("rohan.mehta@nsut.ac.in"));
    }

    #[test]
    fn empty_list_rejects_everyone() {
        let list = Allowlist::new("nsut.ac.in", []);
        assert!(list.is_empty());
        assert!(!list.is_eligible("ananya.iyer@nsut.ac.in"));
    }

    #[test]
    fn load_round_trip() {
        let path = std::env::temp_dir().join(format!("allowlist-{}.json", rand::random::<u32>()));
        fs::write(&path, r#"{ "emails": ["ananya.iyer@nsut.ac.in"] }"#).unwrap();
        let list = Allowlist::load(&path, "nsut.ac.in").unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(list.len(), 1);
        assert!(list.is_eligible("ananya.iyer@nsut.ac.in"));
    }

    #[test]
    fn malformed_artifact_is_an_error() {
        let path = std::env::temp_dir().join(format!("allowlist-{}.json", rand::random::<u32>()));
        fs::write(&path, r#"{ "addresses": [] }"#).unwrap();
        let result = Allowlist::load(&path, "nsut.ac.in");
        fs::remove_file(&path).unwrap();

        assert!(matches!(result, Err(AllowlistError::Parse(_))));
    }
}
