use std::ops::{Deref, DerefMut};

use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core voting group data, as stored in the database.
///
/// Groups partition candidates into the offices being contested; only
/// active groups are shown and tallied.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCore {
    /// Unique group name, referenced by candidates.
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime,
}

impl GroupCore {
    pub fn new(name: impl Into<String>, description: impl Into<String>, is_active: bool) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            is_active,
            created_at: DateTime::now(),
        }
    }
}

/// A group without an ID.
pub type NewGroup = GroupCore;

/// A group from the database, with its unique ID.
#[derive(Debug, Serialize, Deserialize)]
pub struct Group {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub group: GroupCore,
}

impl Deref for Group {
    type Target = GroupCore;

    fn deref(&self) -> &Self::Target {
        &self.group
    }
}

impl DerefMut for Group {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.group
    }
}
