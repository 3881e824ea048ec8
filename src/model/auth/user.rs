use serde::{Deserialize, Serialize};

use crate::model::{
    db::{Admin, Voter},
    mongodb::Id,
};

/// The rights a session token can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rights {
    Voter,
    Admin,
}

/// A user type that sessions can be issued for.
pub trait User {
    const RIGHTS: Rights;

    fn id(&self) -> Id;
}

impl User for Voter {
    const RIGHTS: Rights = Rights::Voter;

    fn id(&self) -> Id {
        self.id
    }
}

impl User for Admin {
    const RIGHTS: Rights = Rights::Admin;

    fn id(&self) -> Id {
        self.id
    }
}
