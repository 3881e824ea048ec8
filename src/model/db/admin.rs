use std::ops::{Deref, DerefMut};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::mongodb::{Coll, Id};

/// Core admin user data.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminCore {
    pub username: String,
    pub password_hash: String,
}

impl AdminCore {
    /// Create an admin, hashing the given password with a fresh salt.
    pub fn new(username: impl Into<String>, password: &str) -> Result<Self> {
        let mut salt = [0u8; 16];
        rand::thread_rng().fill(&mut salt);
        let password_hash =
            argon2::hash_encoded(password.as_bytes(), &salt, &argon2::Config::default())?;
        Ok(Self {
            username: username.into(),
            password_hash,
        })
    }

    /// Check whether the given password is correct.
    /// A malformed stored hash counts as a failed check.
    pub fn verify_password<T: AsRef<[u8]>>(&self, password: T) -> bool {
        argon2::verify_encoded(&self.password_hash, password.as_ref()).unwrap_or(false)
    }
}

/// An admin without an ID.
pub type NewAdmin = AdminCore;

/// An admin user from the database, with its unique ID.
#[derive(Debug, Serialize, Deserialize)]
pub struct Admin {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub admin: AdminCore,
}

impl Deref for Admin {
    type Target = AdminCore;

    fn deref(&self) -> &Self::Target {
        &self.admin
    }
}

impl DerefMut for Admin {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.admin
    }
}

/// Create the initial admin account from config if no admin exists yet.
pub async fn ensure_admin_exists(
    admins: &Coll<NewAdmin>,
    username: &str,
    password: &str,
) -> Result<()> {
    let count = admins.count_documents(None, None).await?;
    if count == 0 {
        let admin = AdminCore::new(username, password)?;
        admins.insert_one(&admin, None).await?;
        info!("Created initial admin account '{username}'");
    }
    Ok(())
}
