use std::time::Duration;

use chrono::Duration as ChronoDuration;
use mongodb::Client as MongoClient;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::model::{
    db::ensure_admin_exists,
    eligibility::Allowlist,
    mongodb::{ensure_indexes_exist, Coll},
};

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Deserialize)]
pub struct Config {
    // non-secrets
    auth_ttl: u32,
    live_interval: u32,
    google_client_id: String,
    admin_username: String,
    // secrets
    jwt_secret: String,
    admin_password: String,
}

impl Config {
    /// Valid lifetime of auth token cookies in seconds.
    pub fn auth_ttl(&self) -> ChronoDuration {
        ChronoDuration::seconds(self.auth_ttl.into())
    }

    /// Period between pushes on the live results stream.
    pub fn live_interval(&self) -> Duration {
        Duration::from_secs(self.live_interval.into())
    }

    /// OAuth client ID that Google ID tokens must be issued for.
    pub fn google_client_id(&self) -> &str {
        &self.google_client_id
    }

    /// Username of the initial admin account.
    pub fn admin_username(&self) -> &str {
        &self.admin_username
    }

    /// Secret key used to encrypt JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Password of the initial admin account.
    pub fn admin_password(&self) -> &str {
        &self.admin_password
    }
}

/// Example data for tests.
#[cfg(test)]
impl Config {
    pub fn example() -> Self {
        Self {
            auth_ttl: 86400,
            live_interval: 3,
            google_client_id: "test-client.apps.googleusercontent.com".to_string(),
            admin_username: "coordinator".to_string(),
            jwt_secret: "the-jwt-signing-secret-for-tests".to_string(),
            admin_password: "correct-horse-battery-staple".to_string(),
        }
    }
}

/// A fairing that loads the application config and puts it in managed state.
/// This could easily be achieved using `AdHoc::config`, but is written out
/// explicitly for symmetry with the other fairings and control over error
/// messages.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Configuration for the database.
#[derive(Deserialize)]
struct DbConfig {
    // secrets
    db_uri: String,
}

/// A fairing that loads the MongoDB config, connects to the database,
/// performs any setup necessary, and places both a `Client` and a `Database`
/// into managed state.
///
/// Must be attached after [`ConfigFairing`], since the initial admin account
/// is created from the application config.
pub struct DatabaseFairing;

#[rocket::async_trait]
impl Fairing for DatabaseFairing {
    fn info(&self) -> Info {
        Info {
            name: "MongoDB",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<DbConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load database config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        info!("Loaded database config, connecting...");
        // Construct the connection.
        let client = match MongoClient::with_uri_str(config.db_uri).await {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to connect to database: {e}");
                return Err(rocket);
            }
        };
        let db = client.database(&get_database_name());

        // Ensure the required indexes exist.
        if let Err(e) = ensure_indexes_exist(&db).await {
            error!("Failed to create database indexes: {e}");
            return Err(rocket);
        }

        // Ensure there is at least one admin user.
        let app_config = rocket
            .state::<Config>()
            .expect("ConfigFairing must be attached before DatabaseFairing");
        let admins = Coll::from_db(&db);
        if let Err(e) = ensure_admin_exists(
            &admins,
            app_config.admin_username(),
            app_config.admin_password(),
        )
        .await
        {
            error!("Failed to set up the admin account: {e}");
            return Err(rocket);
        }
        info!("...database connection online!");

        // Manage the state.
        rocket = rocket.manage(client).manage(db);
        Ok(rocket)
    }
}

/// Get the name of the database to use (production version).
#[cfg(not(test))]
fn get_database_name() -> String {
    "studentvote".to_string()
}

/// Get the name of the database to use (test version).
/// Use a random name to avoid collisions between tests.
#[cfg(test)]
fn get_database_name() -> String {
    let random: u32 = rand::random();
    let db = format!("test{random}");
    info!("Using database {db}");
    db
}

/// Configuration for the eligibility gate.
#[derive(Deserialize)]
struct EligibilityConfig {
    // non-secrets
    email_domain: String,
    allowlist_path: String,
}

/// A fairing that loads the eligibility allow-list into immutable managed
/// state. A missing or malformed allow-list aborts the launch rather than
/// leaving the gate running on an empty set.
pub struct AllowlistFairing;

#[rocket::async_trait]
impl Fairing for AllowlistFairing {
    fn info(&self) -> Info {
        Info {
            name: "Eligibility allow-list",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<EligibilityConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load eligibility config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        // Load the allow-list.
        let allowlist = match Allowlist::load(&config.allowlist_path, &config.email_domain) {
            Ok(allowlist) => allowlist,
            Err(e) => {
                error!(
                    "Failed to load allow-list from '{}': {e}",
                    config.allowlist_path
                );
                return Err(rocket);
            }
        };
        info!(
            "Loaded {} eligible addresses under @{}",
            allowlist.len(),
            config.email_domain
        );

        // Manage the state.
        rocket = rocket.manage(allowlist);
        Ok(rocket)
    }
}
