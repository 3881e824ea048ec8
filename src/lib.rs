#[macro_use]
extern crate rocket;

#[macro_use]
extern crate log;

use rocket::{Build, Rocket};

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;

pub use config::Config;

use config::{AllowlistFairing, ConfigFairing, DatabaseFairing};
use logging::LoggerFairing;

/// Assemble the server: all routes, plus fairings for config, database,
/// eligibility allow-list, and request logging.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .attach(ConfigFairing)
        .attach(DatabaseFairing)
        .attach(AllowlistFairing)
        .attach(LoggerFairing)
        .manage(reqwest::Client::new())
}

/// Ignite a local client against a fresh, randomly-named test database.
///
/// Returns `None` when no transaction-capable MongoDB deployment is
/// reachable, in which case DB-backed tests skip themselves; everything
/// else runs against the throwaway database, which the test drops when done.
#[cfg(test)]
pub(crate) async fn client_and_db() -> Option<(
    rocket::local::asynchronous::Client,
    mongodb::Database,
)> {
    use std::time::Duration;

    use mongodb::bson::doc;

    let rocket = build();
    let db_uri: String = rocket.figment().extract_inner("db_uri").ok()?;

    // Probe with a short timeout; the vote transaction needs a replica set
    // (or mongos), not just any reachable server.
    let mut options = mongodb::options::ClientOptions::parse(&db_uri).await.ok()?;
    options.server_selection_timeout = Some(Duration::from_secs(2));
    let probe = mongodb::Client::with_options(options).ok()?;
    let hello = match probe
        .database("admin")
        .run_command(doc! { "hello": 1 }, None)
        .await
    {
        Ok(hello) => hello,
        Err(_) => {
            eprintln!("No MongoDB deployment reachable at {db_uri}, skipping");
            return None;
        }
    };
    let sharded = hello.get_str("msg").map_or(false, |msg| msg == "isdbgrid");
    if !hello.contains_key("setName") && !sharded {
        eprintln!("MongoDB at {db_uri} does not support transactions, skipping");
        return None;
    }

    let client = rocket::local::asynchronous::Client::tracked(rocket)
        .await
        .expect("test instance failed to ignite");
    let db = client
        .rocket()
        .state::<mongodb::Database>()
        .expect("the database fairing manages a handle")
        .clone();
    Some((client, db))
}
