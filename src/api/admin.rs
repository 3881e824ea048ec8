use mongodb::{bson::doc, Client};
use rocket::{serde::json::Json, Route, State};

use crate::error::{Error, Result};
use crate::model::{
    api::seed::{SeedReceipt, SeedRequest},
    auth::AuthToken,
    db::{Admin, NewCandidate, NewGroup},
    mongodb::Coll,
};

pub fn routes() -> Vec<Route> {
    routes![seed]
}

/// Destructively reset the election fixtures: drop all groups and
/// candidates and repopulate them from the request. Admin-only, meant to be
/// run before the election opens; every new candidate starts at zero votes.
#[post("/admin/seed", data = "<request>", format = "json")]
async fn seed(
    _token: AuthToken<Admin>,
    request: Json<SeedRequest>,
    groups: Coll<NewGroup>,
    candidates: Coll<NewCandidate>,
    db_client: &State<Client>,
) -> Result<Json<SeedReceipt>> {
    request.validate().map_err(Error::validation)?;

    let new_groups = request.new_groups();
    let new_candidates = request.new_candidates();

    // Delete and repopulate atomically so a failed seed cannot leave a
    // half-emptied election behind.
    let mut session = db_client.start_session(None).await?;
    session.start_transaction(None).await?;

    groups
        .delete_many_with_session(doc! {}, None, &mut session)
        .await?;
    candidates
        .delete_many_with_session(doc! {}, None, &mut session)
        .await?;

    groups
        .insert_many_with_session(&new_groups, None, &mut session)
        .await?;
    if !new_candidates.is_empty() {
        candidates
            .insert_many_with_session(&new_candidates, None, &mut session)
            .await?;
    }

    session.commit_transaction().await?;

    warn!(
        "Election fixtures reseeded: {} groups, {} candidates",
        new_groups.len(),
        new_candidates.len()
    );
    Ok(Json(SeedReceipt::new(
        new_groups.len(),
        new_candidates.len(),
    )))
}
