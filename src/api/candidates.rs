use mongodb::bson::doc;
use rocket::{futures::TryStreamExt, serde::json::Json, Route};

use crate::error::Result;
use crate::model::{
    api::candidates::CandidatesResponse,
    db::{Candidate, Group},
    mongodb::Coll,
};

pub fn routes() -> Vec<Route> {
    routes![get_candidates]
}

/// The ballot paper: active groups and the candidates standing in them.
#[get("/candidates")]
async fn get_candidates(
    groups: Coll<Group>,
    candidates: Coll<Candidate>,
) -> Result<Json<CandidatesResponse>> {
    let active_groups = groups
        .find(doc! { "is_active": true }, None)
        .await?
        .try_collect()
        .await?;
    let all_candidates = candidates.find(None, None).await?.try_collect().await?;

    Ok(Json(CandidatesResponse::build(active_groups, all_candidates)))
}
