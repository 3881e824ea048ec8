use chrono::Utc;
use mongodb::bson::{doc, DateTime as BsonDateTime};
use mongodb::options::FindOneOptions;
use rocket::{
    futures::TryStreamExt,
    response::{
        self,
        stream::{Event, EventStream},
        Responder,
    },
    serde::json::Json,
    tokio::select,
    tokio::time,
    Request, Route, Shutdown, State,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Result;
use crate::model::{
    api::{
        live::{recent_window, LiveResponse},
        results::ResultsResponse,
    },
    db::{Candidate, Group, VoteEvent, Voter},
    mongodb::Coll,
};

pub fn routes() -> Vec<Route> {
    routes![get_results, get_live, live_stream]
}

/// Wrapper that marks a response as uncacheable; live data must never be
/// served stale by an intermediary.
pub struct NoCache<T>(pub T);

impl<'r, 'o: 'r, T: Responder<'r, 'o>> Responder<'r, 'o> for NoCache<T> {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let mut res = self.0.respond_to(req)?;
        res.set_raw_header("Cache-Control", "no-cache, no-store, must-revalidate");
        res.set_raw_header("Pragma", "no-cache");
        res.set_raw_header("Expires", "0");
        Ok(res)
    }
}

/// Aggregate results, sorted within each group by tally.
#[get("/results")]
async fn get_results(
    groups: Coll<Group>,
    candidates: Coll<Candidate>,
) -> Result<Json<ResultsResponse>> {
    let active_groups = groups
        .find(doc! { "is_active": true }, None)
        .await?
        .try_collect()
        .await?;
    let all_candidates = candidates.find(None, None).await?.try_collect().await?;

    Ok(Json(ResultsResponse::build(active_groups, all_candidates)))
}

/// A single live snapshot with activity stats.
#[get("/live")]
async fn get_live(
    groups: Coll<Group>,
    candidates: Coll<Candidate>,
    voters: Coll<Voter>,
    events: Coll<VoteEvent>,
) -> Result<NoCache<Json<LiveResponse>>> {
    let snapshot = live_snapshot(&groups, &candidates, &voters, &events).await?;
    Ok(NoCache(Json(snapshot)))
}

/// First message on the live stream.
#[derive(Debug, Serialize, Deserialize)]
struct StreamHello {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

impl Default for StreamHello {
    fn default() -> Self {
        Self {
            kind: "connected".to_string(),
            message: "Live stream connected".to_string(),
        }
    }
}

/// Sent in place of a snapshot when a read fails; the stream itself stays up.
#[derive(Debug, Serialize, Deserialize)]
struct StreamFault {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

impl Default for StreamFault {
    fn default() -> Self {
        Self {
            kind: "error".to_string(),
            message: "Failed to fetch live data".to_string(),
        }
    }
}

/// Live results over Server-Sent Events.
///
/// Each connection owns its own timer; dropping the stream (client
/// disconnect or server shutdown) drops the timer with it, so no periodic
/// work outlives the connection.
#[get("/live/stream")]
async fn live_stream(
    groups: Coll<Group>,
    candidates: Coll<Candidate>,
    voters: Coll<Voter>,
    events: Coll<VoteEvent>,
    config: &State<Config>,
    mut end: Shutdown,
) -> EventStream![] {
    let period = config.live_interval();
    EventStream! {
        yield Event::json(&StreamHello::default()).event("connection");

        let mut timer = time::interval(period);
        // An interval's first tick completes immediately; consume it so the
        // first update arrives one full period after connecting.
        timer.tick().await;
        loop {
            select! {
                _ = timer.tick() => {
                    match live_snapshot(&groups, &candidates, &voters, &events).await {
                        Ok(snapshot) => yield Event::json(&snapshot).event("live-update"),
                        Err(err) => {
                            warn!("Live stream snapshot failed: {err}");
                            yield Event::json(&StreamFault::default()).event("error");
                        }
                    }
                }
                _ = &mut end => break,
            }
        }
    }
}

/// Read everything a live view needs in one pass.
async fn live_snapshot(
    groups: &Coll<Group>,
    candidates: &Coll<Candidate>,
    voters: &Coll<Voter>,
    events: &Coll<VoteEvent>,
) -> Result<LiveResponse> {
    let active_groups = groups
        .find(doc! { "is_active": true }, None)
        .await?
        .try_collect()
        .await?;
    let all_candidates = candidates.find(None, None).await?.try_collect().await?;
    let total_voters = voters
        .count_documents(doc! { "has_voted": true }, None)
        .await?;

    let cutoff = Utc::now() - recent_window();
    let recent_filter = doc! {
        "cast_at": { "$gte": BsonDateTime::from_chrono(cutoff) }
    };
    let recent_events: Vec<VoteEvent> = events
        .find(recent_filter, None)
        .await?
        .try_collect()
        .await?;

    let newest_first = FindOneOptions::builder()
        .sort(doc! { "cast_at": -1 })
        .build();
    let last_vote_time = events
        .find_one(None, newest_first)
        .await?
        .map(|event| event.cast_at.to_chrono());

    Ok(LiveResponse::build(
        active_groups,
        all_candidates,
        total_voters,
        &recent_events,
        last_vote_time,
    ))
}
