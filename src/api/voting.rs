use mongodb::{bson::doc, Client};
use rocket::{serde::json::Json, Route, State};

use crate::error::{Error, Result};
use crate::model::{
    api::ballot::{VoteReceipt, VoteRequest},
    auth::AuthToken,
    db::{Candidate, NewVoteEvent, Voter},
    mongodb::{is_duplicate_key_error, Coll},
};

pub fn routes() -> Vec<Route> {
    routes![cast_vote]
}

/// Cast the caller's single vote.
///
/// The authoritative vote-once check is the conditional update inside the
/// transaction, which flips `has_voted` only if it is still false. Of two
/// racing requests exactly one matches; the other gets `already-voted` and no
/// tally is touched. The unique index on `vote_events.voter_id` backstops the
/// same invariant at the storage level. Candidate existence is checked by the
/// `$inc` itself, so a candidate deleted since the ballot was served aborts
/// the whole transaction.
#[post("/vote", data = "<ballot>", format = "json")]
async fn cast_vote(
    token: AuthToken<Voter>,
    ballot: Json<VoteRequest>,
    voters: Coll<Voter>,
    candidates: Coll<Candidate>,
    events: Coll<NewVoteEvent>,
    db_client: &State<Client>,
) -> Result<Json<VoteReceipt>> {
    let candidate_id = ballot.candidate_id()?;

    // The session may outlive the voter record (e.g. after a reseed).
    let voter = voters
        .find_one(token.id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("No voter found with ID {}", token.id)))?;

    // Fast-path rejection; the authoritative check is the conditional update.
    if voter.has_voted {
        return Err(Error::AlreadyVoted);
    }

    // All three writes commit together or not at all: a crash mid-vote must
    // never leave a marked voter without a counted ballot, or vice versa.
    let mut session = db_client.start_session(None).await?;
    session.start_transaction(None).await?;

    let still_unvoted = doc! {
        "_id": *voter.id,
        "has_voted": false,
    };
    let mark_voted = doc! {
        "$set": { "has_voted": true }
    };
    let update = voters
        .update_one_with_session(still_unvoted, mark_voted, None, &mut session)
        .await?;
    if update.matched_count == 0 {
        // Lost the race against a concurrent request from the same voter.
        session.abort_transaction().await?;
        return Err(Error::AlreadyVoted);
    }

    let event = NewVoteEvent::new(voter.id, candidate_id);
    let inserted = events
        .insert_one_with_session(&event, None, &mut session)
        .await;
    if is_duplicate_key_error(inserted.as_ref()) {
        let _ = session.abort_transaction().await;
        return Err(Error::AlreadyVoted);
    }
    inserted?;

    let increment = doc! {
        "$inc": { "vote_count": 1 }
    };
    let tally = candidates
        .update_one_with_session(candidate_id.as_doc(), increment, None, &mut session)
        .await?;
    if tally.matched_count == 0 {
        // The candidate was removed after the ballot was served, e.g. by a
        // reseed; roll back the voter flag and the event.
        session.abort_transaction().await?;
        return Err(Error::not_found(format!(
            "No candidate found with ID {candidate_id}"
        )));
    }

    session.commit_transaction().await?;

    info!("Vote committed for candidate {candidate_id}");
    Ok(Json(VoteReceipt::default()))
}

#[cfg(test)]
mod tests {
    use mongodb::Database;
    use rocket::{
        http::{ContentType, Cookie, Status},
        local::asynchronous::Client,
        tokio,
    };
    use serde_json::{json, Value};

    use crate::client_and_db;
    use crate::model::{
        db::{NewCandidate, NewGroup, NewVoter, VoteEvent},
        mongodb::Id,
    };

    use super::*;

    async fn insert_voter(db: &Database) -> Voter {
        let new_voter = NewVoter::new("ananya.iyer@nsut.ac.in", "Ananya Iyer", None);
        let id = Coll::<NewVoter>::from_db(db)
            .insert_one(&new_voter, None)
            .await
            .unwrap()
            .inserted_id
            .as_object_id()
            .unwrap()
            .into();
        Voter {
            id,
            voter: new_voter,
        }
    }

    async fn insert_candidate(db: &Database) -> Id {
        Coll::<NewGroup>::from_db(db)
            .insert_one(
                NewGroup::new("President", "Vote for the President", true),
                None,
            )
            .await
            .unwrap();
        Coll::<NewCandidate>::from_db(db)
            .insert_one(
                NewCandidate::new("Ananya Iyer", "President Candidate", None, "President"),
                None,
            )
            .await
            .unwrap()
            .inserted_id
            .as_object_id()
            .unwrap()
            .into()
    }

    fn session_cookie(client: &Client, voter: &Voter) -> Cookie<'static> {
        let config = client.rocket().state::<crate::Config>().unwrap();
        AuthToken::new(voter).into_cookie(config)
    }

    async fn body_json(response: rocket::local::asynchronous::LocalResponse<'_>) -> Value {
        serde_json::from_str(&response.into_string().await.unwrap()).unwrap()
    }

    #[rocket::async_test]
    async fn concurrent_votes_count_once() {
        let Some((client, db)) = client_and_db().await else { return };
        let voter = insert_voter(&db).await;
        let candidate_id = insert_candidate(&db).await;
        let cookie = session_cookie(&client, &voter);
        let body = json!({ "candidateId": candidate_id.to_string() }).to_string();

        let dispatch = || {
            client
                .post(uri!(cast_vote))
                .header(ContentType::JSON)
                .cookie(cookie.clone())
                .body(&body)
                .dispatch()
        };
        let responses = tokio::join!(dispatch(), dispatch(), dispatch(), dispatch());
        let statuses = [
            responses.0.status(),
            responses.1.status(),
            responses.2.status(),
            responses.3.status(),
        ];

        // However the losers fail, exactly one request may commit.
        let successes = statuses
            .iter()
            .filter(|status| **status == Status::Ok)
            .count();
        assert_eq!(successes, 1);

        let candidate = Coll::<Candidate>::from_db(&db)
            .find_one(candidate_id.as_doc(), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(candidate.vote_count, 1);

        let events = Coll::<VoteEvent>::from_db(&db)
            .count_documents(None, None)
            .await
            .unwrap();
        assert_eq!(events, 1);

        let voter = Coll::<Voter>::from_db(&db)
            .find_one(voter.id.as_doc(), None)
            .await
            .unwrap()
            .unwrap();
        assert!(voter.has_voted);

        db.drop(None).await.unwrap();
    }

    #[rocket::async_test]
    async fn seeded_election_vote_flow() {
        let Some((client, db)) = client_and_db().await else { return };

        // The initial admin signs in and seeds the election.
        let config = client.rocket().state::<crate::Config>().unwrap();
        let credentials = json!({
            "username": config.admin_username(),
            "password": config.admin_password()
        })
        .to_string();
        let login = client
            .post("/auth/admin")
            .header(ContentType::JSON)
            .body(credentials)
            .dispatch()
            .await;
        assert_eq!(login.status(), Status::Ok);

        let seed = json!({
            "groups": [
                { "name": "President", "description": "Vote for the President" }
            ],
            "candidates": [{
                "name": "Ananya Iyer",
                "position": "President Candidate",
                "group": "President"
            }]
        })
        .to_string();
        let seeded = client
            .post("/admin/seed")
            .header(ContentType::JSON)
            .body(seed)
            .dispatch()
            .await;
        assert_eq!(seeded.status(), Status::Ok);
        client.post("/auth/logout").dispatch().await;

        // The ballot paper shows the seeded candidate.
        let ballot = client.get("/candidates").dispatch().await;
        assert_eq!(ballot.status(), Status::Ok);
        let ballot = body_json(ballot).await;
        let candidate_id = ballot["groups"][0]["candidates"][0]["_id"]
            .as_str()
            .unwrap()
            .to_string();

        // A voter casts their single vote.
        let voter = insert_voter(&db).await;
        let cookie = session_cookie(&client, &voter);
        let body = json!({ "candidateId": candidate_id }).to_string();
        let first = client
            .post(uri!(cast_vote))
            .header(ContentType::JSON)
            .cookie(cookie.clone())
            .body(&body)
            .dispatch()
            .await;
        assert_eq!(first.status(), Status::Ok);

        // A second attempt is rejected without touching the tally.
        let second = client
            .post(uri!(cast_vote))
            .header(ContentType::JSON)
            .cookie(cookie)
            .body(&body)
            .dispatch()
            .await;
        assert_eq!(second.status(), Status::BadRequest);
        assert_eq!(body_json(second).await["error"], "already-voted");

        let results = client.get("/results").dispatch().await;
        assert_eq!(body_json(results).await["totalVotes"], 1);

        db.drop(None).await.unwrap();
    }

    #[rocket::async_test]
    async fn vote_for_missing_candidate_rolls_back() {
        let Some((client, db)) = client_and_db().await else { return };
        let voter = insert_voter(&db).await;
        let cookie = session_cookie(&client, &voter);

        let response = client
            .post(uri!(cast_vote))
            .header(ContentType::JSON)
            .cookie(cookie)
            .body(json!({ "candidateId": Id::new().to_string() }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NotFound);
        assert_eq!(body_json(response).await["error"], "not-found");

        // The aborted transaction must leave no trace.
        let voter = Coll::<Voter>::from_db(&db)
            .find_one(voter.id.as_doc(), None)
            .await
            .unwrap()
            .unwrap();
        assert!(!voter.has_voted);
        let events = Coll::<VoteEvent>::from_db(&db)
            .count_documents(None, None)
            .await
            .unwrap();
        assert_eq!(events, 0);

        db.drop(None).await.unwrap();
    }

    #[rocket::async_test]
    async fn malformed_candidate_id_is_rejected() {
        let Some((client, db)) = client_and_db().await else { return };
        let voter = insert_voter(&db).await;
        let cookie = session_cookie(&client, &voter);

        let response = client
            .post(uri!(cast_vote))
            .header(ContentType::JSON)
            .cookie(cookie)
            .body(json!({ "candidateId": "not-a-hex-id" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
        assert_eq!(body_json(response).await["error"], "validation-error");

        let voter = Coll::<Voter>::from_db(&db)
            .find_one(voter.id.as_doc(), None)
            .await
            .unwrap()
            .unwrap();
        assert!(!voter.has_voted);

        db.drop(None).await.unwrap();
    }

    #[rocket::async_test]
    async fn vote_requires_a_session() {
        let Some((client, db)) = client_and_db().await else { return };

        let response = client
            .post(uri!(cast_vote))
            .header(ContentType::JSON)
            .body(json!({ "candidateId": Id::new().to_string() }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Unauthorized);

        db.drop(None).await.unwrap();
    }
}
