use log::info;
use rocket::{serde::json::Json, Route, State};

use crate::config::Config;
use crate::error::Result;
use crate::logging::RequestId;
use crate::model::{
    api::participant::{JoinRequest, JoinResponse, ParticipantDescription, PreferenceSubmission},
    cache::RecommendationCache,
    events::SessionEvent,
    participant::{ParticipantId, Preferences},
    session::{GroupSession, SessionCode, SessionStatus},
    store::{SessionHandle, SessionStore},
};

pub fn routes() -> Vec<Route> {
    routes![join_session, submit_preferences, remove_participant]
}

#[post("/sessions/<session_id>/participants", data = "<request>", format = "json")]
async fn join_session(
    session_id: SessionCode,
    request: Json<JoinRequest>,
    store: &State<SessionStore>,
    request_id: &RequestId,
) -> Result<Json<JoinResponse>> {
    let handle = store.get(&session_id).await?;
    let mut session = handle.lock().await?;
    let participant_id = session.add_participant(&request.name)?;

    let participant = session.participant(&participant_id)?;
    info!("req{request_id}: {} joined session {session_id}", participant.name);
    handle.publish(SessionEvent::ParticipantJoined {
        participant: ParticipantDescription::from(participant),
    });

    Ok(Json(JoinResponse { participant_id }))
}

#[put(
    "/sessions/<session_id>/participants/<participant_id>/preferences",
    data = "<submission>",
    format = "json"
)]
async fn submit_preferences(
    session_id: SessionCode,
    participant_id: ParticipantId,
    submission: Json<PreferenceSubmission>,
    store: &State<SessionStore>,
    cache: &State<RecommendationCache>,
    config: &State<Config>,
    request_id: &RequestId,
) -> Result<()> {
    let preferences = Preferences::from_submission(submission.into_inner())?;

    let handle = store.get(&session_id).await?;
    let mut session = handle.lock().await?;
    session.submit_preferences(&participant_id, preferences)?;
    info!("req{request_id}: participant {participant_id} completed input for session {session_id}");

    if config.eager_invalidation() {
        cache.invalidate(&session_id).await;
    }
    handle.publish(SessionEvent::PreferencesSubmitted {
        participant_id,
        completed_count: session.completed_count(),
        total: session.participants().len(),
    });
    announce_if_complete(&handle, &session);
    Ok(())
}

#[delete("/sessions/<session_id>/participants/<participant_id>")]
async fn remove_participant(
    session_id: SessionCode,
    participant_id: ParticipantId,
    store: &State<SessionStore>,
    cache: &State<RecommendationCache>,
    config: &State<Config>,
    request_id: &RequestId,
) -> Result<()> {
    let handle = store.get(&session_id).await?;
    let mut session = handle.lock().await?;
    let removed = session.remove_participant(&participant_id)?;
    info!("req{request_id}: {} left session {session_id}", removed.name);

    if config.eager_invalidation() {
        cache.invalidate(&session_id).await;
    }
    handle.publish(SessionEvent::ParticipantRemoved { participant_id });
    // Removing the last holdout completes the group.
    if !removed.completed() {
        announce_if_complete(&handle, &session);
    }
    Ok(())
}

fn announce_if_complete(handle: &SessionHandle, session: &GroupSession) {
    if session.status() == SessionStatus::Completed {
        info!("All participants of session {} have completed input", session.id);
        handle.publish(SessionEvent::AllCompleted);
    }
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::{Client, LocalResponse},
        serde::json::{json, serde_json, Value},
    };

    use crate::model::{api::session::SessionDescription, catalog::Category};

    use super::*;

    async fn join<'c>(client: &'c Client, name: &str) -> LocalResponse<'c> {
        client
            .post(format!("/sessions/{}/participants", SessionCode::example()))
            .header(ContentType::JSON)
            .body(json!(JoinRequest::example(name)).to_string())
            .dispatch()
            .await
    }

    async fn submit<'c>(client: &'c Client, participant_id: &ParticipantId, body: Value) -> LocalResponse<'c> {
        client
            .put(format!(
                "/sessions/{}/participants/{participant_id}/preferences",
                SessionCode::example()
            ))
            .header(ContentType::JSON)
            .body(body.to_string())
            .dispatch()
            .await
    }

    async fn participant_ids(client: &Client) -> Vec<ParticipantId> {
        let session = client
            .get(format!("/sessions/{}", SessionCode::example()))
            .dispatch()
            .await
            .into_json::<SessionDescription>()
            .await
            .unwrap();
        session.participants.into_iter().map(|p| p.id).collect()
    }

    #[backend_test(seeded)]
    async fn join_open_session(client: Client) {
        let response = join(&client, "  Carol ").await;
        assert_eq!(Status::Ok, response.status());

        let raw_response = response.into_string().await.unwrap();
        let joined = serde_json::from_str::<JoinResponse>(&raw_response).unwrap();
        assert!(participant_ids(&client).await.contains(&joined.participant_id));
    }

    #[backend_test(seeded)]
    async fn join_rejects_duplicate_and_blank_names(client: Client) {
        assert_eq!(Status::BadRequest, join(&client, "alice").await.status());
        assert_eq!(Status::BadRequest, join(&client, "   ").await.status());
        assert_eq!(participant_ids(&client).await.len(), 2);
    }

    #[backend_test]
    async fn join_unknown_session(client: Client) {
        assert_eq!(Status::NotFound, join(&client, "Carol").await.status());
    }

    #[backend_test(seeded)]
    async fn submit_exactly_once(client: Client) {
        let alice = participant_ids(&client).await.remove(0);

        let response = submit(&client, &alice, json!(PreferenceSubmission::example())).await;
        assert_eq!(Status::Ok, response.status());

        let response = submit(&client, &alice, json!({"likedCategories": ["cafe"]})).await;
        assert_eq!(Status::Conflict, response.status());

        // The first submission is the one that sticks.
        let dump = client
            .get(format!("/sessions/{}/dump", SessionCode::example()))
            .dispatch()
            .await
            .into_json::<GroupSession>()
            .await
            .unwrap();
        let preferences = dump.participant(&alice).unwrap().preferences().unwrap();
        assert!(preferences.liked_categories.contains(&Category::Korean));
        assert!(!preferences.liked_categories.contains(&Category::Cafe));
    }

    #[backend_test(seeded)]
    async fn submit_to_unknown_participant(client: Client) {
        let response = submit(&client, &ParticipantId::from("p0-nobody"), json!({})).await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test(seeded)]
    async fn submit_rejects_blank_food_selection(client: Client) {
        let alice = participant_ids(&client).await.remove(0);
        let body = json!({
            "cravingFoods": [{"id": " ", "name": "Ramen", "category": "japanese"}],
        });
        assert_eq!(Status::BadRequest, submit(&client, &alice, body).await.status());

        // Nothing was recorded, so a valid submission still goes through.
        assert_eq!(Status::Ok, submit(&client, &alice, json!({})).await.status());
    }

    #[backend_test(seeded)]
    async fn submissions_complete_the_group(client: Client) {
        for id in participant_ids(&client).await {
            assert_eq!(Status::Ok, submit(&client, &id, json!({})).await.status());
        }
        let session = client
            .get(format!("/sessions/{}", SessionCode::example()))
            .dispatch()
            .await
            .into_json::<SessionDescription>()
            .await
            .unwrap();
        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.completed_count, 2);
    }

    #[backend_test(seeded)]
    async fn remove_participant_twice(client: Client) {
        let ids = participant_ids(&client).await;
        let url = format!("/sessions/{}/participants/{}", SessionCode::example(), ids[1]);

        let response = client.delete(url.clone()).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        assert_eq!(participant_ids(&client).await, vec![ids[0].clone()]);

        let response = client.delete(url).dispatch().await;
        assert_eq!(Status::NotFound, response.status());
    }
}
