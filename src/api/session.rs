use log::info;
use rocket::{serde::json::Json, Route, State};

use crate::error::Result;
use crate::model::{
    api::session::{NewSession, SessionDescription},
    cache::RecommendationCache,
    events::SessionEvent,
    session::{GroupSession, SessionCode},
    store::SessionStore,
};

pub fn routes() -> Vec<Route> {
    routes![
        create_session,
        get_session,
        session_dump,
        close_session,
        delete_session,
    ]
}

#[post("/sessions", data = "<spec>", format = "json")]
async fn create_session(
    spec: Json<NewSession>,
    store: &State<SessionStore>,
) -> Result<Json<SessionDescription>> {
    let spec = spec.into_inner();
    let session = store.create(&spec.title, &spec.participant_names).await?;
    Ok(Json(SessionDescription::from(&session)))
}

#[get("/sessions/<session_id>")]
async fn get_session(
    session_id: SessionCode,
    store: &State<SessionStore>,
) -> Result<Json<SessionDescription>> {
    let handle = store.get(&session_id).await?;
    let session = handle.lock().await?;
    Ok(Json(SessionDescription::from(&*session)))
}

/// Everything about a session, including stored preferences.
#[get("/sessions/<session_id>/dump")]
async fn session_dump(
    session_id: SessionCode,
    store: &State<SessionStore>,
) -> Result<Json<GroupSession>> {
    let handle = store.get(&session_id).await?;
    let session = handle.lock().await?;
    Ok(Json(session.clone()))
}

#[post("/sessions/<session_id>/close")]
async fn close_session(
    session_id: SessionCode,
    store: &State<SessionStore>,
) -> Result<Json<SessionDescription>> {
    let handle = store.get(&session_id).await?;
    let mut session = handle.lock().await?;
    if session.close() {
        info!("Closed session {session_id}");
        handle.publish(SessionEvent::SessionClosed);
    }
    Ok(Json(SessionDescription::from(&*session)))
}

#[delete("/sessions/<session_id>")]
async fn delete_session(
    session_id: SessionCode,
    store: &State<SessionStore>,
    cache: &State<RecommendationCache>,
) -> Result<()> {
    let handle = store.remove(&session_id).await?;
    cache.invalidate(&session_id).await;
    handle.publish(SessionEvent::SessionClosed);
    Ok(())
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Status, StatusClass},
        local::asynchronous::Client,
        serde::json::{json, serde_json},
    };

    use crate::model::{participant::Participant, session::SessionStatus};

    use super::*;

    async fn create(client: &Client, body: String) -> rocket::local::asynchronous::LocalResponse<'_> {
        client
            .post("/sessions")
            .header(ContentType::JSON)
            .body(body)
            .dispatch()
            .await
    }

    #[backend_test]
    async fn create_and_fetch_session(client: Client) {
        let response = create(&client, json!(NewSession::example()).to_string()).await;
        assert_eq!(Status::Ok, response.status());

        let raw_response = response.into_string().await.unwrap();
        let created = serde_json::from_str::<SessionDescription>(&raw_response).unwrap();
        assert_eq!(created.title, "Team dinner");
        assert!(created.is_active);
        assert_eq!(created.id.as_str().len(), 6);
        assert_eq!(created.status, SessionStatus::Waiting);
        assert_eq!(created.total_count, 2);

        // Codes are case-insensitive.
        let lowercase = created.id.as_str().to_lowercase();
        let response = client
            .get(format!("/sessions/{lowercase}"))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let fetched = response.into_json::<SessionDescription>().await.unwrap();
        assert_eq!(fetched, created);
    }

    #[backend_test]
    async fn create_session_validation(client: Client) {
        let too_few = json!({"title": "Lunch", "participantNames": ["Alice", "  "]});
        let response = create(&client, too_few.to_string()).await;
        assert_eq!(Status::BadRequest, response.status());

        let no_title = json!({"title": " ", "participantNames": ["Alice", "Bob"]});
        let response = create(&client, no_title.to_string()).await;
        assert_eq!(Status::BadRequest, response.status());

        let duplicates = json!({"title": "Lunch", "participantNames": ["Alice", "alice"]});
        let response = create(&client, duplicates.to_string()).await;
        assert_eq!(Status::BadRequest, response.status());
    }

    #[backend_test]
    async fn unknown_session(client: Client) {
        let response = client.get("/sessions/ZZZZZZ").dispatch().await;
        assert_eq!(Status::NotFound, response.status());

        let response = client.get("/sessions/not-a-code").dispatch().await;
        assert_eq!(StatusClass::ClientError, response.status().class());
    }

    #[backend_test(seeded)]
    async fn dump_includes_everything(client: Client) {
        let code = SessionCode::example();
        let response = client
            .get(format!("/sessions/{code}/dump"))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let dump = response.into_json::<GroupSession>().await.unwrap();
        let names: Vec<_> = dump.participants().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob"]);
        assert!(dump.participants().iter().all(|p: &Participant| !p.completed()));
    }

    #[backend_test(seeded)]
    async fn close_rejects_new_participants(client: Client) {
        let code = SessionCode::example();
        let response = client
            .post(format!("/sessions/{code}/close"))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let closed = response.into_json::<SessionDescription>().await.unwrap();
        assert!(!closed.is_active);

        let response = client
            .post(format!("/sessions/{code}/participants"))
            .header(ContentType::JSON)
            .body(json!({"name": "Carol"}).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());
    }

    #[backend_test(seeded)]
    async fn delete_session_drops_cache(client: Client) {
        let code = SessionCode::example();
        let response = client
            .get(format!("/sessions/{code}/recommendations"))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let cache = client.rocket().state::<RecommendationCache>().unwrap();
        assert_eq!(cache.len().await, 1);

        let response = client.delete(format!("/sessions/{code}")).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        assert_eq!(cache.len().await, 0);

        let response = client.get(format!("/sessions/{code}")).dispatch().await;
        assert_eq!(Status::NotFound, response.status());
        let response = client.delete(format!("/sessions/{code}")).dispatch().await;
        assert_eq!(Status::NotFound, response.status());
    }
}
