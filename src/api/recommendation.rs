use log::info;
use rocket::{serde::json::Json, Route, State};

use crate::error::Result;
use crate::model::{
    cache::RecommendationCache, recommendation::RecommendationItem, session::SessionCode,
    store::SessionStore,
};

pub fn routes() -> Vec<Route> {
    routes![recommendations, refresh_recommendations]
}

/// The ranked recommendation for a session, served from cache while the
/// completed participants' preferences are unchanged.
#[get("/sessions/<session_id>/recommendations")]
async fn recommendations(
    session_id: SessionCode,
    store: &State<SessionStore>,
    cache: &State<RecommendationCache>,
) -> Result<Json<Vec<RecommendationItem>>> {
    let handle = store.get(&session_id).await?;
    let session = handle.lock().await?;
    let entry = cache.get_or_compute(&session).await;
    Ok(Json(entry.recommendations))
}

/// Discard any cached recommendation and recompute.
#[post("/sessions/<session_id>/recommendations/refresh")]
async fn refresh_recommendations(
    session_id: SessionCode,
    store: &State<SessionStore>,
    cache: &State<RecommendationCache>,
) -> Result<Json<Vec<RecommendationItem>>> {
    let handle = store.get(&session_id).await?;
    let session = handle.lock().await?;
    cache.invalidate(&session_id).await;
    info!("Recomputing recommendations for session {session_id}");
    let entry = cache.get_or_compute(&session).await;
    Ok(Json(entry.recommendations))
}
