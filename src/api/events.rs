use log::{debug, info, warn};
use rocket::{
    response::stream::{Event, EventStream},
    tokio::{select, sync::broadcast::error::RecvError},
    Route, Shutdown, State,
};

use crate::error::Result;
use crate::model::{events::SessionEvent, session::SessionCode, store::SessionStore};

pub fn routes() -> Vec<Route> {
    routes![session_events]
}

/// Stream a session's changes as server-sent events. The stream ends when
/// the session is closed or deleted, or the server shuts down.
#[get("/sessions/<session_id>/events")]
async fn session_events(
    session_id: SessionCode,
    store: &State<SessionStore>,
    mut shutdown: Shutdown,
) -> Result<EventStream![]> {
    let handle = store.get(&session_id).await?;
    let mut events = handle.subscribe();
    info!(
        "New event subscriber for session {session_id}, total subscribers: {}",
        handle.subscriber_count()
    );
    // The stream holds only the receiver, so a deleted session's channel
    // closes once the route that removed it drops the last handle.
    drop(handle);

    Ok(EventStream! {
        loop {
            let event = select! {
                event = events.recv() => match event {
                    Ok(event) => event,
                    Err(RecvError::Closed) => break,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Event subscriber for session {session_id} lagged by {skipped}");
                        continue;
                    }
                },
                _ = &mut shutdown => break,
            };
            let last = event == SessionEvent::SessionClosed;
            yield Event::json(&event).event(event.name());
            if last {
                break;
            }
        }
        debug!("Event subscriber for session {session_id} left");
    })
}
