//! In-memory session registry. The participant lists held here are the only
//! source of truth; everything else is derived from them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use rocket::tokio::sync::{broadcast, Mutex, MutexGuard, RwLock};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{
    events::SessionEvent,
    session::{GroupSession, SessionCode},
};

/// Random codes tried before giving up on finding a free one.
const CODE_ATTEMPTS: usize = 32;

/// One session and the channel its changes are published on.
#[derive(Debug)]
pub struct SessionHandle {
    session: Mutex<GroupSession>,
    /// Set, under the session lock, once the session leaves the store.
    removed: AtomicBool,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionHandle {
    fn new(session: GroupSession, event_buffer: usize) -> Self {
        let (events, _) = broadcast::channel(event_buffer.max(1));
        Self {
            session: Mutex::new(session),
            removed: AtomicBool::new(false),
            events,
        }
    }

    /// Lock the session. All mutations, and all cache access for this
    /// session, happen while this guard is held.
    ///
    /// Fails if the session was deleted while waiting for the lock, so that
    /// nothing is cached for a session that no longer exists.
    pub async fn lock(&self) -> Result<MutexGuard<'_, GroupSession>> {
        let session = self.session.lock().await;
        if self.removed.load(Ordering::Acquire) {
            return Err(Error::not_found(format!("Session '{}'", session.id)));
        }
        Ok(session)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Number of open event streams.
    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    /// Publish an event to current subscribers, if there are any.
    pub fn publish(&self, event: SessionEvent) {
        let name = event.name();
        match self.events.send(event) {
            Ok(receivers) => debug!("Published {name} to {receivers} subscriber(s)"),
            Err(_) => debug!("Dropped {name}, no subscribers"),
        }
    }
}

/// All live sessions, keyed by code.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionCode, Arc<SessionHandle>>>,
    min_participants: usize,
    code_length: usize,
    event_buffer: usize,
}

impl SessionStore {
    pub fn new(config: &Config) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            min_participants: config.min_participants(),
            code_length: config.session_code_length(),
            event_buffer: config.event_buffer(),
        }
    }

    /// Create and register a session under a fresh code.
    ///
    /// Fails rather than retrying forever when no free code turns up, which
    /// only happens once the code space is close to full.
    pub async fn create(&self, title: &str, participant_names: &[String]) -> Result<GroupSession> {
        let mut sessions = self.sessions.write().await;
        let code = {
            let mut rng = rand::thread_rng();
            (0..CODE_ATTEMPTS)
                .map(|_| SessionCode::generate(&mut rng, self.code_length))
                .find(|candidate| !sessions.contains_key(candidate))
        };
        let Some(code) = code else {
            warn!(
                "No free session code after {CODE_ATTEMPTS} attempts with {} live sessions",
                sessions.len()
            );
            return Err(Error::Validation(
                "No session code is available, try again later".to_string(),
            ));
        };
        let session = GroupSession::new(code.clone(), title, participant_names, self.min_participants)?;
        info!(
            "Created session {code} with {} participants",
            session.participants().len()
        );
        sessions.insert(
            code,
            Arc::new(SessionHandle::new(session.clone(), self.event_buffer)),
        );
        Ok(session)
    }

    /// Register an existing session, replacing any with the same code.
    pub async fn insert(&self, session: GroupSession) -> Arc<SessionHandle> {
        let code = session.id.clone();
        let handle = Arc::new(SessionHandle::new(session, self.event_buffer));
        self.sessions.write().await.insert(code, handle.clone());
        handle
    }

    pub async fn get(&self, code: &SessionCode) -> Result<Arc<SessionHandle>> {
        self.sessions
            .read()
            .await
            .get(code)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("Session '{code}'")))
    }

    /// Unregister a session. Once this returns, no request can lock it, so
    /// the caller may drop derived state such as cached recommendations.
    pub async fn remove(&self, code: &SessionCode) -> Result<Arc<SessionHandle>> {
        let handle = self
            .sessions
            .write()
            .await
            .remove(code)
            .ok_or_else(|| Error::not_found(format!("Session '{code}'")))?;
        {
            let _session = handle.session.lock().await;
            handle.removed.store(true, Ordering::Release);
        }
        info!("Deleted session {code}");
        Ok(handle)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
