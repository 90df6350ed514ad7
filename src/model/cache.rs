//! Recommendation cache keyed by session and a digest of the completed
//! participants' preferences.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use data_encoding::HEXLOWER;
use log::{debug, info};
use rocket::serde::json::serde_json;
use rocket::tokio::sync::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::model::{
    participant::Participant,
    recommendation::{compute_recommendations, RecommendationItem},
    session::{GroupSession, SessionCode},
};

/// Hex-encoded SHA-256 digest of the completed participants' preferences.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantHash(String);

impl ParticipantHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Canonical per-participant record fed to the digest. Every collection is
/// sorted so that the encoding does not depend on submission order.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HashRecord<'a> {
    id: &'a str,
    likes: Vec<&'a str>,
    dislikes: Vec<&'a str>,
    craving_foods: Vec<&'a str>,
    not_craving_foods: Vec<&'a str>,
    allergies: Vec<&'a str>,
}

fn sorted<'a>(iter: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    let mut items: Vec<_> = iter.into_iter().collect();
    items.sort_unstable();
    items
}

/// Digest the state that recommendations depend on.
///
/// Only completed participants contribute, and the result is independent of
/// participant order.
pub fn participant_hash<'a, I>(participants: I) -> ParticipantHash
where
    I: IntoIterator<Item = &'a Participant>,
{
    let mut records: Vec<_> = participants
        .into_iter()
        .filter_map(|participant| {
            let preferences = participant.preferences()?;
            Some(HashRecord {
                id: participant.id.as_str(),
                likes: sorted(preferences.liked_categories.iter().map(|c| c.as_str())),
                dislikes: sorted(preferences.disliked_categories.iter().map(|c| c.as_str())),
                craving_foods: sorted(preferences.craving_foods.iter().map(|f| f.id.as_str())),
                not_craving_foods: sorted(
                    preferences.not_craving_foods.iter().map(|f| f.id.as_str()),
                ),
                allergies: sorted(preferences.allergies.iter().map(String::as_str)),
            })
        })
        .collect();
    records.sort_unstable_by(|a, b| a.id.cmp(b.id));

    let encoded = serde_json::to_vec(&records).expect("Serialisation is infallible");
    ParticipantHash(HEXLOWER.encode(&Sha256::digest(encoded)))
}

/// A stored recommendation, valid only while its hash matches the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub session_id: SessionCode,
    pub recommendations: Vec<RecommendationItem>,
    pub calculated_at: DateTime<Utc>,
    pub participant_hash: ParticipantHash,
}

/// Disposable store of computed recommendations, one entry per session.
///
/// [`RecommendationCache::get_or_compute`] only accepts a locked session, so
/// reads for one session are serialised and an entry is never replaced with
/// one computed from older state. The lower-level `get`, `put` and
/// `invalidate` leave that to the caller.
#[derive(Debug, Default)]
pub struct RecommendationCache {
    entries: Mutex<HashMap<SessionCode, CacheEntry>>,
}

impl RecommendationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a still-valid entry. A stale entry is evicted and reported as
    /// a miss.
    pub async fn get(&self, session_id: &SessionCode, participants: &[Participant]) -> Option<CacheEntry> {
        let mut entries = self.entries.lock().await;
        let entry = entries.get(session_id)?;
        if entry.participant_hash == participant_hash(participants) {
            debug!("Recommendation cache hit for session {session_id}");
            return Some(entry.clone());
        }
        info!("Stale recommendation for session {session_id}, evicting");
        entries.remove(session_id);
        None
    }

    /// Store a fresh entry, replacing any previous one.
    pub async fn put(
        &self,
        session_id: &SessionCode,
        recommendations: Vec<RecommendationItem>,
        participants: &[Participant],
    ) -> CacheEntry {
        let entry = CacheEntry {
            session_id: session_id.clone(),
            recommendations,
            calculated_at: Utc::now(),
            participant_hash: participant_hash(participants),
        };
        self.entries
            .lock()
            .await
            .insert(session_id.clone(), entry.clone());
        entry
    }

    /// Drop the entry for a session. Returns whether one was present.
    pub async fn invalidate(&self, session_id: &SessionCode) -> bool {
        let removed = self.entries.lock().await.remove(session_id).is_some();
        if removed {
            debug!("Invalidated cached recommendation for session {session_id}");
        }
        removed
    }

    /// Serve from cache when valid, otherwise compute and store.
    pub async fn get_or_compute(&self, session: &MutexGuard<'_, GroupSession>) -> CacheEntry {
        if let Some(entry) = self.get(&session.id, session.participants()).await {
            return entry;
        }
        let recommendations = compute_recommendations(session.participants());
        self.put(&session.id, recommendations, session.participants())
            .await
    }

    /// Number of sessions with a stored entry.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}
