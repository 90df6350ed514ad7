use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    api::participant::ParticipantDescription,
    catalog::Category,
    session::{GroupSession, SessionCode, SessionStatus},
};

/// Request to create a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    pub title: String,
    #[serde(default)]
    pub participant_names: Vec<String>,
}

/// Summary of a session and its progress. Preferences are not included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDescription {
    pub id: SessionCode,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
    pub status: SessionStatus,
    pub completed_count: usize,
    pub total_count: usize,
    pub participants: Vec<ParticipantDescription>,
}

impl From<&GroupSession> for SessionDescription {
    fn from(session: &GroupSession) -> Self {
        Self {
            id: session.id.clone(),
            title: session.title.clone(),
            created_at: session.created_at,
            is_active: session.is_active,
            status: session.status(),
            completed_count: session.completed_count(),
            total_count: session.participants().len(),
            participants: session.participants().iter().map(Into::into).collect(),
        }
    }
}

/// A catalog entry as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDescription {
    pub id: Category,
    pub label: String,
    pub emoji: String,
}

impl From<Category> for CategoryDescription {
    fn from(category: Category) -> Self {
        Self {
            id: category,
            label: category.label().to_string(),
            emoji: category.emoji().to_string(),
        }
    }
}
