use serde::{Deserialize, Serialize};

use crate::model::{api::participant::ParticipantDescription, participant::ParticipantId};

/// A change to a session, published to anyone following it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionEvent {
    ParticipantJoined {
        participant: ParticipantDescription,
    },
    PreferencesSubmitted {
        #[serde(rename = "participantId")]
        participant_id: ParticipantId,
        #[serde(rename = "completedCount")]
        completed_count: usize,
        total: usize,
    },
    ParticipantRemoved {
        #[serde(rename = "participantId")]
        participant_id: ParticipantId,
    },
    /// Every participant has completed input.
    AllCompleted,
    SessionClosed,
}

impl SessionEvent {
    /// The event name used on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ParticipantJoined { .. } => "participantJoined",
            Self::PreferencesSubmitted { .. } => "preferencesSubmitted",
            Self::ParticipantRemoved { .. } => "participantRemoved",
            Self::AllCompleted => "allCompleted",
            Self::SessionClosed => "sessionClosed",
        }
    }
}

#[cfg(test)]
mod tests {
    use rocket::serde::json::{json, serde_json};

    use super::*;

    #[test]
    fn tagged_by_name() {
        let event = SessionEvent::PreferencesSubmitted {
            participant_id: ParticipantId::from("p1"),
            completed_count: 1,
            total: 3,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "type": "preferencesSubmitted",
                "participantId": "p1",
                "completedCount": 1,
                "total": 3,
            })
        );

        for event in [SessionEvent::AllCompleted, SessionEvent::SessionClosed, event] {
            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value["type"], event.name());
        }
    }
}
