use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use rand::Rng;
use rocket::request::FromParam;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::participant::{Participant, ParticipantId, Preferences};

/// Characters used in generated session codes.
const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
/// Shortest accepted code length. Shorter codes leave too few distinct codes
/// to hand out.
pub const MIN_CODE_LEN: usize = 4;
/// Longest code accepted in a request path.
pub const MAX_CODE_LEN: usize = 16;

/// The short shareable code identifying a group session.
///
/// Codes are uppercase alphanumeric; lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionCode(String);

impl SessionCode {
    pub fn generate(rng: &mut impl Rng, len: usize) -> Self {
        let code = (0..len)
            .map(|_| CODE_CHARSET[rng.gen_range(0..CODE_CHARSET.len())] as char)
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SessionCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'a> FromParam<'a> for SessionCode {
    type Error = Error;

    fn from_param(param: &'a str) -> std::result::Result<Self, Self::Error> {
        if param.is_empty()
            || param.len() > MAX_CODE_LEN
            || !param.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(Error::not_found(format!("Session '{param}'")));
        }
        Ok(Self(param.to_ascii_uppercase()))
    }
}

/// Overall progress of a session's input.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    /// Nobody has completed input yet.
    Waiting,
    /// Some, but not all, participants have completed input.
    InProgress,
    /// Every participant has completed input.
    Completed,
}

/// A group deciding what to eat together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSession {
    pub id: SessionCode,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
    participants: Vec<Participant>,
}

impl GroupSession {
    /// Create a session with the given pre-declared participants.
    ///
    /// Blank names are ignored; at least `min_participants` must remain.
    pub fn new(
        id: SessionCode,
        title: &str,
        participant_names: &[String],
        min_participants: usize,
    ) -> Result<Self> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::Validation("Session title must not be empty".to_string()));
        }

        let names: Vec<&str> = participant_names
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .collect();
        if names.len() < min_participants {
            return Err(Error::Validation(format!(
                "A session needs at least {min_participants} participants, got {}",
                names.len()
            )));
        }

        let mut session = Self {
            id,
            title: title.to_string(),
            created_at: Utc::now(),
            is_active: true,
            participants: Vec::with_capacity(names.len()),
        };
        for name in names {
            session.push_participant(name)?;
        }
        Ok(session)
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, id: &ParticipantId) -> Result<&Participant> {
        self.participants
            .iter()
            .find(|p| &p.id == id)
            .ok_or_else(|| self.participant_not_found(id))
    }

    pub fn completed_count(&self) -> usize {
        self.participants.iter().filter(|p| p.completed()).count()
    }

    pub fn status(&self) -> SessionStatus {
        let completed = self.completed_count();
        if completed == 0 {
            SessionStatus::Waiting
        } else if completed == self.participants.len() {
            SessionStatus::Completed
        } else {
            SessionStatus::InProgress
        }
    }

    /// Add a participant who joined via the session code.
    pub fn add_participant(&mut self, name: &str) -> Result<ParticipantId> {
        if !self.is_active {
            return Err(Error::Validation(format!(
                "Session {} is closed to new participants",
                self.id
            )));
        }
        self.push_participant(name)
    }

    /// Record a participant's final preferences.
    pub fn submit_preferences(&mut self, id: &ParticipantId, preferences: Preferences) -> Result<()> {
        let not_found = self.participant_not_found(id);
        let participant = self
            .participants
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or(not_found)?;
        participant.complete(preferences)
    }

    pub fn remove_participant(&mut self, id: &ParticipantId) -> Result<Participant> {
        let index = self
            .participants
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| self.participant_not_found(id))?;
        Ok(self.participants.remove(index))
    }

    /// Stop accepting new participants. Returns false if already closed.
    pub fn close(&mut self) -> bool {
        std::mem::replace(&mut self.is_active, false)
    }

    fn push_participant(&mut self, name: &str) -> Result<ParticipantId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation(
                "Participant name must not be empty".to_string(),
            ));
        }
        let lowercase = name.to_lowercase();
        if self
            .participants
            .iter()
            .any(|p| p.name.to_lowercase() == lowercase)
        {
            return Err(Error::Validation(format!(
                "Participant name '{name}' is already taken in this session"
            )));
        }

        let mut rng = rand::thread_rng();
        let id = loop {
            let candidate = ParticipantId::generate(&mut rng);
            if self.participants.iter().all(|p| p.id != candidate) {
                break candidate;
            }
        };
        self.participants
            .push(Participant::new(id.clone(), name.to_string()));
        Ok(id)
    }

    fn participant_not_found(&self, id: &ParticipantId) -> Error {
        Error::not_found(format!("Participant '{}' in session {}", id, self.id))
    }
}

#[cfg(test)]
mod examples {
    use super::*;

    impl SessionCode {
        pub fn example() -> Self {
            Self("ABC123".to_string())
        }
    }

    impl GroupSession {
        /// An open session with two pre-declared participants who have not
        /// completed input yet.
        pub fn example() -> Self {
            Self::new(
                SessionCode::example(),
                "Friday lunch",
                &["Alice".to_string(), "Bob".to_string()],
                2,
            )
            .unwrap()
        }
    }
}
