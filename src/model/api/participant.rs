use serde::{Deserialize, Serialize};

use crate::model::{
    catalog::Category,
    participant::{FoodSelection, Participant, ParticipantId},
};

/// Request to join a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    pub name: String,
}

/// The ID assigned to a newly joined participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    pub participant_id: ParticipantId,
}

/// A participant's preference submission, in either or both of the legacy
/// (category lists) and extended (food selections) shapes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceSubmission {
    #[serde(default)]
    pub liked_categories: Vec<Category>,
    #[serde(default)]
    pub disliked_categories: Vec<Category>,
    #[serde(default)]
    pub craving_foods: Vec<FoodSelection>,
    #[serde(default)]
    pub not_craving_foods: Vec<FoodSelection>,
    #[serde(default)]
    pub allergies: Vec<String>,
}

/// Public view of a participant; preferences are not exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantDescription {
    pub id: ParticipantId,
    pub name: String,
    pub completed: bool,
}

impl From<&Participant> for ParticipantDescription {
    fn from(participant: &Participant) -> Self {
        Self {
            id: participant.id.clone(),
            name: participant.name.clone(),
            completed: participant.completed(),
        }
    }
}
