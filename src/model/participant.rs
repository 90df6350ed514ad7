use std::collections::{BTreeSet, HashSet};
use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use rand::Rng;
use rocket::request::FromParam;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::api::participant::PreferenceSubmission;
use crate::model::catalog::Category;

/// Characters used in generated participant IDs.
const ID_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const ID_RANDOM_LEN: usize = 6;

/// Identifies a participant within its session.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Generate a fresh ID. Uniqueness within a session is checked by the caller.
    pub fn generate(rng: &mut impl Rng) -> Self {
        let suffix: String = (0..ID_RANDOM_LEN)
            .map(|_| ID_CHARSET[rng.gen_range(0..ID_CHARSET.len())] as char)
            .collect();
        Self(format!("p{}-{suffix}", Utc::now().timestamp_millis()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ParticipantId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl<'a> FromParam<'a> for ParticipantId {
    type Error = Error;

    fn from_param(param: &'a str) -> std::result::Result<Self, Self::Error> {
        if param.is_empty() || !param.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(Error::not_found(format!("Participant '{param}'")));
        }
        Ok(Self(param.to_string()))
    }
}

/// A specific food, a whole (sub)category, or a free-text entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodSelection {
    pub id: String,
    pub name: String,
    /// Category identifier. Custom entries and unknown groupings carry
    /// identifiers outside the catalog and never score.
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub is_custom: bool,
    #[serde(default)]
    pub is_category: bool,
    #[serde(default)]
    pub is_subcategory: bool,
}

impl FoodSelection {
    /// The catalog category this selection scores against, if any.
    pub fn catalog_category(&self) -> Option<Category> {
        if self.is_custom {
            return None;
        }
        self.category.parse().ok()
    }

    /// Trim the free-text fields and reject selections without an ID or name.
    fn normalize(mut self) -> Result<Self> {
        self.id = self.id.trim().to_string();
        self.name = self.name.trim().to_string();
        self.category = self.category.trim().to_string();
        if self.id.is_empty() {
            return Err(Error::Validation(
                "Food selection is missing an ID".to_string(),
            ));
        }
        if self.name.is_empty() {
            return Err(Error::Validation(format!(
                "Food selection '{}' is missing a name",
                self.id
            )));
        }
        Ok(self)
    }
}

/// Whether a vote is for or against a category.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Stance {
    Like,
    Dislike,
}

/// A single scoring signal, as seen by the recommendation engine.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Vote {
    pub category: Category,
    pub stance: Stance,
}

/// A participant's final preferences in canonical form.
///
/// Built once from a [`PreferenceSubmission`]: category sets are
/// deduplicated, food selections are deduplicated by ID keeping the first
/// occurrence, and allergies are trimmed with blanks dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub liked_categories: BTreeSet<Category>,
    pub disliked_categories: BTreeSet<Category>,
    pub craving_foods: Vec<FoodSelection>,
    pub not_craving_foods: Vec<FoodSelection>,
    pub allergies: BTreeSet<String>,
}

impl Preferences {
    pub fn from_submission(submission: PreferenceSubmission) -> Result<Self> {
        Ok(Self {
            liked_categories: submission.liked_categories.into_iter().collect(),
            disliked_categories: submission.disliked_categories.into_iter().collect(),
            craving_foods: dedup_selections(submission.craving_foods)?,
            not_craving_foods: dedup_selections(submission.not_craving_foods)?,
            allergies: submission
                .allergies
                .into_iter()
                .map(|allergy| allergy.trim().to_string())
                .filter(|allergy| !allergy.is_empty())
                .collect(),
        })
    }

    /// Every scoring signal carried by these preferences: one per liked or
    /// disliked category, and one per food selection whose category is in
    /// the catalog.
    pub fn votes(&self) -> impl Iterator<Item = Vote> + '_ {
        let likes = self
            .liked_categories
            .iter()
            .copied()
            .chain(self.craving_foods.iter().filter_map(FoodSelection::catalog_category))
            .map(|category| Vote {
                category,
                stance: Stance::Like,
            });
        let dislikes = self
            .disliked_categories
            .iter()
            .copied()
            .chain(
                self.not_craving_foods
                    .iter()
                    .filter_map(FoodSelection::catalog_category),
            )
            .map(|category| Vote {
                category,
                stance: Stance::Dislike,
            });
        likes.chain(dislikes)
    }
}

fn dedup_selections(selections: Vec<FoodSelection>) -> Result<Vec<FoodSelection>> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(selections.len());
    for selection in selections {
        let selection = selection.normalize()?;
        if seen.insert(selection.id.clone()) {
            unique.push(selection);
        }
    }
    Ok(unique)
}

/// One voter in a group session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub joined_at: DateTime<Utc>,
    /// Present iff the participant has completed input. Once set it is never
    /// replaced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    preferences: Option<Preferences>,
}

impl Participant {
    pub fn new(id: ParticipantId, name: String) -> Self {
        Self {
            id,
            name,
            joined_at: Utc::now(),
            preferences: None,
        }
    }

    pub fn completed(&self) -> bool {
        self.preferences.is_some()
    }

    pub fn preferences(&self) -> Option<&Preferences> {
        self.preferences.as_ref()
    }

    /// Record final preferences. Completion happens exactly once.
    pub fn complete(&mut self, preferences: Preferences) -> Result<()> {
        if self.completed() {
            return Err(Error::AlreadyCompleted(format!(
                "Participant '{}' has already submitted preferences",
                self.id
            )));
        }
        self.preferences = Some(preferences);
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_only_once() {
        let mut participant = Participant::pending_example("p1");
        assert!(!participant.completed());

        let preferences = Preferences::categories(&[Category::Korean], &[]);
        participant.complete(preferences.clone()).unwrap();
        assert!(participant.completed());

        let err = participant
            .complete(Preferences::categories(&[], &[Category::Korean]))
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyCompleted(_)));
        assert_eq!(participant.preferences(), Some(&preferences));
    }

    #[test]
    fn votes_cover_both_models() {
        let preferences = Preferences {
            liked_categories: [Category::Korean].into_iter().collect(),
            disliked_categories: [Category::Fast].into_iter().collect(),
            craving_foods: vec![
                FoodSelection::food("ramen", "japanese"),
                FoodSelection::food("burger", "other"),
                FoodSelection::custom("grandma's soup"),
            ],
            not_craving_foods: vec![FoodSelection::food("pho", "asian")],
            allergies: BTreeSet::new(),
        };

        let votes: Vec<_> = preferences.votes().collect();
        assert_eq!(
            votes,
            vec![
                Vote { category: Category::Korean, stance: Stance::Like },
                Vote { category: Category::Japanese, stance: Stance::Like },
                Vote { category: Category::Fast, stance: Stance::Dislike },
                Vote { category: Category::Asian, stance: Stance::Dislike },
            ]
        );
    }

    #[test]
    fn custom_selection_never_scores_even_with_catalog_category() {
        let mut selection = FoodSelection::custom("kimchi");
        selection.category = "korean".to_string();
        assert_eq!(selection.catalog_category(), None);
    }

    #[test]
    fn submission_is_normalized() {
        let submission = PreferenceSubmission {
            liked_categories: vec![Category::Korean, Category::Korean],
            disliked_categories: vec![],
            craving_foods: vec![
                FoodSelection::food(" ramen ", "japanese"),
                FoodSelection::food("ramen", "japanese"),
            ],
            not_craving_foods: vec![],
            allergies: vec![" peanut ".to_string(), "".to_string(), "peanut".to_string()],
        };

        let preferences = Preferences::from_submission(submission).unwrap();
        assert_eq!(preferences.liked_categories.len(), 1);
        assert_eq!(preferences.craving_foods.len(), 1);
        assert_eq!(preferences.craving_foods[0].id, "ramen");
        assert_eq!(
            preferences.allergies,
            ["peanut".to_string()].into_iter().collect()
        );
    }

    #[test]
    fn submission_rejects_blank_selection() {
        let submission = PreferenceSubmission {
            not_craving_foods: vec![FoodSelection::food("  ", "korean")],
            ..Default::default()
        };
        let err = Preferences::from_submission(submission).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn generated_ids_are_path_safe() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let id = ParticipantId::generate(&mut rng);
            assert!(ParticipantId::from_param(id.as_str()).is_ok());
        }
        assert!(ParticipantId::from_param("../etc").is_err());
    }
}
