use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A food category: the unit of recommendation.
///
/// The set is closed and fixed at build time. Variants are declared in
/// ascending order of their identifiers, so the derived `Ord` agrees with
/// comparing [`Category::as_str`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Asian,
    Cafe,
    Chinese,
    Etc,
    Fast,
    Japanese,
    Korean,
    Western,
}

impl Category {
    /// Every category in the catalog.
    pub const ALL: [Category; 8] = [
        Category::Asian,
        Category::Cafe,
        Category::Chinese,
        Category::Etc,
        Category::Fast,
        Category::Japanese,
        Category::Korean,
        Category::Western,
    ];

    /// The opaque identifier, as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asian => "asian",
            Self::Cafe => "cafe",
            Self::Chinese => "chinese",
            Self::Etc => "etc",
            Self::Fast => "fast",
            Self::Japanese => "japanese",
            Self::Korean => "korean",
            Self::Western => "western",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Asian => "Asian",
            Self::Cafe => "Cafe & Dessert",
            Self::Chinese => "Chinese",
            Self::Etc => "Other",
            Self::Fast => "Fast Food",
            Self::Japanese => "Japanese",
            Self::Korean => "Korean",
            Self::Western => "Western",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Asian => "🍜",
            Self::Cafe => "☕",
            Self::Chinese => "🥢",
            Self::Etc => "🍽️",
            Self::Fast => "🍔",
            Self::Japanese => "🍣",
            Self::Korean => "🍚",
            Self::Western => "🍝",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The identifier did not name a catalog category.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// A commonly declared allergy. Participants may also declare free-text ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Allergy {
    pub id: &'static str,
    pub name: &'static str,
    pub emoji: &'static str,
}

pub static COMMON_ALLERGIES: [Allergy; 10] = [
    Allergy { id: "peanut", name: "Peanut", emoji: "🥜" },
    Allergy { id: "seafood", name: "Seafood", emoji: "🦐" },
    Allergy { id: "shellfish", name: "Shellfish", emoji: "🦪" },
    Allergy { id: "milk", name: "Dairy", emoji: "🥛" },
    Allergy { id: "egg", name: "Egg", emoji: "🥚" },
    Allergy { id: "wheat", name: "Wheat / Gluten", emoji: "🌾" },
    Allergy { id: "soy", name: "Soy", emoji: "🫘" },
    Allergy { id: "fish", name: "Fish", emoji: "🐟" },
    Allergy { id: "sesame", name: "Sesame", emoji: "🌰" },
    Allergy { id: "tree_nuts", name: "Tree nuts", emoji: "🌰" },
];
