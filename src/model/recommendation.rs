//! The preference aggregation and ranking engine.
//!
//! Scoring is a pure function of the completed participants' preferences:
//! the same multiset of preferences always yields the same ranking,
//! whatever order the participants are given in.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::model::{
    catalog::Category,
    participant::{Participant, Stance},
};

/// Weight of a single "like" signal.
pub const LIKE_WEIGHT: u32 = 2;
/// Weight of a single "dislike" signal. Outweighs a like.
pub const DISLIKE_WEIGHT: u32 = 3;
/// Satisfaction reported for a category nobody voted on.
pub const NEUTRAL_SATISFACTION: u32 = 80;

/// One ranked entry of a recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationItem {
    pub category: Category,
    /// Weighted likes minus weighted dislikes.
    pub score: i64,
    /// Number of participants who voted for this category.
    pub like_count: u32,
    /// Number of participants who voted against this category.
    pub dislike_count: u32,
    /// Estimated group approval, 0 to 100.
    pub satisfaction_rate: u32,
}

impl RecommendationItem {
    /// The ranking order: unopposed categories first, then by score,
    /// satisfaction, and finally identifier.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        (self.dislike_count > 0)
            .cmp(&(other.dislike_count > 0))
            .then_with(|| other.score.cmp(&self.score))
            .then_with(|| other.satisfaction_rate.cmp(&self.satisfaction_rate))
            .then_with(|| self.category.as_str().cmp(other.category.as_str()))
    }
}

/// Running totals for one category.
#[derive(Debug, Default)]
struct Tally<'a> {
    likes: u32,
    dislikes: u32,
    like_voters: BTreeSet<&'a str>,
    dislike_voters: BTreeSet<&'a str>,
}

impl Tally<'_> {
    fn into_item(self, category: Category) -> RecommendationItem {
        RecommendationItem {
            category,
            score: i64::from(self.likes) - i64::from(self.dislikes),
            like_count: self.like_voters.len() as u32,
            dislike_count: self.dislike_voters.len() as u32,
            satisfaction_rate: satisfaction_rate(self.likes, self.dislikes),
        }
    }
}

/// Percentage of weighted votes in favour, with fixed values for unopposed
/// categories.
pub fn satisfaction_rate(likes: u32, dislikes: u32) -> u32 {
    if dislikes == 0 {
        return if likes > 0 { 100 } else { NEUTRAL_SATISFACTION };
    }
    let rate = f64::from(likes) / f64::from(likes + dislikes) * 100.0;
    rate.round().max(0.0) as u32
}

/// Rank every catalog category for the given participants.
///
/// Participants who have not completed input are ignored. The result always
/// contains exactly one item per catalog category.
pub fn compute_recommendations<'a, I>(participants: I) -> Vec<RecommendationItem>
where
    I: IntoIterator<Item = &'a Participant>,
{
    let mut tallies: BTreeMap<Category, Tally> = Category::ALL
        .into_iter()
        .map(|category| (category, Tally::default()))
        .collect();

    for participant in participants {
        let Some(preferences) = participant.preferences() else {
            continue;
        };
        let voter = participant.id.as_str();
        for vote in preferences.votes() {
            let tally = tallies.entry(vote.category).or_default();
            match vote.stance {
                Stance::Like => {
                    tally.likes += LIKE_WEIGHT;
                    tally.like_voters.insert(voter);
                }
                Stance::Dislike => {
                    tally.dislikes += DISLIKE_WEIGHT;
                    tally.dislike_voters.insert(voter);
                }
            }
        }
    }

    let mut items: Vec<_> = tallies
        .into_iter()
        .map(|(category, tally)| tally.into_item(category))
        .collect();
    items.sort_by(RecommendationItem::rank_cmp);
    items
}
