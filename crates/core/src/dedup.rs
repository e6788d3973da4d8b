//! Canonical selection of listings that share a catalog group.
//!
//! The provider returns several listings for the same catalog product.
//! For every `catalog_group_id` one canonical member is kept; listings
//! without a group pass through untouched.

use std::collections::HashMap;

use crate::listing::{DisplayItem, Listing, ListingStatus};

/// Anything that can be grouped and scored for canonical selection.
pub trait CanonicalCandidate {
    /// Shared catalog group, `None` for ungrouped items.
    fn catalog_group(&self) -> Option<&str>;
    fn candidate_status(&self) -> ListingStatus;
    fn sold_quantity(&self) -> u32;
    fn health_score(&self) -> f64;
    fn candidate_price(&self) -> f64;
}

impl CanonicalCandidate for Listing {
    fn catalog_group(&self) -> Option<&str> {
        self.group_id()
    }

    fn candidate_status(&self) -> ListingStatus {
        self.status
    }

    fn sold_quantity(&self) -> u32 {
        self.sold_quantity.unwrap_or(0)
    }

    fn health_score(&self) -> f64 {
        self.health_score.unwrap_or(0.0)
    }

    fn candidate_price(&self) -> f64 {
        self.price
    }
}

// Display items are scored through their parent listing.
impl CanonicalCandidate for DisplayItem {
    fn catalog_group(&self) -> Option<&str> {
        self.parent.group_id()
    }

    fn candidate_status(&self) -> ListingStatus {
        self.parent.status
    }

    fn sold_quantity(&self) -> u32 {
        self.parent.sold_quantity.unwrap_or(0)
    }

    fn health_score(&self) -> f64 {
        self.parent.health_score.unwrap_or(0.0)
    }

    fn candidate_price(&self) -> f64 {
        self.parent.price
    }
}

/// Weights of the canonical score.
///
/// `score = status_weight + sold * sold_weight + health * health_weight - price`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScorePolicy {
    pub active_weight: f64,
    pub paused_weight: f64,
    pub other_weight: f64,
    pub sold_weight: f64,
    pub health_weight: f64,
}

impl Default for ScorePolicy {
    fn default() -> Self {
        Self {
            active_weight: 1_000_000.0,
            paused_weight: 100_000.0,
            other_weight: 0.0,
            sold_weight: 1_000.0,
            health_weight: 10.0,
        }
    }
}

impl ScorePolicy {
    pub fn status_weight(&self, status: ListingStatus) -> f64 {
        match status {
            ListingStatus::Active => self.active_weight,
            ListingStatus::Paused => self.paused_weight,
            ListingStatus::Closed | ListingStatus::Other => self.other_weight,
        }
    }

    pub fn score<T: CanonicalCandidate>(&self, candidate: &T) -> f64 {
        self.status_weight(candidate.candidate_status())
            + candidate.sold_quantity() as f64 * self.sold_weight
            + candidate.health_score() * self.health_weight
            - candidate.candidate_price()
    }
}

/// Canonical score under the default policy.
pub fn canonical_score<T: CanonicalCandidate>(candidate: &T) -> f64 {
    ScorePolicy::default().score(candidate)
}

/// Keep one canonical member per catalog group using the default policy.
pub fn deduplicate<T: CanonicalCandidate>(items: Vec<T>) -> Vec<T> {
    deduplicate_with(&ScorePolicy::default(), items)
}

/// Keep one canonical member per catalog group.
///
/// The highest score wins; on an exact tie the member seen first is kept.
/// Each canonical member takes the position where its group first appeared,
/// ungrouped items keep their input position, so repeated passes are stable.
pub fn deduplicate_with<T: CanonicalCandidate>(policy: &ScorePolicy, items: Vec<T>) -> Vec<T> {
    enum Slot<T> {
        Ungrouped(T),
        Group(usize),
    }

    // (best item, best score) per group, in order of first appearance
    let mut groups: Vec<(T, f64)> = Vec::new();
    let mut group_index: HashMap<String, usize> = HashMap::new();
    let mut slots: Vec<Slot<T>> = Vec::with_capacity(items.len());

    for item in items {
        let group = match item.catalog_group() {
            Some(g) => g.to_string(),
            None => {
                slots.push(Slot::Ungrouped(item));
                continue;
            }
        };

        let score = policy.score(&item);
        match group_index.get(&group) {
            Some(&idx) => {
                if score > groups[idx].1 {
                    groups[idx] = (item, score);
                }
            }
            None => {
                group_index.insert(group, groups.len());
                slots.push(Slot::Group(groups.len()));
                groups.push((item, score));
            }
        }
    }

    let mut winners: Vec<Option<T>> = groups.into_iter().map(|(item, _)| Some(item)).collect();
    slots
        .into_iter()
        .filter_map(|slot| match slot {
            Slot::Ungrouped(item) => Some(item),
            Slot::Group(idx) => winners[idx].take(),
        })
        .collect()
}
