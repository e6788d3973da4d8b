//! Deduplicated accumulation of listings for Local mode.

use std::collections::HashSet;

use crate::dedup::deduplicate;
use crate::listing::Listing;

/// Merge-only listing set.
///
/// After every merge no two stored listings share a catalog group: the
/// whole combined set is deduplicated again, because a later batch can
/// bring a better member of a group that is already stored.
#[derive(Debug, Clone, Default)]
pub struct ListingStore {
    listings: Vec<Listing>,
    next_offset: u32,
    exhausted: bool,
}

impl ListingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    /// Offset of the next batch to request.
    pub fn next_offset(&self) -> u32 {
        self.next_offset
    }

    /// A short batch has been seen; there is nothing more to fetch.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Concatenate `incoming` and re-run deduplication over everything.
    ///
    /// Ungrouped listings already stored under the same `listing_id` are
    /// skipped so overlapping pages do not duplicate them.
    pub fn merge(&mut self, incoming: Vec<Listing>) {
        let known: HashSet<&str> = self
            .listings
            .iter()
            .filter(|l| l.group_id().is_none())
            .map(|l| l.listing_id.as_str())
            .collect();

        let fresh: Vec<Listing> = incoming
            .into_iter()
            .filter(|l| l.group_id().is_some() || !known.contains(l.listing_id.as_str()))
            .collect();

        let mut combined = std::mem::take(&mut self.listings);
        combined.extend(fresh);
        self.listings = deduplicate(combined);
    }

    /// Merge the batch fetched at `offset` with `requested` items asked for.
    ///
    /// `received` is the raw length of the server page before malformed
    /// items were dropped; only a short page marks the catalog exhausted.
    /// Batches behind
    /// `next_offset` were already merged and are ignored. Returns whether
    /// the batch was merged.
    pub fn merge_batch(
        &mut self,
        offset: u32,
        requested: u32,
        received: usize,
        incoming: Vec<Listing>,
    ) -> bool {
        if offset < self.next_offset {
            return false;
        }

        self.merge(incoming);
        self.next_offset = offset.saturating_add(requested);
        if received < requested as usize {
            self.exhausted = true;
        }
        true
    }
}
