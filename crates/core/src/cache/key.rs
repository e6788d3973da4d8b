//! Cache keys and entries.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::catalog::{ListingQuery, RequestRoute};
use crate::listing::{Listing, ListingStatus};

/// Normalized identity of a page request.
///
/// Set-valued parameters are sorted and the free-text query is folded, so
/// requests that differ only in argument order or spacing share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PageRequestKey {
    pub route: RequestRoute,
    pub limit: u32,
    pub offset: u32,
    pub status: Option<ListingStatus>,
    pub query: Option<String>,
    pub category_ids: BTreeSet<String>,
    pub fields: BTreeSet<String>,
}

impl PageRequestKey {
    pub fn from_query(route: RequestRoute, query: &ListingQuery) -> Self {
        Self {
            route,
            limit: query.limit,
            offset: query.offset,
            status: query.status,
            query: query.text().map(normalize_query),
            category_ids: normalize_set(&query.category_ids),
            fields: normalize_set(&query.fields),
        }
    }
}

fn normalize_query(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn normalize_set(values: &[String]) -> BTreeSet<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect()
}

/// A fetched page, immutable once stored.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: PageRequestKey,
    pub fetched_at: Instant,
    /// Server-reported total for the request.
    pub total: u64,
    pub items: Vec<Listing>,
    /// Raw item count of the response before malformed items were dropped.
    pub received: usize,
}

impl CacheEntry {
    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.fetched_at)
    }

    /// Fresh while younger than `ttl`.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.age() < ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(q: Option<&str>, cats: &[&str], fields: &[&str]) -> ListingQuery {
        ListingQuery {
            limit: 24,
            offset: 0,
            status: Some(ListingStatus::Active),
            query: q.map(String::from),
            category_ids: cats.iter().map(|s| s.to_string()).collect(),
            fields: fields.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_argument_order_does_not_matter() {
        let a = PageRequestKey::from_query(
            RequestRoute::Listings,
            &query(Some("Mate"), &["MLA2", "MLA1"], &["title", "price"]),
        );
        let b = PageRequestKey::from_query(
            RequestRoute::Listings,
            &query(Some("  mate "), &["MLA1", "MLA2", "MLA1"], &["price", "title"]),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_blank_query_is_none() {
        let key = PageRequestKey::from_query(RequestRoute::Listings, &query(Some("  "), &[], &[]));
        assert_eq!(key.query, None);
    }

    #[test]
    fn test_query_whitespace_collapsed() {
        let key = PageRequestKey::from_query(
            RequestRoute::Listings,
            &query(Some("Mate   de  Calabaza"), &[], &[]),
        );
        assert_eq!(key.query.as_deref(), Some("mate de calabaza"));
    }

    #[test]
    fn test_route_and_offset_distinguish_keys() {
        let q = query(None, &["MLA1"], &[]);
        let listings = PageRequestKey::from_query(RequestRoute::Listings, &q);
        let by_category = PageRequestKey::from_query(RequestRoute::ByCategory, &q);
        assert_ne!(listings, by_category);

        let mut next = q.clone();
        next.offset = 24;
        assert_ne!(listings, PageRequestKey::from_query(RequestRoute::Listings, &next));
    }
}
