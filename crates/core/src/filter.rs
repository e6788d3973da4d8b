//! Filter and sort pipeline over an in-memory listing set.
//!
//! Pure functions: identical input always yields identical output.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::listing::{Listing, ListingStatus};
use crate::taxonomy;

/// Predicates applied as a conjunction.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ListingFilter {
    /// Case- and accent-insensitive title substring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Category slug; `None` or "todos" matches everything.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    /// Only listings with stock that are not paused.
    #[serde(default)]
    pub in_stock_only: bool,
    /// Only made-to-order listings.
    #[serde(default)]
    pub made_to_order_only: bool,
}

impl ListingFilter {
    pub fn matches(&self, listing: &Listing) -> bool {
        self.matches_text(listing)
            && self.matches_category(listing)
            && self.matches_price(listing)
            && self.matches_stock(listing)
            && self.matches_fulfillment(listing)
    }

    fn matches_text(&self, listing: &Listing) -> bool {
        match self.text.as_deref().map(fold_text) {
            Some(needle) if !needle.is_empty() => fold_text(&listing.title).contains(&needle),
            _ => true,
        }
    }

    fn matches_category(&self, listing: &Listing) -> bool {
        if taxonomy::is_all(self.category.as_deref()) {
            return true;
        }
        self.category
            .as_deref()
            .map(|slug| taxonomy::slug_for(listing) == slug.trim())
            .unwrap_or(true)
    }

    fn matches_price(&self, listing: &Listing) -> bool {
        self.min_price.map(|floor| listing.price >= floor).unwrap_or(true)
    }

    fn matches_stock(&self, listing: &Listing) -> bool {
        !self.in_stock_only
            || (listing.total_stock() > 0 && listing.status != ListingStatus::Paused)
    }

    fn matches_fulfillment(&self, listing: &Listing) -> bool {
        !self.made_to_order_only || listing.is_made_to_order()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Keep the incoming order.
    #[default]
    Relevance,
    Name,
    Price,
    Stock,
    DeliveryTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

fn compare(key: SortKey, a: &Listing, b: &Listing) -> Ordering {
    match key {
        SortKey::Relevance => Ordering::Equal,
        SortKey::Name => fold_text(&a.title)
            .cmp(&fold_text(&b.title))
            .then_with(|| a.title.cmp(&b.title)),
        SortKey::Price => a.price.total_cmp(&b.price),
        SortKey::Stock => a.total_stock().cmp(&b.total_stock()),
        SortKey::DeliveryTime => a.delivery_days().cmp(&b.delivery_days()),
    }
}

/// Sort in place. Stable: equal keys keep their relative order in both directions.
pub fn sort_listings(listings: &mut [Listing], key: SortKey, order: SortOrder) {
    match order {
        SortOrder::Asc => listings.sort_by(|a, b| compare(key, a, b)),
        SortOrder::Desc => listings.sort_by(|a, b| compare(key, b, a)),
    }
}

/// Filter then sort.
pub fn apply(
    listings: &[Listing],
    filter: &ListingFilter,
    key: SortKey,
    order: SortOrder,
) -> Vec<Listing> {
    let mut result: Vec<Listing> = listings
        .iter()
        .filter(|l| filter.matches(l))
        .cloned()
        .collect();
    sort_listings(&mut result, key, order);
    result
}

/// Lowercase and strip diacritics ("Ñandú" -> "nandu").
pub fn fold_text(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// A window of a filtered list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageWindow<T> {
    pub items: Vec<T>,
    /// 1-based page actually shown (clamped).
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u32,
}

/// Number of pages for `total` items, at least 1.
pub fn total_pages(total: u64, page_size: u32) -> u32 {
    let page_size = page_size.max(1) as u64;
    total.div_ceil(page_size).max(1) as u32
}

/// Cut a 1-based page out of `items`, clamping the page into range.
pub fn paginate<T: Clone>(items: &[T], page: u32, page_size: u32) -> PageWindow<T> {
    let page_size = page_size.max(1);
    let total = items.len() as u64;
    let pages = total_pages(total, page_size);
    let page = page.clamp(1, pages);

    let start = ((page - 1) as usize).saturating_mul(page_size as usize);
    let items = items
        .iter()
        .skip(start)
        .take(page_size as usize)
        .cloned()
        .collect();

    PageWindow {
        items,
        page,
        page_size,
        total,
        total_pages: pages,
    }
}
