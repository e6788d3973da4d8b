//! Types for the page loader.

use serde::{Deserialize, Serialize};

use crate::filter::{ListingFilter, SortKey, SortOrder};
use crate::listing::Listing;
use crate::taxonomy::{self, CategorySlug};

/// Loading strategy currently in effect.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoaderMode {
    /// Progressive client-side loading with in-memory filtering.
    #[default]
    Local,
    /// Every input change asks the API for an authoritative page.
    Server,
}

impl LoaderMode {
    /// Server mode whenever a text query or a non-default category is set.
    pub fn for_criteria(criteria: &BrowseCriteria) -> Self {
        if criteria.text().is_some() || !taxonomy::is_all(criteria.category.as_deref()) {
            LoaderMode::Server
        } else {
            LoaderMode::Local
        }
    }
}

/// Client-side refinements that never change the loading mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Refinements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub in_stock_only: bool,
    #[serde(default)]
    pub made_to_order_only: bool,
}

/// Everything the shopper has selected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrowseCriteria {
    pub query: String,
    /// Category slug, `None` for "show all".
    pub category: Option<String>,
    pub refinements: Refinements,
    pub sort_key: SortKey,
    pub sort_order: SortOrder,
    /// 1-based.
    pub page: u32,
    pub page_size: u32,
}

impl BrowseCriteria {
    pub fn new(page_size: u32) -> Self {
        Self {
            query: String::new(),
            category: None,
            refinements: Refinements::default(),
            sort_key: SortKey::default(),
            sort_order: SortOrder::default(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn text(&self) -> Option<&str> {
        Some(self.query.trim()).filter(|q| !q.is_empty())
    }

    /// Category slug unless it is the "show all" default.
    pub fn category_slug(&self) -> Option<&str> {
        match self.category.as_deref().map(str::trim) {
            Some(slug) if !taxonomy::is_all(Some(slug)) => Some(slug),
            _ => None,
        }
    }

    pub fn offset(&self) -> u32 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }

    /// Full predicate set for in-memory filtering.
    pub fn local_filter(&self) -> ListingFilter {
        ListingFilter {
            text: self.text().map(String::from),
            category: self.category_slug().map(String::from),
            min_price: self.refinements.min_price,
            in_stock_only: self.refinements.in_stock_only,
            made_to_order_only: self.refinements.made_to_order_only,
        }
    }

    /// Predicates left to apply on a server page. Text matching is the
    /// server's job; the category is re-checked only when the server could
    /// not be asked for it.
    pub fn server_filter(&self) -> ListingFilter {
        let category = self
            .category_slug()
            .filter(|slug| taxonomy::category_ids_for(slug).is_empty())
            .map(String::from);
        ListingFilter {
            text: None,
            category,
            min_price: self.refinements.min_price,
            in_stock_only: self.refinements.in_stock_only,
            made_to_order_only: self.refinements.made_to_order_only,
        }
    }
}

/// Snapshot handed to the view layer.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogView {
    pub mode: LoaderMode,
    /// Items of the current page.
    pub items: Vec<Listing>,
    /// Items matching the current criteria (server-reported in Server mode).
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    /// A request for this view is still outstanding.
    pub loading: bool,
    /// Local mode has streamed the whole catalog.
    pub background_complete: bool,
    /// Deduplicated listings held in memory.
    pub loaded_count: usize,
    /// Last non-fatal failure, cleared by the next success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub categories: Vec<CategorySlug>,
}
