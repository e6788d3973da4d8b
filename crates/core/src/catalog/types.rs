//! Request and response types for the catalog API.

use serde::{Deserialize, Serialize};

use crate::listing::{Listing, ListingStatus};

/// Which listing endpoint serves a request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RequestRoute {
    /// `GET listings`
    Listings,
    /// `GET listings/by-category`
    ByCategory,
}

/// Parameters of a listing page request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ListingQuery {
    pub limit: u32,
    pub offset: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ListingStatus>,
    /// Free-text query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category_ids: Vec<String>,
    /// Field projection; empty requests full listings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
}

impl ListingQuery {
    pub fn page(limit: u32, offset: u32) -> Self {
        Self {
            limit,
            offset,
            ..Default::default()
        }
    }

    /// Same request without the field projection.
    pub fn without_projection(&self) -> Self {
        Self {
            fields: Vec::new(),
            ..self.clone()
        }
    }

    /// Free-text query with surrounding whitespace removed, if any.
    pub fn text(&self) -> Option<&str> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }
}

/// A normalized page of listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ListingPage {
    /// Total items matching the request on the server.
    pub total: u64,
    pub items: Vec<Listing>,
    /// Items the server sent, including malformed ones dropped while
    /// normalizing. End of data is judged on this count.
    #[serde(default)]
    pub received: usize,
}

impl ListingPage {
    pub fn new(total: u64, items: Vec<Listing>) -> Self {
        let received = items.len();
        Self {
            total,
            items,
            received,
        }
    }

    pub fn with_received(mut self, received: usize) -> Self {
        self.received = received;
        self
    }
}

/// Flags for `GET categories/distinct`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CategoryCountFlags {
    pub only_active: bool,
    pub require_image: bool,
    pub only_in_stock: bool,
}

impl CategoryCountFlags {
    /// Only categories with active, illustrated, in-stock listings.
    pub fn strict() -> Self {
        Self {
            only_active: true,
            require_image: true,
            only_in_stock: true,
        }
    }

    /// Broader flags used when the strict request returns nothing.
    pub fn relaxed() -> Self {
        Self {
            only_active: true,
            require_image: false,
            only_in_stock: false,
        }
    }
}

/// A provider category code with its listing count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DistinctCategory {
    #[serde(alias = "categoryId")]
    pub category_id: String,
    #[serde(default)]
    pub count: u64,
}
