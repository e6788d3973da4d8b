//! Testing utilities and mock implementations.
//!
//! `MockCatalogApi` stands in for the remote catalog API so the cache,
//! loader and taxonomy can be exercised without a network.
//!
//! # Example
//!
//! ```rust,ignore
//! use vitrina_core::testing::{fixtures, MockCatalogApi};
//!
//! let api = Arc::new(MockCatalogApi::with_listings(fixtures::catalog(250)));
//! api.set_delay(Duration::from_millis(20)).await;
//!
//! let loader = PageLoader::new(api.clone(), RequestCache::default(), LoaderConfig::default());
//! let view = loader.start().await;
//! ```

mod mock_catalog;

pub use mock_catalog::{MockCatalogApi, RecordedRequest};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::listing::{Listing, ListingStatus};

    /// Provider codes cycled through by `catalog`.
    const CATALOG_CATEGORIES: &[&str] = &["MLA1430", "MLA1499", "MLA1574", "MLA1276"];

    /// Create an active, ungrouped listing with stock.
    pub fn listing(id: &str, price: f64) -> Listing {
        Listing {
            listing_id: id.to_string(),
            internal_id: format!("int-{}", id),
            title: format!("Listing {}", id),
            price,
            available_quantity: 5,
            status: ListingStatus::Active,
            category_id: None,
            catalog_group_id: None,
            sold_quantity: None,
            health_score: None,
            images: vec![format!("https://img.example.com/{}.jpg", id)],
            variants: Vec::new(),
            manufacturing_days: None,
        }
    }

    /// Create a listing that belongs to a catalog group.
    pub fn grouped_listing(
        id: &str,
        group: &str,
        status: ListingStatus,
        sold: u32,
        health: f64,
        price: f64,
    ) -> Listing {
        Listing {
            catalog_group_id: Some(group.to_string()),
            status,
            sold_quantity: Some(sold),
            health_score: Some(health),
            ..listing(id, price)
        }
    }

    /// Create `count` distinct ungrouped listings `L0000..`, priced from 100.
    pub fn catalog(count: usize) -> Vec<Listing> {
        (0..count)
            .map(|i| {
                let mut item = listing(&format!("L{:04}", i), 100.0 + i as f64);
                item.category_id = Some(CATALOG_CATEGORIES[i % CATALOG_CATEGORIES.len()].to_string());
                item
            })
            .collect()
    }
}
