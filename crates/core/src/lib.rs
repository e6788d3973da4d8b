pub mod cache;
pub mod catalog;
pub mod config;
pub mod dedup;
pub mod filter;
pub mod listing;
pub mod loader;
pub mod metrics;
pub mod taxonomy;
pub mod testing;

pub use cache::{CacheEntry, PageRequestKey, RequestCache, RequestShape};
pub use catalog::{
    CatalogApi, CatalogError, CategoryCountFlags, HttpCatalogClient, ListingPage, ListingQuery,
    RequestRoute,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, LoaderConfig,
    SanitizedConfig,
};
pub use dedup::{deduplicate, deduplicate_with, CanonicalCandidate, ScorePolicy};
pub use filter::{ListingFilter, SortKey, SortOrder};
pub use listing::{DisplayItem, Listing, ListingStatus, Variant};
pub use loader::{BrowseCriteria, CatalogView, LoaderMode, PageLoader, Refinements};
pub use taxonomy::CategorySlug;
