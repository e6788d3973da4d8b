//! Listing data model.
//!
//! A `Listing` is one sellable item as returned by the catalog provider.
//! Several listings may describe the same product (they share a
//! `catalog_group_id`); the dedup module picks one of them for display.

mod display;
mod types;

pub use display::{expand_variants, DisplayItem};
pub use types::*;
