//! Types for catalog listings.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Publication status of a listing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Active,
    Paused,
    Closed,
    /// Any status string the provider sends that we do not model.
    #[default]
    #[serde(other)]
    Other,
}

impl ListingStatus {
    /// Wire value used in request parameters.
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Active => "active",
            ListingStatus::Paused => "paused",
            ListingStatus::Closed => "closed",
            ListingStatus::Other => "other",
        }
    }
}

/// One sellable item from the provider catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    /// Stable external identifier.
    #[serde(alias = "listing_id", alias = "ml_id")]
    pub listing_id: String,
    /// Storage identifier, may differ from `listing_id`.
    #[serde(default, alias = "internal_id", alias = "_id")]
    pub internal_id: String,
    pub title: String,
    /// Currency-agnostic price.
    #[serde(default)]
    pub price: f64,
    #[serde(default, alias = "available_quantity")]
    pub available_quantity: u32,
    #[serde(default)]
    pub status: ListingStatus,
    /// Provider taxonomy code.
    #[serde(default, alias = "category_id", skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    /// Shared-catalog family, present only for grouped listings.
    #[serde(
        default,
        alias = "catalog_group_id",
        alias = "catalog_product_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub catalog_group_id: Option<String>,
    #[serde(default, alias = "sold_quantity", skip_serializing_if = "Option::is_none")]
    pub sold_quantity: Option<u32>,
    /// Listing quality score in [0, 1].
    #[serde(default, alias = "health", skip_serializing_if = "Option::is_none")]
    pub health_score: Option<f64>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub variants: Vec<Variant>,
    /// Days before dispatch. Anything above zero marks a made-to-order listing.
    #[serde(
        default,
        alias = "manufacturing_days",
        alias = "manufacturing_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub manufacturing_days: Option<u32>,
}

impl Listing {
    /// Shared catalog identifier, ignoring blank values.
    pub fn group_id(&self) -> Option<&str> {
        self.catalog_group_id
            .as_deref()
            .map(str::trim)
            .filter(|g| !g.is_empty())
    }

    /// Whether dispatch is not immediate.
    pub fn is_made_to_order(&self) -> bool {
        self.manufacturing_days.unwrap_or(0) > 0
    }

    /// Delivery time used for sorting (missing = 0).
    pub fn delivery_days(&self) -> u32 {
        self.manufacturing_days.unwrap_or(0)
    }

    /// Total stock across variants, or the listing quantity when there are none.
    pub fn total_stock(&self) -> u32 {
        if self.variants.is_empty() {
            self.available_quantity
        } else {
            self.variants.iter().map(|v| v.stock).sum()
        }
    }

    /// Check that no two variants share the same (color, size) pair.
    ///
    /// Returns the first duplicated pair, if any.
    pub fn validate_variants(&self) -> Result<(), (Option<String>, Option<String>)> {
        let mut seen = HashSet::new();
        for variant in &self.variants {
            let pair = (variant.color.clone(), variant.size.clone());
            if !seen.insert(pair.clone()) {
                return Err(pair);
            }
        }
        Ok(())
    }
}

/// A color/size fork of a listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    #[serde(alias = "variant_id", alias = "id")]
    pub variant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default)]
    pub stock: u32,
    /// Overrides the parent listing price when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(id: &str, color: Option<&str>, size: Option<&str>, stock: u32) -> Variant {
        Variant {
            variant_id: id.to_string(),
            color: color.map(String::from),
            size: size.map(String::from),
            stock,
            price: None,
            images: None,
        }
    }

    #[test]
    fn test_deserialize_camel_case_listing() {
        let json = r#"{
            "listingId": "MLA1",
            "internalId": "abc",
            "title": "Mate de calabaza",
            "price": 1500.5,
            "availableQuantity": 3,
            "status": "active",
            "categoryId": "MLA1499",
            "catalogGroupId": "G1",
            "soldQuantity": 12,
            "healthScore": 0.75
        }"#;
        let listing: Listing = serde_json::from_str(json).unwrap();
        assert_eq!(listing.listing_id, "MLA1");
        assert_eq!(listing.internal_id, "abc");
        assert_eq!(listing.status, ListingStatus::Active);
        assert_eq!(listing.group_id(), Some("G1"));
        assert_eq!(listing.sold_quantity, Some(12));
        assert!(listing.images.is_empty());
        assert!(listing.variants.is_empty());
    }

    #[test]
    fn test_deserialize_provider_aliases() {
        let json = r#"{
            "listing_id": "MLA2",
            "_id": "65f0",
            "title": "Poncho",
            "price": 900,
            "available_quantity": 0,
            "status": "under_review",
            "catalog_product_id": "G9",
            "sold_quantity": 4,
            "health": 0.5,
            "manufacturing_time": 15
        }"#;
        let listing: Listing = serde_json::from_str(json).unwrap();
        assert_eq!(listing.internal_id, "65f0");
        assert_eq!(listing.status, ListingStatus::Other);
        assert_eq!(listing.catalog_group_id.as_deref(), Some("G9"));
        assert_eq!(listing.health_score, Some(0.5));
        assert!(listing.is_made_to_order());
        assert_eq!(listing.delivery_days(), 15);
    }

    #[test]
    fn test_blank_group_id_is_ungrouped() {
        let json = r#"{"listingId": "MLA3", "title": "x", "catalogGroupId": "  "}"#;
        let listing: Listing = serde_json::from_str(json).unwrap();
        assert_eq!(listing.group_id(), None);
    }

    #[test]
    fn test_status_wire_values() {
        assert_eq!(serde_json::to_string(&ListingStatus::Paused).unwrap(), "\"paused\"");
        assert_eq!(ListingStatus::Active.as_str(), "active");
        assert_eq!(ListingStatus::Closed.as_str(), "closed");
    }

    #[test]
    fn test_total_stock_prefers_variants() {
        let mut listing: Listing =
            serde_json::from_str(r#"{"listingId": "MLA4", "title": "x", "availableQuantity": 7}"#)
                .unwrap();
        assert_eq!(listing.total_stock(), 7);

        listing.variants = vec![
            variant("v1", Some("rojo"), Some("M"), 2),
            variant("v2", Some("rojo"), Some("L"), 3),
        ];
        assert_eq!(listing.total_stock(), 5);
    }

    #[test]
    fn test_validate_variants_detects_duplicate_pair() {
        let mut listing: Listing =
            serde_json::from_str(r#"{"listingId": "MLA5", "title": "x"}"#).unwrap();
        listing.variants = vec![
            variant("v1", Some("azul"), Some("S"), 1),
            variant("v2", Some("azul"), Some("M"), 1),
        ];
        assert!(listing.validate_variants().is_ok());

        listing.variants.push(variant("v3", Some("azul"), Some("S"), 4));
        let err = listing.validate_variants().unwrap_err();
        assert_eq!(err, (Some("azul".to_string()), Some("S".to_string())));
    }
}
