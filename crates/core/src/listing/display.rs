//! Display items produced by variant expansion.

use std::sync::Arc;

use super::{Listing, ListingStatus, Variant};

/// One tile in a listing grid: a listing, or one of its variants.
///
/// Keeps a back-reference to the parent listing so grouping and scoring
/// read the parent's catalog data.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayItem {
    pub parent: Arc<Listing>,
    pub variant: Option<Variant>,
}

impl DisplayItem {
    /// Identifier unique across expanded items.
    pub fn item_id(&self) -> String {
        match &self.variant {
            Some(v) => format!("{}:{}", self.parent.listing_id, v.variant_id),
            None => self.parent.listing_id.clone(),
        }
    }

    pub fn price(&self) -> f64 {
        self.variant
            .as_ref()
            .and_then(|v| v.price)
            .unwrap_or(self.parent.price)
    }

    pub fn stock(&self) -> u32 {
        match &self.variant {
            Some(v) => v.stock,
            None => self.parent.available_quantity,
        }
    }

    pub fn status(&self) -> ListingStatus {
        self.parent.status
    }

    /// Variant images when present, otherwise the parent's.
    pub fn images(&self) -> &[String] {
        self.variant
            .as_ref()
            .and_then(|v| v.images.as_deref())
            .filter(|imgs| !imgs.is_empty())
            .unwrap_or(&self.parent.images)
    }
}

/// Expand a listing into one display item per variant.
///
/// A listing without variants yields a single bare item.
pub fn expand_variants(listing: Arc<Listing>) -> Vec<DisplayItem> {
    if listing.variants.is_empty() {
        return vec![DisplayItem {
            parent: listing,
            variant: None,
        }];
    }

    listing
        .variants
        .iter()
        .cloned()
        .map(|v| DisplayItem {
            parent: Arc::clone(&listing),
            variant: Some(v),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing_with_variants() -> Listing {
        serde_json::from_str(
            r#"{
                "listingId": "MLA10",
                "title": "Remera",
                "price": 100,
                "availableQuantity": 9,
                "images": ["a.jpg"],
                "variants": [
                    {"variantId": "v1", "color": "negro", "size": "M", "stock": 2, "price": 120},
                    {"variantId": "v2", "color": "blanco", "size": "M", "stock": 0, "images": ["b.jpg"]}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_expand_without_variants() {
        let listing: Listing =
            serde_json::from_str(r#"{"listingId": "MLA11", "title": "x", "price": 50}"#).unwrap();
        let items = expand_variants(Arc::new(listing));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item_id(), "MLA11");
        assert_eq!(items[0].price(), 50.0);
    }

    #[test]
    fn test_expand_one_item_per_variant() {
        let items = expand_variants(Arc::new(listing_with_variants()));
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].item_id(), "MLA10:v1");
        assert_eq!(items[0].price(), 120.0);
        assert_eq!(items[0].stock(), 2);
        assert_eq!(items[0].images(), &["a.jpg".to_string()]);

        assert_eq!(items[1].price(), 100.0);
        assert_eq!(items[1].stock(), 0);
        assert_eq!(items[1].images(), &["b.jpg".to_string()]);
    }
}
