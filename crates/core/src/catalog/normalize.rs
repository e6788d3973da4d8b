//! Response envelope normalization.
//!
//! The listing endpoints have answered with three envelopes over time:
//! `{ total, items }`, the legacy `{ productos, pagination: { total } }`,
//! and a bare array. All of them map to `ListingPage`; anything else is an
//! empty page, never an error.

use serde_json::Value;
use tracing::warn;

use super::{DistinctCategory, ListingPage};
use crate::listing::Listing;

/// Normalize any listing response envelope into a `ListingPage`.
pub fn normalize_listing_response(value: Value) -> ListingPage {
    match value {
        Value::Array(raw) => {
            let received = raw.len();
            let items = parse_items(raw);
            ListingPage::new(items.len() as u64, items).with_received(received)
        }
        Value::Object(mut obj) => {
            if let Some(Value::Array(raw)) = obj.remove("items") {
                let received = raw.len();
                let items = parse_items(raw);
                let total = obj.get("total").and_then(as_count);
                return ListingPage::new(total.unwrap_or(items.len() as u64), items)
                    .with_received(received);
            }

            if let Some(Value::Array(raw)) = obj.remove("productos") {
                let received = raw.len();
                let items = parse_items(raw);
                let total = obj
                    .get("pagination")
                    .and_then(|p| p.get("total"))
                    .and_then(as_count)
                    .or_else(|| obj.get("total").and_then(as_count));
                return ListingPage::new(total.unwrap_or(items.len() as u64), items)
                    .with_received(received);
            }

            warn!(
                keys = ?obj.keys().collect::<Vec<_>>(),
                "Unrecognized listing envelope, treating as empty"
            );
            ListingPage::default()
        }
        other => {
            warn!(kind = value_kind(&other), "Unrecognized listing response");
            ListingPage::default()
        }
    }
}

/// Normalize a `categories/distinct` response.
///
/// Accepts `{ categories: [...] }` or a bare array.
pub fn normalize_distinct_response(value: Value) -> Vec<DistinctCategory> {
    let raw = match value {
        Value::Array(raw) => raw,
        Value::Object(mut obj) => match obj.remove("categories") {
            Some(Value::Array(raw)) => raw,
            _ => {
                warn!("Unrecognized categories envelope, treating as empty");
                return Vec::new();
            }
        },
        _ => return Vec::new(),
    };

    raw.into_iter()
        .filter_map(|v| serde_json::from_value::<DistinctCategory>(v).ok())
        .collect()
}

fn parse_items(raw: Vec<Value>) -> Vec<Listing> {
    let total = raw.len();
    let items: Vec<Listing> = raw
        .into_iter()
        .filter_map(|v| match serde_json::from_value::<Listing>(v) {
            Ok(listing) => Some(listing),
            Err(e) => {
                warn!(error = %e, "Skipping malformed listing");
                None
            }
        })
        .collect();

    if items.len() != total {
        warn!(
            kept = items.len(),
            dropped = total - items.len(),
            "Dropped malformed listings from page"
        );
    }
    items
}

/// Counts sometimes arrive as strings.
fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(id: &str) -> Value {
        json!({ "listingId": id, "title": format!("Item {}", id), "price": 10 })
    }

    #[test]
    fn test_items_envelope() {
        let page = normalize_listing_response(json!({
            "total": 250,
            "items": [item("1"), item("2")]
        }));
        assert_eq!(page.total, 250);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].listing_id, "1");
    }

    #[test]
    fn test_items_envelope_without_total() {
        let page = normalize_listing_response(json!({ "items": [item("1")] }));
        assert_eq!(page.total, 1);
    }

    #[test]
    fn test_legacy_productos_envelope() {
        let page = normalize_listing_response(json!({
            "productos": [item("a"), item("b"), item("c")],
            "pagination": { "total": "90" }
        }));
        assert_eq!(page.total, 90);
        assert_eq!(page.items.len(), 3);
    }

    #[test]
    fn test_bare_array() {
        let page = normalize_listing_response(json!([item("x"), item("y")]));
        assert_eq!(page.total, 2);
        assert_eq!(page.items[1].listing_id, "y");
    }

    #[test]
    fn test_unrecognized_shapes_are_empty() {
        assert_eq!(normalize_listing_response(json!({ "data": [] })), ListingPage::default());
        assert_eq!(normalize_listing_response(json!("oops")), ListingPage::default());
        assert_eq!(normalize_listing_response(Value::Null), ListingPage::default());
    }

    #[test]
    fn test_malformed_items_are_skipped() {
        let page = normalize_listing_response(json!({
            "total": 3,
            "items": [item("1"), { "price": 5 }, item("3")]
        }));
        assert_eq!(page.total, 3);
        assert_eq!(page.received, 3);
        let ids: Vec<_> = page.items.iter().map(|l| l.listing_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);

        let legacy = normalize_listing_response(json!({
            "productos": [{ "price": 5 }, item("a")]
        }));
        assert_eq!(legacy.received, 2);
        assert_eq!(legacy.items.len(), 1);
    }

    #[test]
    fn test_distinct_envelopes() {
        let wrapped = normalize_distinct_response(json!({
            "categories": [{ "category_id": "MLA1430", "count": 7 }]
        }));
        assert_eq!(wrapped.len(), 1);
        assert_eq!(wrapped[0].count, 7);

        let bare = normalize_distinct_response(json!([{ "categoryId": "MLA1499", "count": 2 }]));
        assert_eq!(bare[0].category_id, "MLA1499");

        assert!(normalize_distinct_response(json!({ "foo": 1 })).is_empty());
    }
}
