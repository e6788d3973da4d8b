//! Category taxonomy mapping.
//!
//! Maps fine-grained provider category codes onto a small set of
//! shopper-facing slugs and aggregates listing counts per slug.

mod table;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::{CatalogApi, CatalogError, CategoryCountFlags, DistinctCategory};
use crate::listing::Listing;

use table::{CATEGORY_TABLE, SLUGS};

/// Reserved slug for unknown or missing categories.
pub const FALLBACK_SLUG: &str = "otros";

/// Synthetic "show all" slug, always first in aggregated lists.
pub const ALL_SLUG: &str = "todos";

/// A coarse category bucket with its listing count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategorySlug {
    pub slug: String,
    pub display_name: String,
    pub icon: String,
    pub count: u64,
}

/// Map a provider category code to its slug.
pub fn map_to_slug(category_id: Option<&str>) -> &'static str {
    let Some(id) = category_id.map(str::trim).filter(|id| !id.is_empty()) else {
        return FALLBACK_SLUG;
    };

    CATEGORY_TABLE
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case(id))
        .map(|(_, slug)| *slug)
        .unwrap_or(FALLBACK_SLUG)
}

/// Slug for a listing.
pub fn slug_for(listing: &Listing) -> &'static str {
    map_to_slug(listing.category_id.as_deref())
}

/// Human-facing name for a slug.
pub fn display_name(slug: &str) -> &'static str {
    info(slug).display_name
}

/// Icon for a slug.
pub fn icon(slug: &str) -> &'static str {
    info(slug).icon
}

/// Provider category codes that map to a slug.
///
/// Empty for the fallback and "show all" slugs.
pub fn category_ids_for(slug: &str) -> Vec<&'static str> {
    CATEGORY_TABLE
        .iter()
        .filter(|(_, s)| *s == slug)
        .map(|(code, _)| *code)
        .collect()
}

/// Whether a slug selects every category.
pub fn is_all(slug: Option<&str>) -> bool {
    match slug.map(str::trim) {
        None | Some("") => true,
        Some(s) => s == ALL_SLUG,
    }
}

fn info(slug: &str) -> &'static table::SlugInfo {
    SLUGS
        .iter()
        .find(|s| s.slug == slug)
        .or_else(|| SLUGS.iter().find(|s| s.slug == FALLBACK_SLUG))
        .unwrap_or(&SLUGS[0])
}

fn make_slug(slug: &str, count: u64) -> CategorySlug {
    let info = info(slug);
    CategorySlug {
        slug: info.slug.to_string(),
        display_name: info.display_name.to_string(),
        icon: info.icon.to_string(),
        count,
    }
}

/// Build the sorted slug list from per-slug counts, prefixed by "show all".
fn build_slug_list(counts: HashMap<&'static str, u64>) -> Vec<CategorySlug> {
    let mut slugs: Vec<CategorySlug> = counts
        .into_iter()
        .map(|(slug, count)| make_slug(slug, count))
        .collect();

    slugs.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.display_name.cmp(&b.display_name))
    });

    let total = slugs.iter().map(|s| s.count).sum();
    let mut result = Vec::with_capacity(slugs.len() + 1);
    result.push(make_slug(ALL_SLUG, total));
    result.extend(slugs);
    result
}

/// Count listings per slug.
pub fn aggregate_counts(listings: &[Listing]) -> Vec<CategorySlug> {
    let mut counts: HashMap<&'static str, u64> = HashMap::new();
    for listing in listings {
        *counts.entry(slug_for(listing)).or_default() += 1;
    }
    build_slug_list(counts)
}

/// Fold provider category counts into slug counts.
pub fn aggregate_distinct(categories: &[DistinctCategory]) -> Vec<CategorySlug> {
    let mut counts: HashMap<&'static str, u64> = HashMap::new();
    for category in categories {
        *counts
            .entry(map_to_slug(Some(&category.category_id)))
            .or_default() += category.count;
    }
    build_slug_list(counts)
}

/// Load slug counts from the catalog's distinct-categories endpoint.
///
/// Strict flags are tried first. An empty answer is retried once with
/// relaxed flags before giving up with an empty list.
pub async fn load_category_counts(
    api: &dyn CatalogApi,
) -> Result<Vec<CategorySlug>, CatalogError> {
    let strict = CategoryCountFlags::strict();
    let mut categories = api.distinct_categories(&strict).await?;

    if categories.is_empty() {
        let relaxed = CategoryCountFlags::relaxed();
        warn!(?strict, ?relaxed, "No categories with strict flags, relaxing");
        crate::metrics::FALLBACKS
            .with_label_values(&["relaxed_categories"])
            .inc();
        categories = api.distinct_categories(&relaxed).await?;
    }

    debug!(categories = categories.len(), "Loaded category counts");
    Ok(aggregate_distinct(&categories))
}
