//! Remote catalog API access.
//!
//! The `CatalogApi` trait is the only way the engine talks to the product
//! provider. `HttpCatalogClient` is the reqwest implementation; tests use
//! `testing::MockCatalogApi`.

mod http;
mod normalize;
mod types;

pub use http::HttpCatalogClient;
pub use normalize::{normalize_distinct_response, normalize_listing_response};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to the catalog API.
///
/// Cloneable so a single failure can be handed to every caller waiting on
/// the same coalesced request.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Could not reach the API.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    /// API returned an error status.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Response body was not valid JSON.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client not configured (bad base URL, etc.).
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

impl CatalogError {
    /// Network-level or server-side failure that may succeed on retry.
    pub fn is_transient(&self) -> bool {
        match self {
            CatalogError::Http(_) | CatalogError::ConnectionFailed(_) | CatalogError::Timeout => {
                true
            }
            CatalogError::ApiError { status, .. } => *status >= 500 || *status == 429,
            CatalogError::ParseError(_) | CatalogError::NotConfigured(_) => false,
        }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CatalogError::Timeout
        } else if e.is_connect() {
            CatalogError::ConnectionFailed(e.to_string())
        } else {
            CatalogError::Http(e.to_string())
        }
    }
}

/// Trait for remote catalog backends.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// `GET listings`: free-text and generic listing pages.
    async fn fetch_listings(&self, query: &ListingQuery) -> Result<ListingPage, CatalogError>;

    /// `GET listings/by-category`: used when only a category filter is active.
    async fn fetch_by_category(&self, query: &ListingQuery)
        -> Result<ListingPage, CatalogError>;

    /// `GET categories/distinct`: provider category codes with counts.
    async fn distinct_categories(
        &self,
        flags: &CategoryCountFlags,
    ) -> Result<Vec<DistinctCategory>, CatalogError>;

    /// Dispatch a query to the endpoint for `route`.
    async fn fetch_route(
        &self,
        route: RequestRoute,
        query: &ListingQuery,
    ) -> Result<ListingPage, CatalogError> {
        match route {
            RequestRoute::Listings => self.fetch_listings(query).await,
            RequestRoute::ByCategory => self.fetch_by_category(query).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(CatalogError::Timeout.is_transient());
        assert!(CatalogError::ConnectionFailed("refused".into()).is_transient());
        assert!(CatalogError::ApiError { status: 503, message: String::new() }.is_transient());
        assert!(CatalogError::ApiError { status: 429, message: String::new() }.is_transient());
        assert!(!CatalogError::ApiError { status: 400, message: String::new() }.is_transient());
        assert!(!CatalogError::ParseError("bad".into()).is_transient());
    }

    #[test]
    fn test_error_display() {
        let err = CatalogError::ApiError {
            status: 502,
            message: "bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 502 - bad gateway");
    }
}
