//! HTTP catalog API client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::debug;

use super::normalize::{normalize_distinct_response, normalize_listing_response};
use super::{CatalogApi, CatalogError, CategoryCountFlags, DistinctCategory, ListingPage, ListingQuery};
use crate::config::ApiConfig;
use crate::metrics;

/// reqwest-backed `CatalogApi`.
pub struct HttpCatalogClient {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpCatalogClient {
    /// Create a new client. The base URL comes from configuration and is
    /// never guessed from the runtime environment.
    pub fn new(config: &ApiConfig) -> Result<Self, CatalogError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(CatalogError::NotConfigured(
                "catalog base_url is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_token: config.api_token.clone().filter(|t| !t.is_empty()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_json(
        &self,
        operation: &str,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Value, CatalogError> {
        let start = Instant::now();
        let request = self.authorize(self.client.get(self.url(path)).query(params));

        debug!(operation, path, ?params, "Catalog request");

        let result = match request.send().await {
            Ok(response) => read_json(response).await,
            Err(e) => Err(CatalogError::from(e)),
        };

        let status = if result.is_ok() { "success" } else { "error" };
        metrics::CATALOG_REQUEST_DURATION
            .with_label_values(&[operation])
            .observe(start.elapsed().as_secs_f64());
        metrics::CATALOG_REQUESTS
            .with_label_values(&[operation, status])
            .inc();

        result
    }
}

async fn read_json(response: Response) -> Result<Value, CatalogError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(CatalogError::ApiError {
            status: status.as_u16(),
            message: body.chars().take(200).collect(),
        });
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| CatalogError::ParseError(e.to_string()))
}

/// Query parameters for a listing request.
fn listing_params(query: &ListingQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("limit", query.limit.to_string()),
        ("offset", query.offset.to_string()),
    ];
    if let Some(status) = query.status {
        params.push(("status", status.as_str().to_string()));
    }
    if let Some(text) = query.text() {
        params.push(("q", text.to_string()));
    }
    if !query.category_ids.is_empty() {
        params.push(("categoryIds", query.category_ids.join(",")));
    }
    if !query.fields.is_empty() {
        params.push(("fields", query.fields.join(",")));
    }
    params
}

fn distinct_params(flags: &CategoryCountFlags) -> Vec<(&'static str, String)> {
    vec![
        ("onlyActive", flags.only_active.to_string()),
        ("requireImage", flags.require_image.to_string()),
        ("onlyInStock", flags.only_in_stock.to_string()),
    ]
}

#[async_trait]
impl CatalogApi for HttpCatalogClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_listings(&self, query: &ListingQuery) -> Result<ListingPage, CatalogError> {
        let value = self
            .get_json("listings", "listings", &listing_params(query))
            .await?;
        Ok(normalize_listing_response(value))
    }

    async fn fetch_by_category(
        &self,
        query: &ListingQuery,
    ) -> Result<ListingPage, CatalogError> {
        let value = self
            .get_json("by_category", "listings/by-category", &listing_params(query))
            .await?;
        Ok(normalize_listing_response(value))
    }

    async fn distinct_categories(
        &self,
        flags: &CategoryCountFlags,
    ) -> Result<Vec<DistinctCategory>, CatalogError> {
        let value = self
            .get_json("distinct_categories", "categories/distinct", &distinct_params(flags))
            .await?;
        Ok(normalize_distinct_response(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::ListingStatus;

    fn api_config(url: &str) -> ApiConfig {
        ApiConfig {
            base_url: url.to_string(),
            timeout_secs: 5,
            api_token: Some(String::new()),
            fields: vec![],
        }
    }

    #[test]
    fn test_new_rejects_empty_base_url() {
        let result = HttpCatalogClient::new(&api_config(" "));
        assert!(matches!(result, Err(CatalogError::NotConfigured(_))));
    }

    #[test]
    fn test_url_trims_trailing_slash() {
        let client = HttpCatalogClient::new(&api_config("http://localhost:4000/api/")).unwrap();
        assert_eq!(client.url("listings"), "http://localhost:4000/api/listings");
        // empty token is treated as absent
        assert!(client.api_token.is_none());
    }

    #[test]
    fn test_listing_params_full() {
        let query = ListingQuery {
            limit: 24,
            offset: 48,
            status: Some(ListingStatus::Active),
            query: Some(" mate ".to_string()),
            category_ids: vec!["MLA1499".to_string(), "MLA371792".to_string()],
            fields: vec!["title".to_string(), "price".to_string()],
        };
        let params = listing_params(&query);
        assert_eq!(
            params,
            vec![
                ("limit", "24".to_string()),
                ("offset", "48".to_string()),
                ("status", "active".to_string()),
                ("q", "mate".to_string()),
                ("categoryIds", "MLA1499,MLA371792".to_string()),
                ("fields", "title,price".to_string()),
            ]
        );
    }

    #[test]
    fn test_listing_params_minimal() {
        let params = listing_params(&ListingQuery::page(60, 0));
        assert_eq!(
            params,
            vec![("limit", "60".to_string()), ("offset", "0".to_string())]
        );
    }

    #[test]
    fn test_distinct_params() {
        let params = distinct_params(&CategoryCountFlags::relaxed());
        assert_eq!(params[0], ("onlyActive", "true".to_string()));
        assert_eq!(params[1], ("requireImage", "false".to_string()));
        assert_eq!(params[2], ("onlyInStock", "false".to_string()));
    }
}
