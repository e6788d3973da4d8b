use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::listing::ListingStatus;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
}

/// Remote catalog API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Catalog API base URL (e.g., "https://catalog.example.com/api")
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Bearer token for privileged page variants, provided by the auth service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    /// Field projection sent with listing requests (empty = full listings)
    #[serde(default = "default_fields")]
    pub fields: Vec<String>,
}

fn default_timeout() -> u32 {
    30
}

fn default_fields() -> Vec<String> {
    [
        "listingId",
        "internalId",
        "title",
        "price",
        "availableQuantity",
        "status",
        "categoryId",
        "catalogGroupId",
        "soldQuantity",
        "healthScore",
        "images",
        "variants",
        "manufacturingDays",
    ]
    .iter()
    .map(|f| f.to_string())
    .collect()
}

/// Request cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Freshness window for cached pages (default: 300)
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

fn default_ttl_secs() -> u64 {
    300
}

/// Page loader configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoaderConfig {
    /// Items requested for the first Local-mode window (default: 60)
    #[serde(default = "default_initial_batch_size")]
    pub initial_batch_size: u32,
    /// Items per background batch (default: 100)
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
    /// Items per displayed page (default: 24)
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Settling delay for Server-mode input in milliseconds (default: 300)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Listing status requested from the API (default: active)
    #[serde(default = "default_status")]
    pub status: ListingStatus,
    /// Field projection for listing requests (copied from `api.fields` by `Config::loader_config`)
    #[serde(default)]
    pub fields: Vec<String>,
}

impl LoaderConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            initial_batch_size: default_initial_batch_size(),
            batch_size: default_batch_size(),
            page_size: default_page_size(),
            debounce_ms: default_debounce_ms(),
            status: default_status(),
            fields: Vec::new(),
        }
    }
}

fn default_initial_batch_size() -> u32 {
    60
}

fn default_batch_size() -> u32 {
    100
}

fn default_page_size() -> u32 {
    24
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_status() -> ListingStatus {
    ListingStatus::Active
}

impl Config {
    /// Loader settings with the API field projection filled in.
    pub fn loader_config(&self) -> LoaderConfig {
        let mut loader = self.loader.clone();
        if loader.fields.is_empty() {
            loader.fields = self.api.fields.clone();
        }
        loader
    }
}

/// Sanitized config for diagnostics (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub api: SanitizedApiConfig,
    pub cache: CacheConfig,
    pub loader: LoaderConfig,
}

/// Sanitized API config (token hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedApiConfig {
    pub base_url: String,
    pub timeout_secs: u32,
    pub api_token_configured: bool,
    pub fields: Vec<String>,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            api: SanitizedApiConfig {
                base_url: config.api.base_url.clone(),
                timeout_secs: config.api.timeout_secs,
                api_token_configured: config
                    .api
                    .api_token
                    .as_ref()
                    .map(|t| !t.is_empty())
                    .unwrap_or(false),
                fields: config.api.fields.clone(),
            },
            cache: config.cache.clone(),
            loader: config.loader.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_config() {
        let toml = r#"
[api]
base_url = "https://catalog.example.com"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.api.base_url, "https://catalog.example.com");
        assert_eq!(config.api.timeout_secs, 30);
        assert!(config.api.api_token.is_none());
        assert!(config.api.fields.contains(&"catalogGroupId".to_string()));
        assert_eq!(config.cache.ttl_secs, 300);
        assert_eq!(config.loader.initial_batch_size, 60);
        assert_eq!(config.loader.batch_size, 100);
        assert_eq!(config.loader.page_size, 24);
        assert_eq!(config.loader.debounce_ms, 300);
        assert_eq!(config.loader.status, ListingStatus::Active);
    }

    #[test]
    fn test_deserialize_missing_api_fails() {
        let toml = r#"
[loader]
page_size = 12
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_custom_loader() {
        let toml = r#"
[api]
base_url = "http://localhost:4000"
fields = ["listingId", "title"]

[loader]
initial_batch_size = 30
batch_size = 200
debounce_ms = 150
status = "paused"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.loader.initial_batch_size, 30);
        assert_eq!(config.loader.batch_size, 200);
        assert_eq!(config.loader.debounce(), Duration::from_millis(150));
        assert_eq!(config.loader.status, ListingStatus::Paused);

        let loader = config.loader_config();
        assert_eq!(loader.fields, vec!["listingId", "title"]);
    }

    #[test]
    fn test_cache_ttl_duration() {
        let cache = CacheConfig { ttl_secs: 90 };
        assert_eq!(cache.ttl(), Duration::from_secs(90));
    }

    #[test]
    fn test_sanitized_config_hides_token() {
        let toml = r#"
[api]
base_url = "https://catalog.example.com"
api_token = "secret-token"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.api.api_token_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("secret-token"));
    }

    #[test]
    fn test_sanitized_config_without_token() {
        let toml = r#"
[api]
base_url = "https://catalog.example.com"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        assert!(!sanitized.api.api_token_configured);
        assert_eq!(sanitized.cache.ttl_secs, 300);
    }
}
