use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - API section exists (enforced by serde)
/// - base_url is an http(s) URL
/// - cache TTL and loader sizes are non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let base_url = config.api.base_url.trim();
    if base_url.is_empty() {
        return Err(ConfigError::ValidationError(
            "api.base_url cannot be empty".to_string(),
        ));
    }
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::ValidationError(format!(
            "api.base_url must be an http(s) URL, got '{}'",
            base_url
        )));
    }

    if config.cache.ttl_secs == 0 {
        return Err(ConfigError::ValidationError(
            "cache.ttl_secs cannot be 0".to_string(),
        ));
    }

    let loader = &config.loader;
    for (name, value) in [
        ("loader.initial_batch_size", loader.initial_batch_size),
        ("loader.batch_size", loader.batch_size),
        ("loader.page_size", loader.page_size),
    ] {
        if value == 0 {
            return Err(ConfigError::ValidationError(format!("{} cannot be 0", name)));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, CacheConfig, LoaderConfig};

    fn config_with_url(url: &str) -> Config {
        Config {
            api: ApiConfig {
                base_url: url.to_string(),
                timeout_secs: 30,
                api_token: None,
                fields: Vec::new(),
            },
            cache: CacheConfig::default(),
            loader: LoaderConfig::default(),
        }
    }

    #[test]
    fn test_validate_valid_config() {
        let config = config_with_url("https://catalog.example.com");
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_empty_base_url_fails() {
        let config = config_with_url("  ");
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_non_http_base_url_fails() {
        let config = config_with_url("ftp://catalog.example.com");
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_ttl_fails() {
        let mut config = config_with_url("http://localhost:4000");
        config.cache.ttl_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_page_size_fails() {
        let mut config = config_with_url("http://localhost:4000");
        config.loader.page_size = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("loader.page_size"));
    }
}
