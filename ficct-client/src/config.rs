//! HTTP client configuration

use ficct_core::{ApiConfig, ErrorContext, FicctError, FicctResult, DEFAULT_API_URL};
use std::collections::HashMap;

/// Configuration for the API gateway
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL every endpoint is appended to
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
    /// Additional headers sent with every request
    pub headers: HashMap<String, String>,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self::from_api_config(&ApiConfig::default())
    }
}

impl ApiClientConfig {
    /// Build from the `[api]` configuration section
    pub fn from_api_config(api: &ApiConfig) -> Self {
        Self {
            base_url: api.resolved_base_url(),
            timeout_seconds: api.timeout_seconds,
            user_agent: api.user_agent.clone(),
            headers: HashMap::new(),
        }
    }

    /// Override the base URL; a blank value keeps the default
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let trimmed = base_url.trim().trim_end_matches('/');
        self.base_url = if trimmed.is_empty() {
            DEFAULT_API_URL.to_string()
        } else {
            trimmed.to_string()
        };
        self
    }

    /// Set additional header
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }
}

/// Create the underlying HTTP client
pub(crate) fn create_http_client(config: &ApiClientConfig) -> FicctResult<reqwest::Client> {
    let mut headers = reqwest::header::HeaderMap::new();

    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_str(&config.user_agent).map_err(|e| {
            FicctError::Config {
                message: format!("Invalid user agent: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            }
        })?,
    );

    for (key, value) in &config.headers {
        let header_name = reqwest::header::HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
            FicctError::Config {
                message: format!("Invalid header name '{}': {}", key, e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            }
        })?;

        let header_value =
            reqwest::header::HeaderValue::from_str(value).map_err(|e| FicctError::Config {
                message: format!("Invalid header value for '{}': {}", key, e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            })?;

        headers.insert(header_name, header_value);
    }

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_seconds))
        .default_headers(headers)
        .build()
        .map_err(|e| FicctError::Config {
            message: format!("Failed to create HTTP client: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("http_client").with_operation("create_client"),
        })?;

    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_uses_single_fallback() {
        assert_eq!(ApiClientConfig::default().base_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_with_base_url() {
        let config = ApiClientConfig::default().with_base_url("https://ficct.example.edu/api/");
        assert_eq!(config.base_url, "https://ficct.example.edu/api");

        let config = ApiClientConfig::default().with_base_url("  ");
        assert_eq!(config.base_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_invalid_header_is_config_error() {
        let config = ApiClientConfig::default().with_header("bad header".into(), "x".into());
        assert!(matches!(
            create_http_client(&config),
            Err(FicctError::Config { .. })
        ));
    }
}
