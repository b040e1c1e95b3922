//! API Gateway
//!
//! The single path every backend call takes. It sets the JSON headers,
//! injects the bearer token from the session store, and folds whatever
//! comes back (or fails to) into an [`ApiResponse`]. It never returns an
//! error to its caller.

use crate::config::{create_http_client, ApiClientConfig};
use crate::envelope::ApiResponse;
use crate::pagination::PageQuery;
use ficct_core::{FicctConfig, FicctResult};
use ficct_session::SessionStore;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Per-request options
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    /// Merged over the default headers
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            body: None,
            headers: Vec::new(),
            query: Vec::new(),
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: Value) -> Self {
        Self::with_body(Method::POST, body)
    }

    pub fn put(body: Value) -> Self {
        Self::with_body(Method::PUT, body)
    }

    pub fn patch(body: Value) -> Self {
        Self::with_body(Method::PATCH, body)
    }

    pub fn delete() -> Self {
        Self {
            method: Method::DELETE,
            ..Self::default()
        }
    }

    fn with_body(method: Method, body: Value) -> Self {
        Self {
            method,
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn page(mut self, page: &PageQuery) -> Self {
        self.query.extend(page.to_pairs());
        self
    }
}

/// Gateway to the FICCT REST API
#[derive(Clone)]
pub struct ApiGateway {
    client: reqwest::Client,
    config: ApiClientConfig,
    session: SessionStore,
}

impl ApiGateway {
    pub fn new(config: ApiClientConfig, session: SessionStore) -> FicctResult<Self> {
        let client = create_http_client(&config)?;

        info!("Created FICCT API gateway for {}", config.base_url);

        Ok(Self {
            client,
            config,
            session,
        })
    }

    pub fn from_config(config: &FicctConfig, session: SessionStore) -> FicctResult<Self> {
        Self::new(ApiClientConfig::from_api_config(&config.api), session)
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub(crate) fn url_for(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    /// Defaults, then caller headers, then the bearer token
    fn headers_for(&self, options: &RequestOptions) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        for (key, value) in &options.headers {
            match (
                HeaderName::from_bytes(key.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => warn!("Skipping invalid request header '{}'", key),
            }
        }

        if let Some(token) = self.session.token() {
            match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => warn!("Stored token is not a valid header value, sending without it"),
            }
        }

        headers
    }

    /// Issue a request and normalize the outcome
    pub async fn request(&self, endpoint: &str, options: RequestOptions) -> ApiResponse<Value> {
        let url = self.url_for(endpoint);
        debug!("{} {}", options.method, url);

        let mut builder = self
            .client
            .request(options.method.clone(), &url)
            .headers(self.headers_for(&options));
        if !options.query.is_empty() {
            builder = builder.query(&options.query);
        }
        if let Some(body) = &options.body {
            builder = builder.body(body.to_string());
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(endpoint = endpoint, error = %e, "Request failed before a response");
                return ApiResponse::connection_error();
            }
        };

        let status = response.status().as_u16();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                warn!(endpoint = endpoint, status, error = %e, "Failed to read response body");
                return ApiResponse {
                    status: Some(status),
                    ..ApiResponse::connection_error()
                };
            }
        };

        if body.iter().all(u8::is_ascii_whitespace) {
            return ApiResponse::from_empty(status);
        }

        match serde_json::from_slice::<Value>(&body) {
            Ok(value) => {
                let normalized = ApiResponse::from_body(status, value);
                if !normalized.is_success() {
                    debug!(
                        endpoint = endpoint,
                        status,
                        message = normalized.message.as_deref().unwrap_or_default(),
                        "Server reported failure"
                    );
                }
                normalized
            }
            Err(e) => {
                warn!(endpoint = endpoint, status, error = %e, "Response body is not JSON");
                ApiResponse {
                    status: Some(status),
                    ..ApiResponse::connection_error()
                }
            }
        }
    }

    /// Issue a request and deserialize `data` into `T`
    pub async fn request_as<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> ApiResponse<T> {
        self.request(endpoint, options).await.into_typed()
    }

    /// Issue a request that is abandoned when `cancel` fires
    pub async fn request_with_cancel(
        &self,
        endpoint: &str,
        options: RequestOptions,
        cancel: &CancellationToken,
    ) -> ApiResponse<Value> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(endpoint = endpoint, "Request cancelled");
                ApiResponse::cancelled()
            }
            response = self.request(endpoint, options) => response,
        }
    }

    pub async fn get(&self, endpoint: &str) -> ApiResponse<Value> {
        self.request(endpoint, RequestOptions::get()).await
    }
}

impl std::fmt::Debug for ApiGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiGateway")
            .field("base_url", &self.config.base_url)
            .field("session", &self.session)
            .finish()
    }
}
