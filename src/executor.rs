//! Request executor: the single HTTP path for the whole client
//!
//! Every call to the backend goes through `dispatch`, which owns the
//! classification of raw transport failures and HTTP statuses into
//! `ApiError`. Nothing outside this module ever sees a `reqwest::Error`.

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::token::{TokenStore, TOKEN_KEY};
use reqwest::{header, Client, Method, RequestBuilder, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// JSON-over-HTTP executor with bearer injection and error classification
///
/// # Example
///
/// ```rust,no_run
/// use bangsamsir_client::{ClientConfig, MemoryTokenStore, RequestExecutor};
/// use reqwest::Method;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let executor = RequestExecutor::new(
///     ClientConfig::default(),
///     Arc::new(MemoryTokenStore::new()),
/// );
///
/// let health = executor.get("/api/health").await?;
/// let me = executor.execute(Method::GET, "/api/auth/me", None).await?;
/// # Ok(())
/// # }
/// ```
pub struct RequestExecutor {
    config: ClientConfig,
    client: Client,
    tokens: Arc<dyn TokenStore>,
}

impl RequestExecutor {
    /// Create a new executor over the given token store
    pub fn new(config: ClientConfig, tokens: Arc<dyn TokenStore>) -> Self {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        if let Ok(ua) = header::HeaderValue::from_str(&config.user_agent()) {
            headers.insert(header::USER_AGENT, ua);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            config,
            client,
            tokens,
        }
    }

    /// Client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Current bearer token, read fresh from the store
    ///
    /// The token is never cached on the executor, so a login, logout, or
    /// external rotation is visible to the very next request.
    pub async fn bearer(&self) -> Option<String> {
        self.tokens.get(TOKEN_KEY).await
    }

    /// Store handle, shared with the session coordinator
    pub fn tokens(&self) -> Arc<dyn TokenStore> {
        Arc::clone(&self.tokens)
    }

    // ==================== JSON API ====================

    /// Execute a JSON request against `path` (must start with `/`)
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value> {
        let mut builder = self.request(method.clone(), path).await;
        if let Some(body) = body {
            builder = builder
                .header(header::CONTENT_TYPE, "application/json")
                .json(body);
        }
        self.dispatch(&method, path, builder).await
    }

    /// GET `path`
    pub async fn get(&self, path: &str) -> Result<Value> {
        self.execute(Method::GET, path, None).await
    }

    /// POST `path` with a JSON body
    pub async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.execute(Method::POST, path, Some(body)).await
    }

    /// POST `path` with no body
    pub async fn post_empty(&self, path: &str) -> Result<Value> {
        self.execute(Method::POST, path, None).await
    }

    /// PUT `path` with a JSON body
    pub async fn put(&self, path: &str, body: &Value) -> Result<Value> {
        self.execute(Method::PUT, path, Some(body)).await
    }

    /// PATCH `path` with a JSON body
    pub async fn patch(&self, path: &str, body: &Value) -> Result<Value> {
        self.execute(Method::PATCH, path, Some(body)).await
    }

    /// DELETE `path`
    pub async fn delete(&self, path: &str) -> Result<Value> {
        self.execute(Method::DELETE, path, None).await
    }

    // ==================== Request Assembly ====================

    /// Join `path` onto the base URL, tolerating a trailing slash on the base
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Build a request for `path` with the current bearer attached
    pub(crate) async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self.client.request(method, self.url(path));
        if let Some(token) = self.bearer().await {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Like `request`, but with the upload deadline instead of the default
    pub(crate) async fn upload_request(&self, method: Method, path: &str) -> RequestBuilder {
        self.request(method, path)
            .await
            .timeout(self.config.upload_timeout)
    }

    /// Send a prepared request and classify the outcome
    ///
    /// `method` and `path` are threaded through for logging only; the
    /// builder already carries them.
    pub(crate) async fn dispatch(
        &self,
        method: &Method,
        path: &str,
        builder: RequestBuilder,
    ) -> Result<Value> {
        let started = Instant::now();

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                let err = ApiError::from_transport(e);
                warn!(
                    method = %method,
                    path = path,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %err,
                    "Request failed before a response"
                );
                return Err(err);
            }
        };

        let status = response.status();
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if status == StatusCode::UNAUTHORIZED {
            let message = error_body(response).await;
            warn!(
                method = %method,
                path = path,
                status = status.as_u16(),
                elapsed_ms = elapsed_ms,
                "Request unauthorized"
            );
            return Err(ApiError::Unauthorized(message));
        }

        if !status.is_success() {
            let message = error_body(response).await;
            warn!(
                method = %method,
                path = path,
                status = status.as_u16(),
                elapsed_ms = elapsed_ms,
                "Request failed"
            );
            return Err(ApiError::Server {
                status: status.as_u16(),
                message,
            });
        }

        debug!(
            method = %method,
            path = path,
            status = status.as_u16(),
            elapsed_ms = elapsed_ms,
            "Request ok"
        );

        match response.json().await {
            Ok(value) => Ok(value),
            Err(e) => Err(ApiError::Malformed(e.to_string())),
        }
    }
}

/// Extract a human-readable message from an error response body.
///
/// Tries the JSON `message`/`error` fields first, then falls back to the
/// raw text.
async fn error_body(response: reqwest::Response) -> String {
    let text = response.text().await.unwrap_or_default();

    if let Ok(value) = serde_json::from_str::<Value>(&text) {
        if let Some(message) = value.get("message").and_then(|m| m.as_str()) {
            return message.to_string();
        }
        if let Some(message) = value.get("error").and_then(|m| m.as_str()) {
            return message.to_string();
        }
    }

    if text.is_empty() {
        "Unknown error".to_string()
    } else {
        text
    }
}

/// Build a query string from `key=value` pairs, `?`-prefixed, or empty
pub(crate) fn query_string(params: &[String]) -> String {
    if params.is_empty() {
        String::new()
    } else {
        format!("?{}", params.join("&"))
    }
}
