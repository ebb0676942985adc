//! CMS REST API client.
//!
//! Provides authenticated HTTP communication with the WordPress backend that
//! stores orders, services, pickup slots, camps and payment methods. All
//! callers go through the [`AdminBackend`] trait so the join and view logic
//! can run against an in-memory backend in tests.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{AdminConfig, DEFAULT_PER_PAGE};
use crate::error::{ApiError, ApiResult};
use crate::storage::CredentialProvider;

/// Remote collections exposed by the CMS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Order,
    Service,
    PickupSlot,
    Camp,
    PaymentMethod,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Order => "order",
            Collection::Service => "service",
            Collection::PickupSlot => "pickup_slot",
            Collection::Camp => "camp",
            Collection::PaymentMethod => "payment_method",
        }
    }
}

/// Everything the core needs from the backend.
#[async_trait]
pub trait AdminBackend: Send + Sync {
    /// Perform an authenticated request. `path` is relative to the REST root,
    /// e.g. `service/12`.
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> ApiResult<Value>;

    /// Upload a file to the media library and return the created media record.
    async fn upload_media(&self, file_name: &str, bytes: Vec<u8>) -> ApiResult<Value>;

    fn per_page(&self) -> u32 {
        DEFAULT_PER_PAGE
    }

    async fn get_collection(&self, collection: Collection) -> ApiResult<Value> {
        let path = format!("{}?per_page={}", collection.as_str(), self.per_page());
        self.request(Method::GET, &path, None).await
    }

    async fn update_order_status(&self, order_id: u64, status: &str) -> ApiResult<Value> {
        let body = serde_json::json!({
            "order_id": order_id,
            "order_status": status,
        });
        self.request(Method::POST, "update_order_status", Some(body))
            .await
    }
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Convert a `reqwest::Error` into a user-friendly message.
fn friendly_error(url: &str, err: &reqwest::Error) -> ApiError {
    let message = if err.is_connect() {
        format!("Cannot reach the admin backend at {url}")
    } else if err.is_timeout() {
        format!("Connection to {url} timed out")
    } else if err.is_builder() {
        format!("Invalid admin backend URL: {url}")
    } else {
        format!("Network error communicating with {url}: {err}")
    };
    ApiError::Network(message)
}

/// Convert an HTTP status code into a user-friendly message.
fn status_error(status: StatusCode) -> String {
    match status.as_u16() {
        401 => "Authentication token is invalid or expired".to_string(),
        403 => "Not authorized for this action".to_string(),
        404 => "Admin backend endpoint not found".to_string(),
        s if s >= 500 => format!("Admin backend server error (HTTP {s})"),
        s => format!("Unexpected response from admin backend (HTTP {s})"),
    }
}

/// Build the error for a non-success response, preferring the backend's own
/// `message` (WordPress) or `error` field.
pub(crate) fn error_from_body(status: StatusCode, body_text: &str) -> ApiError {
    let message = serde_json::from_str::<Value>(body_text)
        .ok()
        .and_then(|json| {
            json.get("message")
                .or_else(|| json.get("error"))
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string())
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| status_error(status));
    ApiError::Backend {
        status: status.as_u16(),
        message,
    }
}

/// Parse a success body. Empty bodies (and 204) read as `{ "success": true }`.
pub(crate) fn parse_success_body(status: StatusCode, body_text: &str) -> ApiResult<Value> {
    if status == StatusCode::NO_CONTENT || body_text.trim().is_empty() {
        return Ok(serde_json::json!({ "success": true }));
    }
    serde_json::from_str(body_text).map_err(|e| ApiError::InvalidPayload(e.to_string()))
}

fn guess_content_type(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    config: AdminConfig,
    credentials: Arc<dyn CredentialProvider>,
}

impl ApiClient {
    pub fn new(
        config: AdminConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> ApiResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            config,
            credentials,
        })
    }

    pub fn config(&self) -> &AdminConfig {
        &self.config
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    fn bearer(&self) -> ApiResult<String> {
        self.credentials
            .token()
            .map(|t| format!("Bearer {t}"))
            .ok_or(ApiError::MissingToken)
    }

    async fn finish(&self, url: &str, resp: reqwest::Response) -> ApiResult<Value> {
        let status = resp.status();
        let body_text = resp.text().await.map_err(|e| friendly_error(url, &e))?;
        if !status.is_success() {
            let err = error_from_body(status, &body_text);
            warn!(url, status = status.as_u16(), error = %err, "admin backend request failed");
            return Err(err);
        }
        parse_success_body(status, &body_text)
    }
}

#[async_trait]
impl AdminBackend for ApiClient {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> ApiResult<Value> {
        let auth = self.bearer()?;
        let url = self.config.rest_url(path);
        debug!(%method, url = %url, "admin backend request");

        let mut req = self
            .http
            .request(method, &url)
            .header(reqwest::header::AUTHORIZATION, auth);
        if let Some(b) = body {
            req = req.json(&b);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| friendly_error(&self.config.site_url, &e))?;
        self.finish(&url, resp).await
    }

    async fn upload_media(&self, file_name: &str, bytes: Vec<u8>) -> ApiResult<Value> {
        let auth = self.bearer()?;
        let url = self.config.rest_url("media");
        debug!(url = %url, file_name, size = bytes.len(), "uploading media");

        let resp = self
            .http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, auth)
            .header(reqwest::header::CONTENT_TYPE, guess_content_type(file_name))
            .header(
                reqwest::header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name.replace('"', "")),
            )
            .body(bytes)
            .send()
            .await
            .map_err(|e| friendly_error(&self.config.site_url, &e))?;
        self.finish(&url, resp).await
    }

    fn per_page(&self) -> u32 {
        self.config.per_page
    }
}
