//! Admin login against the CMS JWT endpoint.
//!
//! A successful login stores the bearer token in the credential store; every
//! later request picks it up through [`crate::storage::CredentialProvider`].
//! Tokens whose `exp` claim has passed are treated as absent.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::storage::KeyringStore;

const LOGIN_FAILED: &str = "Login failed. Check credentials.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub user_nicename: Option<String>,
    #[serde(default)]
    pub user_display_name: Option<String>,
}

/// Read the token endpoint's reply.
pub(crate) fn parse_login_response(
    status: StatusCode,
    body_text: &str,
) -> ApiResult<LoginResponse> {
    let json = serde_json::from_str::<Value>(body_text);
    if !status.is_success() {
        return Err(login_failure(status, json.ok().as_ref()));
    }

    let json = json.map_err(|e| ApiError::InvalidPayload(e.to_string()))?;
    let has_token = json
        .get("token")
        .and_then(Value::as_str)
        .is_some_and(|t| !t.trim().is_empty());
    if !has_token {
        return Err(login_failure(status, Some(&json)));
    }

    serde_json::from_value(json).map_err(|e| ApiError::InvalidPayload(e.to_string()))
}

fn login_failure(status: StatusCode, json: Option<&Value>) -> ApiError {
    // The plugin returns HTML-formatted messages such as
    // "<strong>Error:</strong> The password you entered ..."
    let message = json
        .and_then(|j| j.get("message"))
        .and_then(Value::as_str)
        .map(strip_tags)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| LOGIN_FAILED.to_string());
    ApiError::Backend {
        status: status.as_u16(),
        message,
    }
}

fn strip_tags(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_tag = false;
    for c in raw.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.trim().to_string()
}

/// Log in and store the returned token.
pub async fn login(
    client: &ApiClient,
    store: &KeyringStore,
    username: &str,
    password: &str,
) -> ApiResult<LoginResponse> {
    let url = client.config().token_url();
    let resp = client
        .http()
        .post(&url)
        .json(&serde_json::json!({ "username": username, "password": password }))
        .send()
        .await
        .map_err(|e| {
            warn!(error = %e, "login request failed");
            ApiError::Network(
                "Could not connect to the authentication server. Check network settings."
                    .to_string(),
            )
        })?;

    let status = resp.status();
    let body_text = resp
        .text()
        .await
        .map_err(|e| ApiError::Network(e.to_string()))?;
    let login = parse_login_response(status, &body_text)?;

    store.store_token(&login.token)?;
    info!(user = ?login.user_nicename, "admin logged in");
    Ok(login)
}

pub fn logout(store: &KeyringStore) -> ApiResult<()> {
    store.clear_token()?;
    info!("logged out");
    Ok(())
}

/// Expiry time from a JWT's `exp` claim, if the token carries one.
pub fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.get("exp").and_then(Value::as_i64)?;
    DateTime::from_timestamp(exp, 0)
}

/// Tokens without a readable `exp` are left for the backend to judge.
pub fn is_token_expired(token: &str, now: DateTime<Utc>) -> bool {
    token_expiry(token).is_some_and(|exp| exp <= now)
}
