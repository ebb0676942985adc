//! Credential storage using the OS credential store.
//!
//! On Windows this uses the Credential Manager (via the `keyring` crate), on
//! macOS Keychain, and on Linux the Secret Service API. The bearer token and
//! the CMS site URL live here.

use keyring::Entry;
use tracing::{debug, info, warn};

use crate::error::ApiError;

const SERVICE_NAME: &str = "laundry-admin";

// Credential keys
pub(crate) const KEY_TOKEN: &str = "jwt";
pub(crate) const KEY_SITE_URL: &str = "admin_site_url";

/// All credential keys managed by this module.
const ALL_KEYS: &[&str] = &[KEY_TOKEN, KEY_SITE_URL];

// ---------------------------------------------------------------------------
// Low-level helpers
// ---------------------------------------------------------------------------

/// Retrieve a single credential from the OS keyring. Returns `None` when the
/// entry does not exist (or the platform returns a "not found" error).
pub fn get_credential(key: &str) -> Option<String> {
    let entry = match Entry::new(SERVICE_NAME, key) {
        Ok(e) => e,
        Err(e) => {
            warn!(key, error = %e, "keyring: failed to create entry");
            return None;
        }
    };
    match entry.get_password() {
        Ok(pw) => Some(pw),
        Err(keyring::Error::NoEntry) => None,
        Err(e) => {
            warn!(key, error = %e, "keyring: failed to read credential");
            None
        }
    }
}

/// Store a credential in the OS keyring.
pub fn set_credential(key: &str, value: &str) -> Result<(), ApiError> {
    let entry = Entry::new(SERVICE_NAME, key).map_err(|e| ApiError::Storage(e.to_string()))?;
    entry
        .set_password(value)
        .map_err(|e| ApiError::Storage(e.to_string()))
}

/// Delete a credential from the OS keyring. Silently succeeds if the entry
/// does not exist.
pub fn delete_credential(key: &str) -> Result<(), ApiError> {
    let entry = Entry::new(SERVICE_NAME, key).map_err(|e| ApiError::Storage(e.to_string()))?;
    match entry.delete_credential() {
        Ok(()) => Ok(()),
        Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(ApiError::Storage(e.to_string())),
    }
}

/// Delete every stored credential.
pub fn factory_reset() -> Result<(), ApiError> {
    info!("deleting all stored credentials");
    for key in ALL_KEYS {
        delete_credential(key)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Token access
// ---------------------------------------------------------------------------

/// Source of the bearer token attached to every backend request.
///
/// Passed explicitly into [`crate::api::ApiClient`]; `None` means the user is
/// not logged in and the request must not be attempted.
pub trait CredentialProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// Token provider backed by the OS keyring.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringStore;

impl KeyringStore {
    pub fn store_token(&self, token: &str) -> Result<(), ApiError> {
        set_credential(KEY_TOKEN, token)
    }

    pub fn clear_token(&self) -> Result<(), ApiError> {
        delete_credential(KEY_TOKEN)
    }
}

impl CredentialProvider for KeyringStore {
    fn token(&self) -> Option<String> {
        let token = get_credential(KEY_TOKEN)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        match token {
            Some(t) if crate::auth::is_token_expired(&t, chrono::Utc::now()) => {
                debug!("stored token has expired");
                None
            }
            Some(t) => Some(t),
            None => {
                warn!("JWT token not found. User may not be logged in.");
                None
            }
        }
    }
}

/// Fixed token, for tools and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(pub Option<String>);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn absent() -> Self {
        Self(None)
    }
}

impl CredentialProvider for StaticToken {
    fn token(&self) -> Option<String> {
        self.0.clone()
    }
}
