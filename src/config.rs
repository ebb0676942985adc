//! Backend location and client tuning.

use std::time::Duration;

use tracing::debug;

use crate::storage;

pub const DEFAULT_SITE_URL: &str = "https://amalaundry.com.au";

/// Environment override for the site URL when nothing is stored.
pub const SITE_URL_ENV: &str = "LAUNDRY_ADMIN_URL";

/// Page size requested for every collection fetch.
pub const DEFAULT_PER_PAGE: u32 = 100;

/// Default timeout for API requests (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const REST_PREFIX: &str = "/wp-json/wp/v2";
const TOKEN_PATH: &str = "/wp-json/jwt-auth/v1/token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminConfig {
    pub site_url: String,
    pub per_page: u32,
    pub timeout: Duration,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SITE_URL)
    }
}

impl AdminConfig {
    pub fn new(site_url: &str) -> Self {
        Self {
            site_url: normalize_site_url(site_url),
            per_page: DEFAULT_PER_PAGE,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Resolve the site URL: credential store, then environment, then default.
    pub fn load() -> Self {
        let stored = storage::get_credential(storage::KEY_SITE_URL);
        let (source, url) = resolve_site_url(stored, env_site_url());
        let config = Self::new(&url);
        debug!(source, site_url = %config.site_url, "admin config loaded");
        config
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    /// Full URL of a REST resource, e.g. `service/12` or `camp?per_page=100`.
    pub fn rest_url(&self, path: &str) -> String {
        format!(
            "{}{}/{}",
            self.site_url,
            REST_PREFIX,
            path.trim_start_matches('/')
        )
    }

    pub fn token_url(&self) -> String {
        format!("{}{}", self.site_url, TOKEN_PATH)
    }
}

fn env_site_url() -> Option<String> {
    std::env::var(SITE_URL_ENV).ok()
}

/// First non-blank candidate wins. Returns the source name with the URL.
fn resolve_site_url(stored: Option<String>, env: Option<String>) -> (&'static str, String) {
    let non_blank = |u: Option<String>| u.filter(|u| !u.trim().is_empty());
    if let Some(url) = non_blank(stored) {
        ("credential_store", url)
    } else if let Some(url) = non_blank(env) {
        ("environment", url)
    } else {
        ("default", DEFAULT_SITE_URL.to_string())
    }
}

/// Normalise the CMS site URL:
/// - ensure a scheme is present (https, or http for localhost)
/// - strip trailing slashes
/// - strip a trailing `/wp-json` segment (and `/wp-json/wp/v2`)
pub fn normalize_site_url(url: &str) -> String {
    let mut url = url.trim().to_string();

    if !url.starts_with("http://") && !url.starts_with("https://") {
        if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
            url = format!("http://{url}");
        } else {
            url = format!("https://{url}");
        }
    }

    while url.ends_with('/') {
        url.pop();
    }

    for suffix in [REST_PREFIX, "/wp-json"] {
        if url.ends_with(suffix) {
            url.truncate(url.len() - suffix.len());
        }
    }

    while url.ends_with('/') {
        url.pop();
    }

    url
}
