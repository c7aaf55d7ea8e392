//! Portal configuration parsed from environment variables.
//!
//! The API base URL is fixed for the life of the process; nothing mutates a
//! `PortalConfig` after startup.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;

use crate::error::ConfigError;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_STORAGE_PATH: &str = ".portal/local_storage.json";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LOGOUT_GRACE_MS: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    pub api_base_url: Url,
    pub storage_path: PathBuf,
    pub timeouts: Timeouts,
    /// How long the CLI host waits on the logout notification before exiting.
    pub logout_grace: Duration,
}

impl PortalConfig {
    /// Build typed portal config from environment variables.
    ///
    /// Optional:
    /// - `API_BASE_URL`: default `http://127.0.0.1:8000`
    /// - `PORTAL_STORAGE_PATH`: default `.portal/local_storage.json`
    /// - `PORTAL_REQUEST_TIMEOUT_SECS`: default 30
    /// - `PORTAL_CONNECT_TIMEOUT_SECS`: default 10
    /// - `PORTAL_LOGOUT_GRACE_MS`: default 500
    ///
    /// # Errors
    ///
    /// Returns an error if `API_BASE_URL` is not an absolute http(s) URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`PortalConfig::from_env`], but a `base_url` given by the caller
    /// replaces `API_BASE_URL` before anything is parsed.
    ///
    /// # Errors
    ///
    /// Returns an error if the effective base URL is not an absolute http(s) URL.
    pub fn from_env_with_base_url(base_url: Option<&str>) -> Result<Self, ConfigError> {
        Self::from_lookup(with_base_url(|key| std::env::var(key).ok(), base_url))
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = parse_base_url(lookup("API_BASE_URL").as_deref().unwrap_or(DEFAULT_API_BASE_URL))?;
        let storage_path = lookup("PORTAL_STORAGE_PATH")
            .filter(|raw| !raw.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_STORAGE_PATH), PathBuf::from);
        let timeouts = Timeouts {
            request_secs: parse_u64(lookup("PORTAL_REQUEST_TIMEOUT_SECS"), DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_u64(lookup("PORTAL_CONNECT_TIMEOUT_SECS"), DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        let logout_grace = Duration::from_millis(parse_u64(lookup("PORTAL_LOGOUT_GRACE_MS"), DEFAULT_LOGOUT_GRACE_MS));

        Ok(Self { api_base_url, storage_path, timeouts, logout_grace })
    }

    /// Config pointing at `base_url` with every other field defaulted.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute http(s) URL.
    pub fn for_base_url(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: parse_base_url(base_url)?,
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            timeouts: Timeouts::default(),
            logout_grace: Duration::from_millis(DEFAULT_LOGOUT_GRACE_MS),
        })
    }
}

fn with_base_url<'a, F>(lookup: F, base_url: Option<&'a str>) -> impl Fn(&str) -> Option<String> + 'a
where
    F: Fn(&str) -> Option<String> + 'a,
{
    move |key| match base_url {
        Some(url) if key == "API_BASE_URL" => Some(url.to_owned()),
        _ => lookup(key),
    }
}

fn parse_u64(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok()).unwrap_or(default)
}

/// Parse and normalize the API origin. Trailing slashes are dropped so
/// endpoint paths join cleanly.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidBaseUrl`] for relative, non-http, or
/// otherwise unparseable input.
pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let invalid = |reason: String| ConfigError::InvalidBaseUrl { value: raw.to_owned(), reason };

    let url = Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("URL cannot be a base".to_owned()));
    }
    Ok(url)
}
