//! REST API client for the `/usuarios` endpoints.
//!
//! ERROR HANDLING
//! ==============
//! Every call returns `Result<_, ApiError>` and never panics. Error bodies
//! are decoded fail-safe: a non-JSON error page still yields
//! `ApiError::Rejected` with `detail: None` so handlers show generic text.
//! Success bodies are read in full before any field is used.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use tracing::{debug, warn};

use super::types::{Credentials, LoginResponse, UserInfo, decode_error_detail};
use crate::config::PortalConfig;
use crate::error::ApiError;

/// Calls the page handlers make against the backend. Implemented by
/// [`ApiClient`]; tests substitute scripted doubles.
#[async_trait]
pub trait UserApi: Send + Sync {
    /// `POST /usuarios/login` with the credentials as JSON.
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError>;

    /// `GET /usuarios/{username}`. `Ok(None)` means the lookup succeeded
    /// but the body was not a recognizable profile.
    async fn fetch_user(&self, username: &str) -> Result<Option<UserInfo>, ApiError>;

    /// `POST /usuarios/logout`.
    async fn logout(&self) -> Result<(), ApiError>;
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Build a client for `config.api_base_url` with the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &PortalConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.api_base_url.clone() })
    }

    /// Join path segments onto the base URL, percent-encoding each one.
    /// `.` and `..` cannot be expressed as a single segment (URL parsing
    /// resolves them, even as `%2E%2E`) and are dropped; see
    /// [`is_dot_segment`].
    #[must_use]
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn read_body(response: reqwest::Response) -> Result<(StatusCode, String), ApiError> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok((status, text))
    }
}

#[async_trait]
impl UserApi for ApiClient {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        let url = self.endpoint(&["usuarios", "login"]);
        debug!(%url, username = %credentials.username, "login request");

        let response = self
            .http
            .post(url)
            .json(credentials)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let (status, text) = Self::read_body(response).await?;

        if !status.is_success() {
            let detail = decode_error_detail(&text);
            warn!(status = status.as_u16(), ?detail, "login rejected");
            return Err(ApiError::Rejected { status: status.as_u16(), detail });
        }

        parse_login_response(&text)
    }

    async fn fetch_user(&self, username: &str) -> Result<Option<UserInfo>, ApiError> {
        if is_dot_segment(username) {
            warn!(%username, "username cannot be sent as a path segment; treating as unknown user");
            return Err(ApiError::NotFound { username: username.to_owned() });
        }
        let url = self.endpoint(&["usuarios", username]);
        debug!(%url, "user info request");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let (status, text) = Self::read_body(response).await?;

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound { username: username.to_owned() });
        }
        if !status.is_success() {
            let detail = decode_error_detail(&text);
            warn!(status = status.as_u16(), ?detail, "user info request rejected");
            return Err(ApiError::Rejected { status: status.as_u16(), detail });
        }

        Ok(parse_user_info(&text))
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let url = self.endpoint(&["usuarios", "logout"]);
        debug!(%url, "logout notification");

        let response = self
            .http
            .post(url)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Rejected { status: status.as_u16(), detail: None });
        }
        Ok(())
    }
}

/// True for `.` and `..`, which a URL path resolves instead of keeping.
#[must_use]
pub fn is_dot_segment(segment: &str) -> bool {
    matches!(segment, "." | "..")
}

// =============================================================================
// PARSING
// =============================================================================

fn parse_login_response(json: &str) -> Result<LoginResponse, ApiError> {
    let resp: LoginResponse = serde_json::from_str(json).map_err(|e| ApiError::Decode(e.to_string()))?;
    if resp.username.is_empty() {
        return Err(ApiError::Decode("login response has empty username".to_owned()));
    }
    Ok(resp)
}

fn parse_user_info(json: &str) -> Option<UserInfo> {
    match serde_json::from_str(json) {
        Ok(info) => Some(info),
        Err(e) => {
            debug!(error = %e, "user info body not a profile; treating lookup as plain success");
            None
        }
    }
}
