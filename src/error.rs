//! Error types shared across the portal.
//!
//! ERROR HANDLING
//! ==============
//! Every error is contained to the handler that triggered it. Handlers turn
//! these into user-facing text; nothing here is retried or fatal.

// =============================================================================
// API
// =============================================================================

/// Errors produced by calls against the `/usuarios` API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (connect failure, timeout).
    #[error("API request failed: {0}")]
    Transport(String),

    /// A success response carried a body that could not be decoded.
    #[error("API response parse failed: {0}")]
    Decode(String),

    /// The API answered with a non-success status.
    #[error("API rejected request: status {status}")]
    Rejected { status: u16, detail: Option<String> },

    /// The requested user does not exist (HTTP 404 on user lookup).
    #[error("user not found: {username}")]
    NotFound { username: String },

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    /// True for failures where the server never gave a usable answer.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Decode(_) | Self::HttpClientBuild(_))
    }

    /// Server-provided `detail` text, when the error carried one.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Rejected { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

// =============================================================================
// STORAGE
// =============================================================================

/// Errors produced by the identity store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backing file could not be read or written.
    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file exists but is not a JSON object of strings.
    #[error("storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// An in-memory store lock was poisoned by a panicking writer.
    #[error("storage lock poisoned")]
    Poisoned,
}

// =============================================================================
// CONFIG
// =============================================================================

/// Errors produced while building [`crate::config::PortalConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `API_BASE_URL` is not an absolute http(s) URL.
    #[error("invalid API base URL '{value}': {reason}")]
    InvalidBaseUrl { value: String, reason: String },
}
