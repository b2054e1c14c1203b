//! API error type shared by the transport, the session layer, and pages.
//!
//! Payloads are strings so the error stays `Clone`: a failed session refresh
//! is fanned out to every request that was waiting on it.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

pub const DEFAULT_ERROR_MESSAGE: &str = "Something went wrong";

/// Errors produced by API client operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The request never produced a response (connect, TLS, timeout).
    #[error("request failed: {0}")]
    Transport(String),

    /// The response body could not be decoded into the expected shape.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// The request could not be built (bad multipart part, bad header).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    Config(String),

    /// Session refresh failed; the user has to log in again.
    #[error("session expired: {reason}")]
    SessionExpired { reason: String },

    /// The request was queued behind a refresh that was abandoned.
    #[error("request cancelled before completion")]
    Cancelled,
}

impl ApiError {
    /// `true` for an HTTP 401 from the backend.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Http { status: 401, .. })
    }

    #[must_use]
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired { .. })
    }

    /// Whether offering the user a retry action makes sense.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Cancelled | Self::Http { status: 408 | 429 | 500..=599, .. })
    }

    /// HTTP status when the backend produced one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
