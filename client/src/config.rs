//! Client configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::path::PathBuf;
use std::time::Duration;

use crate::net::error::ApiError;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PROFILE_CACHE: &str = ".vidshare/profile.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Timeouts {
    #[must_use]
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    #[must_use]
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root including the version prefix, without a trailing slash.
    pub api_url: String,
    pub timeouts: Timeouts,
    pub profile_cache: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            timeouts: Timeouts::default(),
            profile_cache: PathBuf::from(DEFAULT_PROFILE_CACHE),
        }
    }
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `VIDSHARE_API_URL`: default `http://localhost:8000/api/v1`
    /// - `VIDSHARE_REQUEST_TIMEOUT_SECS`: default 30
    /// - `VIDSHARE_CONNECT_TIMEOUT_SECS`: default 10
    /// - `VIDSHARE_PROFILE_CACHE`: default `.vidshare/profile.json`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] when the API URL is not http(s).
    pub fn from_env() -> Result<Self, ApiError> {
        let api_url = normalize_api_url(
            &std::env::var("VIDSHARE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_owned()),
        )?;
        let timeouts = Timeouts {
            request_secs: env_parse_u64("VIDSHARE_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("VIDSHARE_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        let profile_cache = std::env::var("VIDSHARE_PROFILE_CACHE")
            .map_or_else(|_| PathBuf::from(DEFAULT_PROFILE_CACHE), PathBuf::from);

        Ok(Self { api_url, timeouts, profile_cache })
    }
}

/// Trim whitespace and trailing slashes, and reject non-http(s) URLs.
///
/// # Errors
///
/// Returns [`ApiError::Config`] for an empty or non-http(s) URL.
pub fn normalize_api_url(raw: &str) -> Result<String, ApiError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ApiError::Config(format!("VIDSHARE_API_URL must be http(s): '{raw}'")));
    }
    Ok(trimmed.to_owned())
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}
