//! On-disk cache of the last known user profile.
//!
//! The session itself lives in httpOnly cookies; this cache only lets a new
//! process show who is logged in before the first API call completes.

#[cfg(test)]
#[path = "profile_cache_test.rs"]
mod profile_cache_test;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::net::types::User;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("profile cache io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("profile cache encode failed: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Clone, Debug)]
pub struct ProfileCache {
    path: PathBuf,
}

impl ProfileCache {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cached user. A missing file is `None`; an unreadable or
    /// corrupt file is removed and reported as `None`.
    pub async fn load(&self) -> Option<User> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "profile cache unreadable");
                return None;
            }
        };
        match serde_json::from_slice(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "discarding corrupt profile cache");
                if let Err(e) = self.clear().await {
                    tracing::warn!(error = %e, "failed to remove corrupt profile cache");
                }
                None
            }
        }
    }

    /// Write `user`, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the file cannot be written.
    pub async fn save(&self, user: &User) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let raw = serde_json::to_vec_pretty(user)?;
        tokio::fs::write(&self.path, raw).await?;
        Ok(())
    }

    /// Remove the cache file. Removing a missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] for any failure other than not-found.
    pub async fn clear(&self) -> Result<(), CacheError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
