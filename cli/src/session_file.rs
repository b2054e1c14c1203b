//! Session cookies persisted between CLI invocations.
//!
//! The library keeps cookies in memory for one process. The CLI saves the
//! jar's `Cookie` header next to the profile cache after every command and
//! seeds the next process's jar from it.

#[cfg(test)]
#[path = "session_file_test.rs"]
mod session_file_test;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

pub const SESSION_FILE_NAME: &str = "session";

/// Owner read/write only: the file holds live session cookies.
#[cfg(unix)]
pub const SESSION_FILE_MODE: u32 = 0o600;

pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    /// Session file living in the same directory as `profile_cache`.
    #[must_use]
    pub fn beside(profile_cache: &Path) -> Self {
        Self { path: profile_cache.with_file_name(SESSION_FILE_NAME) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saved `Cookie` header, if any.
    pub async fn load(&self) -> std::io::Result<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => {
                let header = raw.trim();
                Ok((!header.is_empty()).then(|| header.to_owned()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Write the cookie header, readable by the owner only.
    pub async fn save(&self, header: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(SESSION_FILE_MODE);
        let mut file = options.open(&self.path).await?;
        // `mode` only applies on creation; tighten a file left by an older run.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(SESSION_FILE_MODE)).await?;
        }
        file.write_all(header.as_bytes()).await?;
        file.flush().await
    }

    pub async fn clear(&self) -> std::io::Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}
