//! Page loaders and actions for each screen.
//!
//! ARCHITECTURE
//! ============
//! Each page owns its [`PageState`](crate::state::page::PageState), loads it
//! through the [`AuthStore`]'s API client, and applies action results to the
//! loaded content in place. Rendering is left to the front end.
//!
//! Every API failure passes through [`AuthStore::handle_error`] so an expired
//! session logs the user out no matter which page noticed it.

pub mod account;
pub mod channel;
pub mod feed;
pub mod library;
pub mod watch;

use crate::net::error::ApiError;
use crate::state::auth::AuthStore;
use crate::state::page::ErrorNotice;

/// Failure of a page action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
    /// The action needs a logged-in user.
    #[error("{0}")]
    SignInRequired(String),

    /// Input rejected before any request was sent.
    #[error("{0}")]
    Invalid(String),

    /// The action targets content that has not loaded.
    #[error("nothing loaded yet")]
    NotLoaded,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl PageError {
    #[must_use]
    pub fn notice(&self) -> ErrorNotice {
        match self {
            Self::Api(err) => ErrorNotice::from_error(err),
            other => ErrorNotice::validation(other.to_string()),
        }
    }

    #[must_use]
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::Api(err) if err.is_session_expired())
    }
}

fn require_auth(auth: &AuthStore, message: &str) -> Result<(), PageError> {
    if auth.is_authenticated() {
        Ok(())
    } else {
        Err(PageError::SignInRequired(message.to_owned()))
    }
}

/// Route an API result through the auth store's expiry handling.
async fn checked<T>(auth: &AuthStore, result: Result<T, ApiError>) -> Result<T, PageError> {
    match result {
        Ok(value) => Ok(value),
        Err(err) => {
            auth.handle_error(&err).await;
            Err(PageError::Api(err))
        }
    }
}
