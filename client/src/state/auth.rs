//! Auth-session state for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Pages read [`AuthState`] to gate authenticated actions, and every page
//! routes API failures through [`AuthStore::handle_error`] so an expired
//! session logs the user out in one place. The store is constructed once and
//! passed by `Arc`; there is no global auth context.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::sync::{Arc, PoisonError, RwLock};

use tokio::task::JoinHandle;

use super::profile_cache::ProfileCache;
use crate::net::api::{ApiClient, RegisterForm};
use crate::net::error::ApiError;
use crate::net::types::User;

pub const REGISTERED_MESSAGE: &str = "Registration successful! Please login.";
pub const AVATAR_REQUIRED_MESSAGE: &str = "Avatar is required";

/// Authentication state tracking the current user and loading status.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AuthState {
    pub user: Option<User>,
    /// `true` until the cached profile has been restored.
    pub loading: bool,
}

impl AuthState {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

// =============================================================================
// AUTH STORE
// =============================================================================

pub struct AuthStore {
    api: ApiClient,
    cache: ProfileCache,
    state: RwLock<AuthState>,
}

impl AuthStore {
    #[must_use]
    pub fn new(api: ApiClient, cache: ProfileCache) -> Self {
        Self { api, cache, state: RwLock::new(AuthState { user: None, loading: true }) }
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub fn snapshot(&self) -> AuthState {
        self.state.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.snapshot().user
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.read().unwrap_or_else(PoisonError::into_inner).is_authenticated()
    }

    fn set_user(&self, user: Option<User>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.user = user;
        state.loading = false;
    }

    /// Restore the cached profile from disk.
    pub async fn restore(&self) -> AuthState {
        let user = self.cache.load().await;
        tracing::debug!(restored = user.is_some(), "auth state restored");
        self.set_user(user);
        self.snapshot()
    }

    /// Log in and remember the returned user.
    ///
    /// # Errors
    ///
    /// Returns the backend failure; local state is unchanged on error.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let data = self.api.login(email, password).await?;
        self.remember(&data.user).await;
        tracing::info!(user = %data.user.username, "logged in");
        Ok(data.user)
    }

    /// Create an account and return the message to show. Does not log in.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] without calling the backend when
    /// no avatar is attached, otherwise the backend failure.
    pub async fn register(&self, form: &RegisterForm) -> Result<String, ApiError> {
        if form.avatar.is_none() {
            return Err(ApiError::InvalidRequest(AVATAR_REQUIRED_MESSAGE.to_owned()));
        }
        let envelope = self.api.register(form).await?;
        tracing::info!(user = %form.username, "registered");
        Ok(envelope.message.unwrap_or_else(|| REGISTERED_MESSAGE.to_owned()))
    }

    /// Log out. Local state is cleared even when the backend call fails.
    pub async fn logout(&self) {
        if let Err(e) = self.api.logout().await {
            tracing::warn!(error = %e, "logout request failed");
        }
        self.clear_local().await;
    }

    /// Re-fetch the current user and update the cache.
    ///
    /// # Errors
    ///
    /// Returns the backend failure; a session expiry also clears local state.
    pub async fn refresh_user(&self) -> Result<User, ApiError> {
        match self.api.current_user().await {
            Ok(user) => {
                self.remember(&user).await;
                Ok(user)
            }
            Err(err) => {
                self.handle_error(&err).await;
                Err(err)
            }
        }
    }

    /// React to an API failure. Returns `true` when the session is gone and
    /// the caller should route to login.
    pub async fn handle_error(&self, err: &ApiError) -> bool {
        if !err.is_session_expired() {
            return false;
        }
        tracing::info!(error = %err, "session expired, clearing local user");
        self.clear_local().await;
        true
    }

    /// Clear local state whenever the session manager reports a failed
    /// refresh. Runs until the session manager is dropped.
    pub async fn watch_session_expiry(self: Arc<Self>) {
        let mut expiry = self.api.session().subscribe_expiry();
        while expiry.changed().await.is_ok() {
            tracing::info!("session expiry signalled, clearing local user");
            self.clear_local().await;
        }
    }

    /// Run [`Self::watch_session_expiry`] as a background task. Abort the
    /// handle to stop watching.
    #[must_use]
    pub fn spawn_expiry_watcher(self: &Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(Arc::clone(self).watch_session_expiry())
    }

    async fn remember(&self, user: &User) {
        self.set_user(Some(user.clone()));
        if let Err(e) = self.cache.save(user).await {
            tracing::warn!(error = %e, "failed to cache user profile");
        }
    }

    async fn clear_local(&self) {
        self.set_user(None);
        if let Err(e) = self.cache.clear().await {
            tracing::warn!(error = %e, "failed to clear profile cache");
        }
    }
}
