//! Authenticated request interceptor with single-flight session refresh.
//!
//! DESIGN
//! ======
//! Every authenticated call goes through [`SessionManager::execute`]. A 401
//! from any endpoint other than the refresh endpoint starts a refresh. While
//! that refresh is in flight, other callers that hit a 401 join a FIFO
//! wait-list instead of starting their own.
//!
//! ```text
//!   Idle ──401──▶ Refreshing ──settle──▶ Idle
//!                  │  ▲
//!                  └──┘ 401 while refreshing: enqueue waiter
//! ```
//!
//! The caller that started the refresh (the leader) settles the wait-list:
//! - refresh ok: replay each waiter's request once, in arrival order, then
//!   its own. Replays bypass the interceptor, so a second 401 is final.
//! - refresh failed: every waiter and the leader get `SessionExpired`, and the
//!   expiry signal fires so the auth store can drop the user.
//!
//! The refresh flag and wait-list sit behind a `std::sync::Mutex` that is
//! never held across an await.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::{oneshot, watch};

use super::error::ApiError;
use super::transport::{ApiRequest, Transport};

pub const REFRESH_TOKEN_PATH: &str = "/users/refresh-token";

type Reply = oneshot::Sender<Result<Value, ApiError>>;

struct Waiter {
    request: ApiRequest,
    reply: Reply,
}

#[derive(Default)]
struct RefreshState {
    refreshing: bool,
    waiters: VecDeque<Waiter>,
}

enum Role {
    Leader(ApiRequest),
    Waiter(oneshot::Receiver<Result<Value, ApiError>>),
}

// =============================================================================
// SESSION MANAGER
// =============================================================================

pub struct SessionManager {
    transport: Arc<dyn Transport>,
    state: Mutex<RefreshState>,
    expired: watch::Sender<u64>,
}

impl SessionManager {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let (expired, _) = watch::channel(0);
        Self { transport, state: Mutex::new(RefreshState::default()), expired }
    }

    /// Perform `request`, recovering from an expired access token once.
    ///
    /// # Errors
    ///
    /// Returns the request's own error for anything other than a recoverable
    /// 401, [`ApiError::SessionExpired`] when the refresh fails, and
    /// [`ApiError::Cancelled`] when the refresh this call waited on was
    /// abandoned.
    pub async fn execute(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let err = match self.send_direct(&request).await {
            Ok(body) => return Ok(body),
            Err(err) => err,
        };
        if !err.is_unauthorized() || Self::is_refresh_request(&request) {
            return Err(err);
        }

        match self.join_or_lead(request) {
            Role::Waiter(reply) => reply.await.unwrap_or(Err(ApiError::Cancelled)),
            Role::Leader(request) => self.lead_refresh(request).await,
        }
    }

    /// Perform `request` once without refresh handling.
    ///
    /// # Errors
    ///
    /// Returns transport failures and non-2xx statuses as [`ApiError`].
    pub async fn send_direct(&self, request: &ApiRequest) -> Result<Value, ApiError> {
        self.transport.send(request).await?.into_result()
    }

    /// Whether a refresh is currently in flight.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.lock_state().refreshing
    }

    /// Number of requests queued behind the in-flight refresh.
    #[must_use]
    pub fn pending_waiters(&self) -> usize {
        self.lock_state().waiters.len()
    }

    /// Receiver that ticks every time a refresh fails.
    #[must_use]
    pub fn subscribe_expiry(&self) -> watch::Receiver<u64> {
        self.expired.subscribe()
    }

    fn is_refresh_request(request: &ApiRequest) -> bool {
        request.path == REFRESH_TOKEN_PATH
    }

    fn lock_state(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn join_or_lead(&self, request: ApiRequest) -> Role {
        let mut state = self.lock_state();
        if state.refreshing {
            let (reply, rx) = oneshot::channel();
            state.waiters.push_back(Waiter { request, reply });
            tracing::debug!(queued = state.waiters.len(), "request queued behind session refresh");
            return Role::Waiter(rx);
        }
        state.refreshing = true;
        Role::Leader(request)
    }

    async fn lead_refresh(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let guard = RefreshGuard { manager: self, settled: false };
        tracing::debug!(request = %request.label(), "session refresh started");

        let outcome = self.send_direct(&ApiRequest::post(REFRESH_TOKEN_PATH)).await;
        let waiters = guard.settle();

        match outcome {
            Ok(_) => {
                tracing::debug!(replaying = waiters.len(), "session refreshed");
                for waiter in waiters {
                    let result = self.send_direct(&waiter.request).await;
                    if waiter.reply.send(result).is_err() {
                        tracing::debug!(request = %waiter.request.label(), "waiter gone before replay completed");
                    }
                }
                self.send_direct(&request).await
            }
            Err(err) => {
                tracing::warn!(error = %err, waiting = waiters.len(), "session refresh failed, session expired");
                let expired = ApiError::SessionExpired { reason: err.to_string() };
                for waiter in waiters {
                    if waiter.reply.send(Err(expired.clone())).is_err() {
                        tracing::debug!(request = %waiter.request.label(), "waiter gone before refresh failed");
                    }
                }
                self.expired.send_modify(|n| *n = n.wrapping_add(1));
                Err(expired)
            }
        }
    }
}

// =============================================================================
// REFRESH GUARD
// =============================================================================

/// Returns the manager to Idle if the leader is dropped mid-refresh.
struct RefreshGuard<'a> {
    manager: &'a SessionManager,
    settled: bool,
}

impl RefreshGuard<'_> {
    /// Leave Refreshing and take the wait-list in one critical section.
    fn settle(mut self) -> VecDeque<Waiter> {
        self.settled = true;
        let mut state = self.manager.lock_state();
        state.refreshing = false;
        std::mem::take(&mut state.waiters)
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let waiters = {
            let mut state = self.manager.lock_state();
            state.refreshing = false;
            std::mem::take(&mut state.waiters)
        };
        tracing::warn!(waiting = waiters.len(), "session refresh abandoned");
        for waiter in waiters {
            if waiter.reply.send(Err(ApiError::Cancelled)).is_err() {
                tracing::debug!(request = %waiter.request.label(), "waiter gone before refresh was abandoned");
            }
        }
    }
}
