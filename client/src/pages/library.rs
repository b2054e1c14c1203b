//! The signed-in user's library: watch history and subscriptions.

#[cfg(test)]
#[path = "library_test.rs"]
mod library_test;

use super::{PageError, checked};
use crate::net::api::DEFAULT_HISTORY_PAGE_SIZE;
use crate::net::types::{SubscribedChannel, WatchHistoryItem};
use crate::state::auth::AuthStore;
use crate::state::page::{ErrorNotice, PageState};

pub const HISTORY_SIGN_IN_MESSAGE: &str = "Please log in to view your watch history.";
pub const HISTORY_EMPTY_MESSAGE: &str = "Your watch history is empty.";
pub const SUBSCRIPTIONS_SIGN_IN_MESSAGE: &str = "Please log in to view your subscriptions.";
pub const SUBSCRIPTIONS_EMPTY_MESSAGE: &str = "You haven't subscribed to any channels yet.";

fn list_state<T>(items: Vec<T>, empty_message: &str) -> PageState<Vec<T>> {
    if items.is_empty() { PageState::empty(empty_message) } else { PageState::Loaded(items) }
}

// =============================================================================
// HISTORY
// =============================================================================

pub struct HistoryPage {
    pub state: PageState<Vec<WatchHistoryItem>>,
    pub notice: Option<ErrorNotice>,
}

impl HistoryPage {
    pub async fn load(auth: &AuthStore) -> Self {
        if !auth.is_authenticated() {
            return Self { state: PageState::sign_in(HISTORY_SIGN_IN_MESSAGE), notice: None };
        }
        let state = match checked(auth, auth.api().watch_history(1, DEFAULT_HISTORY_PAGE_SIZE).await).await {
            Ok(items) => list_state(items, HISTORY_EMPTY_MESSAGE),
            Err(err) => PageState::Failed(err.notice()),
        };
        Self { state, notice: None }
    }

    /// Clear the whole history on the backend, then locally.
    ///
    /// # Errors
    ///
    /// Returns the API failure; the list stays as it was.
    pub async fn clear(&mut self, auth: &AuthStore) -> Result<(), PageError> {
        match checked(auth, auth.api().clear_watch_history().await).await {
            Ok(_) => {
                self.state = PageState::empty(HISTORY_EMPTY_MESSAGE);
                self.notice = None;
                Ok(())
            }
            Err(err) => {
                self.notice = Some(err.notice());
                Err(err)
            }
        }
    }
}

// =============================================================================
// SUBSCRIPTIONS
// =============================================================================

pub struct SubscriptionsPage {
    pub state: PageState<Vec<SubscribedChannel>>,
}

impl SubscriptionsPage {
    pub async fn load(auth: &AuthStore) -> Self {
        if !auth.is_authenticated() {
            return Self { state: PageState::sign_in(SUBSCRIPTIONS_SIGN_IN_MESSAGE) };
        }
        let state = match checked(auth, auth.api().subscribed_channels().await).await {
            Ok(channels) => list_state(channels, SUBSCRIPTIONS_EMPTY_MESSAGE),
            Err(err) => PageState::Failed(err.notice()),
        };
        Self { state }
    }
}
