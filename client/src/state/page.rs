//! Render-ready page state.
//!
//! DESIGN
//! ======
//! Every screen is one of: still loading, loaded with content, loaded but
//! empty (with the message to show), failed with a notice, or gated behind
//! sign-in. Action failures on a loaded page do not replace the content; pages
//! keep them in a separate dismissible [`ErrorNotice`].

#[cfg(test)]
#[path = "page_test.rs"]
mod page_test;

use crate::net::error::ApiError;

/// Page size used by every paged video list.
pub const FEED_PAGE_SIZE: u32 = 12;

#[derive(Clone, Debug, PartialEq)]
pub enum PageState<T> {
    Loading,
    Loaded(T),
    Empty { message: String },
    Failed(ErrorNotice),
    SignInRequired { message: String },
}

impl<T> PageState<T> {
    #[must_use]
    pub fn empty(message: impl Into<String>) -> Self {
        Self::Empty { message: message.into() }
    }

    #[must_use]
    pub fn sign_in(message: impl Into<String>) -> Self {
        Self::SignInRequired { message: message.into() }
    }

    #[must_use]
    pub fn loaded(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn loaded_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn notice(&self) -> Option<&ErrorNotice> {
        match self {
            Self::Failed(notice) => Some(notice),
            _ => None,
        }
    }
}

// =============================================================================
// ERROR NOTICE
// =============================================================================

/// A user-facing error banner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorNotice {
    pub message: String,
    /// Offer a "try again" action.
    pub retryable: bool,
    /// The session is gone; the front end should route to login.
    pub session_expired: bool,
}

impl ErrorNotice {
    #[must_use]
    pub fn from_error(err: &ApiError) -> Self {
        Self { message: err.to_string(), retryable: err.retryable(), session_expired: err.is_session_expired() }
    }

    /// A validation message raised before any request was sent.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self { message: message.into(), retryable: false, session_expired: false }
    }
}

// =============================================================================
// FEED
// =============================================================================

/// An append-only paged list.
#[derive(Clone, Debug, PartialEq)]
pub struct Feed<T> {
    pub items: Vec<T>,
    /// Last page loaded, 1-based.
    pub page: u32,
    /// Whether the last page came back full.
    pub has_more: bool,
}

impl<T> Feed<T> {
    #[must_use]
    pub fn first(items: Vec<T>, page_size: u32) -> Self {
        let has_more = is_full_page(items.len(), page_size);
        Self { items, page: 1, has_more }
    }

    /// Append page `page`. A first page replaces the list.
    pub fn push_page(&mut self, page: u32, items: Vec<T>, page_size: u32) {
        self.has_more = is_full_page(items.len(), page_size);
        if page <= 1 {
            self.items = items;
        } else {
            self.items.extend(items);
        }
        self.page = page.max(1);
    }

    #[must_use]
    pub fn next_page(&self) -> u32 {
        self.page + 1
    }
}

fn is_full_page(len: usize, page_size: u32) -> bool {
    u32::try_from(len).is_ok_and(|len| len == page_size)
}
