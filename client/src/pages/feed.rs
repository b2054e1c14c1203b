//! Paged video lists: home, trending, search, liked, and the user's uploads.
//!
//! DESIGN
//! ======
//! All five screens share one controller. They differ only in which endpoint
//! fills a page, whether a login is required, and what an empty result says.
//! `load` replaces the list with page 1; `load_more` appends the next page
//! and keeps what is already shown if it fails.

#[cfg(test)]
#[path = "feed_test.rs"]
mod feed_test;

use super::{PageError, checked};
use crate::net::api::VideoQuery;
use crate::net::error::ApiError;
use crate::net::types::Video;
use crate::state::auth::AuthStore;
use crate::state::page::{ErrorNotice, FEED_PAGE_SIZE, Feed, PageState};

/// Search term the trending screen sends.
pub const TRENDING_QUERY: &str = "trending";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeedKind {
    Home,
    Trending,
    Search(String),
    Liked,
    YourVideos,
}

impl FeedKind {
    fn sign_in_message(&self) -> Option<&'static str> {
        match self {
            Self::Liked => Some("Please log in to view your liked videos."),
            Self::YourVideos => Some("Please log in to view your videos."),
            Self::Home | Self::Trending | Self::Search(_) => None,
        }
    }

    fn empty_message(&self) -> String {
        match self {
            Self::Home => "No videos available yet.".to_owned(),
            Self::Trending => "No trending videos right now.".to_owned(),
            Self::Search(query) => format!("No results found for \"{}\".", query.trim()),
            Self::Liked => "You haven't liked any videos yet.".to_owned(),
            Self::YourVideos => "You haven't uploaded any videos yet.".to_owned(),
        }
    }

    async fn fetch(&self, auth: &AuthStore, page: u32) -> Result<Vec<Video>, ApiError> {
        let api = auth.api();
        match self {
            Self::Home => api.videos(&VideoQuery::page(page, FEED_PAGE_SIZE)).await,
            Self::Trending => api.videos(&VideoQuery::page(page, FEED_PAGE_SIZE).search(TRENDING_QUERY)).await,
            Self::Search(query) => api.videos(&VideoQuery::page(page, FEED_PAGE_SIZE).search(query.trim())).await,
            Self::Liked => api.liked_videos(page, FEED_PAGE_SIZE).await,
            Self::YourVideos => api.your_videos(page, FEED_PAGE_SIZE).await,
        }
    }
}

pub struct FeedController {
    kind: FeedKind,
    pub state: PageState<Feed<Video>>,
    /// Failure of the last `load_more`; the loaded list stays visible.
    pub notice: Option<ErrorNotice>,
}

impl FeedController {
    #[must_use]
    pub fn new(kind: FeedKind) -> Self {
        Self { kind, state: PageState::Loading, notice: None }
    }

    #[must_use]
    pub fn videos(&self) -> &[Video] {
        self.state.loaded().map(|feed| feed.items.as_slice()).unwrap_or_default()
    }

    #[must_use]
    pub fn has_more(&self) -> bool {
        self.state.loaded().is_some_and(|feed| feed.has_more)
    }

    /// Load page 1, replacing whatever was shown. Also the retry action.
    pub async fn load(&mut self, auth: &AuthStore) {
        self.notice = None;
        if let FeedKind::Search(query) = &self.kind
            && query.trim().is_empty()
        {
            self.state = PageState::empty("Please enter a search query.");
            return;
        }
        if let Some(message) = self.kind.sign_in_message()
            && !auth.is_authenticated()
        {
            self.state = PageState::sign_in(message);
            return;
        }

        self.state = PageState::Loading;
        self.state = match checked(auth, self.kind.fetch(auth, 1).await).await {
            Ok(videos) if videos.is_empty() => PageState::empty(self.kind.empty_message()),
            Ok(videos) => PageState::Loaded(Feed::first(videos, FEED_PAGE_SIZE)),
            Err(err) => PageState::Failed(err.notice()),
        };
    }

    /// Append the next page. No-op unless a full page is showing.
    ///
    /// # Errors
    ///
    /// Returns the fetch failure; the failure is also kept in `notice`.
    pub async fn load_more(&mut self, auth: &AuthStore) -> Result<usize, PageError> {
        let Some(next) = self.state.loaded().filter(|feed| feed.has_more).map(Feed::next_page) else {
            return Ok(0);
        };
        match checked(auth, self.kind.fetch(auth, next).await).await {
            Ok(videos) => {
                let added = videos.len();
                if let Some(feed) = self.state.loaded_mut() {
                    feed.push_page(next, videos, FEED_PAGE_SIZE);
                }
                self.notice = None;
                Ok(added)
            }
            Err(err) => {
                tracing::warn!(error = %err, page = next, "load more failed");
                self.notice = Some(err.notice());
                Err(err)
            }
        }
    }
}
