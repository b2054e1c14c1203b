//! Watch page: one video, its comments, reactions, and playback reporting.
//!
//! DESIGN
//! ======
//! Actions call the backend first and only then adjust the loaded video in
//! place, so a failed like never shows a phantom count. The counter rules live
//! in the `apply_*` functions below so every front end renders the same
//! numbers the backend will report on the next load.
//!
//! Comments are secondary content: failing to load them leaves an empty
//! list instead of failing the page.

#[cfg(test)]
#[path = "watch_test.rs"]
mod watch_test;

use super::{PageError, checked, require_auth};
use crate::net::api::DEFAULT_COMMENT_PAGE_SIZE;
use crate::net::types::{Comment, User, Video};
use crate::state::auth::AuthStore;
use crate::state::page::{ErrorNotice, PageState};

pub const SIGN_IN_TO_INTERACT: &str = "Please log in to like, comment, or subscribe.";
pub const OWN_CHANNEL_MESSAGE: &str = "You cannot subscribe to your own channel.";
pub const BLANK_COMMENT_MESSAGE: &str = "Comment cannot be empty.";

/// Seconds of playback between watch-history reports.
pub const REPORT_INTERVAL_SECS: f64 = 30.0;

// =============================================================================
// COUNTER RULES
// =============================================================================

/// Toggle the viewer's like. A prior dislike is withdrawn.
pub fn apply_like(video: &mut Video) {
    let liked = video.is_liked.unwrap_or(false);
    video.likes += if liked { -1 } else { 1 };
    if video.is_disliked.unwrap_or(false) {
        video.dislikes -= 1;
    }
    video.is_liked = Some(!liked);
    video.is_disliked = Some(false);
}

/// Toggle the viewer's dislike. A prior like is withdrawn.
pub fn apply_dislike(video: &mut Video) {
    let disliked = video.is_disliked.unwrap_or(false);
    video.dislikes += if disliked { -1 } else { 1 };
    if video.is_liked.unwrap_or(false) {
        video.likes -= 1;
    }
    video.is_disliked = Some(!disliked);
    video.is_liked = Some(false);
}

/// Record a subscribe (`true`) or unsubscribe on a channel owner.
pub fn apply_subscription(owner: &mut User, subscribed: bool) {
    let count = owner.subscribers_count.unwrap_or(0);
    owner.subscribers_count = Some(if subscribed { count + 1 } else { count - 1 });
    owner.is_subscribed = Some(subscribed);
}

pub fn apply_comment_like(comment: &mut Comment) {
    let liked = comment.is_liked.unwrap_or(false);
    comment.likes += if liked { -1 } else { 1 };
    comment.is_liked = Some(!liked);
}

// =============================================================================
// WATCH PAGE
// =============================================================================

pub struct WatchPage {
    pub video_id: String,
    pub state: PageState<Video>,
    /// Newest first.
    pub comments: Vec<Comment>,
    /// Failure of the last action; the video stays visible.
    pub notice: Option<ErrorNotice>,
}

impl WatchPage {
    /// Fetch the video and its first page of comments.
    pub async fn load(auth: &AuthStore, video_id: &str) -> Self {
        let api = auth.api();
        let state = match checked(auth, api.video(video_id).await).await {
            Ok(video) => PageState::Loaded(video),
            Err(err) => PageState::Failed(err.notice()),
        };
        let comments = if state.loaded().is_some() {
            match checked(auth, api.comments(video_id, 1, DEFAULT_COMMENT_PAGE_SIZE).await).await {
                Ok(comments) => comments,
                Err(e) => {
                    tracing::warn!(error = %e, video = %video_id, "failed to load comments");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };
        Self { video_id: video_id.to_owned(), state, comments, notice: None }
    }

    #[must_use]
    pub fn video(&self) -> Option<&Video> {
        self.state.loaded()
    }

    /// Whether `viewer` uploaded the loaded video.
    #[must_use]
    pub fn is_own_video(&self, viewer: Option<&User>) -> bool {
        match (self.video(), viewer) {
            (Some(video), Some(viewer)) => video.owner.id == viewer.id,
            _ => false,
        }
    }

    /// # Errors
    ///
    /// Requires a user and a loaded video; otherwise returns the API failure.
    pub async fn like(&mut self, auth: &AuthStore) -> Result<(), PageError> {
        let id = self.interactive_video_id(auth)?;
        let result = checked(auth, auth.api().like_video(&id).await).await;
        self.settle(result.map(|_| ()), apply_like)
    }

    /// # Errors
    ///
    /// Requires a user and a loaded video; otherwise returns the API failure.
    pub async fn dislike(&mut self, auth: &AuthStore) -> Result<(), PageError> {
        let id = self.interactive_video_id(auth)?;
        let result = checked(auth, auth.api().dislike_video(&id).await).await;
        self.settle(result.map(|_| ()), apply_dislike)
    }

    /// Subscribe to or unsubscribe from the video owner's channel.
    ///
    /// # Errors
    ///
    /// Rejects the viewer's own channel; otherwise returns the API failure.
    pub async fn toggle_subscription(&mut self, auth: &AuthStore) -> Result<bool, PageError> {
        self.interactive_video_id(auth)?;
        if self.is_own_video(auth.current_user().as_ref()) {
            return self.fail(PageError::Invalid(OWN_CHANNEL_MESSAGE.to_owned()));
        }
        let Some(owner) = self.video().map(|v| v.owner.clone()) else {
            return Err(PageError::NotLoaded);
        };
        let subscribe = !owner.is_subscribed.unwrap_or(false);
        let api = auth.api();
        let result = if subscribe {
            api.subscribe(&owner.id).await
        } else {
            api.unsubscribe(&owner.id).await
        };
        let result = checked(auth, result).await.map(|_| ());
        self.settle(result, |video| apply_subscription(&mut video.owner, subscribe))?;
        Ok(subscribe)
    }

    /// Post a comment and show it first.
    ///
    /// # Errors
    ///
    /// Rejects blank content before calling the backend.
    pub async fn add_comment(&mut self, auth: &AuthStore, content: &str) -> Result<(), PageError> {
        let id = self.interactive_video_id(auth)?;
        let content = content.trim();
        if content.is_empty() {
            return self.fail(PageError::Invalid(BLANK_COMMENT_MESSAGE.to_owned()));
        }
        match checked(auth, auth.api().add_comment(&id, content).await).await {
            Ok(comment) => {
                self.comments.insert(0, comment);
                self.notice = None;
                Ok(())
            }
            Err(err) => self.fail(err),
        }
    }

    /// # Errors
    ///
    /// Requires a user; otherwise returns the API failure.
    pub async fn like_comment(&mut self, auth: &AuthStore, comment_id: &str) -> Result<(), PageError> {
        if let Err(err) = require_auth(auth, SIGN_IN_TO_INTERACT) {
            return self.fail(err);
        }
        match checked(auth, auth.api().like_comment(comment_id).await).await {
            Ok(_) => {
                if let Some(comment) = self.comments.iter_mut().find(|c| c.id == comment_id) {
                    apply_comment_like(comment);
                }
                Ok(())
            }
            Err(err) => self.fail(err),
        }
    }

    /// Reporter for this video's playback progress.
    #[must_use]
    pub fn reporter(&self) -> PlaybackReporter {
        PlaybackReporter::new(&self.video_id)
    }

    fn interactive_video_id(&mut self, auth: &AuthStore) -> Result<String, PageError> {
        if let Err(err) = require_auth(auth, SIGN_IN_TO_INTERACT) {
            return self.fail(err);
        }
        self.video().map(|v| v.id.clone()).ok_or(PageError::NotLoaded)
    }

    fn settle(&mut self, result: Result<(), PageError>, apply: impl FnOnce(&mut Video)) -> Result<(), PageError> {
        match result {
            Ok(()) => {
                if let Some(video) = self.state.loaded_mut() {
                    apply(video);
                }
                self.notice = None;
                Ok(())
            }
            Err(err) => self.fail(err),
        }
    }

    fn fail<T>(&mut self, err: PageError) -> Result<T, PageError> {
        self.notice = Some(err.notice());
        Err(err)
    }
}

// =============================================================================
// PLAYBACK REPORTER
// =============================================================================

/// Turns player position updates into watch-history reports.
///
/// A report is due each time playback crosses another 30-second mark, and
/// once more with the full duration when the video ends. Seeking backwards
/// does not repeat a mark already reported.
#[derive(Clone, Debug)]
pub struct PlaybackReporter {
    video_id: String,
    last_mark: u64,
}

impl PlaybackReporter {
    #[must_use]
    pub fn new(video_id: &str) -> Self {
        Self { video_id: video_id.to_owned(), last_mark: 0 }
    }

    /// Watch time to report for a position update, if a mark was crossed.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn on_progress(&mut self, position_secs: f64) -> Option<f64> {
        if !position_secs.is_finite() || position_secs < REPORT_INTERVAL_SECS {
            return None;
        }
        let mark = (position_secs / REPORT_INTERVAL_SECS).floor() as u64;
        if mark <= self.last_mark {
            return None;
        }
        self.last_mark = mark;
        Some(position_secs)
    }

    /// Record a position update, reporting it when a mark was crossed.
    pub async fn progress(&mut self, auth: &AuthStore, position_secs: f64) {
        if let Some(watch_time) = self.on_progress(position_secs) {
            self.report(auth, watch_time).await;
        }
    }

    /// Report the full duration once playback ends.
    pub async fn ended(&mut self, auth: &AuthStore, duration_secs: f64) {
        self.report(auth, duration_secs).await;
    }

    /// Failures are logged only; playback never stops for history.
    async fn report(&self, auth: &AuthStore, watch_time: f64) {
        if !auth.is_authenticated() {
            return;
        }
        if let Err(e) = auth.api().add_to_watch_history(&self.video_id, watch_time).await {
            tracing::warn!(error = %e, video = %self.video_id, "failed to record watch history");
            auth.handle_error(&e).await;
        }
    }
}
