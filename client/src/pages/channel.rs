//! Channel page: a creator's profile and their uploads.

#[cfg(test)]
#[path = "channel_test.rs"]
mod channel_test;

use super::watch::{OWN_CHANNEL_MESSAGE, SIGN_IN_TO_INTERACT};
use super::{PageError, checked, require_auth};
use crate::net::api::DEFAULT_VIDEO_PAGE_SIZE;
use crate::net::types::{ChannelProfile, Video};
use crate::state::auth::AuthStore;
use crate::state::page::{ErrorNotice, PageState};

#[derive(Clone, Debug, PartialEq)]
pub struct ChannelView {
    pub profile: ChannelProfile,
    pub videos: Vec<Video>,
}

/// Record a subscribe (`true`) or unsubscribe on a channel profile.
pub fn apply_channel_subscription(profile: &mut ChannelProfile, subscribed: bool) {
    profile.subscribers_count += if subscribed { 1 } else { -1 };
    profile.is_subscribed = Some(subscribed);
}

pub struct ChannelPage {
    pub username: String,
    pub state: PageState<ChannelView>,
    pub notice: Option<ErrorNotice>,
}

impl ChannelPage {
    /// Fetch the profile, then the first page of the channel's videos.
    pub async fn load(auth: &AuthStore, username: &str) -> Self {
        let state = match Self::fetch(auth, username).await {
            Ok(view) => PageState::Loaded(view),
            Err(err) => PageState::Failed(err.notice()),
        };
        Self { username: username.to_owned(), state, notice: None }
    }

    async fn fetch(auth: &AuthStore, username: &str) -> Result<ChannelView, PageError> {
        let api = auth.api();
        let profile = checked(auth, api.channel_profile(username).await).await?;
        let videos =
            checked(auth, api.videos_by_owner(&profile.username, 1, DEFAULT_VIDEO_PAGE_SIZE).await).await?;
        Ok(ChannelView { profile, videos })
    }

    #[must_use]
    pub fn view(&self) -> Option<&ChannelView> {
        self.state.loaded()
    }

    /// Subscribe to or unsubscribe from this channel. Returns the new
    /// subscription state.
    ///
    /// # Errors
    ///
    /// Requires a user other than the channel owner; otherwise returns the
    /// API failure.
    pub async fn toggle_subscription(&mut self, auth: &AuthStore) -> Result<bool, PageError> {
        let result = self.try_toggle(auth).await;
        match &result {
            Ok(_) => self.notice = None,
            Err(err) => self.notice = Some(err.notice()),
        }
        result
    }

    async fn try_toggle(&mut self, auth: &AuthStore) -> Result<bool, PageError> {
        require_auth(auth, SIGN_IN_TO_INTERACT)?;
        let profile = self.view().map(|v| v.profile.clone()).ok_or(PageError::NotLoaded)?;
        if auth.current_user().is_some_and(|user| user.id == profile.id) {
            return Err(PageError::Invalid(OWN_CHANNEL_MESSAGE.to_owned()));
        }

        let subscribe = !profile.is_subscribed.unwrap_or(false);
        let api = auth.api();
        let result = if subscribe {
            api.subscribe(&profile.id).await
        } else {
            api.unsubscribe(&profile.id).await
        };
        checked(auth, result).await?;
        if let Some(view) = self.state.loaded_mut() {
            apply_channel_subscription(&mut view.profile, subscribe);
        }
        Ok(subscribe)
    }
}
