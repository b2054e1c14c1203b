//! Typed REST client for the video platform backend.
//!
//! Every method maps to one backend endpoint. Calls that need a session go
//! through [`SessionManager::execute`] so an expired access token is
//! refreshed transparently; `login` and `refresh_token` go straight to the
//! transport because they are how a session is obtained in the first place.
//!
//! ERROR HANDLING
//! ==============
//! All methods return [`ApiError`]. Pages turn these into dismissible notices;
//! `SessionExpired` is the only variant that should end the session.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::borrow::Cow;
use std::sync::Arc;

use serde_json::{Value, json};

use super::envelope::{envelope, extract_list, extract_record};
use super::error::ApiError;
use super::session::SessionManager;
use super::transport::{ApiRequest, FileUpload, FormPart, Transport};
use super::types::{
    ChannelProfile, Comment, Envelope, LoginData, SortOrder, SubscribedChannel, User, Video, WatchHistoryItem,
};

pub const DEFAULT_VIDEO_PAGE_SIZE: u32 = 10;
pub const DEFAULT_COMMENT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_LIBRARY_PAGE_SIZE: u32 = 12;
pub const DEFAULT_HISTORY_PAGE_SIZE: u32 = 20;

// =============================================================================
// REQUEST INPUTS
// =============================================================================

/// Filters for `GET /videos`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoQuery {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
}

impl Default for VideoQuery {
    fn default() -> Self {
        Self { page: 1, limit: DEFAULT_VIDEO_PAGE_SIZE, search: None, sort_by: None, sort_order: None }
    }
}

impl VideoQuery {
    #[must_use]
    pub fn page(page: u32, limit: u32) -> Self {
        Self { page, limit, ..Self::default() }
    }

    #[must_use]
    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.search = Some(query.into());
        self
    }
}

/// Multipart fields for `POST /users/register`.
#[derive(Clone, Debug, PartialEq)]
pub struct RegisterForm {
    pub fullname: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub avatar: Option<FileUpload>,
    pub cover_image: Option<FileUpload>,
}

/// Multipart fields for `PATCH /users/update-profile`.
#[derive(Clone, Debug, PartialEq)]
pub struct ProfileUpdate {
    pub fullname: String,
    pub email: String,
    pub avatar: Option<FileUpload>,
    pub cover_image: Option<FileUpload>,
}

/// Multipart fields for `POST /videos/uploadVideo`.
#[derive(Clone, Debug, PartialEq)]
pub struct UploadForm {
    pub title: String,
    pub description: String,
    pub video_file: FileUpload,
    pub thumbnail: FileUpload,
    /// Length in seconds.
    pub duration: f64,
}

// =============================================================================
// ENDPOINT PATHS
// =============================================================================

/// Percent-encode one path segment. `?`, `#`, and `/` in ids would
/// otherwise change which resource is addressed; `.` and `..` would be
/// collapsed by URL normalization.
fn segment(value: &str) -> Cow<'_, str> {
    match value {
        "." => Cow::Borrowed("%2E"),
        ".." => Cow::Borrowed("%2E%2E"),
        _ => urlencoding::encode(value),
    }
}

fn channel_profile_endpoint(username: &str) -> String {
    format!("/users/getChannelInfo/{}", segment(username))
}

fn reset_password_endpoint(token: &str) -> String {
    format!("/users/reset-password/{}", segment(token))
}

fn video_endpoint(video_id: &str) -> String {
    format!("/videos/{}", segment(video_id))
}

fn owner_videos_endpoint(owner_id: &str) -> String {
    format!("/videos/owner/{}", segment(owner_id))
}

fn video_reaction_endpoint(video_id: &str, reaction: &str) -> String {
    format!("/videos/{}/{reaction}", segment(video_id))
}

fn video_comments_endpoint(video_id: &str) -> String {
    format!("/videos/{}/comments", segment(video_id))
}

fn comment_like_endpoint(comment_id: &str) -> String {
    format!("/comments/{}/like", segment(comment_id))
}

fn subscribe_endpoint(channel_id: &str) -> String {
    format!("/users/subscribe/{}", segment(channel_id))
}

fn unsubscribe_endpoint(channel_id: &str) -> String {
    format!("/unsubscribe/{}", segment(channel_id))
}

fn text_part(name: &str, value: impl Into<String>) -> FormPart {
    FormPart::Text { name: name.to_owned(), value: value.into() }
}

fn file_part(name: &str, file: FileUpload) -> FormPart {
    FormPart::File { name: name.to_owned(), file }
}

fn paged(request: ApiRequest, page: u32, limit: u32) -> ApiRequest {
    request.query("page", page).query("limit", limit)
}

// =============================================================================
// CLIENT
// =============================================================================

#[derive(Clone)]
pub struct ApiClient {
    session: Arc<SessionManager>,
}

impl ApiClient {
    #[must_use]
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }

    /// Build a client with its own session manager over `transport`.
    #[must_use]
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self::new(Arc::new(SessionManager::new(transport)))
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    async fn call(&self, request: ApiRequest) -> Result<Value, ApiError> {
        self.session.execute(request).await
    }

    async fn call_envelope(&self, request: ApiRequest) -> Result<Envelope, ApiError> {
        envelope(self.call(request).await?)
    }

    // -------------------------------------------------------------------------
    // Auth
    // -------------------------------------------------------------------------

    /// Create an account. Does not log in.
    ///
    /// # Errors
    ///
    /// Returns the backend or transport failure.
    pub async fn register(&self, form: &RegisterForm) -> Result<Envelope, ApiError> {
        let mut parts = vec![
            text_part("fullname", form.fullname.clone()),
            text_part("username", form.username.clone()),
            text_part("email", form.email.clone()),
            text_part("password", form.password.clone()),
        ];
        if let Some(avatar) = &form.avatar {
            parts.push(file_part("avatar", avatar.clone()));
        }
        if let Some(cover) = &form.cover_image {
            parts.push(file_part("coverImage", cover.clone()));
        }
        self.call_envelope(ApiRequest::post("/users/register").multipart(parts)).await
    }

    /// Log in with email and password. The session cookies land in the
    /// transport's cookie jar.
    ///
    /// # Errors
    ///
    /// Returns the backend failure (wrong credentials are a plain `Http` error,
    /// never a refresh attempt).
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginData, ApiError> {
        let request = ApiRequest::post("/users/login").json(json!({ "email": email, "password": password }));
        let body = self.session.send_direct(&request).await?;
        extract_record(&body, "user").map(|user| LoginData { user })
    }

    /// # Errors
    ///
    /// Returns the backend or transport failure.
    pub async fn logout(&self) -> Result<Envelope, ApiError> {
        self.call_envelope(ApiRequest::post("/users/logout")).await
    }

    /// # Errors
    ///
    /// Returns the backend or transport failure.
    pub async fn forgot_password(&self, email: &str) -> Result<Envelope, ApiError> {
        self.call_envelope(ApiRequest::post("/users/forget-password").json(json!({ "email": email })))
            .await
    }

    /// # Errors
    ///
    /// Returns the backend or transport failure.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<Envelope, ApiError> {
        self.call_envelope(
            ApiRequest::post(reset_password_endpoint(token)).json(json!({ "newPassword": new_password })),
        )
        .await
    }

    // -------------------------------------------------------------------------
    // Users & channels
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns the backend or transport failure.
    pub async fn current_user(&self) -> Result<User, ApiError> {
        let body = self.call(ApiRequest::get("/users/current-user")).await?;
        extract_record(&body, "user")
    }

    /// # Errors
    ///
    /// Returns the backend or transport failure.
    pub async fn channel_profile(&self, username: &str) -> Result<ChannelProfile, ApiError> {
        let body = self.call(ApiRequest::get(channel_profile_endpoint(username))).await?;
        extract_record(&body, "channel")
    }

    /// # Errors
    ///
    /// Returns the backend or transport failure.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Envelope, ApiError> {
        let mut parts = vec![text_part("fullname", update.fullname.clone()), text_part("email", update.email.clone())];
        if let Some(avatar) = &update.avatar {
            parts.push(file_part("avatar", avatar.clone()));
        }
        if let Some(cover) = &update.cover_image {
            parts.push(file_part("coverImage", cover.clone()));
        }
        self.call_envelope(ApiRequest::patch("/users/update-profile").multipart(parts)).await
    }

    /// # Errors
    ///
    /// Returns the backend or transport failure.
    pub async fn change_password(&self, old_password: &str, new_password: &str) -> Result<Envelope, ApiError> {
        self.call_envelope(
            ApiRequest::post("/users/change-password")
                .json(json!({ "oldPassword": old_password, "newPassword": new_password })),
        )
        .await
    }

    /// # Errors
    ///
    /// Returns the backend or transport failure.
    pub async fn subscribe(&self, channel_id: &str) -> Result<Envelope, ApiError> {
        self.call_envelope(ApiRequest::post(subscribe_endpoint(channel_id))).await
    }

    /// # Errors
    ///
    /// Returns the backend or transport failure.
    pub async fn unsubscribe(&self, channel_id: &str) -> Result<Envelope, ApiError> {
        self.call_envelope(ApiRequest::delete(unsubscribe_endpoint(channel_id))).await
    }

    /// # Errors
    ///
    /// Returns the backend or transport failure.
    pub async fn subscribed_channels(&self) -> Result<Vec<SubscribedChannel>, ApiError> {
        let body = self.call(ApiRequest::get("/users/subscriptions")).await?;
        extract_list(&body, "channels")
    }

    // -------------------------------------------------------------------------
    // Videos
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns the backend or transport failure.
    pub async fn videos(&self, query: &VideoQuery) -> Result<Vec<Video>, ApiError> {
        let mut request = paged(ApiRequest::get("/videos"), query.page, query.limit);
        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            request = request.query("search", search);
        }
        if let Some(sort_by) = query.sort_by.as_deref().filter(|s| !s.is_empty()) {
            request = request.query("sortBy", sort_by);
        }
        if let Some(order) = query.sort_order {
            request = request.query("sortOrder", order.as_str());
        }
        let body = self.call(request).await?;
        extract_list(&body, "videos")
    }

    /// # Errors
    ///
    /// Returns the backend or transport failure.
    pub async fn video(&self, video_id: &str) -> Result<Video, ApiError> {
        let body = self.call(ApiRequest::get(video_endpoint(video_id))).await?;
        extract_record(&body, "video")
    }

    /// # Errors
    ///
    /// Returns the backend or transport failure.
    pub async fn videos_by_owner(&self, owner: &str, page: u32, limit: u32) -> Result<Vec<Video>, ApiError> {
        let body = self.call(paged(ApiRequest::get(owner_videos_endpoint(owner)), page, limit)).await?;
        extract_list(&body, "videos")
    }

    /// # Errors
    ///
    /// Returns the backend or transport failure.
    pub async fn upload_video(&self, form: &UploadForm) -> Result<Envelope, ApiError> {
        let parts = vec![
            text_part("title", form.title.clone()),
            text_part("description", form.description.clone()),
            file_part("videoFile", form.video_file.clone()),
            file_part("thumbnail", form.thumbnail.clone()),
            text_part("duration", form.duration.to_string()),
        ];
        self.call_envelope(ApiRequest::post("/videos/uploadVideo").multipart(parts)).await
    }

    /// # Errors
    ///
    /// Returns the backend or transport failure.
    pub async fn like_video(&self, video_id: &str) -> Result<Envelope, ApiError> {
        self.call_envelope(ApiRequest::post(video_reaction_endpoint(video_id, "like"))).await
    }

    /// # Errors
    ///
    /// Returns the backend or transport failure.
    pub async fn dislike_video(&self, video_id: &str) -> Result<Envelope, ApiError> {
        self.call_envelope(ApiRequest::post(video_reaction_endpoint(video_id, "dislike"))).await
    }

    /// # Errors
    ///
    /// Returns the backend or transport failure.
    pub async fn your_videos(&self, page: u32, limit: u32) -> Result<Vec<Video>, ApiError> {
        let body = self.call(paged(ApiRequest::get("/videos/my-videos"), page, limit)).await?;
        extract_list(&body, "videos")
    }

    /// # Errors
    ///
    /// Returns the backend or transport failure.
    pub async fn liked_videos(&self, page: u32, limit: u32) -> Result<Vec<Video>, ApiError> {
        let body = self.call(paged(ApiRequest::get("/likes/videos"), page, limit)).await?;
        extract_list(&body, "videos")
    }

    // -------------------------------------------------------------------------
    // Comments
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns the backend or transport failure.
    pub async fn comments(&self, video_id: &str, page: u32, limit: u32) -> Result<Vec<Comment>, ApiError> {
        let body = self.call(paged(ApiRequest::get(video_comments_endpoint(video_id)), page, limit)).await?;
        extract_list(&body, "comments")
    }

    /// # Errors
    ///
    /// Returns the backend or transport failure.
    pub async fn add_comment(&self, video_id: &str, content: &str) -> Result<Comment, ApiError> {
        let body = self
            .call(ApiRequest::post(video_comments_endpoint(video_id)).json(json!({ "content": content })))
            .await?;
        extract_record(&body, "comment")
    }

    /// # Errors
    ///
    /// Returns the backend or transport failure.
    pub async fn like_comment(&self, comment_id: &str) -> Result<Envelope, ApiError> {
        self.call_envelope(ApiRequest::post(comment_like_endpoint(comment_id))).await
    }

    // -------------------------------------------------------------------------
    // Watch history
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns the backend or transport failure.
    pub async fn watch_history(&self, page: u32, limit: u32) -> Result<Vec<WatchHistoryItem>, ApiError> {
        let body = self.call(paged(ApiRequest::get("/users/watch-history"), page, limit)).await?;
        extract_list(&body, "history")
    }

    /// # Errors
    ///
    /// Returns the backend or transport failure.
    pub async fn add_to_watch_history(&self, video_id: &str, watch_time: f64) -> Result<Envelope, ApiError> {
        self.call_envelope(
            ApiRequest::post("/users/watch-history").json(json!({ "videoId": video_id, "watchTime": watch_time })),
        )
        .await
    }

    /// # Errors
    ///
    /// Returns the backend or transport failure.
    pub async fn clear_watch_history(&self) -> Result<Envelope, ApiError> {
        self.call_envelope(ApiRequest::delete("/users/watch-history")).await
    }
}
