//! Account forms: register, upload, settings, and password recovery.
//!
//! Each action validates its input locally, calls one endpoint, and returns
//! the message to show on success: the backend's own message when it sent
//! one, otherwise a fixed default.

#[cfg(test)]
#[path = "account_test.rs"]
mod account_test;

use super::{PageError, checked, require_auth};
use crate::net::api::{ProfileUpdate, RegisterForm, UploadForm};
use crate::net::error::ApiError;
use crate::net::types::Envelope;
use crate::state::auth::AuthStore;

pub const UPLOAD_SIGN_IN_MESSAGE: &str = "You must be logged in to upload videos.";
pub const UPLOAD_INCOMPLETE_MESSAGE: &str =
    "Please fill in all required fields and select both video and thumbnail files. Ensure video duration is loaded.";
pub const UPLOADED_MESSAGE: &str = "Video uploaded successfully!";
pub const SETTINGS_SIGN_IN_MESSAGE: &str = "Please log in to view your settings.";
pub const PROFILE_UPDATED_MESSAGE: &str = "Profile updated successfully!";
pub const PASSWORD_MISMATCH_MESSAGE: &str = "New password and confirm password do not match.";
pub const PASSWORD_CHANGED_MESSAGE: &str = "Password changed successfully!";
pub const EMAIL_REQUIRED_MESSAGE: &str = "Please enter your email address.";
pub const RESET_LINK_SENT_MESSAGE: &str = "Password reset link sent to your email.";
pub const PASSWORD_RESET_MESSAGE: &str = "Password has been reset successfully. Please login.";

fn message_or(envelope: Envelope, default: &str) -> String {
    envelope
        .message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| default.to_owned())
}

/// Whether a registration failure means the account already exists and the
/// user should be sent to login instead.
#[must_use]
pub fn is_already_registered(err: &PageError) -> bool {
    err.to_string().to_lowercase().contains("email already exists")
}

/// # Errors
///
/// Rejects a form without an avatar; otherwise returns the API failure.
pub async fn register(auth: &AuthStore, form: &RegisterForm) -> Result<String, PageError> {
    match auth.register(form).await {
        Ok(message) => Ok(message),
        Err(ApiError::InvalidRequest(message)) => Err(PageError::Invalid(message)),
        Err(err) => Err(PageError::Api(err)),
    }
}

/// Reject an upload missing any required field.
///
/// # Errors
///
/// Returns [`PageError::Invalid`] with the combined requirement message.
pub fn validate_upload(form: &UploadForm) -> Result<(), PageError> {
    let complete = !form.title.trim().is_empty()
        && !form.description.trim().is_empty()
        && !form.video_file.bytes.is_empty()
        && !form.thumbnail.bytes.is_empty()
        && form.duration.is_finite()
        && form.duration > 0.0;
    if complete { Ok(()) } else { Err(PageError::Invalid(UPLOAD_INCOMPLETE_MESSAGE.to_owned())) }
}

/// # Errors
///
/// Requires a user and a complete form; otherwise returns the API failure.
pub async fn upload(auth: &AuthStore, form: &UploadForm) -> Result<String, PageError> {
    require_auth(auth, UPLOAD_SIGN_IN_MESSAGE)?;
    validate_upload(form)?;
    let envelope = checked(auth, auth.api().upload_video(form).await).await?;
    tracing::info!(title = %form.title, "video uploaded");
    Ok(message_or(envelope, UPLOADED_MESSAGE))
}

/// Update the profile, then re-fetch the user so the cache matches.
///
/// # Errors
///
/// Requires a user; otherwise returns the update or re-fetch failure.
pub async fn update_profile(auth: &AuthStore, update: &ProfileUpdate) -> Result<String, PageError> {
    require_auth(auth, SETTINGS_SIGN_IN_MESSAGE)?;
    let envelope = checked(auth, auth.api().update_profile(update).await).await?;
    auth.refresh_user().await?;
    Ok(message_or(envelope, PROFILE_UPDATED_MESSAGE))
}

/// # Errors
///
/// Requires a user and matching new/confirm passwords; otherwise returns the
/// API failure.
pub async fn change_password(
    auth: &AuthStore,
    old_password: &str,
    new_password: &str,
    confirm_password: &str,
) -> Result<String, PageError> {
    require_auth(auth, SETTINGS_SIGN_IN_MESSAGE)?;
    if new_password != confirm_password {
        return Err(PageError::Invalid(PASSWORD_MISMATCH_MESSAGE.to_owned()));
    }
    let envelope = checked(auth, auth.api().change_password(old_password, new_password).await).await?;
    Ok(message_or(envelope, PASSWORD_CHANGED_MESSAGE))
}

/// # Errors
///
/// Rejects a blank email; otherwise returns the API failure.
pub async fn forgot_password(auth: &AuthStore, email: &str) -> Result<String, PageError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(PageError::Invalid(EMAIL_REQUIRED_MESSAGE.to_owned()));
    }
    let envelope = checked(auth, auth.api().forgot_password(email).await).await?;
    Ok(message_or(envelope, RESET_LINK_SENT_MESSAGE))
}

/// # Errors
///
/// Rejects mismatched passwords; otherwise returns the API failure.
pub async fn reset_password(
    auth: &AuthStore,
    token: &str,
    new_password: &str,
    confirm_password: &str,
) -> Result<String, PageError> {
    if new_password != confirm_password {
        return Err(PageError::Invalid(PASSWORD_MISMATCH_MESSAGE.to_owned()));
    }
    let envelope = checked(auth, auth.api().reset_password(token, new_password).await).await?;
    Ok(message_or(envelope, PASSWORD_RESET_MESSAGE))
}
