//! Wire records for the video platform REST API.
//!
//! DESIGN
//! ======
//! Field names mirror the backend JSON (`_id`, `fullname`, `videofile`,
//! `createdAt`) so records pass through from the API to the page layer
//! without a mapping step. Counters go through a lenient integer decoder
//! because aggregate pipelines sometimes emit them as floats.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// A platform user as embedded in videos, comments, and auth responses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Backend object id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub fullname: String,
    /// Unique handle used in channel URLs.
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    /// Avatar image URL.
    #[serde(default)]
    pub avatar: String,
    /// Channel banner URL, if set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_opt_i64_from_number")]
    pub subscribers_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_opt_i64_from_number")]
    pub channels_subscribed_to_count: Option<i64>,
    /// Whether the requesting user is subscribed to this user's channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_subscribed: Option<bool>,
}

/// A channel the current user subscribes to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribedChannel {
    #[serde(flatten)]
    pub channel: User,
    /// RFC 3339 timestamp of the subscription.
    #[serde(default)]
    pub subscribed_at: String,
}

/// A published (or draft) video with its owner embedded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Media URL.
    #[serde(default)]
    pub videofile: String,
    /// Thumbnail image URL.
    #[serde(default)]
    pub thumbnail: String,
    /// Length in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_i64_from_number")]
    pub views: i64,
    #[serde(default)]
    pub ispublished: bool,
    pub owner: User,
    /// RFC 3339 upload timestamp.
    #[serde(default)]
    pub created_at: String,
    #[serde(default, deserialize_with = "deserialize_i64_from_number")]
    pub likes: i64,
    #[serde(default, deserialize_with = "deserialize_i64_from_number")]
    pub dislikes: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_liked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_disliked: Option<bool>,
}

/// A comment on a video.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: String,
    pub content: String,
    /// Id of the video the comment belongs to.
    #[serde(default)]
    pub video: String,
    pub owner: User,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, deserialize_with = "deserialize_i64_from_number")]
    pub likes: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_liked: Option<bool>,
}

/// Public channel page data returned by `/users/getChannelInfo/{username}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub fullname: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub cover_image: String,
    #[serde(default, deserialize_with = "deserialize_i64_from_number")]
    pub subscribers_count: i64,
    #[serde(default, deserialize_with = "deserialize_i64_from_number")]
    pub channels_subscribed_to_count: i64,
    #[serde(default)]
    pub is_subscribed: Option<bool>,
}

/// One entry of the current user's watch history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchHistoryItem {
    #[serde(rename = "_id")]
    pub id: String,
    pub video: Video,
    /// RFC 3339 timestamp of the last view.
    #[serde(default)]
    pub watched_at: String,
    /// Seconds watched.
    #[serde(default)]
    pub watch_time: f64,
    #[serde(default)]
    pub completed: bool,
}

/// Standard backend response envelope.
///
/// Every endpoint answers with some subset of these keys. `data` carries the
/// payload, `message` a human-readable outcome, and `error` replaces `message`
/// on some failure paths.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of a successful `POST /users/login`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub user: User,
}

/// Sort direction for video listings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

fn deserialize_i64_from_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    i64_from_value(&value).map_err(D::Error::custom)
}

fn deserialize_opt_i64_from_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    i64_from_value(&value).map(Some).map_err(D::Error::custom)
}

fn i64_from_value(value: &serde_json::Value) -> Result<i64, &'static str> {
    match value {
        serde_json::Value::Null => Ok(0),
        serde_json::Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                return Ok(int);
            }
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
            if let Some(float) = number.as_f64()
                && float.is_finite()
                && float.fract() == 0.0
                && float >= i64::MIN as f64
                && float <= i64::MAX as f64
            {
                return Ok(float as i64);
            }
            Err("expected integer-compatible number")
        }
        _ => Err("expected number"),
    }
}
