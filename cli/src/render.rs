//! Plain-text rendering of page state for the terminal.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use time::OffsetDateTime;
use vidshare_client::net::types::{ChannelProfile, Comment, SubscribedChannel, User, Video, WatchHistoryItem};
use vidshare_client::state::page::PageState;
use vidshare_client::util::format::{format_duration, format_views, format_watch_time, time_ago};

pub fn video_line(video: &Video, now: OffsetDateTime) -> String {
    let duration = video.duration.map(format_duration).unwrap_or_else(|| "--:--".to_owned());
    format!(
        "{}  {}  [{}]  {} · {} views · {}",
        video.id,
        video.title,
        duration,
        video.owner.username,
        format_views(video.views),
        time_ago(&video.created_at, now)
    )
}

pub fn video_detail(video: &Video, now: OffsetDateTime) -> Vec<String> {
    let mut lines = vec![
        video.title.clone(),
        format!("{} views · {}", format_views(video.views), time_ago(&video.created_at, now)),
        format!(
            "{} likes{} · {} dislikes{}",
            video.likes,
            marker(video.is_liked),
            video.dislikes,
            marker(video.is_disliked)
        ),
        format!("by {}{}", owner_label(&video.owner), subscribed_suffix(video.owner.is_subscribed)),
    ];
    if !video.description.is_empty() {
        lines.push(String::new());
        lines.push(video.description.clone());
    }
    lines
}

pub fn comment_line(comment: &Comment, now: OffsetDateTime) -> String {
    format!(
        "{}  {} ({}): {}  [{} likes{}]",
        comment.id,
        comment.owner.username,
        time_ago(&comment.created_at, now),
        comment.content,
        comment.likes,
        marker(comment.is_liked)
    )
}

pub fn history_line(item: &WatchHistoryItem, now: OffsetDateTime) -> String {
    let progress = if item.completed { "completed".to_owned() } else { format!("watched {}", format_watch_time(item.watch_time)) };
    format!("{}  {}  {} · {}", item.video.id, item.video.title, progress, time_ago(&item.watched_at, now))
}

pub fn channel_header(profile: &ChannelProfile) -> Vec<String> {
    let name = profile.fullname.as_deref().unwrap_or(&profile.username);
    vec![
        format!("{name} (@{})", profile.username),
        format!(
            "{} subscribers · {} subscriptions{}",
            format_views(profile.subscribers_count),
            profile.channels_subscribed_to_count,
            subscribed_suffix(profile.is_subscribed)
        ),
    ]
}

pub fn subscription_line(channel: &SubscribedChannel, now: OffsetDateTime) -> String {
    format!("{}  subscribed {}", owner_label(&channel.channel), time_ago(&channel.subscribed_at, now))
}

pub fn user_line(user: &User) -> String {
    format!("{} <{}> id={}", owner_label(user), user.email, user.id)
}

/// Lines for a page, or the message to show instead of content.
pub fn page_lines<T>(state: &PageState<T>, render: impl Fn(&T) -> Vec<String>) -> Vec<String> {
    match state {
        PageState::Loading => vec!["Loading...".to_owned()],
        PageState::Loaded(value) => render(value),
        PageState::Empty { message } | PageState::SignInRequired { message } => vec![message.clone()],
        PageState::Failed(notice) => {
            let hint = if notice.session_expired {
                " (run `vidshare login`)"
            } else if notice.retryable {
                " (try again)"
            } else {
                ""
            };
            vec![format!("error: {}{hint}", notice.message)]
        }
    }
}

fn owner_label(user: &User) -> String {
    if user.fullname.is_empty() { format!("@{}", user.username) } else { format!("{} (@{})", user.fullname, user.username) }
}

fn marker(flag: Option<bool>) -> &'static str {
    if flag.unwrap_or(false) { " *" } else { "" }
}

fn subscribed_suffix(flag: Option<bool>) -> &'static str {
    if flag.unwrap_or(false) { " · subscribed" } else { "" }
}
