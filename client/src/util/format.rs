//! Display formatting for counters, durations, and timestamps.
//!
//! SYSTEM CONTEXT
//! ==============
//! Video cards, the watch page, and the history list all render the same
//! "1.2K views", "4:05", and "3 days ago" strings; these helpers keep them
//! identical across front ends.

#[cfg(test)]
#[path = "format_test.rs"]
mod format_test;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const MINUTES_PER_HOUR: i64 = 60;
const MINUTES_PER_DAY: i64 = 24 * MINUTES_PER_HOUR;
const MINUTES_PER_MONTH: i64 = 30 * MINUTES_PER_DAY;
const MINUTES_PER_YEAR: i64 = 365 * MINUTES_PER_DAY;
/// 42 hours: below this a day-old timestamp still reads `1 day`.
const MINUTES_BEFORE_TWO_DAYS: i64 = 42 * MINUTES_PER_HOUR;

/// `1.5M`, `12.3K`, or the plain count.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_views(views: i64) -> String {
    if views >= 1_000_000 {
        format!("{:.1}M", views as f64 / 1_000_000.0)
    } else if views >= 1000 {
        format!("{:.1}K", views as f64 / 1000.0)
    } else {
        views.to_string()
    }
}

/// `h:mm:ss` when the video is an hour or longer, otherwise `m:ss`.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    let total = whole_seconds(seconds);
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

/// `m:ss` with unbounded minutes, for watch-time progress.
#[must_use]
pub fn format_watch_time(seconds: f64) -> String {
    let total = whole_seconds(seconds);
    format!("{}:{:02}", total / 60, total % 60)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_seconds(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 { seconds.floor() as u64 } else { 0 }
}

/// Relative age of an RFC 3339 timestamp, e.g. `about 3 hours ago`.
///
/// Reads `1 day` up to 42 hours. `about` qualifies hours and the first two
/// months only; partial years read `over` or `almost`.
///
/// Unparseable input is returned unchanged. Timestamps in the future read as
/// `less than a minute ago`.
#[must_use]
pub fn time_ago(timestamp: &str, now: OffsetDateTime) -> String {
    let Ok(then) = OffsetDateTime::parse(timestamp, &Rfc3339) else {
        return timestamp.to_owned();
    };
    let seconds = (now - then).whole_seconds();
    if seconds < 30 {
        return "less than a minute ago".to_owned();
    }

    let minutes = (seconds + 30) / 60;
    if minutes < 45 {
        plural(minutes, "minute", "")
    } else if minutes < 90 {
        "about 1 hour ago".to_owned()
    } else if minutes < MINUTES_PER_DAY {
        plural(rounded(minutes, MINUTES_PER_HOUR), "hour", "about ")
    } else if minutes < MINUTES_BEFORE_TWO_DAYS {
        "1 day ago".to_owned()
    } else if minutes < MINUTES_PER_MONTH {
        plural(rounded(minutes, MINUTES_PER_DAY), "day", "")
    } else if minutes < 2 * MINUTES_PER_MONTH {
        plural(rounded(minutes, MINUTES_PER_MONTH), "month", "about ")
    } else if minutes < MINUTES_PER_YEAR {
        plural(rounded(minutes, MINUTES_PER_MONTH), "month", "")
    } else {
        years_ago(minutes * 12 / MINUTES_PER_YEAR)
    }
}

/// `about`, `over`, or `almost` depending on the months past a whole year.
fn years_ago(months: i64) -> String {
    let (years, extra) = (months / 12, months % 12);
    if extra < 3 {
        plural(years, "year", "about ")
    } else if extra < 9 {
        plural(years, "year", "over ")
    } else {
        plural(years + 1, "year", "almost ")
    }
}

fn rounded(minutes: i64, unit: i64) -> i64 {
    (minutes + unit / 2) / unit
}

fn plural(count: i64, unit: &str, prefix: &str) -> String {
    let s = if count == 1 { "" } else { "s" };
    format!("{prefix}{count} {unit}{s} ago")
}
