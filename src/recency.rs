//! Age checks and "posted ... ago" formatting for job postings.

use chrono::{DateTime, Duration, Local, TimeZone};
use std::fmt;

use crate::environment::DEFAULT_RECENCY_WINDOW_MINUTES;

/// Maximum age of a posting that still gets a notification.
pub fn default_window() -> Duration {
    Duration::minutes(DEFAULT_RECENCY_WINDOW_MINUTES)
}

/// When a posting was published, relative to the poll time and in local time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostedAt {
    pub relative: String,
    pub absolute: String,
}

impl fmt::Display for PostedAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ago ({})", self.relative, self.absolute)
    }
}

/// Returns true if `elapsed` falls inside `window`. Future timestamps count as fresh.
pub fn is_within_window(elapsed: Duration, window: Duration) -> bool {
    elapsed <= window
}

/// Renders an elapsed duration as "<d> days" or "<h>h <m>m".
pub fn format_relative(elapsed: Duration) -> String {
    if elapsed.num_days() >= 1 {
        return format!("{} days", elapsed.num_days());
    }

    let total_seconds = elapsed.num_seconds().max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    format!("{}h {}m", hours, minutes)
}

/// Applies the recency window to a posting.
///
/// Returns `None` when the posting is older than `window`, otherwise the
/// relative and absolute (local, `YYYY-MM-DD HH:MM`) publication times.
pub fn check<Tz: TimeZone>(
    published: &DateTime<Tz>,
    now: &DateTime<Local>,
    window: Duration,
) -> Option<PostedAt> {
    let published = published.with_timezone(&Local);
    let elapsed = now.signed_duration_since(published);
    if !is_within_window(elapsed, window) {
        return None;
    }

    Some(PostedAt {
        relative: format_relative(elapsed),
        absolute: published.format("%Y-%m-%d %H:%M").to_string(),
    })
}
