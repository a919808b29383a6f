pub mod config;
pub mod environment;
pub mod extract;
pub mod logging;
pub mod notifier;
pub mod poller;
pub mod recency;
pub mod rss;
pub mod seen;

pub const TARGET_WEB_REQUEST: &str = "web_request";
pub const TARGET_NOTIFY: &str = "notify";
pub const TARGET_JOB_FEED: &str = "job_feed";

/// Placeholder rendered for any optional field that could not be extracted.
pub const NOT_AVAILABLE: &str = "N/A";
