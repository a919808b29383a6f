use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tokio::time::Duration;
use tracing::warn;

use crate::recency;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const DEFAULT_PROCESSED_JOBS_PATH: &str = "processed_jobs.json";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_RECENCY_WINDOW_MINUTES: i64 = 60;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Retrieves an environment variable, falling back to `default` when unset or empty.
pub fn get_env_var_or(var: &str, default: &str) -> String {
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => value.trim().to_string(),
        _ => default.to_string(),
    }
}

/// Retrieves an environment variable and parses it.
///
/// # Arguments
/// - `var`: The name of the environment variable.
/// - `default`: Value used when the variable is unset or cannot be parsed.
///
/// # Returns
/// - The parsed value, or `default`. A value that fails to parse is logged.
pub fn get_env_var_parsed<T: FromStr>(var: &str, default: T) -> T {
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => match value.trim().parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!("Ignoring unparseable value {:?} for {}", value, var);
                default
            }
        },
        _ => default,
    }
}

/// Turns a configured recency window into a duration.
///
/// Negative values and values too large for a duration fall back to the
/// default window.
pub fn recency_window_from_minutes(minutes: i64) -> chrono::Duration {
    if minutes < 0 {
        warn!("Ignoring negative recency window of {} minutes", minutes);
        return recency::default_window();
    }
    chrono::Duration::try_minutes(minutes).unwrap_or_else(|| {
        warn!("Ignoring out of range recency window of {} minutes", minutes);
        recency::default_window()
    })
}

/// Runtime settings for the notifier, read from the environment.
#[derive(Clone, Debug)]
pub struct Settings {
    pub config_path: PathBuf,
    pub processed_jobs_path: PathBuf,
    pub log_dir: PathBuf,
    pub poll_interval: Duration,
    pub recency_window: chrono::Duration,
    pub request_timeout: Duration,
    pub notifier_command: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            processed_jobs_path: PathBuf::from(DEFAULT_PROCESSED_JOBS_PATH),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            recency_window: recency::default_window(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            notifier_command: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let notifier_command = env::var("NOTIFIER_COMMAND")
            .ok()
            .map(|cmd| cmd.trim().to_string())
            .filter(|cmd| !cmd.is_empty());

        Self {
            config_path: PathBuf::from(get_env_var_or("JOB_FEED_CONFIG", DEFAULT_CONFIG_PATH)),
            processed_jobs_path: PathBuf::from(get_env_var_or(
                "PROCESSED_JOBS_PATH",
                DEFAULT_PROCESSED_JOBS_PATH,
            )),
            log_dir: PathBuf::from(get_env_var_or("LOG_DIR", DEFAULT_LOG_DIR)),
            poll_interval: Duration::from_secs(get_env_var_parsed(
                "POLL_INTERVAL_SECS",
                DEFAULT_POLL_INTERVAL_SECS,
            )),
            recency_window: recency_window_from_minutes(get_env_var_parsed(
                "RECENCY_WINDOW_MINUTES",
                DEFAULT_RECENCY_WINDOW_MINUTES,
            )),
            request_timeout: Duration::from_secs(get_env_var_parsed(
                "REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )),
            notifier_command,
        }
    }
}
