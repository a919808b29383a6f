//! Feed list configuration, read from a JSON file at the start of every cycle.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::TARGET_JOB_FEED;

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct FeedConfig {
    /// Feed URLs, polled in the order given.
    pub feed_url: Vec<String>,
}

impl FeedConfig {
    pub fn load(path: &Path) -> Result<Self> {
        debug!(target: TARGET_JOB_FEED, "Reading config file {}", path.display());
        let json_data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&json_data)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_json(json_data: &str) -> Result<Self> {
        Ok(serde_json::from_str(json_data)?)
    }
}
