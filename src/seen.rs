//! Registry of job identifiers that have already been notified.
//!
//! The registry lives in a JSON array on disk. It is loaded once per poll
//! cycle, grows in memory while the cycle runs and is written back in full by
//! [`SeenJobs::save`] at the end. Anything marked after the last save is lost
//! if the process dies.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::TARGET_JOB_FEED;

#[derive(Debug)]
pub struct SeenJobs {
    path: PathBuf,
    // Insertion order, kept so the file reads chronologically
    order: Vec<String>,
    index: HashSet<String>,
}

impl SeenJobs {
    /// Loads the registry, treating a missing file as a first run.
    pub fn load(path: &Path) -> Result<Self> {
        let mut seen = Self {
            path: path.to_path_buf(),
            order: Vec::new(),
            index: HashSet::new(),
        };

        if !path.exists() {
            debug!(target: TARGET_JOB_FEED, "No processed jobs file at {}, starting empty", path.display());
            return Ok(seen);
        }

        let json_data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read processed jobs file {}", path.display()))?;
        let ids: Vec<String> = serde_json::from_str(&json_data).with_context(|| {
            format!(
                "Processed jobs file {} is not a JSON array of job ids",
                path.display()
            )
        })?;

        for id in ids {
            seen.mark_seen(&id);
        }
        debug!(target: TARGET_JOB_FEED, "Loaded {} processed job ids", seen.len());
        Ok(seen)
    }

    pub fn is_seen(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    /// Records `id` in memory. Returns false if it was already present.
    pub fn mark_seen(&mut self, id: &str) -> bool {
        if !self.index.insert(id.to_string()) {
            return false;
        }
        self.order.push(id.to_string());
        true
    }

    /// Overwrites the registry file with every id seen so far.
    pub fn save(&self) -> Result<()> {
        let json_data = serde_json::to_string(&self.order)?;
        fs::write(&self.path, json_data).with_context(|| {
            format!("Failed to write processed jobs file {}", self.path.display())
        })?;
        debug!(target: TARGET_JOB_FEED, "Saved {} processed job ids to {}", self.len(), self.path.display());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}
