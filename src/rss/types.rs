//! Type definitions for the RSS module.

use chrono::{DateTime, Utc};

use super::util::extract_job_id;
use crate::extract::SkipReason;

/// One entry as it came out of the feed, before any validation.
#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub published: Option<DateTime<Utc>>,
    /// HTML description carrying the labeled job fields.
    pub content: String,
    pub summary: String,
}

/// A feed entry that has a link, a job identifier and a publication time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPosting {
    pub id: String,
    pub title: String,
    pub link: String,
    pub published: DateTime<Utc>,
    pub content: String,
    pub summary: String,
}

impl JobPosting {
    /// Title with the job board's " - Upwork" suffix removed.
    pub fn display_title(&self) -> &str {
        self.title
            .strip_suffix(" - Upwork")
            .unwrap_or(&self.title)
            .trim()
    }
}

impl TryFrom<FeedEntry> for JobPosting {
    type Error = SkipReason;

    fn try_from(entry: FeedEntry) -> Result<Self, Self::Error> {
        let link = entry.link.ok_or(SkipReason::MissingLink)?;
        let id = extract_job_id(&link)
            .ok_or_else(|| SkipReason::MissingIdentifier(link.clone()))?;
        let published = entry.published.ok_or(SkipReason::MissingPublished)?;

        Ok(Self {
            id,
            title: entry.title.unwrap_or_default(),
            link,
            published,
            content: entry.content,
            summary: entry.summary,
        })
    }
}
