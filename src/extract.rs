//! Extraction of job details from the HTML fragment embedded in a feed entry.
//!
//! Job boards render each posting's metadata as a bold label followed by the
//! value as loose text, e.g. `<b>Budget</b>: $500<br /><b>Country</b>: Spain`.
//! Every field except the category degrades to `N/A` when it cannot be found.

use scraper::{Html, Selector};
use thiserror::Error;
use tracing::debug;

use crate::{NOT_AVAILABLE, TARGET_JOB_FEED};

const LABEL_BUDGET: &str = "Budget";
const LABEL_HOURLY_RANGE: &str = "Hourly Range";
const LABEL_CATEGORY: &str = "Category";
const LABEL_COUNTRY: &str = "Country";
const LABEL_SKILLS: &str = "Skills";

/// Maximum number of skill hashtags carried into a notification.
pub const MAX_SKILLS: usize = 10;

/// Reasons a single feed entry is skipped instead of notified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("no job identifier in link {0}")]
    MissingIdentifier(String),
    #[error("entry has no link")]
    MissingLink,
    #[error("entry has no published timestamp")]
    MissingPublished,
    #[error("no Category label in job description")]
    MissingCategory,
}

/// Fields pulled out of a job posting's HTML description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFields {
    pub rate: String,
    pub category: String,
    pub country: String,
    pub skills: Vec<String>,
    pub summary: String,
}

impl JobFields {
    /// Skills rendered as space separated hashtags, or `N/A`.
    pub fn skills_line(&self) -> String {
        if self.skills.is_empty() {
            NOT_AVAILABLE.to_string()
        } else {
            self.skills.join(" ")
        }
    }

    /// Category rendered as a hashtag.
    pub fn category_tag(&self) -> String {
        format!("#{}", self.category)
    }
}

/// Turns free text into a hashtag-safe token.
pub fn normalize_tag(value: &str) -> String {
    value
        .trim()
        .replace([' ', '-', '/'], "_")
        .replace('&', "and")
}

/// Finds the text that follows a `<b>` element whose content equals `label`.
fn labeled_value(document: &Html, label: &str) -> Option<String> {
    let bold = Selector::parse("b").ok()?;
    let element = document
        .select(&bold)
        .find(|el| el.text().collect::<String>().trim() == label)?;

    element
        .next_siblings()
        .find_map(|node| node.value().as_text().map(|text| (&**text).to_owned()))
}

/// Removes the `:` separator and surrounding whitespace from a labeled value.
fn clean_value(raw: &str) -> String {
    raw.replace(':', "").replace('\n', "").trim().to_string()
}

pub fn extract_rate(document: &Html) -> String {
    let (kind, raw) = if let Some(budget) = labeled_value(document, LABEL_BUDGET) {
        ("Budget", budget)
    } else if let Some(hourly) = labeled_value(document, LABEL_HOURLY_RANGE) {
        ("Hourly", hourly)
    } else {
        debug!(target: TARGET_JOB_FEED, "Rate is not available");
        return NOT_AVAILABLE.to_string();
    };

    let value = clean_value(&raw);
    if value.is_empty() {
        debug!(target: TARGET_JOB_FEED, "{} label present but empty", kind);
        return NOT_AVAILABLE.to_string();
    }
    format!("{} {}", kind, value)
}

pub fn extract_category(document: &Html) -> Result<String, SkipReason> {
    let raw = labeled_value(document, LABEL_CATEGORY).ok_or(SkipReason::MissingCategory)?;
    Ok(normalize_tag(&clean_value(&raw)))
}

pub fn extract_country(document: &Html) -> String {
    match labeled_value(document, LABEL_COUNTRY).map(|raw| clean_value(&raw)) {
        Some(country) if !country.is_empty() => country,
        _ => {
            debug!(target: TARGET_JOB_FEED, "Country is not available");
            NOT_AVAILABLE.to_string()
        }
    }
}

/// Returns up to [`MAX_SKILLS`] hashtags, in the order listed.
pub fn extract_skills(document: &Html) -> Vec<String> {
    let Some(raw) = labeled_value(document, LABEL_SKILLS) else {
        debug!(target: TARGET_JOB_FEED, "Skills are not available");
        return Vec::new();
    };
    skill_tags(&clean_value(&raw))
}

pub fn skill_tags(skills: &str) -> Vec<String> {
    skills
        .split(',')
        .map(str::trim)
        .filter(|skill| !skill.is_empty())
        .take(MAX_SKILLS)
        .map(|skill| format!("#{}", normalize_tag(skill)))
        .collect()
}

/// First sentence of an entry summary, with `<br>` variants turned into newlines.
pub fn first_sentence(summary: &str) -> String {
    let first = summary.split('.').next().unwrap_or_default();
    format!("{}.", first)
        .replace("<br>", "\n")
        .replace("<br/>", "\n")
        .replace("<br />", "\n")
        .replace("<br >", "\n")
        .replace("\n\n", "\n")
}

/// Extracts every field from one posting.
///
/// `content` is the HTML description carrying the labeled fields and
/// `summary` the entry's summary text. Fails only when the category is missing.
pub fn extract_fields(content: &str, summary: &str) -> Result<JobFields, SkipReason> {
    let document = Html::parse_fragment(content);

    let category = extract_category(&document)?;
    Ok(JobFields {
        rate: extract_rate(&document),
        category,
        country: extract_country(&document),
        skills: extract_skills(&document),
        summary: first_sentence(summary),
    })
}
