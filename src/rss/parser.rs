//! Feed parsing logic for RSS and Atom job feeds.

use anyhow::Result;
use feed_rs::model::Entry;
use feed_rs::parser;
use std::io::Cursor;
use tracing::{debug, error, warn};

use super::types::FeedEntry;
use super::util::cleanup_xml;
use crate::TARGET_WEB_REQUEST;

fn to_feed_entry(entry: Entry) -> FeedEntry {
    let summary = entry.summary.map(|t| t.content);
    let content = entry.content.and_then(|c| c.body);

    FeedEntry {
        title: entry.title.map(|t| t.content),
        link: entry.links.first().map(|link| link.href.clone()),
        // Atom feeds may only carry <updated>
        published: entry.published.or(entry.updated),
        content: content.clone().or_else(|| summary.clone()).unwrap_or_default(),
        summary: summary.or(content).unwrap_or_default(),
    }
}

/// Parse a feed body into entries, in the order the feed lists them.
///
/// A body that fails to parse is run through [`cleanup_xml`] and parsed again.
pub fn parse_feed(text: &str, feed_url: &str) -> Result<Vec<FeedEntry>> {
    let feed = match parser::parse(Cursor::new(text)) {
        Ok(feed) => feed,
        Err(first_err) => {
            let cleaned_xml = cleanup_xml(text);
            if !(cleaned_xml.contains("<rss") || cleaned_xml.contains("<feed")) {
                let preview = text.chars().take(100).collect::<String>();
                error!(
                    target: TARGET_WEB_REQUEST,
                    "Feed from {} doesn't appear to be RSS or Atom. Content preview: {}",
                    feed_url,
                    preview
                );
                return Err(anyhow::anyhow!("Content is not RSS or Atom feed: {}", first_err));
            }

            match parser::parse(Cursor::new(cleaned_xml)) {
                Ok(feed) => {
                    warn!(target: TARGET_WEB_REQUEST, "Feed from {} parsed only after XML cleanup", feed_url);
                    feed
                }
                Err(second_err) => {
                    return Err(anyhow::anyhow!(
                        "Failed to parse feed even after cleanup. First error: {}. Second error: {}",
                        first_err,
                        second_err
                    ));
                }
            }
        }
    };

    debug!(target: TARGET_WEB_REQUEST, "Parsed feed {} with {} entries", feed_url, feed.entries.len());
    Ok(feed.entries.into_iter().map(to_feed_entry).collect())
}
