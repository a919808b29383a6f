//! Poll cycle: fetch every configured feed, notify about fresh unseen jobs and
//! persist the registry of notified job ids.

use anyhow::Result;
use chrono::{DateTime, Duration as ChronoDuration, Local};
use std::path::PathBuf;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};

use crate::config::FeedConfig;
use crate::environment::Settings;
use crate::extract::{extract_fields, JobFields, SkipReason};
use crate::notifier::{Notification, Notifier};
use crate::recency::{self, PostedAt};
use crate::rss::{is_valid_url, parse_feed, FeedEntry, FeedSource, JobPosting};
use crate::seen::SeenJobs;
use crate::{TARGET_JOB_FEED, TARGET_WEB_REQUEST};

pub const NOTIFICATION_TITLE: &str = "New Job Posted";

/// A fresh, unseen posting with everything needed for its notification.
#[derive(Debug, Clone)]
pub struct JobAlert {
    pub posting: JobPosting,
    pub fields: JobFields,
    pub posted_at: PostedAt,
}

impl JobAlert {
    pub fn message(&self) -> String {
        format!(
            "{}\n{}\n💲 {}\n📄 {}\n🕑 {}\n🌍 {}\n{}",
            self.posting.display_title(),
            self.fields.category_tag(),
            self.fields.rate,
            self.fields.summary,
            self.posted_at,
            self.fields.country,
            self.fields.skills_line()
        )
    }

    pub fn notification(&self) -> Notification {
        Notification {
            title: NOTIFICATION_TITLE.to_string(),
            body: self.message(),
            link: self.posting.link.clone(),
        }
    }
}

#[derive(Debug)]
pub enum EntryOutcome {
    Notify(Box<JobAlert>),
    AlreadySeen(String),
    Stale(String),
    Skipped(SkipReason),
}

/// Decides what to do with one feed entry. Pure apart from debug logging.
pub fn evaluate_entry(
    entry: FeedEntry,
    seen: &SeenJobs,
    now: &DateTime<Local>,
    window: ChronoDuration,
) -> EntryOutcome {
    let posting = match JobPosting::try_from(entry) {
        Ok(posting) => posting,
        Err(reason) => return EntryOutcome::Skipped(reason),
    };

    if seen.is_seen(&posting.id) {
        return EntryOutcome::AlreadySeen(posting.id);
    }
    debug!(target: TARGET_JOB_FEED, "New job was found: {}", posting.id);

    let Some(posted_at) = recency::check(&posting.published, now, window) else {
        return EntryOutcome::Stale(posting.id);
    };

    match extract_fields(&posting.content, &posting.summary) {
        Ok(fields) => EntryOutcome::Notify(Box::new(JobAlert {
            posting,
            fields,
            posted_at,
        })),
        Err(reason) => EntryOutcome::Skipped(reason),
    }
}

/// Tallies for one poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub feeds_processed: usize,
    pub feeds_failed: usize,
    pub notified: usize,
    pub notify_failures: usize,
    pub already_seen: usize,
    pub stale: usize,
    pub malformed: usize,
}

pub struct FeedPoller<S, N> {
    source: S,
    notifier: N,
    config_path: PathBuf,
    processed_jobs_path: PathBuf,
    recency_window: ChronoDuration,
}

impl<S: FeedSource, N: Notifier> FeedPoller<S, N> {
    pub fn new(source: S, notifier: N, settings: &Settings) -> Self {
        Self {
            source,
            notifier,
            config_path: settings.config_path.clone(),
            processed_jobs_path: settings.processed_jobs_path.clone(),
            recency_window: settings.recency_window,
        }
    }

    /// Runs one full cycle against `now`.
    ///
    /// Feed and entry failures are logged and skipped. Errors loading the
    /// config or the registry, or saving the registry, are returned.
    pub async fn run_cycle(&self, now: DateTime<Local>) -> Result<CycleReport> {
        let config = FeedConfig::load(&self.config_path)?;
        let mut seen = SeenJobs::load(&self.processed_jobs_path)?;
        let mut report = CycleReport::default();

        debug!(target: TARGET_JOB_FEED, "Fetching jobs from {} feeds", config.feed_url.len());
        for feed_url in &config.feed_url {
            if feed_url.trim().is_empty() {
                warn!(target: TARGET_WEB_REQUEST, "Skipping empty feed URL");
                continue;
            }
            if !is_valid_url(feed_url) {
                warn!(target: TARGET_WEB_REQUEST, "Skipping invalid feed URL: {}", feed_url);
                report.feeds_failed += 1;
                continue;
            }

            match self.process_feed(feed_url, &mut seen, &now, &mut report).await {
                Ok(()) => report.feeds_processed += 1,
                Err(err) => {
                    error!(target: TARGET_WEB_REQUEST, "Failed to process feed {}: {:#}", feed_url, err);
                    report.feeds_failed += 1;
                }
            }
        }

        seen.save()?;
        Ok(report)
    }

    async fn process_feed(
        &self,
        feed_url: &str,
        seen: &mut SeenJobs,
        now: &DateTime<Local>,
        report: &mut CycleReport,
    ) -> Result<()> {
        let body = self.source.fetch(feed_url).await?;
        let mut entries = parse_feed(&body, feed_url)?;

        // Feeds list newest first; reverse, then sort so ties keep oldest-first order
        entries.reverse();
        entries.sort_by_key(|entry| entry.published);

        for entry in entries {
            match evaluate_entry(entry, seen, now, self.recency_window) {
                EntryOutcome::Notify(alert) => {
                    info!(target: TARGET_JOB_FEED, "\n{}", alert.message());
                    if let Err(err) = self.notifier.notify(&alert.notification()).await {
                        error!(target: TARGET_JOB_FEED, "Failed to send notification for {}: {:#}", alert.posting.link, err);
                        report.notify_failures += 1;
                    } else {
                        report.notified += 1;
                    }
                    seen.mark_seen(&alert.posting.id);
                }
                EntryOutcome::AlreadySeen(_) => report.already_seen += 1,
                EntryOutcome::Stale(id) => {
                    debug!(target: TARGET_JOB_FEED, "Job {} is older than the recency window", id);
                    report.stale += 1;
                }
                EntryOutcome::Skipped(reason) => {
                    warn!(target: TARGET_JOB_FEED, "Skipping entry from {}: {}", feed_url, reason);
                    report.malformed += 1;
                }
            }
        }
        Ok(())
    }
}

/// Repeats [`FeedPoller::run_cycle`] forever, pausing `interval` between cycles.
pub async fn run_forever<S: FeedSource, N: Notifier>(
    poller: &FeedPoller<S, N>,
    interval: Duration,
) -> Result<()> {
    loop {
        let report = poller.run_cycle(Local::now()).await?;
        info!(
            target: TARGET_JOB_FEED,
            "Cycle done: {} notified, {} seen, {} stale, {} malformed, {}/{} feeds failed",
            report.notified,
            report.already_seen,
            report.stale,
            report.malformed,
            report.feeds_failed,
            report.feeds_processed + report.feeds_failed
        );
        debug!(target: TARGET_JOB_FEED, "Waiting {:?} before next fetch", interval);
        sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const FEED_A: &str = "https://www.upwork.com/ab/feed/jobs/rss?q=data";
    const FEED_B: &str = "https://www.upwork.com/ab/feed/jobs/rss?q=rust";

    struct FakeSource {
        bodies: HashMap<String, String>,
    }

    #[async_trait]
    impl FeedSource for FakeSource {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.bodies
                .get(url)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("connection refused: {}", url))
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<Notification>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, notification: &Notification) -> Result<()> {
            self.sent.lock().unwrap().push(notification.clone());
            if self.fail {
                anyhow::bail!("notification daemon unavailable");
            }
            Ok(())
        }
    }

    struct Item<'a> {
        title: &'a str,
        id: &'a str,
        age_minutes: i64,
        description: &'a str,
    }

    fn rss(now: &DateTime<Local>, items: &[Item]) -> String {
        let items: String = items
            .iter()
            .map(|item| {
                let published = *now - ChronoDuration::minutes(item.age_minutes);
                format!(
                    "<item><title><![CDATA[{} - Upwork]]></title>\
                     <link>https://www.upwork.com/jobs/job_%{}?source=rss</link>\
                     <description><![CDATA[{}]]></description>\
                     <pubDate>{}</pubDate></item>",
                    item.title,
                    item.id,
                    item.description,
                    published.to_rfc2822()
                )
            })
            .collect();
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><rss version=\"2.0\"><channel>\
             <title>Jobs</title><link>https://www.upwork.com</link><description>Jobs</description>\
             {}</channel></rss>",
            items
        )
    }

    const DATA_ENTRY: &str = "Enter 300 invoices into Excel. Deadline Friday.<br /><br />\
        <b>Budget</b>: $500-$1000\n<br /><b>Category</b>: Data Entry<br />\
        <b>Skills</b>:Excel,     Data Entry     \n<br /><b>Country</b>: United States\n<br />";

    fn setup(feeds: &[&str]) -> (TempDir, Settings) {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        fs::write(
            &config_path,
            serde_json::json!({ "feed_url": feeds }).to_string(),
        )
        .unwrap();
        let settings = Settings {
            config_path,
            processed_jobs_path: dir.path().join("processed_jobs.json"),
            ..Settings::default()
        };
        (dir, settings)
    }

    fn poller(
        settings: &Settings,
        bodies: Vec<(&str, String)>,
        notifier: RecordingNotifier,
    ) -> FeedPoller<FakeSource, RecordingNotifier> {
        let source = FakeSource {
            bodies: bodies
                .into_iter()
                .map(|(url, body)| (url.to_string(), body))
                .collect(),
        };
        FeedPoller::new(source, notifier, settings)
    }

    fn persisted(path: &Path) -> Vec<String> {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_new_posting_is_notified_and_persisted() {
        let now = Local::now();
        let (_dir, settings) = setup(&[FEED_A]);
        let body = rss(
            &now,
            &[Item {
                title: "Invoice data entry",
                id: "7E01data",
                age_minutes: 10,
                description: DATA_ENTRY,
            }],
        );
        let poller = poller(&settings, vec![(FEED_A, body)], RecordingNotifier::default());

        let report = poller.run_cycle(now).await.unwrap();
        assert_eq!(report.notified, 1);
        assert_eq!(report.feeds_processed, 1);

        let sent = poller.notifier.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        let notification = &sent[0];
        assert_eq!(notification.title, NOTIFICATION_TITLE);
        assert_eq!(
            notification.link,
            "https://www.upwork.com/jobs/job_%7E01data?source=rss"
        );
        let lines: Vec<&str> = notification.body.lines().collect();
        assert_eq!(lines[0], "Invoice data entry");
        assert_eq!(lines[1], "#Data_Entry");
        assert_eq!(lines[2], "💲 Budget $500-$1000");
        assert_eq!(lines[3], "📄 Enter 300 invoices into Excel.");
        assert!(lines[4].starts_with("🕑 0h 10m ago ("));
        assert_eq!(lines[5], "🌍 United States");
        assert_eq!(lines[6], "#Excel #Data_Entry");

        assert_eq!(persisted(&settings.processed_jobs_path), vec!["7E01data"]);
    }

    #[tokio::test]
    async fn test_repeated_cycle_does_not_renotify() {
        let now = Local::now();
        let (_dir, settings) = setup(&[FEED_A]);
        let body = rss(
            &now,
            &[Item {
                title: "Invoice data entry",
                id: "7E01data",
                age_minutes: 5,
                description: DATA_ENTRY,
            }],
        );
        let poller = poller(&settings, vec![(FEED_A, body)], RecordingNotifier::default());

        poller.run_cycle(now).await.unwrap();
        let second = poller.run_cycle(now).await.unwrap();
        assert_eq!(second.notified, 0);
        assert_eq!(second.already_seen, 1);
        assert_eq!(poller.notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stale_posting_is_ignored_and_not_recorded() {
        let now = Local::now();
        let (_dir, settings) = setup(&[FEED_A]);
        let body = rss(
            &now,
            &[Item {
                title: "Old job",
                id: "7E01old",
                age_minutes: 61,
                description: DATA_ENTRY,
            }],
        );
        let poller = poller(&settings, vec![(FEED_A, body)], RecordingNotifier::default());

        let report = poller.run_cycle(now).await.unwrap();
        assert_eq!(report.stale, 1);
        assert!(poller.notifier.sent.lock().unwrap().is_empty());
        assert!(persisted(&settings.processed_jobs_path).is_empty());
    }

    #[tokio::test]
    async fn test_seen_posting_is_skipped_even_when_fresh() {
        let now = Local::now();
        let (_dir, settings) = setup(&[FEED_A]);
        fs::write(&settings.processed_jobs_path, r#"["7E01data"]"#).unwrap();
        let body = rss(
            &now,
            &[Item {
                title: "Invoice data entry",
                id: "7E01data",
                age_minutes: 1,
                description: DATA_ENTRY,
            }],
        );
        let poller = poller(&settings, vec![(FEED_A, body)], RecordingNotifier::default());

        let report = poller.run_cycle(now).await.unwrap();
        assert_eq!(report.already_seen, 1);
        assert!(poller.notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_entry_does_not_abort_feed() {
        let now = Local::now();
        let (_dir, settings) = setup(&[FEED_A]);
        let body = rss(
            &now,
            &[
                Item {
                    title: "No category",
                    id: "7E01nocat",
                    age_minutes: 20,
                    description: "Something.<br /><b>Budget</b>: $10",
                },
                Item {
                    title: "Invoice data entry",
                    id: "7E01data",
                    age_minutes: 10,
                    description: DATA_ENTRY,
                },
            ],
        );
        let poller = poller(&settings, vec![(FEED_A, body)], RecordingNotifier::default());

        let report = poller.run_cycle(now).await.unwrap();
        assert_eq!(report.malformed, 1);
        assert_eq!(report.notified, 1);
        assert_eq!(persisted(&settings.processed_jobs_path), vec!["7E01data"]);
    }

    #[tokio::test]
    async fn test_failed_feed_does_not_abort_cycle() {
        let now = Local::now();
        let (_dir, settings) = setup(&[FEED_A, "not a url", FEED_B]);
        let body = rss(
            &now,
            &[Item {
                title: "Rust CLI",
                id: "7E01rust",
                age_minutes: 3,
                description: "Build a CLI.<br /><b>Category</b>: Desktop Software Development<br />",
            }],
        );
        // FEED_A has no body and fails to fetch
        let poller = poller(&settings, vec![(FEED_B, body)], RecordingNotifier::default());

        let report = poller.run_cycle(now).await.unwrap();
        assert_eq!(report.feeds_failed, 2);
        assert_eq!(report.feeds_processed, 1);
        assert_eq!(report.notified, 1);
    }

    #[tokio::test]
    async fn test_notifications_in_chronological_order() {
        let now = Local::now();
        let (_dir, settings) = setup(&[FEED_A]);
        // feeds list newest first
        let body = rss(
            &now,
            &[
                Item {
                    title: "Newest",
                    id: "7E01new",
                    age_minutes: 2,
                    description: DATA_ENTRY,
                },
                Item {
                    title: "Oldest",
                    id: "7E01old",
                    age_minutes: 40,
                    description: DATA_ENTRY,
                },
            ],
        );
        let poller = poller(&settings, vec![(FEED_A, body)], RecordingNotifier::default());

        poller.run_cycle(now).await.unwrap();
        let titles: Vec<String> = poller
            .notifier
            .sent
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.body.lines().next().unwrap_or_default().to_string())
            .collect();
        assert_eq!(titles, vec!["Oldest", "Newest"]);
        assert_eq!(
            persisted(&settings.processed_jobs_path),
            vec!["7E01old", "7E01new"]
        );
    }

    #[tokio::test]
    async fn test_equal_timestamps_keep_oldest_first_order() {
        let now = Local::now();
        let (_dir, settings) = setup(&[FEED_A]);
        // same pubDate, listed newest first
        let body = rss(
            &now,
            &[
                Item {
                    title: "Second",
                    id: "7E01second",
                    age_minutes: 15,
                    description: DATA_ENTRY,
                },
                Item {
                    title: "First",
                    id: "7E01first",
                    age_minutes: 15,
                    description: DATA_ENTRY,
                },
            ],
        );
        let poller = poller(&settings, vec![(FEED_A, body)], RecordingNotifier::default());

        poller.run_cycle(now).await.unwrap();
        let titles: Vec<String> = poller
            .notifier
            .sent
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.body.lines().next().unwrap_or_default().to_string())
            .collect();
        assert_eq!(titles, vec!["First", "Second"]);
        assert_eq!(
            persisted(&settings.processed_jobs_path),
            vec!["7E01first", "7E01second"]
        );
    }

    #[tokio::test]
    async fn test_same_job_in_two_feeds_notified_once() {
        let now = Local::now();
        let (_dir, settings) = setup(&[FEED_A, FEED_B]);
        let item = Item {
            title: "Mobile app",
            id: "7E01dup",
            age_minutes: 59,
            description: "Need an app.<br /><b>Category</b>: Web &amp; Mobile Development<br />\
                          <b>Skills</b>: <br />",
        };
        let poller = poller(
            &settings,
            vec![
                (FEED_A, rss(&now, std::slice::from_ref(&item))),
                (FEED_B, rss(&now, std::slice::from_ref(&item))),
            ],
            RecordingNotifier::default(),
        );

        let report = poller.run_cycle(now).await.unwrap();
        assert_eq!(report.feeds_processed, 2);
        assert_eq!(report.notified, 1);
        assert_eq!(report.already_seen, 1);

        let sent = poller.notifier.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        let lines: Vec<&str> = sent[0].body.lines().collect();
        assert_eq!(lines[1], "#Web_and_Mobile_Development");
        assert_eq!(lines[2], "💲 N/A");
        assert_eq!(lines[5], "🌍 N/A");
        assert_eq!(lines[6], "N/A");

        assert_eq!(persisted(&settings.processed_jobs_path), vec!["7E01dup"]);
    }

    #[tokio::test]
    async fn test_notify_failure_is_not_fatal() {
        let now = Local::now();
        let (_dir, settings) = setup(&[FEED_A]);
        let body = rss(
            &now,
            &[Item {
                title: "Invoice data entry",
                id: "7E01data",
                age_minutes: 10,
                description: DATA_ENTRY,
            }],
        );
        let notifier = RecordingNotifier {
            fail: true,
            ..RecordingNotifier::default()
        };
        let poller = poller(&settings, vec![(FEED_A, body)], notifier);

        let report = poller.run_cycle(now).await.unwrap();
        assert_eq!(report.notify_failures, 1);
        assert_eq!(persisted(&settings.processed_jobs_path), vec!["7E01data"]);
    }

    #[tokio::test]
    async fn test_missing_config_is_fatal() {
        let (dir, mut settings) = setup(&[FEED_A]);
        settings.config_path = dir.path().join("missing.json");
        let poller = poller(&settings, vec![], RecordingNotifier::default());
        assert!(poller.run_cycle(Local::now()).await.is_err());
    }

    #[tokio::test]
    async fn test_corrupt_registry_is_fatal() {
        let (_dir, settings) = setup(&[FEED_A]);
        fs::write(&settings.processed_jobs_path, "[\"7E01data\"").unwrap();
        let poller = poller(&settings, vec![], RecordingNotifier::default());
        assert!(poller.run_cycle(Local::now()).await.is_err());
    }
}
