use anyhow::Result;
use std::fs;
use tracing::{error, info};

use job_feed_notifier::environment::Settings;
use job_feed_notifier::logging;
use job_feed_notifier::notifier::DesktopNotifier;
use job_feed_notifier::poller::{run_forever, FeedPoller};
use job_feed_notifier::rss::HttpFeedSource;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let settings = Settings::from_env();

    fs::create_dir_all(&settings.log_dir)?;
    logging::configure_logging(&settings.log_dir);

    info!(
        "Starting job feed notifier: config={}, processed_jobs={}, interval={:?}",
        settings.config_path.display(),
        settings.processed_jobs_path.display(),
        settings.poll_interval
    );

    let source = HttpFeedSource::new(settings.request_timeout)?;
    let notifier = match &settings.notifier_command {
        Some(command) => DesktopNotifier::new(command.as_str()),
        None => DesktopNotifier::default(),
    };
    let poller = FeedPoller::new(source, notifier, &settings);

    if let Err(err) = run_forever(&poller, settings.poll_interval).await {
        error!("Stopping after fatal error: {:#}", err);
        return Err(err);
    }
    Ok(())
}
