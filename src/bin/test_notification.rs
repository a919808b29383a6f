use anyhow::Result;
use tracing::info;

use job_feed_notifier::environment::Settings;
use job_feed_notifier::notifier::{DesktopNotifier, Notification, Notifier};
use job_feed_notifier::poller::NOTIFICATION_TITLE;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let link = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://www.upwork.com/nx/search/jobs/".to_string());

    let settings = Settings::from_env();
    let notifier = match &settings.notifier_command {
        Some(command) => DesktopNotifier::new(command.as_str()),
        None => DesktopNotifier::default(),
    };

    let notification = Notification {
        title: NOTIFICATION_TITLE.to_string(),
        body: "Test job posting\n#Testing\n💲 Budget $100\n📄 This is a test notification.\n🌍 N/A\n#Rust".to_string(),
        link,
    };

    info!("Sending test notification with {:?}", notifier);
    notifier.notify(&notification).await?;
    Ok(())
}
