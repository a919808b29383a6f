//! Desktop notifications for new job postings.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::TARGET_NOTIFY;

#[cfg(target_os = "macos")]
pub const DEFAULT_NOTIFIER_COMMAND: &str = "terminal-notifier";
#[cfg(not(target_os = "macos"))]
pub const DEFAULT_NOTIFIER_COMMAND: &str = "notify-send";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    /// Opened in the browser when the notification is clicked.
    pub link: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<()>;
}

/// Sends notifications through an external command.
///
/// `terminal-notifier` gets the link as its `-open` action. Any other command
/// is treated like `notify-send`, which has no click action, so the link is
/// appended to the body instead.
#[derive(Clone, Debug)]
pub struct DesktopNotifier {
    command: String,
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFIER_COMMAND)
    }
}

impl DesktopNotifier {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    fn is_terminal_notifier(&self) -> bool {
        self.command.ends_with("terminal-notifier")
    }

    /// Builds the argument list for the configured command.
    pub fn args(&self, notification: &Notification) -> Vec<String> {
        if self.is_terminal_notifier() {
            vec![
                "-title".to_string(),
                notification.title.clone(),
                "-message".to_string(),
                notification.body.clone(),
                "-open".to_string(),
                notification.link.clone(),
            ]
        } else {
            vec![
                notification.title.clone(),
                format!("{}\n{}", notification.body, notification.link),
            ]
        }
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        debug!(target: TARGET_NOTIFY, "Running {} for {}", self.command, notification.link);

        let output = Command::new(&self.command)
            .args(self.args(notification))
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.command))?;

        if !output.status.success() {
            return Err(anyhow::anyhow!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        info!(target: TARGET_NOTIFY, "Notification sent. Link will open when notification is clicked.");
        Ok(())
    }
}
