//! HTTP client creation and request handling for job feeds.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::header;
use tokio::time::{timeout, Duration};
use tracing::debug;

use crate::TARGET_WEB_REQUEST;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:138.0) Gecko/20100101 Firefox/138.0";

/// Where feed bodies come from.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

pub fn create_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .gzip(true)
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::default())
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))
}

/// Fetches feeds over HTTP(S), giving up on any request slower than the timeout.
#[derive(Clone, Debug)]
pub struct HttpFeedSource {
    client: reqwest::Client,
    request_timeout: Duration,
}

impl HttpFeedSource {
    pub fn new(request_timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_http_client()?,
            request_timeout,
        })
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str) -> Result<String> {
        debug!(target: TARGET_WEB_REQUEST, "Loading feed from {}", url);

        let request = self
            .client
            .get(url)
            .header(
                header::ACCEPT,
                "application/rss+xml, application/atom+xml, application/xml, text/xml, */*;q=0.9",
            )
            .send();

        let response = match timeout(self.request_timeout, request).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => return Err(anyhow::anyhow!("Request to {} failed: {}", url, err)),
            Err(_) => {
                return Err(anyhow::anyhow!(
                    "Request to {} timed out after {} seconds",
                    url,
                    self.request_timeout.as_secs()
                ))
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!("Non-success status {} from {}", status, url));
        }

        let body = match timeout(self.request_timeout, response.text()).await {
            Ok(Ok(body)) => body,
            Ok(Err(err)) => {
                return Err(anyhow::anyhow!(
                    "Failed to read response body from {}: {}",
                    url,
                    err
                ))
            }
            Err(_) => return Err(anyhow::anyhow!("Reading body from {} timed out", url)),
        };

        debug!(
            target: TARGET_WEB_REQUEST,
            "First 500 characters of response body: {}",
            body.chars().take(500).collect::<String>()
        );
        Ok(body)
    }
}
