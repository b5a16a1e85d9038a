use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::Notifier;

/// HTTP client for the announce relay: one POST per announcement with the
/// target channel and the rendered message.
#[derive(Clone)]
pub struct AnnounceClient {
    url: String,
    client: Client,
    timeout: Duration,
}

#[derive(Serialize)]
struct AnnouncePayload<'a> {
    channel_id: &'a str,
    message: &'a str,
}

impl AnnounceClient {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: Client::new(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }
}

#[async_trait]
impl Notifier for AnnounceClient {
    async fn send(&self, channel_id: &str, message: &str) -> Result<()> {
        if message.is_empty() {
            return Ok(());
        }
        let payload = AnnouncePayload {
            channel_id,
            message,
        };
        self.client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .context("announce relay post")?
            .error_for_status()
            .context("announce relay non-2xx")?;
        Ok(())
    }
}
