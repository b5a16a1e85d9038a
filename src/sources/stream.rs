// src/sources/stream.rs
//! Live-status lookup for message enrichment: document-store connection
//! record first, then the stream platform's streams endpoint. Best-effort
//! only; callers treat any failure here as "not live".

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::AppConfig;

use super::{store, LiveStatus, LiveStatusSource};

#[derive(Clone)]
pub struct HttpLiveSource {
    stream_api_url: String,
    client_id: Option<String>,
    store_base_url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct StreamsPage {
    #[serde(default)]
    data: Vec<StreamEntry>,
}

#[derive(Debug, Deserialize)]
struct StreamEntry {
    #[serde(default, rename = "type")]
    kind: String,
}

impl HttpLiveSource {
    pub fn new(cfg: &AppConfig, client: Client) -> Self {
        Self {
            stream_api_url: cfg.stream_api_url.trim_end_matches('/').to_string(),
            client_id: cfg.stream_client_id.clone(),
            store_base_url: cfg.store_base_url.clone(),
            client,
        }
    }
}

#[async_trait]
impl LiveStatusSource for HttpLiveSource {
    async fn live_status(&self, member: &str) -> Result<Option<LiveStatus>> {
        // Enrichment is disabled entirely without platform credentials.
        let Some(client_id) = &self.client_id else {
            return Ok(None);
        };
        let Some(conn) = store::stream_connection(&self.client, &self.store_base_url, member)
            .await?
        else {
            return Ok(None);
        };

        let url = format!(
            "{}/streams?first=1&user_id={}",
            self.stream_api_url, conn.id
        );
        let page: StreamsPage = self
            .client
            .get(&url)
            .header("Client-ID", client_id)
            .send()
            .await
            .with_context(|| format!("querying stream status for {member}"))?
            .error_for_status()
            .with_context(|| format!("stream status request for {member} rejected"))?
            .json()
            .await
            .with_context(|| format!("decoding stream status for {member}"))?;

        let is_live = page.data.first().is_some_and(|s| s.kind == "live");
        Ok(Some(LiveStatus {
            login: conn.name,
            is_live,
        }))
    }
}
