// src/sources/store.rs
//! Document-store client for per-member ladder data.
//!
//! The store is a key-path REST document store (Firebase-style): values live
//! under `/members/{id}/...` and absent paths return JSON `null`. A member's
//! ladder document nests region → character → season → race → record; the
//! pipeline flattens that to one `SeasonBucket` per character.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::AppConfig;
use crate::ladder::{ActivityRecord, SeasonBucket};

use super::StreakSource;

#[derive(Clone)]
pub struct HttpStreakSource {
    base_url: String,
    client: Client,
}

#[derive(Debug, Deserialize, Default)]
struct CharacterDoc {
    #[serde(default)]
    ladder_info: BTreeMap<String, BTreeMap<String, ActivityRecord>>,
}

/// region id → character id → character document.
type CharactersDoc = BTreeMap<String, BTreeMap<String, CharacterDoc>>;

impl HttpStreakSource {
    pub fn new(cfg: &AppConfig, client: Client) -> Self {
        Self {
            base_url: cfg.store_base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}.json", self.base_url)
    }
}

#[async_trait]
impl StreakSource for HttpStreakSource {
    async fn fetch_ladders(&self, member: &str) -> Result<Vec<SeasonBucket>> {
        let url = self.url(&format!("members/{member}/characters"));
        let doc: Option<CharactersDoc> = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("fetching characters for {member}"))?
            .error_for_status()
            .with_context(|| format!("characters request for {member} rejected"))?
            .json()
            .await
            .with_context(|| format!("decoding characters for {member}"))?;

        let doc = doc.unwrap_or_default();
        let buckets = doc
            .into_values()
            .flat_map(BTreeMap::into_values)
            .map(|character| {
                character
                    .ladder_info
                    .into_iter()
                    .map(|(season, races)| (season, races.into_values().collect()))
                    .collect::<SeasonBucket>()
            })
            .collect();
        Ok(buckets)
    }
}

/// Shallow listing of registered member ids (`/members.json?shallow=true`).
pub async fn registered_member_ids(
    client: &Client,
    base_url: &str,
) -> Result<Vec<String>> {
    let url = format!("{}/members.json?shallow=true", base_url.trim_end_matches('/'));
    let ids: Option<BTreeMap<String, serde_json::Value>> = client
        .get(&url)
        .send()
        .await
        .context("fetching registered members")?
        .error_for_status()
        .context("registered members request rejected")?
        .json()
        .await
        .context("decoding registered members")?;
    Ok(ids.unwrap_or_default().into_keys().collect())
}

/// A member's stream connection on file, if any.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamConnection {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

pub async fn stream_connection(
    client: &Client,
    base_url: &str,
    member: &str,
) -> Result<Option<StreamConnection>> {
    let url = format!(
        "{}/members/{member}/connections/twitch.json",
        base_url.trim_end_matches('/')
    );
    let conn: Option<StreamConnection> = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("fetching stream connection for {member}"))?
        .error_for_status()
        .with_context(|| format!("stream connection request for {member} rejected"))?
        .json()
        .await
        .with_context(|| format!("decoding stream connection for {member}"))?;
    // A connection without both id and name is unusable.
    Ok(conn.filter(|c| !c.id.is_empty() && !c.name.is_empty()))
}
