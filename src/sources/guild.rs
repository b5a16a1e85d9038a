// src/sources/guild.rs
//! Roster resolution: registered ids from the document store intersected with
//! guild members holding the membership role. Display names prefer nickname,
//! then username, then the raw id.

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::AppConfig;
use crate::ladder::MemberId;

use super::{store, RosterSource};

#[derive(Clone)]
pub struct HttpRosterSource {
    guild_api_url: String,
    guild_id: String,
    bot_token: String,
    member_role_id: String,
    store_base_url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct GuildUser {
    #[serde(default)]
    id: String,
    #[serde(default)]
    username: String,
}

#[derive(Debug, Deserialize)]
struct GuildMember {
    user: Option<GuildUser>,
    #[serde(default)]
    nick: Option<String>,
    #[serde(default)]
    roles: Vec<String>,
}

impl HttpRosterSource {
    pub fn new(cfg: &AppConfig, client: Client) -> Self {
        Self {
            guild_api_url: cfg.guild_api_url.trim_end_matches('/').to_string(),
            guild_id: cfg.guild_id.clone(),
            bot_token: cfg.bot_token.clone(),
            member_role_id: cfg.member_role_id.clone(),
            store_base_url: cfg.store_base_url.clone(),
            client,
        }
    }
}

#[async_trait]
impl RosterSource for HttpRosterSource {
    async fn registered_members(&self) -> Result<Vec<MemberId>> {
        store::registered_member_ids(&self.client, &self.store_base_url).await
    }

    async fn display_names(&self) -> Result<HashMap<MemberId, String>> {
        let url = format!(
            "{}/guilds/{}/members?limit=500",
            self.guild_api_url, self.guild_id
        );
        let members: Vec<GuildMember> = self
            .client
            .get(&url)
            .header("Authorization", format!("Bot {}", self.bot_token))
            .send()
            .await
            .context("fetching guild members")?
            .error_for_status()
            .context("guild members request rejected")?
            .json()
            .await
            .context("decoding guild members")?;

        let mut names = HashMap::new();
        for member in members {
            if !member.roles.iter().any(|r| r == &self.member_role_id) {
                continue;
            }
            let Some(user) = member.user else { continue };
            if user.id.is_empty() {
                continue;
            }
            let name = member
                .nick
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| {
                    if user.username.is_empty() {
                        user.id.clone()
                    } else {
                        user.username.clone()
                    }
                });
            names.insert(user.id, name);
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guild_member_payload_shape() {
        let raw = serde_json::json!([
            { "user": { "id": "1", "username": "serral" }, "nick": "The GOAT", "roles": ["m"] },
            { "user": { "id": "2", "username": "maru" }, "roles": ["m", "other"] },
            { "user": { "id": "3", "username": "onlooker" }, "roles": [] }
        ]);
        let members: Vec<GuildMember> = serde_json::from_value(raw).unwrap();
        assert_eq!(members.len(), 3);
        assert_eq!(members[0].nick.as_deref(), Some("The GOAT"));
        assert!(members[1].nick.is_none());
        assert!(members[2].roles.is_empty());
    }
}
