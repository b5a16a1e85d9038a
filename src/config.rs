// src/config.rs
//! Startup configuration. Every knob is read from the environment exactly
//! once, validated, and carried as a plain struct for the life of the
//! process; nothing is re-read per cycle.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::decision::ThresholdTable;
use crate::engine::ComparisonPolicy;

pub const DEFAULT_WORKERS: usize = 16;
/// 5 days, in seconds.
pub const DEFAULT_RECENCY_WINDOW_SECS: i64 = 432_000;
pub const DEFAULT_CYCLE_BUDGET_SECS: u64 = 300;
pub const DEFAULT_STATE_PATH: &str = "state/win_streaks.json";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Concurrent in-flight tasks for both the fetch and dispatch pools.
    pub workers: usize,
    pub recency_window_secs: i64,
    pub recency_filter: bool,
    pub comparison: ComparisonPolicy,
    pub thresholds: ThresholdTable,
    pub state_path: PathBuf,
    pub trigger_token: String,
    pub cycle_budget_secs: u64,
    pub store_base_url: String,
    pub guild_api_url: String,
    pub guild_id: String,
    pub bot_token: String,
    pub member_role_id: String,
    pub announce_url: String,
    pub announcement_channel_id: String,
    pub stream_api_url: String,
    pub stream_client_id: Option<String>,
    pub bind_addr: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let workers = parsed("STREAK_WORKERS", DEFAULT_WORKERS)?;
        if workers == 0 {
            bail!("STREAK_WORKERS must be at least 1");
        }

        let comparison = match env::var("STREAK_COMPARISON") {
            Ok(raw) => ComparisonPolicy::from_str(&raw)?,
            Err(_) => ComparisonPolicy::Strict,
        };

        let thresholds = match env::var("THRESHOLDS_PATH") {
            Ok(path) => ThresholdTable::load(&PathBuf::from(path))?,
            Err(_) => ThresholdTable::builtin(),
        };
        if thresholds.is_empty() {
            bail!("threshold table is empty, nothing could ever be announced");
        }

        Ok(Self {
            workers,
            recency_window_secs: parsed("RECENCY_WINDOW_SECS", DEFAULT_RECENCY_WINDOW_SECS)?,
            recency_filter: flag("RECENCY_FILTER", true)?,
            comparison,
            thresholds,
            state_path: PathBuf::from(
                env::var("STATE_PATH").unwrap_or_else(|_| DEFAULT_STATE_PATH.to_string()),
            ),
            trigger_token: required("TRIGGER_TOKEN")?,
            cycle_budget_secs: parsed("CYCLE_BUDGET_SECS", DEFAULT_CYCLE_BUDGET_SECS)?,
            store_base_url: required("STORE_BASE_URL")?,
            guild_api_url: env::var("GUILD_API_URL")
                .unwrap_or_else(|_| "https://discordapp.com/api".to_string()),
            guild_id: required("GUILD_ID")?,
            bot_token: required("BOT_TOKEN")?,
            member_role_id: required("MEMBER_ROLE_ID")?,
            announce_url: required("ANNOUNCE_URL")?,
            announcement_channel_id: required("ANNOUNCEMENT_CHANNEL_ID")?,
            stream_api_url: env::var("STREAM_API_URL")
                .unwrap_or_else(|_| "https://api.twitch.tv/helix".to_string()),
            stream_client_id: env::var("TWITCH_CLIENT_ID").ok().filter(|v| !v.is_empty()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
        })
    }

    /// Recency window handed to the extractor; `None` disables filtering.
    pub fn recency(&self) -> Option<i64> {
        self.recency_filter.then_some(self.recency_window_secs)
    }
}

fn required(key: &str) -> Result<String> {
    let value = env::var(key).with_context(|| format!("missing required env var {key}"))?;
    if value.trim().is_empty() {
        bail!("env var {key} is empty");
    }
    Ok(value)
}

fn parsed<T: FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {key}={raw:?}: {e}")),
        Err(_) => Ok(default),
    }
}

fn flag(key: &str, default: bool) -> Result<bool> {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => bail!("invalid {key}={other:?} (expected true/false)"),
        },
        Err(_) => Ok(default),
    }
}
