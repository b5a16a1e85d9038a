// src/snapshot.rs
//! Durable per-member streak baseline.
//!
//! The store holds exactly one JSON object (MemberID → streak) that is
//! replaced wholesale at the end of a successful cycle. An absent file is the
//! bootstrap signal and is not an error; a file that exists but cannot be
//! read or parsed is fatal to the cycle, otherwise a corrupted baseline would
//! re-announce every milestone on the next run.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;

use crate::ladder::MemberId;

/// Point-in-time observation of the whole roster. BTreeMap keeps iteration
/// (and the serialized file) deterministic.
pub type StreakSnapshot = BTreeMap<MemberId, u32>;

#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the previous cycle's snapshot. `Ok(None)` means no baseline has
    /// ever been committed (bootstrap).
    pub async fn load(&self) -> Result<Option<StreakSnapshot>> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("reading state file {}", self.path.display()))
            }
        };
        let snapshot: StreakSnapshot = serde_json::from_slice(&raw)
            .with_context(|| format!("state file {} is corrupt", self.path.display()))?;
        Ok(Some(snapshot))
    }

    /// Replace the stored baseline. Writes a sibling temp file first and
    /// renames it over the target so a concurrent `load` never observes a
    /// partial snapshot.
    pub async fn save(&self, snapshot: &StreakSnapshot) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating state dir {}", dir.display()))?;
        }
        let body = serde_json::to_vec_pretty(snapshot).context("serializing snapshot")?;

        let mut tmp = self.path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, body)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replacing state file {}", self.path.display()))?;
        Ok(())
    }
}
