//! Announcement decisions and the milestone table that produces them.
//!
//! The table maps exact streak values to message templates. Exact match only:
//! a streak of 11 against milestones {10, 15} announces nothing. Templates
//! carry a `{name}` placeholder filled with the member's display name.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::ladder::MemberId;

/// One announceable milestone crossing. Derived per cycle, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub member_id: MemberId,
    pub display_name: String,
    pub streak: u32,
    pub message: String,
}

/// Static mapping streak value → message template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdTable {
    templates: BTreeMap<u32, String>,
}

impl ThresholdTable {
    /// The stock milestone set shipped with the service.
    pub fn builtin() -> Self {
        let templates = [
            (4, "{name} is on a 4 game win streak!"),
            (6, "Killing spree! {name} is on a 6 game win streak!"),
            (8, "RAMPAGE. {name} is on an 8 game win streak!"),
            (9, "{name} is completely dominating with a 9 win streak!"),
            (10, "U N S T O P P A B L E. {name} is on a 10 win streak!"),
            (
                15,
                "🎉 🎉 🎉 🎉 Congratulations!  🎉 🎉 🎉 🎉\n{name} has gone 15 games without losing a single one!",
            ),
        ]
        .into_iter()
        .map(|(k, v)| (k, v.to_string()))
        .collect();
        Self { templates }
    }

    pub fn new(templates: BTreeMap<u32, String>) -> Self {
        Self { templates }
    }

    /// Parse a `[messages]` TOML table; keys are streak values.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        #[derive(Deserialize)]
        struct File {
            messages: BTreeMap<String, String>,
        }
        let file: File = toml::from_str(raw).context("parsing thresholds TOML")?;
        let mut templates = BTreeMap::new();
        for (key, template) in file.messages {
            let streak: u32 = key
                .parse()
                .with_context(|| format!("thresholds key {key:?} is not a streak value"))?;
            templates.insert(streak, template);
        }
        Ok(Self { templates })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading thresholds from {}", path.display()))?;
        Self::from_toml_str(&raw)
    }

    /// Exact-match lookup; `None` for any streak that is not a milestone.
    pub fn template_for(&self, streak: u32) -> Option<&str> {
        self.templates.get(&streak).map(String::as_str)
    }

    pub fn render(&self, streak: u32, display_name: &str) -> Option<String> {
        self.template_for(streak)
            .map(|t| t.replace("{name}", display_name))
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn milestones(&self) -> impl Iterator<Item = u32> + '_ {
        self.templates.keys().copied()
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) at streak {}",
            self.display_name, self.member_id, self.streak
        )
    }
}
