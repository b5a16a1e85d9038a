//! # Announcement Decision Engine
//! Pure, testable logic that maps `(current, previous)` snapshots → the set
//! of announceable `Decision`s. No I/O, suitable for unit tests and offline
//! evaluation.
//!
//! A member announces iff their current streak is an exact milestone of the
//! threshold table AND it crosses their previous value under the configured
//! comparison policy. The first-ever cycle (no previous snapshot) announces
//! nothing and only establishes the baseline.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::decision::{Decision, ThresholdTable};
use crate::ladder::MemberId;
use crate::snapshot::StreakSnapshot;

/// How "crossed a milestone" compares against the previous observation.
///
/// `Strict` (`>`) fires only on the cycle a milestone is first reached, or
/// re-reached after dropping below it. `Inclusive` (`>=`) re-announces an
/// unchanged streak on every cycle it sits at a milestone value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonPolicy {
    Strict,
    Inclusive,
}

impl ComparisonPolicy {
    pub fn crossed(self, current: u32, previous: u32) -> bool {
        match self {
            ComparisonPolicy::Strict => current > previous,
            ComparisonPolicy::Inclusive => current >= previous,
        }
    }
}

impl FromStr for ComparisonPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" | ">" => Ok(ComparisonPolicy::Strict),
            "inclusive" | ">=" => Ok(ComparisonPolicy::Inclusive),
            other => anyhow::bail!("unknown comparison policy {other:?} (strict|inclusive)"),
        }
    }
}

/// Result of one evaluation. `bootstrap` signals that `current` must still be
/// committed as the new baseline even though nothing is announced.
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    pub decisions: Vec<Decision>,
    pub bootstrap: bool,
}

/// Evaluate the freshly fetched snapshot against the previous baseline.
///
/// Members missing from `current` (fetch failures) are not evaluated at all;
/// members missing from `previous` count as streak 0. Decisions come out
/// sorted by member id for reproducible output.
pub fn decide(
    current: &StreakSnapshot,
    previous: Option<&StreakSnapshot>,
    display_names: &HashMap<MemberId, String>,
    table: &ThresholdTable,
    policy: ComparisonPolicy,
) -> Outcome {
    let Some(previous) = previous else {
        return Outcome {
            decisions: Vec::new(),
            bootstrap: true,
        };
    };

    // BTreeMap iteration keeps the output ordered by member id.
    let mut decisions = Vec::new();
    for (member, &streak) in current {
        let prev = previous.get(member).copied().unwrap_or(0);
        if !policy.crossed(streak, prev) {
            continue;
        }
        let name = display_names
            .get(member)
            .map(String::as_str)
            .unwrap_or(member);
        if let Some(message) = table.render(streak, name) {
            decisions.push(Decision {
                member_id: member.clone(),
                display_name: name.to_string(),
                streak,
                message,
            });
        }
    }

    Outcome {
        decisions,
        bootstrap: false,
    }
}
