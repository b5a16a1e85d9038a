//! Ladder data model and streak extraction.
//! Pure logic over the nested season/race records returned by the document
//! store. No I/O, suitable for unit tests and offline evaluation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Opaque stable member identifier, unique across all maps.
pub type MemberId = String;

/// One race's ladder entry within a season.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    #[serde(default)]
    pub current_win_streak: u32,
    /// Unix seconds of the last ladder game on this entry.
    #[serde(rename = "last_played_time_stamp", default)]
    pub last_played: i64,
}

/// Season identifier → ladder entries for that season. Identifiers sort
/// lexicographically; only the greatest (most recent) season counts.
pub type SeasonBucket = BTreeMap<String, Vec<ActivityRecord>>;

/// A record is fresh iff it was played inside the recency window ending now.
pub fn is_fresh(record: &ActivityRecord, now: i64, window_secs: i64) -> bool {
    record.last_played > now - window_secs
}

/// Current win streak for one character's season bucket.
///
/// Selects the most recent season, drops stale entries when a recency window
/// is given (`None` disables the filter), and returns the best streak among
/// what remains. Empty bucket or no surviving entries yield 0.
pub fn extract_streak(bucket: &SeasonBucket, now: i64, recency: Option<i64>) -> u32 {
    let Some((_, records)) = bucket.iter().next_back() else {
        return 0;
    };
    records
        .iter()
        .filter(|r| match recency {
            Some(window) => is_fresh(r, now, window),
            None => true,
        })
        .map(|r| r.current_win_streak)
        .max()
        .unwrap_or(0)
}

/// A member may ladder on several characters; the reported streak is the best
/// active one across all of them.
pub fn member_streak(buckets: &[SeasonBucket], now: i64, recency: Option<i64>) -> u32 {
    buckets
        .iter()
        .map(|b| extract_streak(b, now, recency))
        .max()
        .unwrap_or(0)
}
