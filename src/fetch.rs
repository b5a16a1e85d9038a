// src/fetch.rs
//! Bounded-concurrency fan-out of per-member streak fetches.
//!
//! One task per roster member, at most `workers` in flight at once. The batch
//! always runs to completion: a member whose fetch fails is dropped from the
//! resulting snapshot (absence, not streak 0) and the rest continue. Callers
//! must treat a missing key as "no data this cycle".

use std::sync::Arc;

use metrics::counter;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

use crate::ladder::{self, MemberId};
use crate::snapshot::StreakSnapshot;
use crate::sources::StreakSource;

pub async fn fetch_all(
    source: Arc<dyn StreakSource>,
    members: Vec<MemberId>,
    workers: usize,
    now: i64,
    recency: Option<i64>,
) -> StreakSnapshot {
    let limiter = Arc::new(Semaphore::new(workers.max(1)));
    let mut tasks = JoinSet::new();

    for member in members {
        let source = Arc::clone(&source);
        let limiter = Arc::clone(&limiter);
        tasks.spawn(async move {
            let _permit = limiter
                .acquire_owned()
                .await
                .expect("fetch semaphore closed");
            match source.fetch_ladders(&member).await {
                Ok(buckets) => Some((member, ladder::member_streak(&buckets, now, recency))),
                Err(e) => {
                    counter!("streak_fetch_failures_total").increment(1);
                    warn!(member = %member, "streak fetch failed, dropping member this cycle: {e:#}");
                    None
                }
            }
        });
    }

    let mut snapshot = StreakSnapshot::new();
    while let Some(settled) = tasks.join_next().await {
        match settled {
            Ok(Some((member, streak))) => {
                snapshot.insert(member, streak);
            }
            Ok(None) => {}
            Err(e) => {
                // A panicked task costs only its own member, like any failure.
                counter!("streak_fetch_failures_total").increment(1);
                warn!(error = %e, "streak fetch task aborted");
            }
        }
    }
    snapshot
}
