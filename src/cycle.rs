// src/cycle.rs
//! One pipeline run: roster → fetch → evaluate → dispatch → commit baseline.
//!
//! The previous and current snapshots are explicit values owned by this
//! function; no state lives across invocations outside the `StateStore`.
//! Whole-cycle failures (roster, state read/write) propagate and leave the
//! stored baseline untouched; per-item failures (fetch, dispatch, enrichment)
//! are isolated inside their stage.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use metrics::{counter, gauge};
use serde::Serialize;
use tracing::info;

use crate::config::AppConfig;
use crate::dispatch;
use crate::engine;
use crate::fetch;
use crate::ladder::MemberId;
use crate::notify::Notifier;
use crate::snapshot::StateStore;
use crate::sources::{LiveStatusSource, RosterSource, StreakSource};

/// Everything a cycle touches outside its own computation.
pub struct CycleDeps {
    pub roster: Arc<dyn RosterSource>,
    pub streaks: Arc<dyn StreakSource>,
    pub live: Arc<dyn LiveStatusSource>,
    pub notifier: Arc<dyn Notifier>,
    pub store: StateStore,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CycleReport {
    pub roster_size: usize,
    pub fetched: usize,
    pub bootstrap: bool,
    pub announced: usize,
    pub dispatch_failures: usize,
}

pub async fn run_cycle(cfg: &AppConfig, deps: &CycleDeps) -> Result<CycleReport> {
    let registered = deps
        .roster
        .registered_members()
        .await
        .context("resolving registered members")?;
    let display_names = deps
        .roster
        .display_names()
        .await
        .context("resolving guild display names")?;

    // Only registered ids that still hold the membership role are evaluated.
    let roster: Vec<MemberId> = registered
        .into_iter()
        .filter(|id| display_names.contains_key(id))
        .collect();

    // Load the baseline before doing any work that could announce; a corrupt
    // state file must fail the cycle here, not after messages went out.
    let previous = deps
        .store
        .load()
        .await
        .context("loading previous streak baseline")?;

    let now = Utc::now().timestamp();
    let current = fetch::fetch_all(
        Arc::clone(&deps.streaks),
        roster.clone(),
        cfg.workers,
        now,
        cfg.recency(),
    )
    .await;

    let outcome = engine::decide(
        &current,
        previous.as_ref(),
        &display_names,
        &cfg.thresholds,
        cfg.comparison,
    );

    let announced = outcome.decisions.len();
    let dispatched = if outcome.bootstrap {
        info!("bootstrap cycle: establishing baseline, no announcements");
        dispatch::DispatchReport::default()
    } else {
        dispatch::dispatch_all(
            outcome.decisions,
            Arc::clone(&deps.notifier),
            Arc::clone(&deps.live),
            cfg.announcement_channel_id.clone(),
            cfg.workers,
        )
        .await
    };

    deps.store
        .save(&current)
        .await
        .context("committing new streak baseline")?;

    counter!("cycle_runs_total").increment(1);
    gauge!("cycle_last_run_ts").set(now as f64);

    let report = CycleReport {
        roster_size: roster.len(),
        fetched: current.len(),
        bootstrap: outcome.bootstrap,
        announced,
        dispatch_failures: dispatched.failed,
    };
    info!(
        roster = report.roster_size,
        fetched = report.fetched,
        announced = report.announced,
        failed = report.dispatch_failures,
        bootstrap = report.bootstrap,
        "cycle complete"
    );
    Ok(report)
}
