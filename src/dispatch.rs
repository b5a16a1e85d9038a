// src/dispatch.rs
//! Bounded-concurrency fan-out of announcements.
//!
//! Each decision gets its own task: optional live-status enrichment, then one
//! delivery attempt. Enrichment failures leave the base message untouched;
//! delivery failures are logged and counted but never fail siblings or the
//! cycle.

use std::sync::Arc;

use metrics::counter;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::decision::Decision;
use crate::notify::Notifier;
use crate::sources::LiveStatusSource;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub sent: usize,
    pub failed: usize,
}

pub async fn dispatch_all(
    decisions: Vec<Decision>,
    notifier: Arc<dyn Notifier>,
    live: Arc<dyn LiveStatusSource>,
    channel_id: String,
    workers: usize,
) -> DispatchReport {
    let limiter = Arc::new(Semaphore::new(workers.max(1)));
    let mut tasks = JoinSet::new();

    for decision in decisions {
        let notifier = Arc::clone(&notifier);
        let live = Arc::clone(&live);
        let channel_id = channel_id.clone();
        let limiter = Arc::clone(&limiter);
        tasks.spawn(async move {
            let _permit = limiter
                .acquire_owned()
                .await
                .expect("dispatch semaphore closed");
            let message = enrich(decision.message.clone(), &decision, live.as_ref()).await;
            match notifier.send(&channel_id, &message).await {
                Ok(()) => {
                    counter!("announcements_total").increment(1);
                    info!(member = %decision.member_id, streak = decision.streak, "announced win streak");
                    true
                }
                Err(e) => {
                    counter!("dispatch_failures_total").increment(1);
                    warn!(member = %decision.member_id, "announcement delivery failed: {e:#}");
                    false
                }
            }
        });
    }

    let mut report = DispatchReport::default();
    while let Some(settled) = tasks.join_next().await {
        match settled {
            Ok(true) => report.sent += 1,
            Ok(false) => report.failed += 1,
            Err(e) => {
                report.failed += 1;
                warn!(error = %e, "dispatch task aborted");
            }
        }
    }
    report
}

/// Append the "tune in" line when the member is live. Any lookup failure is
/// swallowed: enrichment must never suppress the announcement itself.
async fn enrich(base: String, decision: &Decision, live: &dyn LiveStatusSource) -> String {
    match live.live_status(&decision.member_id).await {
        Ok(Some(status)) if status.is_live => format!(
            "{base}\nTune in to https://www.twitch.tv/{} and show your support!",
            status.login
        ),
        Ok(_) => base,
        Err(e) => {
            debug!(member = %decision.member_id, "live-status enrichment failed: {e:#}");
            base
        }
    }
}
