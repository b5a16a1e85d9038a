use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

/// One-time metrics registration (so series show up on /metrics).
fn describe_pipeline_metrics() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("cycle_runs_total", "Completed pipeline cycles.");
        describe_counter!("cycle_failures_total", "Cycles that failed or timed out.");
        describe_counter!(
            "streak_fetch_failures_total",
            "Members dropped from a cycle due to fetch failure."
        );
        describe_counter!("announcements_total", "Win-streak announcements delivered.");
        describe_counter!(
            "dispatch_failures_total",
            "Announcements that failed to deliver."
        );
        describe_gauge!("cycle_last_run_ts", "Unix ts when a cycle last completed.");
    });
}

impl Metrics {
    /// Initialize the Prometheus recorder and register the pipeline series.
    pub fn init() -> Self {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .expect("prometheus: install recorder");
        describe_pipeline_metrics();
        Self { handle }
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
