//! HTTP trigger surface: an authenticated `/update` endpoint the external
//! scheduler hits once per period, plus `/health`. Cycles are serialized —
//! a trigger that arrives while one is running is rejected, not queued.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use metrics::counter;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::error;

use crate::config::AppConfig;
use crate::cycle::{self, CycleDeps};

pub const TRIGGER_TOKEN_HEADER: &str = "x-trigger-token";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub deps: Arc<CycleDeps>,
    /// Held for the duration of a cycle; `try_lock` is the concurrency gate.
    pub cycle_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, deps: Arc<CycleDeps>) -> Self {
        Self {
            config,
            deps,
            cycle_lock: Arc::new(Mutex::new(())),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/update", post(update))
        .with_state(state)
}

async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let token = headers
        .get(TRIGGER_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());
    if token != Some(state.config.trigger_token.as_str()) {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "forbidden" })),
        );
    }

    let Ok(_running) = state.cycle_lock.try_lock() else {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "error": "a cycle is already running" })),
        );
    };

    let budget = Duration::from_secs(state.config.cycle_budget_secs);
    match tokio::time::timeout(budget, cycle::run_cycle(&state.config, &state.deps)).await {
        Ok(Ok(report)) => {
            let body = serde_json::to_value(report).unwrap_or_else(|_| json!({}));
            (StatusCode::OK, Json(body))
        }
        Ok(Err(e)) => {
            counter!("cycle_failures_total").increment(1);
            error!("cycle failed: {e:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": format!("{e:#}") })),
            )
        }
        Err(_) => {
            counter!("cycle_failures_total").increment(1);
            error!(budget_secs = state.config.cycle_budget_secs, "cycle exceeded wall-clock budget");
            (
                StatusCode::GATEWAY_TIMEOUT,
                Json(json!({ "error": "cycle exceeded wall-clock budget" })),
            )
        }
    }
}
