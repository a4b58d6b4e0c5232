//! Prometheus metrics
//!
//! The recorder is installed once at startup; the agent's counters and the
//! update counter below are rendered at `GET /metrics`.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::state::AppState;
use crate::ServerError;

pub const UPDATES_RECEIVED_TOTAL: &str = "intake_updates_received_total";

/// Install the global Prometheus recorder and describe every metric
pub fn init_metrics() -> Result<PrometheusHandle, ServerError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ServerError::Metrics(e.to_string()))?;

    intake_bot_agent::describe_metrics();
    describe_counter!(
        UPDATES_RECEIVED_TOTAL,
        "Telegram updates received, by source"
    );
    Ok(handle)
}

/// Count one inbound update (`webhook` or `polling`)
pub fn record_update(source: &'static str) {
    counter!(UPDATES_RECEIVED_TOTAL, "source" => source).increment(1);
}

pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics recorder not installed".to_string(),
        ),
    }
}
