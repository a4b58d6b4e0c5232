//! HTTP Endpoints
//!
//! Telegram webhook, health check and Prometheus metrics.

use axum::{
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use intake_bot_transport::TelegramUpdate;

use crate::metrics::{metrics_handler, record_update};
use crate::state::AppState;
use crate::updates::process_update;
use crate::ServerError;

/// Header Telegram sets to the secret registered with `setWebhook`
pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub ok: bool,
}

/// Create the application router
pub fn create_router(state: AppState, webhook_path: &str) -> Router {
    Router::new()
        .route(webhook_path, post(telegram_webhook))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn verify_secret(expected: Option<&str>, headers: &HeaderMap) -> Result<(), ServerError> {
    let Some(expected) = expected else {
        return Ok(());
    };
    match headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok()) {
        Some(given) if given == expected => Ok(()),
        Some(_) => Err(ServerError::Auth("webhook secret mismatch".into())),
        None => Err(ServerError::Auth("webhook secret missing".into())),
    }
}

/// Accept one update and process it in the background.
///
/// Telegram only needs a quick 200; slow work (finalize settle delay,
/// downloads) must not hold the request open or the update is redelivered.
async fn telegram_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(update): Json<TelegramUpdate>,
) -> Result<Json<WebhookResponse>, StatusCode> {
    if let Err(e) = verify_secret(state.webhook_secret.as_deref(), &headers) {
        tracing::warn!(error = %e, "Rejected webhook request");
        return Err(e.into());
    }

    record_update("webhook");
    tracing::debug!(update_id = update.update_id, "Webhook update received");

    let dispatcher = state.dispatcher.clone();
    let telegram = state.telegram.clone();
    tokio::spawn(process_update(dispatcher, telegram, update));

    Ok(Json(WebhookResponse { ok: true }))
}

async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "active_users": state.dispatcher.active_users(),
        })),
    )
}
