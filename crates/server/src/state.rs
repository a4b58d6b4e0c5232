//! Application state

use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

use intake_bot_agent::Dispatcher;
use intake_bot_transport::TelegramClient;

/// Shared state for the HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    /// Used to acknowledge callback queries
    pub telegram: Arc<TelegramClient>,
    /// Expected `X-Telegram-Bot-Api-Secret-Token`; `None` accepts any request
    pub webhook_secret: Option<String>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(dispatcher: Arc<Dispatcher>, telegram: Arc<TelegramClient>) -> Self {
        Self {
            dispatcher,
            telegram,
            webhook_secret: None,
            metrics: None,
        }
    }

    pub fn with_webhook_secret(mut self, secret: Option<String>) -> Self {
        self.webhook_secret = secret.filter(|s| !s.is_empty());
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
