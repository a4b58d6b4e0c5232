//! Intake Bot Server
//!
//! Receives Telegram updates by webhook or long polling and hands them to
//! the dispatcher. Also serves health and Prometheus metrics endpoints.

pub mod bootstrap;
pub mod http;
pub mod metrics;
pub mod polling;
pub mod state;
pub mod updates;

pub use bootstrap::{build_capabilities, build_dispatcher, register_commands};
pub use http::create_router;
pub use polling::run_polling;
pub use self::metrics::{init_metrics, metrics_handler, record_update};
pub use state::AppState;
pub use updates::process_update;

use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Metrics error: {0}")]
    Metrics(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ServerError> for axum::http::StatusCode {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::Auth(_) => axum::http::StatusCode::UNAUTHORIZED,
            ServerError::InvalidRequest(_) => axum::http::StatusCode::BAD_REQUEST,
            ServerError::Metrics(_) => axum::http::StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Config(_)
            | ServerError::Storage(_)
            | ServerError::Transport(_)
            | ServerError::Internal(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<intake_bot_config::ConfigError> for ServerError {
    fn from(err: intake_bot_config::ConfigError) -> Self {
        ServerError::Config(err.to_string())
    }
}

impl From<intake_bot_persistence::PersistenceError> for ServerError {
    fn from(err: intake_bot_persistence::PersistenceError) -> Self {
        ServerError::Storage(err.to_string())
    }
}

impl From<intake_bot_transport::TransportError> for ServerError {
    fn from(err: intake_bot_transport::TransportError) -> Self {
        ServerError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            StatusCode::from(ServerError::Auth("bad secret".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            StatusCode::from(ServerError::InvalidRequest("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            StatusCode::from(ServerError::Storage("disk".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
