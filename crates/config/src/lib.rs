//! Configuration management for the intake bot
//!
//! Supports loading configuration from:
//! - TOML/YAML/JSON files under `config/`
//! - Environment variables (`INTAKE_BOT_` prefix, `__` section separator)
//!
//! `.env` loading is left to the binary so tests stay hermetic.

pub mod settings;

pub use settings::{
    load_settings, load_settings_from, BotConfig, BotMode, ContactMode, DialogueConfig,
    ObservabilityConfig, OperatorConfig, RuntimeEnvironment, ServerConfig, SessionBackend,
    Settings, StorageConfig, TableBackend, TablesConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
