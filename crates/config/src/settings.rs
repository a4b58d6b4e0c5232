//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use intake_bot_core::TableNames;

use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Relaxed validation, warnings only
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    /// Check if strict validation should be applied
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// Chat transport
    #[serde(default)]
    pub bot: BotConfig,

    /// HTTP server (webhook, health, metrics)
    #[serde(default)]
    pub server: ServerConfig,

    /// Dialogue behaviour
    #[serde(default)]
    pub dialogue: DialogueConfig,

    /// Sessions, uploads and locale files
    #[serde(default)]
    pub storage: StorageConfig,

    /// Lead tables
    #[serde(default)]
    pub tables: TablesConfig,

    #[serde(default)]
    pub operator: OperatorConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// How updates are received from the chat platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BotMode {
    #[default]
    Polling,
    Webhook,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Bot API token
    #[serde(default)]
    pub token: String,

    #[serde(default)]
    pub mode: BotMode,

    /// Expected value of the webhook secret header
    #[serde(default)]
    pub webhook_secret: Option<String>,

    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,

    /// Long-poll timeout in seconds
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,

    #[serde(default = "default_bot_api_base")]
    pub api_base: String,
}

fn default_webhook_path() -> String {
    "/telegram/webhook".to_string()
}
fn default_poll_timeout() -> u64 {
    30
}
fn default_bot_api_base() -> String {
    "https://api.telegram.org".to_string()
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            mode: BotMode::default(),
            webhook_secret: None,
            webhook_path: default_webhook_path(),
            poll_timeout_secs: default_poll_timeout(),
            api_base: default_bot_api_base(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// How the terminal phone number is accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContactMode {
    /// Typed numbers are validated; structured contacts are accepted as is
    #[default]
    Validated,
    /// Only structured contacts are accepted
    StructuredOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueConfig {
    #[serde(default)]
    pub contact_mode: ContactMode,

    /// Text turns needed before a details state advances
    #[serde(default = "default_min_comment_turns")]
    pub min_comment_turns: u32,

    #[serde(default = "default_base_locale")]
    pub base_locale: String,

    #[serde(default = "default_supported_locales")]
    pub supported_locales: Vec<String>,

    /// Wait before reconciling attachments at finalize time
    #[serde(default = "default_settle_ms")]
    pub finalize_settle_ms: u64,
}

fn default_min_comment_turns() -> u32 {
    2
}
fn default_base_locale() -> String {
    "en".to_string()
}
fn default_supported_locales() -> Vec<String> {
    ["ru", "uk", "pl", "en"].iter().map(|s| s.to_string()).collect()
}
fn default_settle_ms() -> u64 {
    2000
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            contact_mode: ContactMode::default(),
            min_comment_turns: default_min_comment_turns(),
            base_locale: default_base_locale(),
            supported_locales: default_supported_locales(),
            finalize_settle_ms: default_settle_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionBackend {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub session_backend: SessionBackend,

    #[serde(default = "default_sessions_dir")]
    pub sessions_dir: String,

    /// Root for uploaded files (`<uploads_dir>/<user_id>/<name>`)
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: String,

    #[serde(default = "default_locale_prefs_path")]
    pub locale_prefs_path: String,

    /// Message catalog overriding the built-in one
    #[serde(default)]
    pub locales_file: Option<String>,
}

fn default_sessions_dir() -> String {
    "data/sessions".to_string()
}
fn default_uploads_dir() -> String {
    "uploads".to_string()
}
fn default_locale_prefs_path() -> String {
    "data/user_languages.json".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            session_backend: SessionBackend::default(),
            sessions_dir: default_sessions_dir(),
            uploads_dir: default_uploads_dir(),
            locale_prefs_path: default_locale_prefs_path(),
            locales_file: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TableBackend {
    #[default]
    Memory,
    GoogleSheets,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablesConfig {
    #[serde(default)]
    pub backend: TableBackend,

    #[serde(default)]
    pub spreadsheet_id: Option<String>,

    /// OAuth bearer token for the Sheets API
    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default = "default_sheets_api_base")]
    pub api_base: String,

    #[serde(default = "default_wholesale_table")]
    pub wholesale_table: String,

    #[serde(default = "default_retail_table")]
    pub retail_table: String,

    /// Link the operator receives for `/sheet`
    #[serde(default)]
    pub sheet_url: Option<String>,
}

fn default_sheets_api_base() -> String {
    "https://sheets.googleapis.com".to_string()
}
fn default_wholesale_table() -> String {
    TableNames::default().wholesale
}
fn default_retail_table() -> String {
    TableNames::default().retail
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            backend: TableBackend::default(),
            spreadsheet_id: None,
            access_token: None,
            api_base: default_sheets_api_base(),
            wholesale_table: default_wholesale_table(),
            retail_table: default_retail_table(),
            sheet_url: None,
        }
    }
}

impl TablesConfig {
    pub fn table_names(&self) -> TableNames {
        TableNames {
            wholesale: self.wholesale_table.clone(),
            retail: self.retail_table.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OperatorConfig {
    /// Chat that receives lead notifications
    #[serde(default)]
    pub chat_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_bot()?;
        self.validate_server()?;
        self.validate_dialogue()?;
        self.validate_tables()?;
        Ok(())
    }

    fn validate_bot(&self) -> Result<(), ConfigError> {
        if self.bot.token.trim().is_empty() {
            if self.environment.is_strict() {
                return Err(ConfigError::InvalidValue {
                    field: "bot.token".to_string(),
                    message: format!("Required in {:?} mode", self.bot.mode),
                });
            }
            tracing::warn!("bot.token is empty; the bot will not be able to reach the chat API");
        }

        if self.bot.mode == BotMode::Webhook && self.bot.webhook_secret.is_none() {
            if self.environment.is_strict() {
                return Err(ConfigError::MissingField("bot.webhook_secret".to_string()));
            }
            tracing::warn!("Webhook mode without bot.webhook_secret accepts unauthenticated updates");
        }

        if !self.bot.webhook_path.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                field: "bot.webhook_path".to_string(),
                message: format!("Must start with '/', got {}", self.bot.webhook_path),
            });
        }

        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }
        Ok(())
    }

    fn validate_dialogue(&self) -> Result<(), ConfigError> {
        let dialogue = &self.dialogue;

        if dialogue.min_comment_turns == 0 {
            return Err(ConfigError::InvalidValue {
                field: "dialogue.min_comment_turns".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if dialogue.supported_locales.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "dialogue.supported_locales".to_string(),
                message: "At least one locale is required".to_string(),
            });
        }

        if !dialogue.supported_locales.contains(&dialogue.base_locale) {
            return Err(ConfigError::InvalidValue {
                field: "dialogue.base_locale".to_string(),
                message: format!(
                    "{} is not one of the supported locales {:?}",
                    dialogue.base_locale, dialogue.supported_locales
                ),
            });
        }

        if dialogue.finalize_settle_ms > 60_000 {
            return Err(ConfigError::InvalidValue {
                field: "dialogue.finalize_settle_ms".to_string(),
                message: format!("Too high (maximum 60000ms), got {}", dialogue.finalize_settle_ms),
            });
        }

        Ok(())
    }

    fn validate_tables(&self) -> Result<(), ConfigError> {
        let tables = &self.tables;

        if tables.wholesale_table.trim().is_empty() || tables.retail_table.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "tables".to_string(),
                message: "Table names cannot be empty".to_string(),
            });
        }

        if tables.wholesale_table == tables.retail_table {
            return Err(ConfigError::InvalidValue {
                field: "tables.retail_table".to_string(),
                message: "Wholesale and retail leads need separate tables".to_string(),
            });
        }

        if tables.backend == TableBackend::GoogleSheets {
            if tables.spreadsheet_id.as_deref().map_or(true, str::is_empty) {
                return Err(ConfigError::MissingField("tables.spreadsheet_id".to_string()));
            }
            if tables.access_token.as_deref().map_or(true, str::is_empty) {
                return Err(ConfigError::MissingField("tables.access_token".to_string()));
            }
        }

        Ok(())
    }
}

/// Load settings from `config/` in the working directory plus the environment
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from(Path::new("config"), env)
}

/// Load settings from an explicit config directory
pub fn load_settings_from(dir: &Path, env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    // Load default config
    builder = builder.add_source(File::from(dir.join("default")).required(false));

    // Load environment-specific config
    if let Some(env_name) = env {
        builder = builder.add_source(File::from(dir.join(env_name)).required(false));
    }

    // Load from environment variables
    builder = builder.add_source(
        Environment::with_prefix("INTAKE_BOT")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("dialogue.supported_locales")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.bot.mode, BotMode::Polling);
        assert_eq!(settings.dialogue.contact_mode, ContactMode::Validated);
        assert_eq!(settings.dialogue.min_comment_turns, 2);
        assert_eq!(settings.dialogue.finalize_settle_ms, 2000);
        assert_eq!(settings.tables.table_names(), TableNames::default());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_min_comment_turns_validation() {
        let mut settings = Settings::default();
        settings.dialogue.min_comment_turns = 0;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "dialogue.min_comment_turns"
        ));
    }

    #[test]
    fn test_base_locale_must_be_supported() {
        let mut settings = Settings::default();
        settings.dialogue.base_locale = "de".to_string();
        assert!(settings.validate().is_err());

        settings.dialogue.supported_locales.push("de".to_string());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_empty_token_strict_environment() {
        let mut settings = Settings::default();
        settings.environment = RuntimeEnvironment::Production;
        assert!(settings.validate().is_err());

        settings.bot.token = "123:abc".to_string();
        assert!(settings.validate().is_ok());

        settings.bot.mode = BotMode::Webhook;
        assert!(settings.validate().is_err());

        settings.bot.webhook_secret = Some("s3cret".to_string());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_google_sheets_requires_credentials() {
        let mut settings = Settings::default();
        settings.tables.backend = TableBackend::GoogleSheets;
        assert!(settings.validate().is_err());

        settings.tables.spreadsheet_id = Some("sheet-id".to_string());
        settings.tables.access_token = Some("ya29.token".to_string());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_same_table_names_rejected() {
        let mut settings = Settings::default();
        settings.tables.retail_table = settings.tables.wholesale_table.clone();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_settings_deserialize_partial() {
        let json = r#"{
            "dialogue": { "contact_mode": "structured_only", "min_comment_turns": 3 },
            "operator": { "chat_id": "-100200300" }
        }"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.dialogue.contact_mode, ContactMode::StructuredOnly);
        assert_eq!(settings.dialogue.min_comment_turns, 3);
        assert_eq!(settings.dialogue.base_locale, "en");
        assert_eq!(settings.operator.chat_id.as_deref(), Some("-100200300"));
        assert_eq!(settings.storage.uploads_dir, "uploads");
    }

    #[test]
    fn test_load_settings_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("default.toml"),
            "[server]\nport = 9000\n\n[dialogue]\nfinalize_settle_ms = 0\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("test.toml"),
            "[tables]\nsheet_url = \"https://example.com/sheet\"\n",
        )
        .unwrap();

        let settings = load_settings_from(dir.path(), Some("test")).unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.dialogue.finalize_settle_ms, 0);
        assert_eq!(
            settings.tables.sheet_url.as_deref(),
            Some("https://example.com/sheet")
        );
    }

    #[test]
    fn test_load_settings_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("default.toml"),
            "[dialogue]\nmin_comment_turns = 0\n",
        )
        .unwrap();
        assert!(load_settings_from(dir.path(), None).is_err());
    }
}
