//! Engine configuration

use std::time::Duration;

use intake_bot_config::{ContactMode, Settings};
use intake_bot_core::{TableNames, UserId};

/// Runtime knobs for the dialogue engine, finalizer and operator desk
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub contact_mode: ContactMode,
    /// Text turns needed before a details state advances
    pub min_comment_turns: u32,
    /// Wait before attachments are reconciled at finalize time
    pub finalize_settle: Duration,
    pub table_names: TableNames,
    /// Chat receiving lead notifications; also the only chat allowed
    /// to use operator actions
    pub operator_chat: Option<UserId>,
    pub sheet_url: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            contact_mode: ContactMode::Validated,
            min_comment_turns: 2,
            finalize_settle: Duration::from_millis(2000),
            table_names: TableNames::default(),
            operator_chat: None,
            sheet_url: None,
        }
    }
}

impl EngineConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            contact_mode: settings.dialogue.contact_mode,
            min_comment_turns: settings.dialogue.min_comment_turns,
            finalize_settle: Duration::from_millis(settings.dialogue.finalize_settle_ms),
            table_names: settings.tables.table_names(),
            operator_chat: settings
                .operator
                .chat_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(UserId::from),
            sheet_url: settings.tables.sheet_url.clone(),
        }
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.finalize_settle = settle;
        self
    }

    pub fn with_operator(mut self, chat: impl Into<UserId>) -> Self {
        self.operator_chat = Some(chat.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_settings() {
        let mut settings = Settings::default();
        settings.operator.chat_id = Some(" -100200 ".to_string());
        settings.dialogue.finalize_settle_ms = 0;
        settings.tables.sheet_url = Some("https://example.com/sheet".to_string());

        let config = EngineConfig::from_settings(&settings);
        assert_eq!(config.operator_chat, Some(UserId::from("-100200")));
        assert_eq!(config.finalize_settle, Duration::ZERO);
        assert_eq!(config.min_comment_turns, 2);
        assert_eq!(config.table_names.retail, "Retail clients");
        assert_eq!(config.sheet_url.as_deref(), Some("https://example.com/sheet"));
    }

    #[test]
    fn test_blank_operator_chat_is_none() {
        let mut settings = Settings::default();
        settings.operator.chat_id = Some("  ".to_string());
        assert!(EngineConfig::from_settings(&settings).operator_chat.is_none());
    }
}
