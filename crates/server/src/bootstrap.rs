//! Startup wiring
//!
//! Turns `Settings` into concrete capability backends and the dispatcher.

use std::sync::Arc;

use intake_bot_agent::{Capabilities, DialogueEngine, Dispatcher, EngineConfig, OperatorDesk};
use intake_bot_config::{SessionBackend, Settings, TableBackend};
use intake_bot_core::{LocalePreferences, Localizer, SessionStore, TableStore, Transport};
use intake_bot_persistence::{
    FileLocalePreferences, FileSessionStore, GoogleSheetsConfig, GoogleSheetsTableStore,
    InMemorySessionStore, InMemoryTableStore, JsonLocaleCatalog, LocalBlobStore,
};
use intake_bot_transport::{BotCommand, TelegramClient};

use crate::ServerError;

/// Build every capability backend selected in `settings`
pub async fn build_capabilities(
    settings: &Settings,
    transport: Arc<dyn Transport>,
) -> Result<Capabilities, ServerError> {
    let storage = &settings.storage;

    let sessions: Arc<dyn SessionStore> = match storage.session_backend {
        SessionBackend::Memory => Arc::new(InMemorySessionStore::new()),
        SessionBackend::File => Arc::new(FileSessionStore::new(&storage.sessions_dir)),
    };

    let tables: Arc<dyn TableStore> = match settings.tables.backend {
        TableBackend::Memory => {
            tracing::warn!("Lead tables are in memory and will be lost on restart");
            Arc::new(InMemoryTableStore::new())
        }
        TableBackend::GoogleSheets => Arc::new(GoogleSheetsTableStore::new(sheets_config(settings)?)),
    };

    let dialogue = &settings.dialogue;
    let catalog = match &storage.locales_file {
        Some(path) => {
            JsonLocaleCatalog::from_file(
                path,
                dialogue.base_locale.clone(),
                dialogue.supported_locales.clone(),
            )
            .await?
        }
        None => JsonLocaleCatalog::embedded(
            dialogue.base_locale.clone(),
            dialogue.supported_locales.clone(),
        )?,
    };
    let localizer: Arc<dyn Localizer> = Arc::new(catalog);
    let locale_prefs: Arc<dyn LocalePreferences> =
        Arc::new(FileLocalePreferences::new(&storage.locale_prefs_path));

    tracing::info!(
        sessions = ?storage.session_backend,
        tables = ?settings.tables.backend,
        uploads_dir = %storage.uploads_dir,
        "Capability backends ready"
    );

    Ok(Capabilities {
        transport,
        sessions,
        blobs: Arc::new(LocalBlobStore::new(&storage.uploads_dir)),
        tables,
        localizer,
        locale_prefs,
    })
}

fn sheets_config(settings: &Settings) -> Result<GoogleSheetsConfig, ServerError> {
    let tables = &settings.tables;
    let required = |value: &Option<String>, field: &str| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ServerError::Config(format!("tables.{field} is required for google_sheets")))
    };

    Ok(GoogleSheetsConfig {
        api_base: tables.api_base.clone(),
        spreadsheet_id: required(&tables.spreadsheet_id, "spreadsheet_id")?,
        access_token: required(&tables.access_token, "access_token")?,
    })
}

/// Dialogue engine and operator desk over shared capabilities
pub fn build_dispatcher(caps: Capabilities, config: EngineConfig) -> Dispatcher {
    let desk = OperatorDesk::new(
        caps.tables.clone(),
        caps.blobs.clone(),
        caps.transport.clone(),
        caps.localizer.clone(),
        config.table_names.clone(),
        config.operator_chat.clone(),
        config.sheet_url.clone(),
    );
    let transport = caps.transport.clone();
    Dispatcher::new(DialogueEngine::new(caps, config), desk, transport)
}

/// Commands shown in the client's command menu
pub fn bot_commands() -> Vec<BotCommand> {
    [
        ("start", "Start a new request"),
        ("cancel", "Cancel the current request"),
        ("sheet", "Lead spreadsheet link (operator)"),
    ]
    .into_iter()
    .map(|(command, description)| BotCommand {
        command: command.to_string(),
        description: description.to_string(),
    })
    .collect()
}

pub async fn register_commands(telegram: &TelegramClient) -> Result<(), ServerError> {
    telegram.set_my_commands(&bot_commands()).await?;
    Ok(())
}
