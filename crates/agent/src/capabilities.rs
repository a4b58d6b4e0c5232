//! Collaborators the engine talks to

use std::sync::Arc;

use intake_bot_core::{
    BlobStore, LocalePreferences, Localizer, SessionStore, TableStore, Transport,
};

/// Shared handles to every capability backend.
///
/// Cloning is cheap; all fields are reference counted.
#[derive(Clone)]
pub struct Capabilities {
    pub transport: Arc<dyn Transport>,
    pub sessions: Arc<dyn SessionStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub tables: Arc<dyn TableStore>,
    pub localizer: Arc<dyn Localizer>,
    pub locale_prefs: Arc<dyn LocalePreferences>,
}
