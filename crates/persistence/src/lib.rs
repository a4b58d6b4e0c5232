//! Storage backends for the intake bot
//!
//! Provides implementations of the core capability traits:
//! - Sessions (in-memory, JSON files)
//! - Attachment blobs (local disk, in-memory)
//! - Lead tables (in-memory, Google Sheets)
//! - Message catalog and per-user locale preferences

pub mod blobs;
pub mod error;
pub mod locales;
pub mod sessions;
pub mod sheets;
pub mod tables;

pub use blobs::{InMemoryBlobStore, LocalBlobStore};
pub use error::PersistenceError;
pub use locales::{FileLocalePreferences, InMemoryLocalePreferences, JsonLocaleCatalog};
pub use sessions::{FileSessionStore, InMemorySessionStore};
pub use sheets::{GoogleSheetsConfig, GoogleSheetsTableStore};
pub use tables::InMemoryTableStore;

/// Make an arbitrary string safe to use as a single path component
pub(crate) fn sanitize_component(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.replace("..", "_");
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_component() {
        assert_eq!(sanitize_component("photo_AgAD.jpg"), "photo_AgAD.jpg");
        assert_eq!(sanitize_component("-100200"), "-100200");
        assert_eq!(sanitize_component("проект 1.pdf"), "проект_1.pdf");
        assert_eq!(sanitize_component("../../etc/passwd"), "____etc_passwd");
        assert_eq!(sanitize_component(".hidden"), "hidden");
        assert_eq!(sanitize_component("   "), "_");
    }
}
