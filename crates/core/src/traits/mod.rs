//! Capability traits consumed by the dialogue engine
//!
//! Every collaborator the bot talks to sits behind one of these traits so
//! backends can be swapped by configuration and replaced by fakes in tests.
//!
//! # Trait Map
//!
//! ```text
//! Messaging:
//!   - Transport: send replies, fetch uploaded bytes, send files
//!
//! Storage:
//!   - SessionStore: per-user dialogue session
//!   - BlobStore: uploaded attachment bytes keyed by user
//!   - TableStore: shared lead tables (one row per lead)
//!
//! Localization:
//!   - Localizer: message catalog lookup
//!   - LocalePreferences: remembered locale per user
//! ```

mod locale;
mod storage;
mod transport;

pub use locale::{LocalePreferences, Localizer};
pub use storage::{BlobStore, SessionStore, TableRow, TableStore};
pub use transport::Transport;
