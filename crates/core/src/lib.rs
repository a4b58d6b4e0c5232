//! Core traits and types for the intake bot
//!
//! This crate provides the foundational types used across all other crates:
//! - Session and dialogue state
//! - Typed user choices (button payloads)
//! - Inbound events and outbound replies
//! - Lead records and their table layout
//! - Phone number validation
//! - Capability traits for pluggable backends (transport, blob storage,
//!   tables, localization, session storage)
//! - Error types

pub mod choice;
pub mod error;
pub mod event;
pub mod lead;
pub mod phone;
pub mod reply;
pub mod session;
pub mod traits;

pub use choice::{Category, OperatorAction, RetailSubtype, UserChoice, WholesaleSubtype};
pub use error::{CapabilityError, CoreError};
pub use event::{Attachment, AttachmentKind, Command, EventKind, InboundEvent};
pub use lead::{
    headers_for, CategoryDetails, LeadId, LeadRecord, LeadStatus, TableNames, CLIENT_ID_COLUMN,
    STATUS_COLUMN, TIMESTAMP_FORMAT,
};
pub use phone::{is_valid_phone, normalize_phone};
pub use reply::{Choice, Keyboard, Reply};
pub use session::{DialogueState, Field, Session, UserId};

pub use traits::{
    BlobStore, LocalePreferences, Localizer, SessionStore, TableRow, TableStore, Transport,
};
