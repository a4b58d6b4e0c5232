//! Error types shared across crates

use thiserror::Error;

use crate::session::{DialogueState, Field};

/// Failure of an external capability call (transport, storage, tables).
///
/// Adapters map their own error types into this so the dialogue engine
/// only has to inspect one tagged value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Blob storage error: {0}")]
    Blob(String),

    #[error("Table error: {0}")]
    Table(String),

    #[error("Session storage error: {0}")]
    Session(String),

    #[error("Locale error: {0}")]
    Locale(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Invariant violations on core types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Field {} is already set", field.as_str())]
    FieldAlreadySet { field: Field },

    #[error("Field {} is required in state {}", field.as_str(), state.as_str())]
    MissingField { field: Field, state: DialogueState },
}
