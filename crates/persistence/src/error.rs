//! Persistence error type

use intake_bot_core::CapabilityError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),
}

impl PersistenceError {
    /// Map into the capability error for the given store kind
    pub fn into_capability(self, kind: fn(String) -> CapabilityError) -> CapabilityError {
        match self {
            Self::NotFound(what) => CapabilityError::NotFound(what),
            other => kind(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_capability() {
        let err = PersistenceError::NotFound("uploads/1/a.jpg".into());
        assert_eq!(
            err.into_capability(CapabilityError::Blob),
            CapabilityError::NotFound("uploads/1/a.jpg".into())
        );

        let err = PersistenceError::Api {
            status: 403,
            body: "forbidden".into(),
        };
        assert!(matches!(
            err.into_capability(CapabilityError::Table),
            CapabilityError::Table(msg) if msg.contains("403")
        ));
    }
}
