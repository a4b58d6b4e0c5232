use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CapabilityError;
use crate::session::{Session, UserId};

/// Per-user session persistence
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, user_id: &UserId) -> Result<Option<Session>, CapabilityError>;
    async fn save(&self, session: &Session) -> Result<(), CapabilityError>;
    async fn clear(&self, user_id: &UserId) -> Result<(), CapabilityError>;
}

/// Attachment byte storage keyed by user
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes and return the reference they can be read back with
    async fn store(
        &self,
        user_id: &UserId,
        bytes: &[u8],
        suggested_name: &str,
    ) -> Result<String, CapabilityError>;

    /// All references stored for a user, sorted
    async fn list(&self, user_id: &UserId) -> Result<Vec<String>, CapabilityError>;

    async fn read(&self, reference: &str) -> Result<Vec<u8>, CapabilityError>;
}

/// A located data row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    /// 1-based row number, header row included
    pub index: usize,
    pub values: Vec<String>,
}

impl TableRow {
    /// Value under `column`, given the table headers
    pub fn get<'a>(&'a self, headers: &[String], column: &str) -> Option<&'a str> {
        let pos = headers.iter().position(|h| h == column)?;
        self.values.get(pos).map(String::as_str)
    }
}

/// Shared tabular store (one table per lead category)
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Create the table if absent; rewrite the header row if it differs.
    /// Data rows are never touched.
    async fn ensure(&self, table: &str, headers: &[String]) -> Result<(), CapabilityError>;

    async fn append_row(&self, table: &str, values: &[String]) -> Result<(), CapabilityError>;

    /// First data row whose `id_column` equals `id_value`
    async fn find_row(
        &self,
        table: &str,
        id_column: &str,
        id_value: &str,
    ) -> Result<Option<TableRow>, CapabilityError>;

    async fn update_cell(
        &self,
        table: &str,
        row: &TableRow,
        column: &str,
        value: &str,
    ) -> Result<(), CapabilityError>;
}
