//! In-memory lead tables
//!
//! Each table is a list of rows; row 1 is the header row. Row indices
//! handed out in `TableRow` are 1-based to match spreadsheet numbering.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use intake_bot_core::{CapabilityError, TableRow, TableStore};

#[derive(Default)]
pub struct InMemoryTableStore {
    tables: RwLock<HashMap<String, Vec<Vec<String>>>>,
}

impl InMemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a table, header row first
    pub fn rows(&self, table: &str) -> Option<Vec<Vec<String>>> {
        self.tables.read().get(table).cloned()
    }

    /// Number of data rows (header excluded)
    pub fn data_row_count(&self, table: &str) -> usize {
        self.tables
            .read()
            .get(table)
            .map_or(0, |rows| rows.len().saturating_sub(1))
    }
}

fn column_index(rows: &[Vec<String>], table: &str, column: &str) -> Result<usize, CapabilityError> {
    rows.first()
        .and_then(|headers| headers.iter().position(|h| h == column))
        .ok_or_else(|| CapabilityError::Table(format!("column '{}' not in table '{}'", column, table)))
}

#[async_trait]
impl TableStore for InMemoryTableStore {
    async fn ensure(&self, table: &str, headers: &[String]) -> Result<(), CapabilityError> {
        let mut tables = self.tables.write();
        let rows = tables.entry(table.to_string()).or_default();
        match rows.first_mut() {
            None => rows.push(headers.to_vec()),
            Some(existing) if existing.as_slice() != headers => {
                tracing::info!(table, "Rewriting header row");
                *existing = headers.to_vec();
            }
            Some(_) => {}
        }
        Ok(())
    }

    async fn append_row(&self, table: &str, values: &[String]) -> Result<(), CapabilityError> {
        let mut tables = self.tables.write();
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| CapabilityError::NotFound(format!("table '{}'", table)))?;
        rows.push(values.to_vec());
        Ok(())
    }

    async fn find_row(
        &self,
        table: &str,
        id_column: &str,
        id_value: &str,
    ) -> Result<Option<TableRow>, CapabilityError> {
        let tables = self.tables.read();
        let Some(rows) = tables.get(table) else {
            return Ok(None);
        };
        let col = column_index(rows, table, id_column)?;
        let wanted = id_value.trim();

        Ok(rows
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, row)| row.get(col).map(|v| v.trim()) == Some(wanted))
            .map(|(i, row)| TableRow {
                index: i + 1,
                values: row.clone(),
            }))
    }

    async fn update_cell(
        &self,
        table: &str,
        row: &TableRow,
        column: &str,
        value: &str,
    ) -> Result<(), CapabilityError> {
        let mut tables = self.tables.write();
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| CapabilityError::NotFound(format!("table '{}'", table)))?;
        let col = column_index(rows, table, column)?;

        // index 1 is the header row
        let target = row
            .index
            .checked_sub(1)
            .filter(|&i| i > 0)
            .and_then(|i| rows.get_mut(i))
            .ok_or_else(|| CapabilityError::NotFound(format!("row {} in '{}'", row.index, table)))?;

        if target.len() <= col {
            target.resize(col + 1, String::new());
        }
        target[col] = value.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_ensure_is_idempotent() {
        let store = InMemoryTableStore::new();
        let headers = strings(&["Client name", "Client ID", "Status"]);

        store.ensure("Retail clients", &headers).await.unwrap();
        store.ensure("Retail clients", &headers).await.unwrap();
        assert_eq!(store.rows("Retail clients").unwrap(), vec![headers]);
    }

    #[tokio::test]
    async fn test_header_rewrite_keeps_data_rows() {
        let store = InMemoryTableStore::new();
        let old = strings(&["Name", "ID"]);
        store.ensure("t", &old).await.unwrap();
        store
            .append_row("t", &strings(&["Ivan", "1"]))
            .await
            .unwrap();

        let new = strings(&["Client name", "Client ID"]);
        store.ensure("t", &new).await.unwrap();

        let rows = store.rows("t").unwrap();
        assert_eq!(rows[0], new);
        assert_eq!(rows[1], strings(&["Ivan", "1"]));
        assert_eq!(store.data_row_count("t"), 1);
    }

    #[tokio::test]
    async fn test_append_to_missing_table_fails() {
        let store = InMemoryTableStore::new();
        let err = store.append_row("nope", &strings(&["x"])).await.unwrap_err();
        assert!(matches!(err, CapabilityError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_find_first_and_update() {
        let store = InMemoryTableStore::new();
        store
            .ensure("t", &strings(&["Client name", "Client ID", "Status"]))
            .await
            .unwrap();
        store.append_row("t", &strings(&["A", "1", "new"])).await.unwrap();
        store.append_row("t", &strings(&["B", "2", "new"])).await.unwrap();
        store.append_row("t", &strings(&["B2", "2", "new"])).await.unwrap();

        assert!(store.find_row("t", "Client ID", "3").await.unwrap().is_none());
        assert!(store.find_row("missing", "Client ID", "2").await.unwrap().is_none());

        let row = store.find_row("t", "Client ID", " 2 ").await.unwrap().unwrap();
        assert_eq!(row.index, 3);
        assert_eq!(row.values[0], "B");

        store.update_cell("t", &row, "Status", "viewed").await.unwrap();
        let rows = store.rows("t").unwrap();
        assert_eq!(rows[2][2], "viewed");
        assert_eq!(rows[3][2], "new");

        let err = store.update_cell("t", &row, "Nope", "x").await.unwrap_err();
        assert!(matches!(err, CapabilityError::Table(_)));
    }
}
