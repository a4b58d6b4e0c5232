//! Google Sheets table store (Sheets REST API v4)
//!
//! Each lead table is a worksheet in one spreadsheet. Authentication uses a
//! bearer access token supplied by configuration.

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Client, Method, Url};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use intake_bot_core::{CapabilityError, TableRow, TableStore};

use crate::PersistenceError;

#[derive(Debug, Clone)]
pub struct GoogleSheetsConfig {
    pub api_base: String,
    pub spreadsheet_id: String,
    pub access_token: String,
}

pub struct GoogleSheetsTableStore {
    client: Client,
    config: GoogleSheetsConfig,
    known_sheets: RwLock<HashSet<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// A1 column letters for a 0-based column index
fn column_letters(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (index % 26) as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.iter().rev().collect()
}

/// Sheet name quoted for use in an A1 range
fn quoted(sheet: &str) -> String {
    format!("'{}'", sheet.replace('\'', "''"))
}

impl GoogleSheetsTableStore {
    pub fn new(config: GoogleSheetsConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: GoogleSheetsConfig) -> Self {
        Self {
            client,
            config,
            known_sheets: RwLock::new(HashSet::new()),
        }
    }

    fn url(&self, segments: &[&str]) -> Result<Url, PersistenceError> {
        let mut url = Url::parse(&self.config.api_base)
            .map_err(|e| PersistenceError::InvalidReference(e.to_string()))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| PersistenceError::InvalidReference(self.config.api_base.clone()))?;
            path.pop_if_empty()
                .extend(["v4", "spreadsheets", self.config.spreadsheet_id.as_str()]);
            path.extend(segments);
        }
        Ok(url)
    }

    async fn call<T: serde::de::DeserializeOwned + Default>(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> Result<T, PersistenceError> {
        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(&self.config.access_token);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PersistenceError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(T::default());
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn sheet_titles(&self) -> Result<HashSet<String>, PersistenceError> {
        let mut url = self.url(&[])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");
        let meta: SpreadsheetMeta = self.call(Method::GET, url, None).await?;
        Ok(meta.sheets.into_iter().map(|s| s.properties.title).collect())
    }

    async fn ensure_sheet(&self, table: &str) -> Result<(), PersistenceError> {
        if self.known_sheets.read().contains(table) {
            return Ok(());
        }

        let titles = self.sheet_titles().await?;
        if !titles.contains(table) {
            let url = self.url(&[])?;
            let url = Url::parse(&format!("{}:batchUpdate", url))
                .map_err(|e| PersistenceError::InvalidReference(e.to_string()))?;
            let body = serde_json::json!({
                "requests": [{ "addSheet": { "properties": { "title": table } } }]
            });
            let _: serde_json::Value = self.call(Method::POST, url, Some(body)).await?;
            tracing::info!(table, "Created worksheet");
        }

        let mut known = self.known_sheets.write();
        known.extend(titles);
        known.insert(table.to_string());
        Ok(())
    }

    async fn get_values(&self, range: &str) -> Result<Vec<Vec<String>>, PersistenceError> {
        let url = self.url(&["values", range])?;
        let values: ValueRange = self.call(Method::GET, url, None).await?;
        Ok(values.values)
    }

    async fn put_values(&self, range: &str, row: &[String]) -> Result<(), PersistenceError> {
        let mut url = self.url(&["values", range])?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        let body = serde_json::to_value(ValueRange {
            values: vec![row.to_vec()],
        })?;
        let _: serde_json::Value = self.call(Method::PUT, url, Some(body)).await?;
        Ok(())
    }

    async fn ensure_headers(&self, table: &str, headers: &[String]) -> Result<(), PersistenceError> {
        self.ensure_sheet(table).await?;

        let header_range = format!("{}!1:1", quoted(table));
        let existing = self.get_values(&header_range).await?;
        let current = existing.into_iter().next().unwrap_or_default();
        if current.as_slice() != headers {
            self.put_values(&header_range, headers).await?;
            tracing::info!(table, "Header row updated");
        }
        Ok(())
    }

    async fn append(&self, table: &str, values: &[String]) -> Result<(), PersistenceError> {
        let range = format!("{}!A1:append", quoted(table));
        let mut url = self.url(&["values", &range])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");
        let body = serde_json::to_value(ValueRange {
            values: vec![values.to_vec()],
        })?;
        let _: serde_json::Value = self.call(Method::POST, url, Some(body)).await?;
        Ok(())
    }

    async fn find(
        &self,
        table: &str,
        id_column: &str,
        id_value: &str,
    ) -> Result<Option<TableRow>, PersistenceError> {
        let rows = self.get_values(&quoted(table)).await?;
        let Some(col) = rows
            .first()
            .and_then(|headers| headers.iter().position(|h| h == id_column))
        else {
            return Ok(None);
        };
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

    async fn update(
        &self,
        table: &str,
        row: &TableRow,
        column: &str,
        value: &str,
    ) -> Result<(), PersistenceError> {
        let headers = self
            .get_values(&format!("{}!1:1", quoted(table)))
            .await?
            .into_iter()
            .next()
            .unwrap_or_default();
        let col = headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| PersistenceError::NotFound(format!("column '{}' in '{}'", column, table)))?;

        let cell = format!("{}!{}{}", quoted(table), column_letters(col), row.index);
        self.put_values(&cell, &[value.to_string()]).await
    }
}

#[async_trait]
impl TableStore for GoogleSheetsTableStore {
    async fn ensure(&self, table: &str, headers: &[String]) -> Result<(), CapabilityError> {
        self.ensure_headers(table, headers)
            .await
            .map_err(|e| e.into_capability(CapabilityError::Table))
    }

    async fn append_row(&self, table: &str, values: &[String]) -> Result<(), CapabilityError> {
        self.append(table, values).await.map_err(|e| {
            tracing::error!(table, error = %e, "Failed to append row");
            e.into_capability(CapabilityError::Table)
        })
    }

    async fn find_row(
        &self,
        table: &str,
        id_column: &str,
        id_value: &str,
    ) -> Result<Option<TableRow>, CapabilityError> {
        self.find(table, id_column, id_value)
            .await
            .map_err(|e| e.into_capability(CapabilityError::Table))
    }

    async fn update_cell(
        &self,
        table: &str,
        row: &TableRow,
        column: &str,
        value: &str,
    ) -> Result<(), CapabilityError> {
        self.update(table, row, column, value)
            .await
            .map_err(|e| e.into_capability(CapabilityError::Table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> GoogleSheetsTableStore {
        GoogleSheetsTableStore::new(GoogleSheetsConfig {
            api_base: "https://sheets.googleapis.com".into(),
            spreadsheet_id: "abc123".into(),
            access_token: "token".into(),
        })
    }

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(10), "K");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(27), "AB");
        assert_eq!(column_letters(701), "ZZ");
        assert_eq!(column_letters(702), "AAA");
    }

    #[test]
    fn test_quoted_sheet_names() {
        assert_eq!(quoted("Retail clients"), "'Retail clients'");
        assert_eq!(quoted("O'Brien"), "'O''Brien'");
    }

    #[test]
    fn test_url_building() {
        let store = store();
        let url = store.url(&["values", "'Retail clients'!1:1"]).unwrap();
        assert!(url
            .as_str()
            .starts_with("https://sheets.googleapis.com/v4/spreadsheets/abc123/values/"));
        assert!(url.as_str().contains("Retail%20clients"));
    }

    #[test]
    fn test_value_range_missing_values() {
        let parsed: ValueRange = serde_json::from_str(r#"{"range":"'t'!A1:Z1"}"#).unwrap();
        assert!(parsed.values.is_empty());
    }
}
