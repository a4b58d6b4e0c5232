//! Operator desk
//!
//! The operator chat receives lead notifications with a "details" button.
//! Pressing it looks the lead up in its category table, marks it viewed
//! and sends back the full record plus every stored attachment.

use std::sync::Arc;

use intake_bot_core::{
    headers_for, BlobStore, CapabilityError, Category, LeadStatus, Localizer, Reply, TableNames,
    TableRow, TableStore, Transport, UserId, CLIENT_ID_COLUMN, STATUS_COLUMN,
};

use crate::prompts::fill;

pub struct OperatorDesk {
    tables: Arc<dyn TableStore>,
    blobs: Arc<dyn BlobStore>,
    transport: Arc<dyn Transport>,
    localizer: Arc<dyn Localizer>,
    table_names: TableNames,
    operator_chat: Option<UserId>,
    sheet_url: Option<String>,
}

/// Split the `Attachments` cell back into references
fn split_attachments(cell: &str) -> Vec<String> {
    cell.split(',')
        .map(|r| r.trim().replace('\\', "/"))
        .filter(|r| !r.is_empty())
        .collect()
}

/// File name shown to the operator for a reference
fn display_name(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

impl OperatorDesk {
    pub fn new(
        tables: Arc<dyn TableStore>,
        blobs: Arc<dyn BlobStore>,
        transport: Arc<dyn Transport>,
        localizer: Arc<dyn Localizer>,
        table_names: TableNames,
        operator_chat: Option<UserId>,
        sheet_url: Option<String>,
    ) -> Self {
        Self {
            tables,
            blobs,
            transport,
            localizer,
            table_names,
            operator_chat,
            sheet_url,
        }
    }

    pub fn is_operator(&self, user_id: &UserId) -> bool {
        self.operator_chat.as_ref() == Some(user_id)
    }

    fn text(&self, key: &str) -> String {
        self.localizer.text(self.localizer.base_locale(), key)
    }

    pub(crate) fn error_text(&self) -> String {
        self.text("error_occurred")
    }

    /// Send lead details and attachments for `client_id` to `to`
    pub async fn handle_details(
        &self,
        to: &UserId,
        category: Category,
        client_id: &UserId,
    ) -> Result<(), CapabilityError> {
        let table = self.table_names.for_category(category);
        let Some(row) = self
            .tables
            .find_row(table, CLIENT_ID_COLUMN, client_id.as_str())
            .await?
        else {
            tracing::warn!(table, client_id = %client_id, "Lead not found");
            return self
                .transport
                .send(to, Reply::text(self.text("lead_not_found")))
                .await;
        };

        let status_updated = match self
            .tables
            .update_cell(table, &row, STATUS_COLUMN, LeadStatus::Viewed.as_str())
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(table, client_id = %client_id, error = %e, "Failed to mark lead viewed");
                false
            }
        };

        let headers = headers_for(category);
        self.transport
            .send(to, Reply::text(self.summary(&row, &headers, status_updated)))
            .await?;

        let references = split_attachments(row.get(&headers, "Attachments").unwrap_or_default());
        let mut missing = Vec::new();
        for reference in &references {
            match self.blobs.read(reference).await {
                Ok(bytes) => {
                    if let Err(e) = self
                        .transport
                        .send_file(to, display_name(reference), bytes)
                        .await
                    {
                        tracing::warn!(reference = %reference, error = %e, "Failed to send attachment");
                        missing.push(reference.clone());
                    }
                }
                Err(e) => {
                    tracing::warn!(reference = %reference, error = %e, "Attachment not readable");
                    missing.push(reference.clone());
                }
            }
        }

        if !missing.is_empty() {
            let text = format!("{}\n{}", self.text("missing_files"), missing.join("\n"));
            self.transport.send(to, Reply::text(text)).await?;
        }

        tracing::info!(
            table,
            client_id = %client_id,
            sent = references.len() - missing.len(),
            missing = missing.len(),
            "Lead details sent to operator"
        );
        Ok(())
    }

    fn summary(&self, row: &TableRow, headers: &[String], status_updated: bool) -> String {
        let cell = |column: &str| row.get(headers, column).unwrap_or_default();
        let status = if status_updated {
            self.text("status_updated")
        } else {
            self.text("status_update_failed")
        };

        format!(
            "📋 {}\n👤 {}: {}\n📌 {}: {}\n📂 {}: {}\n🗒 {}: {}\n📲 {}: {}\n📅 {}: {}\n📁 {}: {}\n📝 {}: {}",
            self.text("lead_details"),
            self.text("client"),
            cell("Client name"),
            self.text("category"),
            cell("Category"),
            self.text("files"),
            cell("Attachments"),
            self.text("comment"),
            cell("Comment"),
            self.text("contact"),
            cell("Contact"),
            self.text("date"),
            cell("Date"),
            self.text("attachment_count"),
            cell("Attachment count"),
            self.text("status"),
            status,
        )
    }

    /// Reply with the lead spreadsheet link
    pub async fn handle_sheet(&self, to: &UserId) -> Result<(), CapabilityError> {
        let text = match self.sheet_url.as_deref() {
            Some(url) => fill(&self.text("sheet_link"), &[("url", url)]),
            None => self.text("sheet_not_configured"),
        };
        self.transport.send(to, Reply::removing_keyboard(text)).await
    }
}
