//! Lead finalization
//!
//! Turns a completed session into one row of the category table and tells
//! the operator about it. Persistence failures are surfaced; a failed
//! notification is only logged.

use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use intake_bot_core::{
    BlobStore, CapabilityError, Category, CategoryDetails, Choice, Field, LeadId, LeadRecord,
    LeadStatus, Localizer, OperatorAction, Reply, Session, TableNames, TableStore, Transport,
    UserId, TIMESTAMP_FORMAT,
};

use crate::metrics;

#[derive(Error, Debug)]
pub enum FinalizeError {
    #[error("Failed to persist lead: {0}")]
    PersistenceFailure(CapabilityError),

    #[error("Session is missing field {0}")]
    MissingField(&'static str),
}

fn required<'a>(session: &'a Session, field: Field) -> Result<&'a str, FinalizeError> {
    session
        .field(field)
        .ok_or(FinalizeError::MissingField(field.as_str()))
}

/// Build the lead record for a session.
///
/// A stored category other than `wholesale` produces a retail-shaped record;
/// the raw value still goes into the `Category` column.
pub fn build_record(
    session: &Session,
    attachments: Vec<String>,
    timestamp: String,
) -> Result<LeadRecord, FinalizeError> {
    let client_name = required(session, Field::Name)?;
    let category = required(session, Field::Category)?;
    let contact = required(session, Field::Phone)?;
    let sub_category = session.field(Field::SubCategory).unwrap_or_default();

    let details = match Category::from_stored(category) {
        Category::Wholesale => CategoryDetails::Wholesale {
            project_type: sub_category.to_string(),
        },
        Category::Retail => CategoryDetails::Retail {
            item_interest: sub_category.to_string(),
            cemetery: session.field(Field::Cemetery).unwrap_or_default().to_string(),
        },
    };

    Ok(LeadRecord {
        client_name: client_name.to_string(),
        client_id: session.user_id.to_string(),
        category: category.to_string(),
        details,
        attachments,
        comment: session.combined_comment.trim().to_string(),
        contact: contact.to_string(),
        timestamp,
        status: LeadStatus::New,
    })
}

pub struct LeadFinalizer {
    blobs: Arc<dyn BlobStore>,
    tables: Arc<dyn TableStore>,
    transport: Arc<dyn Transport>,
    localizer: Arc<dyn Localizer>,
    table_names: TableNames,
    operator_chat: Option<UserId>,
    settle: Duration,
}

impl LeadFinalizer {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        tables: Arc<dyn TableStore>,
        transport: Arc<dyn Transport>,
        localizer: Arc<dyn Localizer>,
        table_names: TableNames,
        operator_chat: Option<UserId>,
        settle: Duration,
    ) -> Self {
        Self {
            blobs,
            tables,
            transport,
            localizer,
            table_names,
            operator_chat,
            settle,
        }
    }

    /// Persist the lead for a completed session and notify the operator.
    pub async fn finalize(&self, session: &Session) -> Result<LeadId, FinalizeError> {
        // uploads still in flight get a chance to land
        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }
        let (attachments, missing) = self.reconcile_attachments(session).await;
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let record = build_record(session, attachments, timestamp)?;

        let category = record.category();
        let table = self.table_names.for_category(category).to_string();

        if let Err(e) = self.persist(&table, &record).await {
            tracing::error!(
                user_id = %session.user_id,
                table = %table,
                error = %e,
                "Failed to persist lead"
            );
            metrics::record_finalize_failure();
            return Err(FinalizeError::PersistenceFailure(e));
        }

        metrics::record_lead_finalized(category.as_str());
        tracing::info!(
            user_id = %session.user_id,
            table = %table,
            attachments = record.attachment_count(),
            "Lead saved"
        );

        self.notify_operator(&record, &missing).await;

        Ok(LeadId {
            table,
            client_id: record.client_id,
            lead_uuid: Uuid::new_v4(),
        })
    }

    /// Stored attachments for the user, plus the session references
    /// that have no stored file behind them. Falls back to the session
    /// list when storage cannot be listed.
    async fn reconcile_attachments(&self, session: &Session) -> (Vec<String>, Vec<String>) {
        let (mut attachments, missing) = match self.blobs.list(&session.user_id).await {
            Ok(stored) => {
                let missing: Vec<String> = session
                    .file_list
                    .iter()
                    .filter(|reference| !stored.contains(reference))
                    .cloned()
                    .collect();
                for reference in &missing {
                    tracing::warn!(
                        user_id = %session.user_id,
                        reference = %reference,
                        "Attachment missing from storage"
                    );
                }
                (stored, missing)
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %session.user_id,
                    error = %e,
                    "Could not list stored attachments, using session list"
                );
                (session.file_list.clone(), Vec::new())
            }
        };
        attachments.sort();
        attachments.dedup();
        (attachments, missing)
    }

    async fn persist(&self, table: &str, record: &LeadRecord) -> Result<(), CapabilityError> {
        self.tables.ensure(table, &record.headers()).await?;
        self.tables.append_row(table, &record.row()).await
    }

    async fn notify_operator(&self, record: &LeadRecord, missing: &[String]) {
        let Some(chat) = &self.operator_chat else {
            return;
        };

        let locale = self.localizer.base_locale();
        let label = |key: &str| self.localizer.text(locale, key);
        let mut text = format!(
            "📝 {}\n📅 {}: {}\n\n👤 {}: {}\n📌 {}: {}\n🗒 {}: {}\n📂 {}: {}",
            label("new_order"),
            label("date"),
            record.timestamp,
            label("client"),
            record.client_name,
            label("category"),
            record.category,
            label("comment"),
            record.comment,
            label("files"),
            record.attachment_count(),
        );
        if !missing.is_empty() {
            text.push_str(&format!("\n\n{}\n{}", label("missing_files"), missing.join("\n")));
        }
        let action = OperatorAction::Details {
            category: record.category(),
            client_id: UserId::new(record.client_id.clone()),
        };
        let reply = Reply::with_choices(
            text,
            vec![Choice::new(label("btn_details"), action.payload())],
        );

        if let Err(e) = self.transport.send(chat, reply).await {
            metrics::record_notification_failure();
            tracing::warn!(
                operator_chat = %chat,
                client_id = %record.client_id,
                error = %e,
                "Failed to notify operator"
            );
        }
    }
}
