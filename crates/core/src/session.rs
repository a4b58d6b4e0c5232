//! Per-user conversation session
//!
//! A `Session` is the whole in-progress record of one user's dialogue:
//! the current node in the dialogue graph plus everything collected so far.
//! It is owned by a `SessionStore` between events and by the running
//! transition while an event is processed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::CoreError;

/// Opaque user identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Node in the fixed dialogue graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DialogueState {
    /// No dialogue yet; waiting for the start command
    #[default]
    Start,
    AwaitingName,
    AwaitingCategory,
    AwaitingWholesaleSubtype,
    AwaitingRetailSubtype,
    AwaitingWholesaleDetails,
    AwaitingCemetery,
    AwaitingMonumentDetails,
    AwaitingItemDetails,
    AwaitingContact,
    /// Dialogue finished (lead submitted or cancelled)
    Idle,
}

impl DialogueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::AwaitingName => "awaiting_name",
            Self::AwaitingCategory => "awaiting_category",
            Self::AwaitingWholesaleSubtype => "awaiting_wholesale_subtype",
            Self::AwaitingRetailSubtype => "awaiting_retail_subtype",
            Self::AwaitingWholesaleDetails => "awaiting_wholesale_details",
            Self::AwaitingCemetery => "awaiting_cemetery",
            Self::AwaitingMonumentDetails => "awaiting_monument_details",
            Self::AwaitingItemDetails => "awaiting_item_details",
            Self::AwaitingContact => "awaiting_contact",
            Self::Idle => "idle",
        }
    }

    /// States where free-form details (text, photos, documents) are aggregated
    pub fn is_details_collection(&self) -> bool {
        matches!(
            self,
            Self::AwaitingWholesaleDetails | Self::AwaitingMonumentDetails | Self::AwaitingItemDetails
        )
    }

    /// States that only advance on a button choice
    pub fn is_selection(&self) -> bool {
        matches!(
            self,
            Self::AwaitingCategory | Self::AwaitingWholesaleSubtype | Self::AwaitingRetailSubtype
        )
    }

    /// States outside an active dialogue
    pub fn is_dormant(&self) -> bool {
        matches!(self, Self::Start | Self::Idle)
    }
}

/// Collected field names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Category,
    SubCategory,
    Cemetery,
    Phone,
    Locale,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Category => "client_category",
            Self::SubCategory => "sub_category",
            Self::Cemetery => "cemetery",
            Self::Phone => "phone",
            Self::Locale => "locale",
        }
    }

    /// Locale is re-resolved on every transition; everything else is set once
    pub fn is_write_once(&self) -> bool {
        !matches!(self, Self::Locale)
    }
}

/// One user's in-progress conversation record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
    pub state: DialogueState,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default)]
    pub combined_comment: String,
    #[serde(default)]
    pub file_list: Vec<String>,
    #[serde(default)]
    pub comment_turns: u32,
}

impl Session {
    /// Fresh session for a user that has not started a dialogue
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            state: DialogueState::Start,
            fields: BTreeMap::new(),
            combined_comment: String::new(),
            file_list: Vec::new(),
            comment_turns: 0,
        }
    }

    pub fn field(&self, field: Field) -> Option<&str> {
        self.fields.get(field.as_str()).map(String::as_str)
    }

    /// Record a collected value.
    ///
    /// Write-once fields keep their first value; a second write is rejected.
    pub fn record(&mut self, field: Field, value: impl Into<String>) -> Result<(), CoreError> {
        if field.is_write_once() && self.fields.contains_key(field.as_str()) {
            return Err(CoreError::FieldAlreadySet { field });
        }
        self.fields.insert(field.as_str().to_string(), value.into());
        Ok(())
    }

    /// Look up a field the current state depends on
    pub fn require(&self, field: Field) -> Result<&str, CoreError> {
        self.field(field).ok_or(CoreError::MissingField {
            field,
            state: self.state,
        })
    }

    /// Append a text fragment to the combined comment (newline-joined, trimmed)
    pub fn append_comment(&mut self, fragment: &str) {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return;
        }
        if self.combined_comment.is_empty() {
            self.combined_comment = fragment.to_string();
        } else {
            self.combined_comment = format!("{}\n{}", self.combined_comment, fragment)
                .trim()
                .to_string();
        }
    }

    /// Add an attachment reference, keeping the list sorted and de-duplicated
    pub fn add_file(&mut self, reference: impl Into<String>) {
        let reference = reference.into();
        if let Err(pos) = self.file_list.binary_search(&reference) {
            self.file_list.insert(pos, reference);
        }
    }

    /// Move to a new state; entering a details state restarts the turn counter
    pub fn enter(&mut self, state: DialogueState) {
        if state.is_details_collection() && state != self.state {
            self.comment_turns = 0;
        }
        self.state = state;
    }

    /// Drop everything collected and park the session in `state`
    pub fn reset(&mut self, state: DialogueState) {
        self.fields.clear();
        self.combined_comment.clear();
        self.file_list.clear();
        self.comment_turns = 0;
        self.state = state;
    }
}
