//! Inbound events delivered by the transport

use serde::{Deserialize, Serialize};

use crate::session::UserId;

/// Bot commands the dialogue understands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", content = "raw", rename_all = "snake_case")]
pub enum Command {
    Start,
    Cancel,
    Sheet,
    Other(String),
}

impl Command {
    /// Parse the first word of a `/command` message (bot mention suffix allowed)
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.trim().split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);
        let command = match name.to_lowercase().as_str() {
            "start" => Self::Start,
            "cancel" => Self::Cancel,
            "sheet" => Self::Sheet,
            other => Self::Other(other.to_string()),
        };
        Some(command)
    }
}

/// Kind of uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Photo,
    Document,
}

/// Reference to a file the user sent, not yet downloaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub kind: AttachmentKind,
    /// Transport-specific handle used to fetch the bytes
    pub file_id: String,
    pub file_name: Option<String>,
    pub caption: Option<String>,
}

impl Attachment {
    /// File name to store the bytes under
    pub fn suggested_name(&self) -> String {
        match (&self.kind, &self.file_name) {
            (AttachmentKind::Document, Some(name)) if !name.trim().is_empty() => name.clone(),
            (AttachmentKind::Document, _) => format!("document_{}", self.file_id),
            (AttachmentKind::Photo, _) => format!("photo_{}.jpg", self.file_id),
        }
    }

    /// Caption with surrounding whitespace removed, if anything is left
    pub fn caption(&self) -> Option<&str> {
        self.caption
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// What the user sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    Command { command: Command },
    Text { text: String },
    /// Button press with its raw payload
    Choice { payload: String },
    /// Structured contact shared through the transport's contact affordance
    Contact { phone: String },
    Attachment { attachment: Attachment },
    /// Content the bot does not handle (stickers, voice, ...)
    Unsupported { content: String },
}

/// One inbound event for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    pub user_id: UserId,
    /// Language hint from the transport (e.g. client UI language)
    pub locale_hint: Option<String>,
    pub kind: EventKind,
}

impl InboundEvent {
    pub fn new(user_id: impl Into<UserId>, kind: EventKind) -> Self {
        Self {
            user_id: user_id.into(),
            locale_hint: None,
            kind,
        }
    }

    pub fn with_locale_hint(mut self, hint: impl Into<String>) -> Self {
        self.locale_hint = Some(hint.into());
        self
    }

    pub fn command(user_id: impl Into<UserId>, command: Command) -> Self {
        Self::new(user_id, EventKind::Command { command })
    }

    pub fn text(user_id: impl Into<UserId>, text: impl Into<String>) -> Self {
        Self::new(user_id, EventKind::Text { text: text.into() })
    }

    pub fn choice(user_id: impl Into<UserId>, payload: impl Into<String>) -> Self {
        Self::new(
            user_id,
            EventKind::Choice {
                payload: payload.into(),
            },
        )
    }

    pub fn contact(user_id: impl Into<UserId>, phone: impl Into<String>) -> Self {
        Self::new(
            user_id,
            EventKind::Contact {
                phone: phone.into(),
            },
        )
    }

    pub fn attachment(user_id: impl Into<UserId>, attachment: Attachment) -> Self {
        Self::new(user_id, EventKind::Attachment { attachment })
    }

    /// Short label for logs and metrics
    pub fn kind_label(&self) -> &'static str {
        match &self.kind {
            EventKind::Command { .. } => "command",
            EventKind::Text { .. } => "text",
            EventKind::Choice { .. } => "choice",
            EventKind::Contact { .. } => "contact",
            EventKind::Attachment { .. } => "attachment",
            EventKind::Unsupported { .. } => "unsupported",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parse() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("/start@intake_bot payload"), Some(Command::Start));
        assert_eq!(Command::parse("/Cancel"), Some(Command::Cancel));
        assert_eq!(
            Command::parse("/help"),
            Some(Command::Other("help".to_string()))
        );
        assert_eq!(Command::parse("start"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn test_suggested_name() {
        let photo = Attachment {
            kind: AttachmentKind::Photo,
            file_id: "abc".into(),
            file_name: None,
            caption: None,
        };
        assert_eq!(photo.suggested_name(), "photo_abc.jpg");

        let doc = Attachment {
            kind: AttachmentKind::Document,
            file_id: "def".into(),
            file_name: Some("project.pdf".into()),
            caption: Some("   ".into()),
        };
        assert_eq!(doc.suggested_name(), "project.pdf");
        assert_eq!(doc.caption(), None);

        let unnamed = Attachment {
            file_name: None,
            ..doc
        };
        assert_eq!(unnamed.suggested_name(), "document_def");
    }
}
