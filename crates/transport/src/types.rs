//! Telegram Bot API update model (subset)
//!
//! Only the fields the intake dialogue reads are modelled; everything else
//! in an update is ignored by serde.

use serde::{Deserialize, Serialize};

use intake_bot_core::{Attachment, AttachmentKind, Command, EventKind, InboundEvent, UserId};

/// Telegram Update object
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

/// Telegram Message object
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
    pub caption: Option<String>,
    /// Photo (array of sizes, largest last)
    pub photo: Option<Vec<PhotoSize>>,
    pub document: Option<Document>,
    pub contact: Option<Contact>,
    pub sticker: Option<serde_json::Value>,
    pub voice: Option<serde_json::Value>,
    pub video: Option<serde_json::Value>,
    pub audio: Option<serde_json::Value>,
    pub location: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub file_unique_id: String,
    pub width: i32,
    pub height: i32,
    pub file_size: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub file_id: String,
    pub file_unique_id: String,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub file_size: Option<i64>,
}

/// Shared contact
#[derive(Debug, Clone, Deserialize)]
pub struct Contact {
    pub phone_number: String,
    pub first_name: Option<String>,
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
    pub language_code: Option<String>,
}

/// Inline button press
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

/// Bot API response envelope
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
}

/// Result of `getFile`
#[derive(Debug, Clone, Deserialize)]
pub struct File {
    pub file_id: String,
    pub file_path: Option<String>,
}

/// Entry for `setMyCommands`
#[derive(Debug, Clone, Serialize)]
pub struct BotCommand {
    pub command: String,
    pub description: String,
}

impl Message {
    fn kind(&self) -> EventKind {
        if let Some(contact) = &self.contact {
            return EventKind::Contact {
                phone: contact.phone_number.clone(),
            };
        }

        if let Some(photo) = self.photo.as_ref().and_then(|sizes| sizes.last()) {
            return EventKind::Attachment {
                attachment: Attachment {
                    kind: AttachmentKind::Photo,
                    file_id: photo.file_id.clone(),
                    file_name: None,
                    caption: self.caption.clone(),
                },
            };
        }

        if let Some(document) = &self.document {
            return EventKind::Attachment {
                attachment: Attachment {
                    kind: AttachmentKind::Document,
                    file_id: document.file_id.clone(),
                    file_name: document.file_name.clone(),
                    caption: self.caption.clone(),
                },
            };
        }

        if let Some(text) = &self.text {
            return match Command::parse(text) {
                Some(command) => EventKind::Command { command },
                None => EventKind::Text { text: text.clone() },
            };
        }

        let content = if self.sticker.is_some() {
            "sticker"
        } else if self.voice.is_some() {
            "voice"
        } else if self.video.is_some() {
            "video"
        } else if self.audio.is_some() {
            "audio"
        } else if self.location.is_some() {
            "location"
        } else {
            "unknown"
        };
        EventKind::Unsupported {
            content: content.to_string(),
        }
    }
}

impl TelegramUpdate {
    /// Id to acknowledge if this update is a button press
    pub fn callback_query_id(&self) -> Option<&str> {
        self.callback_query.as_ref().map(|q| q.id.as_str())
    }

    /// Map to a dialogue event. Updates from bots and update kinds the bot
    /// does not handle yield `None`.
    ///
    /// The event is addressed by chat id, so replies go back to the chat the
    /// update came from.
    pub fn into_event(self) -> Option<InboundEvent> {
        if let Some(query) = self.callback_query {
            if query.from.is_bot {
                return None;
            }
            let chat_id = query
                .message
                .as_ref()
                .map_or(query.from.id, |m| m.chat.id);
            let mut event = InboundEvent::choice(UserId::from(chat_id), query.data.unwrap_or_default());
            event.locale_hint = query.from.language_code;
            return Some(event);
        }

        let message = self.message?;
        if message.from.as_ref().is_some_and(|u| u.is_bot) {
            return None;
        }
        let mut event = InboundEvent::new(UserId::from(message.chat.id), message.kind());
        event.locale_hint = message.from.and_then(|u| u.language_code);
        Some(event)
    }
}
