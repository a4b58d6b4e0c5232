//! Telegram transport for the intake bot
//!
//! - `TelegramClient`: Bot API client implementing the core `Transport` trait
//! - `types`: the subset of the Bot API update model the bot reads
//! - update → `InboundEvent` mapping

pub mod client;
pub mod types;

pub use client::TelegramClient;
pub use types::{
    BotCommand, CallbackQuery, Chat, Contact, Document, Message, PhotoSize, TelegramUpdate, User,
};

use intake_bot_core::CapabilityError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Bot API error {code}: {description}")]
    Api { code: i64, description: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl From<TransportError> for CapabilityError {
    fn from(err: TransportError) -> Self {
        CapabilityError::Transport(err.to_string())
    }
}
