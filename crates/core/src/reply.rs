//! Outbound messages

use serde::{Deserialize, Serialize};

/// One button: visible label plus the payload sent back on press
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub label: String,
    pub payload: String,
}

impl Choice {
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}

/// Keyboard attached to a reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Keyboard {
    #[default]
    None,
    /// Inline buttons, one per row
    Choices { choices: Vec<Choice> },
    /// Button that shares the user's phone number as a structured contact
    RequestContact { label: String },
    /// Remove any custom keyboard shown earlier
    Remove,
}

/// Text plus optional keyboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    #[serde(default)]
    pub keyboard: Keyboard,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: Keyboard::None,
        }
    }

    pub fn with_choices(text: impl Into<String>, choices: Vec<Choice>) -> Self {
        Self {
            text: text.into(),
            keyboard: Keyboard::Choices { choices },
        }
    }

    pub fn with_contact_request(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: Keyboard::RequestContact {
                label: label.into(),
            },
        }
    }

    pub fn removing_keyboard(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: Keyboard::Remove,
        }
    }

    pub fn choices(&self) -> &[Choice] {
        match &self.keyboard {
            Keyboard::Choices { choices } => choices,
            _ => &[],
        }
    }
}
