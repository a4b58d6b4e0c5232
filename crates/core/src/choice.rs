//! Typed button payloads
//!
//! Every button the bot offers carries one of the payloads below. Parsing is
//! total: anything that is not a declared payload yields `None` and the
//! dialogue engine treats it as an ignored event.

use serde::{Deserialize, Serialize};

use crate::session::UserId;

/// Client category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Wholesale,
    Retail,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wholesale => "wholesale",
            Self::Retail => "retail",
        }
    }

    /// Parse a stored category value; anything unknown maps to retail
    pub fn from_stored(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "wholesale" => Self::Wholesale,
            _ => Self::Retail,
        }
    }
}

/// Wholesale sub-type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WholesaleSubtype {
    StoneProcessor,
    RelatedField,
}

impl WholesaleSubtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StoneProcessor => "stone_processor",
            Self::RelatedField => "related_field",
        }
    }
}

/// Retail sub-type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetailSubtype {
    Monuments,
    OtherItems,
}

impl RetailSubtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monuments => "monuments",
            Self::OtherItems => "other_items",
        }
    }
}

/// A choice made by the client through a button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum UserChoice {
    Category(Category),
    Wholesale(WholesaleSubtype),
    Retail(RetailSubtype),
}

impl UserChoice {
    pub fn payload(&self) -> String {
        match self {
            Self::Category(c) => format!("category:{}", c.as_str()),
            Self::Wholesale(s) => format!("wholesale:{}", s.as_str()),
            Self::Retail(s) => format!("retail:{}", s.as_str()),
        }
    }

    pub fn parse(payload: &str) -> Option<Self> {
        let choice = match payload.trim() {
            "category:wholesale" => Self::Category(Category::Wholesale),
            "category:retail" => Self::Category(Category::Retail),
            "wholesale:stone_processor" => Self::Wholesale(WholesaleSubtype::StoneProcessor),
            "wholesale:related_field" => Self::Wholesale(WholesaleSubtype::RelatedField),
            "retail:monuments" => Self::Retail(RetailSubtype::Monuments),
            "retail:other_items" => Self::Retail(RetailSubtype::OtherItems),
            _ => return None,
        };
        Some(choice)
    }

    /// Locale key for the button label
    pub fn label_key(&self) -> &'static str {
        match self {
            Self::Category(Category::Wholesale) => "btn_wholesale",
            Self::Category(Category::Retail) => "btn_retail",
            Self::Wholesale(WholesaleSubtype::StoneProcessor) => "btn_stone_processor",
            Self::Wholesale(WholesaleSubtype::RelatedField) => "btn_related_field",
            Self::Retail(RetailSubtype::Monuments) => "btn_monuments",
            Self::Retail(RetailSubtype::OtherItems) => "btn_other_items",
        }
    }
}

/// Actions available to the operator on a lead notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorAction {
    /// Show full lead details and attachments
    Details { category: Category, client_id: UserId },
}

impl OperatorAction {
    pub fn payload(&self) -> String {
        match self {
            Self::Details {
                category,
                client_id,
            } => format!("details:{}:{}", category.as_str(), client_id),
        }
    }

    pub fn parse(payload: &str) -> Option<Self> {
        let rest = payload.trim().strip_prefix("details:")?;
        let (category, client_id) = rest.split_once(':')?;
        if client_id.is_empty() {
            return None;
        }
        let category = match category {
            "wholesale" => Category::Wholesale,
            "retail" => Category::Retail,
            _ => return None,
        };
        Some(Self::Details {
            category,
            client_id: UserId::new(client_id),
        })
    }
}
