//! Finalized lead record and its tabular layout

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::choice::Category;

/// Timestamp format used in the `Date` column
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Column holding the client id (lookup key for operator actions)
pub const CLIENT_ID_COLUMN: &str = "Client ID";

/// Column holding the lead status
pub const STATUS_COLUMN: &str = "Status";

const WHOLESALE_HEADERS: [&str; 10] = [
    "Client name",
    "Client ID",
    "Category",
    "Project type",
    "Attachments",
    "Comment",
    "Contact",
    "Date",
    "Attachment count",
    "Status",
];

const RETAIL_HEADERS: [&str; 11] = [
    "Client name",
    "Client ID",
    "Category",
    "Item interest",
    "Cemetery",
    "Attachments",
    "Comment",
    "Contact",
    "Date",
    "Attachment count",
    "Status",
];

/// Lead status lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    #[default]
    New,
    Viewed,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Viewed => "viewed",
        }
    }
}

/// Category-specific part of a lead
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum CategoryDetails {
    Wholesale {
        project_type: String,
    },
    Retail {
        item_interest: String,
        cemetery: String,
    },
}

impl CategoryDetails {
    pub fn category(&self) -> Category {
        match self {
            Self::Wholesale { .. } => Category::Wholesale,
            Self::Retail { .. } => Category::Retail,
        }
    }
}

/// Configurable destination table names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableNames {
    pub wholesale: String,
    pub retail: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            wholesale: "Wholesale clients".to_string(),
            retail: "Retail clients".to_string(),
        }
    }
}

impl TableNames {
    pub fn for_category(&self, category: Category) -> &str {
        match category {
            Category::Wholesale => &self.wholesale,
            Category::Retail => &self.retail,
        }
    }
}

/// Headers for a category table
pub fn headers_for(category: Category) -> Vec<String> {
    let headers: &[&str] = match category {
        Category::Wholesale => &WHOLESALE_HEADERS,
        Category::Retail => &RETAIL_HEADERS,
    };
    headers.iter().map(|h| h.to_string()).collect()
}

/// Immutable record of a completed dialogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub client_name: String,
    pub client_id: String,
    /// Raw stored category value
    pub category: String,
    pub details: CategoryDetails,
    pub attachments: Vec<String>,
    pub comment: String,
    pub contact: String,
    pub timestamp: String,
    pub status: LeadStatus,
}

impl LeadRecord {
    pub fn category(&self) -> Category {
        self.details.category()
    }

    pub fn attachment_count(&self) -> usize {
        self.attachments.len()
    }

    pub fn headers(&self) -> Vec<String> {
        headers_for(self.category())
    }

    /// Row values in header order
    pub fn row(&self) -> Vec<String> {
        let attachments = self.attachments.join(", ");
        let mut row = vec![
            self.client_name.clone(),
            self.client_id.clone(),
            self.category.clone(),
        ];
        match &self.details {
            CategoryDetails::Wholesale { project_type } => row.push(project_type.clone()),
            CategoryDetails::Retail {
                item_interest,
                cemetery,
            } => {
                row.push(item_interest.clone());
                row.push(cemetery.clone());
            }
        }
        row.extend([
            attachments,
            self.comment.clone(),
            self.contact.clone(),
            self.timestamp.clone(),
            self.attachment_count().to_string(),
            self.status.as_str().to_string(),
        ]);
        row
    }
}

/// Handle to a persisted lead
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadId {
    pub table: String,
    pub client_id: String,
    pub lead_uuid: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retail_lead() -> LeadRecord {
        LeadRecord {
            client_name: "Ivan".into(),
            client_id: "42".into(),
            category: "retail".into(),
            details: CategoryDetails::Retail {
                item_interest: "monuments".into(),
                cemetery: "Central".into(),
            },
            attachments: vec!["uploads/42/a.jpg".into(), "uploads/42/b.pdf".into()],
            comment: "granite, 1.2m".into(),
            contact: "+79990001122".into(),
            timestamp: "2024-05-01 10:00:00".into(),
            status: LeadStatus::New,
        }
    }

    #[test]
    fn test_retail_row_matches_headers() {
        let lead = retail_lead();
        let headers = lead.headers();
        let row = lead.row();
        assert_eq!(headers.len(), row.len());
        assert_eq!(headers[3], "Item interest");
        assert_eq!(row[3], "monuments");
        assert_eq!(row[4], "Central");
        assert_eq!(row[5], "uploads/42/a.jpg, uploads/42/b.pdf");
        assert_eq!(row[9], "2");
        assert_eq!(row[10], "new");
    }

    #[test]
    fn test_wholesale_row_matches_headers() {
        let lead = LeadRecord {
            category: "wholesale".into(),
            details: CategoryDetails::Wholesale {
                project_type: "stone_processor".into(),
            },
            attachments: Vec::new(),
            ..retail_lead()
        };
        let headers = lead.headers();
        let row = lead.row();
        assert_eq!(headers.len(), 10);
        assert_eq!(row.len(), 10);
        assert_eq!(row[3], "stone_processor");
        assert_eq!(row[4], "");
        assert_eq!(row[8], "0");
    }

    #[test]
    fn test_status_column_positions() {
        for category in [Category::Wholesale, Category::Retail] {
            let headers = headers_for(category);
            assert_eq!(headers[1], CLIENT_ID_COLUMN);
            assert_eq!(headers.last().map(String::as_str), Some(STATUS_COLUMN));
        }
    }

    #[test]
    fn test_table_names_default() {
        let names = TableNames::default();
        assert_eq!(names.for_category(Category::Wholesale), "Wholesale clients");
        assert_eq!(names.for_category(Category::Retail), "Retail clients");
    }
}
