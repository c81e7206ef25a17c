use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Workflow state of an inquiry, managed by the back office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InquiryStatus {
    New,
    InProgress,
    Responded,
    Closed,
}

impl Default for InquiryStatus {
    fn default() -> Self {
        InquiryStatus::New
    }
}

impl std::fmt::Display for InquiryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InquiryStatus::New => write!(f, "New"),
            InquiryStatus::InProgress => write!(f, "In Progress"),
            InquiryStatus::Responded => write!(f, "Responded"),
            InquiryStatus::Closed => write!(f, "Closed"),
        }
    }
}

/// An internal note attached to an inquiry by an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InquiryNote {
    pub text: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// A booking inquiry as stored by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inquiry {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub destination_id: Option<String>,
    pub destination_name: Option<String>,
    pub dates: Option<String>,
    pub group_size: Option<i32>,
    pub budget: Option<String>,
    pub message: Option<String>,
    #[serde(default)]
    pub status: InquiryStatus,
    #[serde(default)]
    pub notes: Vec<InquiryNote>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Payload for creating an inquiry. Also the shape persisted in the
/// offline outbox until it can be submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InquiryCreate {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub destination_id: Option<String>,
    pub destination_name: Option<String>,
    pub dates: Option<String>,
    pub group_size: Option<i32>,
    pub budget: Option<String>,
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_snake_case() {
        let s: InquiryStatus = serde_json::from_str(r#""in_progress""#).unwrap();
        assert_eq!(s, InquiryStatus::InProgress);
        assert_eq!(serde_json::to_string(&s).unwrap(), r#""in_progress""#);
    }

    #[test]
    fn test_inquiry_defaults_to_new() {
        let json = r#"{"id": "i-1", "name": "Eva", "email": "eva@example.se"}"#;
        let inquiry: Inquiry = serde_json::from_str(json).unwrap();
        assert_eq!(inquiry.status, InquiryStatus::New);
        assert!(inquiry.notes.is_empty());
    }
}
