use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored file (destination photos, article images, brochures) as
/// described by the file endpoints. Identity is the storage key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFile {
    pub file_key: String,
    pub file_url: Option<String>,
    pub original_filename: Option<String>,
    pub content_type: Option<String>,
    #[serde(default)]
    pub size: u64,
    pub uploaded_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_minimal_listing_entry() {
        let file: StoredFile = serde_json::from_str(
            r#"{"file_key": "destinations/20250101_ab12.jpg", "size": 1024}"#,
        )
        .unwrap();
        assert_eq!(file.file_key, "destinations/20250101_ab12.jpg");
        assert!(file.file_url.is_none());
    }
}
