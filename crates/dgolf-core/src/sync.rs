//! Offline inquiry outbox.
//!
//! Inquiries submitted while the network is down are queued here and
//! replayed when connectivity returns. The queue is FIFO and durable;
//! a failed flush keeps the remaining entries for the next attempt.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::models::InquiryCreate;

/// Outbox file name in the cache directory
const OUTBOX_FILE: &str = "outbox.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct OutboxData {
    pending: Vec<InquiryCreate>,
}

pub struct InquiryOutbox {
    cache_dir: PathBuf,
}

impl InquiryOutbox {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    fn path(&self) -> PathBuf {
        self.cache_dir.join(OUTBOX_FILE)
    }

    fn load(&self) -> Result<OutboxData> {
        let path = self.path();
        if !path.exists() {
            return Ok(OutboxData::default());
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read outbox file")?;
        serde_json::from_str(&contents).context("Failed to parse outbox file")
    }

    fn save(&self, data: &OutboxData) -> Result<()> {
        let path = self.path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, serde_json::to_string_pretty(data)?)?;
        Ok(())
    }

    /// Queue an inquiry for later submission.
    pub fn enqueue(&self, inquiry: InquiryCreate) -> Result<()> {
        let mut data = self.load()?;
        data.pending.push(inquiry);
        self.save(&data)?;
        info!(pending = data.pending.len(), "Inquiry queued for sync");
        Ok(())
    }

    pub fn pending_count(&self) -> usize {
        self.load().map(|d| d.pending.len()).unwrap_or(0)
    }

    /// Submit queued inquiries in order. Stops at the first failure so
    /// ordering is preserved; returns how many were submitted.
    pub async fn flush(&self, api: &ApiClient) -> Result<usize> {
        let mut data = self.load()?;
        if data.pending.is_empty() {
            return Ok(0);
        }

        let mut submitted = 0;
        while let Some(inquiry) = data.pending.first().cloned() {
            match api.create_inquiry(&inquiry).await {
                Ok(_) => {
                    data.pending.remove(0);
                    submitted += 1;
                }
                Err(e) => {
                    warn!(error = %e, remaining = data.pending.len(), "Outbox flush interrupted");
                    break;
                }
            }
        }

        self.save(&data)?;
        if submitted > 0 {
            info!(submitted, "Flushed offline inquiries");
        }
        Ok(submitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample(message: &str) -> InquiryCreate {
        InquiryCreate {
            name: "Eva Berg".into(),
            email: "eva@example.se".into(),
            phone: None,
            destination_id: Some("d-1".into()),
            destination_name: Some("Costa del Sol".into()),
            dates: None,
            group_size: Some(4),
            budget: None,
            message: Some(message.into()),
        }
    }

    #[test]
    fn test_enqueue_persists_in_order() {
        let dir = TempDir::new().unwrap();
        let outbox = InquiryOutbox::new(dir.path().to_path_buf());

        outbox.enqueue(sample("first")).unwrap();
        outbox.enqueue(sample("second")).unwrap();

        assert_eq!(outbox.pending_count(), 2);
        let data = outbox.load().unwrap();
        assert_eq!(data.pending[0].message.as_deref(), Some("first"));
        assert_eq!(data.pending[1].message.as_deref(), Some("second"));
    }

    #[test]
    fn test_empty_outbox_counts_zero() {
        let dir = TempDir::new().unwrap();
        let outbox = InquiryOutbox::new(dir.path().to_path_buf());
        assert_eq!(outbox.pending_count(), 0);
    }
}
