use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::destination::Seo;

/// An editorial article, optionally linked to destinations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub content: String,
    pub excerpt: Option<String>,
    pub category: Option<String>,
    pub author: Option<String>,
    pub publish_date: Option<DateTime<Utc>>,
    pub featured_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub destination_ids: Vec<String>,
    pub image: Option<String>,
    #[serde(default = "default_true")]
    pub published: bool,
    pub seo: Option<Seo>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

impl Article {
    /// Excerpt when present, otherwise the leading slice of the content.
    pub fn summary(&self, max_len: usize) -> String {
        let source = match self.excerpt {
            Some(ref excerpt) if !excerpt.is_empty() => excerpt,
            _ => &self.content,
        };
        if source.chars().count() <= max_len {
            source.clone()
        } else {
            let truncated: String = source.chars().take(max_len.saturating_sub(3)).collect();
            format!("{}...", truncated)
        }
    }

    /// Whether the article is currently pinned as featured.
    pub fn is_featured(&self) -> bool {
        match self.featured_until {
            Some(until) => Utc::now() < until,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample() -> Article {
        serde_json::from_str(
            r#"{
                "id": "a-1",
                "title": "Winter golf in Spain",
                "slug": "winter-golf-spain",
                "content": "Full length body text goes here."
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_summary_falls_back_to_content() {
        let a = sample();
        assert_eq!(a.summary(100), "Full length body text goes here.");
        assert_eq!(a.summary(10), "Full le...");
    }

    #[test]
    fn test_is_featured_window() {
        let mut a = sample();
        assert!(!a.is_featured());
        a.featured_until = Some(Utc::now() + Duration::days(1));
        assert!(a.is_featured());
        a.featured_until = Some(Utc::now() - Duration::days(1));
        assert!(!a.is_featured());
    }
}
