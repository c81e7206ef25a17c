use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A published customer review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Testimonial {
    pub id: String,
    pub name: String,
    pub rating: u8,
    pub content: String,
    pub destination_id: Option<String>,
    pub trip_date: Option<String>,
    #[serde(default = "default_true")]
    pub published: bool,
    pub created_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

impl Testimonial {
    /// Star rating clamped to the 1-5 scale the backend enforces.
    pub fn stars(&self) -> String {
        let rating = self.rating.clamp(1, 5) as usize;
        let mut s = String::with_capacity(5);
        for _ in 0..rating {
            s.push('★');
        }
        for _ in rating..5 {
            s.push('☆');
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stars_rendering() {
        let t: Testimonial = serde_json::from_str(
            r#"{"id": "t-1", "name": "Nils", "rating": 4, "content": "Great trip"}"#,
        )
        .unwrap();
        assert_eq!(t.stars(), "★★★★☆");
    }
}
