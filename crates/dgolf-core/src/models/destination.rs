use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A golf travel destination in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Destination {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub country: String,
    pub region: Option<String>,
    pub short_desc: String,
    #[serde(default)]
    pub long_desc: String,
    pub price_from: i64,
    pub price_to: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default = "default_true")]
    pub published: bool,
    pub seo: Option<Seo>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// SEO metadata carried by destinations and articles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Seo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub canonical: Option<String>,
}

fn default_currency() -> String {
    "SEK".to_string()
}

fn default_true() -> bool {
    true
}

impl Destination {
    /// Price range formatted for display, e.g. "8 500 - 14 000 SEK".
    pub fn price_display(&self) -> String {
        format!(
            "{} - {} {}",
            group_thousands(self.price_from),
            group_thousands(self.price_to),
            self.currency
        )
    }

    /// Country plus region when one is set.
    pub fn location_display(&self) -> String {
        match self.region {
            Some(ref region) if !region.is_empty() => {
                format!("{}, {}", region, self.country)
            }
            _ => self.country.clone(),
        }
    }
}

fn group_thousands(value: i64) -> String {
    let digits = value.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }
    if value < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Destination {
        serde_json::from_str(
            r#"{
                "id": "d-1",
                "name": "Costa del Sol",
                "slug": "costa-del-sol",
                "country": "Spain",
                "region": "Andalusia",
                "short_desc": "Sun and links",
                "long_desc": "",
                "price_from": 8500,
                "price_to": 14000
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_destination_defaults() {
        let d = sample();
        assert_eq!(d.currency, "SEK");
        assert!(d.published);
        assert!(!d.featured);
        assert!(d.images.is_empty());
    }

    #[test]
    fn test_price_display_groups_thousands() {
        let d = sample();
        assert_eq!(d.price_display(), "8 500 - 14 000 SEK");
    }

    #[test]
    fn test_location_display() {
        let mut d = sample();
        assert_eq!(d.location_display(), "Andalusia, Spain");
        d.region = None;
        assert_eq!(d.location_display(), "Spain");
    }
}
