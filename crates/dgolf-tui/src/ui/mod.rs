//! Terminal UI for the DGolf client.
//!
//! Two parallel compositions share the same application state: `desktop`
//! (wide, two-pane) and `mobile` (compact, single-pane). The device
//! profile published by the core's watcher is the only thing deciding
//! which one mounts; resizing the terminal flips between them live.

pub mod desktop;
pub mod input;
pub mod mobile;
pub mod render;
pub mod styles;

/// Truncate a string to a maximum width, adding an ellipsis if needed.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format an RFC 3339-ish timestamp as a short date for lists.
pub fn short_date(date: &Option<chrono::DateTime<chrono::Utc>>) -> String {
    match date {
        Some(dt) => dt.format("%b %d, %Y").to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a long destination name", 10), "a long ...");
        assert_eq!(truncate("abcdef", 2), "ab");
    }
}
