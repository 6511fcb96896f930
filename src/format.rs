use chrono::{DateTime, Utc};

use crate::models::MAX_LEVEL;

pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

pub fn level_bar(level: u8) -> String {
    let filled = level.min(MAX_LEVEL) as usize;
    let empty = MAX_LEVEL as usize - filled;
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

pub fn format_time(t: &DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M UTC").to_string()
}

pub fn format_short(t: &DateTime<Utc>) -> String {
    t.format("%b %d %H:%M").to_string()
}
