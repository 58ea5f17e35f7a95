// src/view/format.rs
//! Display helpers for history rows

use chrono::{Local, TimeZone};

use crate::core::Entry;

/// Preview length used when the caller does not configure one
pub const DEFAULT_PREVIEW_CHARS: usize = 100;

/// Local time as `YYYY-MM-DD HH:MM:SS`
pub fn format_timestamp(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis).single() {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => millis.to_string(),
    }
}

/// "Just now", "5m ago", "3h ago", "2d ago", or the full timestamp past a week
pub fn format_relative_time(millis: i64, now_millis: i64) -> String {
    let seconds = now_millis.saturating_sub(millis).div_euclid(1000);
    let minutes = seconds.div_euclid(60);
    let hours = minutes.div_euclid(60);
    let days = hours.div_euclid(24);

    if seconds < 60 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if hours < 24 {
        format!("{}h ago", hours)
    } else if days < 7 {
        format!("{}d ago", days)
    } else {
        format_timestamp(millis)
    }
}

/// Cut `text` to `max_chars` characters, marking the cut with `...`
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// "N entries", plus the pinned count when there is any
pub fn entry_count_label(entries: &[Entry]) -> String {
    let total = entries.len();
    let pinned = entries.iter().filter(|e| e.pinned).count();
    if pinned > 0 {
        format!("{} entries ({} pinned)", total, pinned)
    } else {
        format!("{} entries", total)
    }
}
