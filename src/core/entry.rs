// src/core/entry.rs
//! History entry types
//!
//! An [`Entry`] is one captured piece of clipboard text. The store keeps them
//! in insertion order, which (because timestamps only ever grow) is also
//! ascending timestamp order.

use serde::{Deserialize, Serialize};

/// A single captured clipboard item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub text: String,
    pub pinned: bool,
    /// Creation time in milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl Entry {
    /// Create an unpinned entry whose id is derived from its creation time
    pub fn new(text: String, timestamp: i64) -> Self {
        Self {
            id: timestamp.to_string(),
            text,
            pinned: false,
            timestamp,
        }
    }
}

/// Normalize candidate text, returning `None` when nothing but whitespace remains
pub fn normalize_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
