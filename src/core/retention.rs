// src/core/retention.rs
//! Retention policy for the clipboard history
//!
//! The history is bounded to `max_entries`. Pinned entries are exempt from
//! eviction; when the bound is exceeded the oldest unpinned entries go first.
//! Duplicate suppression only looks at the last `duplicate_window` insertions,
//! not the whole history.

use serde::{Deserialize, Serialize};

use super::entry::Entry;

pub const DEFAULT_MAX_ENTRIES: usize = 200;
pub const DEFAULT_DUPLICATE_WINDOW: usize = 5;

/// Configuration for history retention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// Maximum number of entries kept once unpinned entries can be evicted
    pub max_entries: usize,

    /// Number of most recent insertions checked for duplicate text
    pub duplicate_window: usize,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            duplicate_window: DEFAULT_DUPLICATE_WINDOW,
        }
    }
}

impl RetentionPolicy {
    /// True when `text` matches one of the last `duplicate_window` entries
    pub fn is_recent_duplicate(&self, history: &[Entry], text: &str) -> bool {
        history
            .iter()
            .rev()
            .take(self.duplicate_window)
            .any(|entry| entry.text == text)
    }

    /// Timestamp for the next insertion.
    ///
    /// Lands past both the stored entries and `last_issued`, the newest
    /// timestamp ever handed out, so an id freed by a delete or clear is never
    /// reused. `None` once no later millisecond is representable.
    pub fn next_timestamp(
        &self,
        history: &[Entry],
        last_issued: Option<i64>,
        now: i64,
    ) -> Option<i64> {
        let newest = history.iter().map(|e| e.timestamp).chain(last_issued).max();
        match newest {
            Some(newest) if newest >= now => newest.checked_add(1),
            _ => Some(now),
        }
    }

    /// Trim the history down to `max_entries`, keeping every pinned entry.
    ///
    /// Returns the number of evicted entries. When nothing is over the bound
    /// the history is left untouched.
    pub fn apply(&self, history: &mut Vec<Entry>) -> usize {
        if history.len() <= self.max_entries {
            return 0;
        }

        let (pinned, unpinned): (Vec<Entry>, Vec<Entry>) =
            history.drain(..).partition(|e| e.pinned);

        let keep_unpinned = self.max_entries.saturating_sub(pinned.len());
        let evicted = unpinned.len().saturating_sub(keep_unpinned);

        history.extend(pinned);
        history.extend(unpinned.into_iter().skip(evicted));
        history.sort_by_key(|e| e.timestamp);

        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(count: usize) -> Vec<Entry> {
        (0..count)
            .map(|i| Entry::new(format!("t{}", i + 1), 1_000 + i as i64))
            .collect()
    }

    #[test]
    fn test_under_bound_is_untouched() {
        let policy = RetentionPolicy::default();
        let mut history = entries(200);
        assert_eq!(policy.apply(&mut history), 0);
        assert_eq!(history.len(), 200);
    }

    #[test]
    fn test_oldest_unpinned_is_evicted() {
        let policy = RetentionPolicy::default();
        let mut history = entries(201);
        assert_eq!(policy.apply(&mut history), 1);
        assert_eq!(history.len(), 200);
        assert_eq!(history[0].text, "t2");
        assert_eq!(history[199].text, "t201");
    }

    #[test]
    fn test_pinned_entries_survive_and_order_is_restored() {
        let policy = RetentionPolicy::default();
        let mut history = entries(201);
        history[0].pinned = true;

        policy.apply(&mut history);

        assert_eq!(history.len(), 200);
        assert_eq!(history[0].text, "t1");
        assert_eq!(history[1].text, "t3");
        assert!(history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_pinned_over_bound_are_all_kept() {
        let policy = RetentionPolicy {
            max_entries: 3,
            duplicate_window: 5,
        };
        let mut history = entries(6);
        for entry in history.iter_mut().take(4) {
            entry.pinned = true;
        }

        assert_eq!(policy.apply(&mut history), 2);
        assert_eq!(history.len(), 4);
        assert!(history.iter().all(|e| e.pinned));
    }

    #[test]
    fn test_duplicate_window_is_insertion_based() {
        let policy = RetentionPolicy::default();
        let history = entries(6);
        // t1 is the 6th most recent insertion
        assert!(!policy.is_recent_duplicate(&history, "t1"));
        assert!(policy.is_recent_duplicate(&history, "t2"));
        assert!(policy.is_recent_duplicate(&history, "t6"));
    }

    #[test]
    fn test_next_timestamp_never_collides() {
        let policy = RetentionPolicy::default();
        assert_eq!(policy.next_timestamp(&[], None, 500), Some(500));

        let history = entries(3);
        assert_eq!(policy.next_timestamp(&history, None, 1_002), Some(1_003));
        assert_eq!(policy.next_timestamp(&history, None, 5_000), Some(5_000));
    }

    #[test]
    fn test_next_timestamp_moves_past_last_issued() {
        let policy = RetentionPolicy::default();
        // entries issued up to 2_000 were deleted since
        assert_eq!(policy.next_timestamp(&[], Some(2_000), 1_500), Some(2_001));
        assert_eq!(policy.next_timestamp(&entries(3), Some(900), 1_000), Some(1_003));
        assert_eq!(policy.next_timestamp(&[], Some(2_000), 3_000), Some(3_000));
    }

    #[test]
    fn test_next_timestamp_at_the_end_of_the_range() {
        let policy = RetentionPolicy::default();
        let history = vec![Entry::new("old".to_string(), i64::MAX)];
        assert_eq!(policy.next_timestamp(&history, None, 1_000), None);
        assert_eq!(policy.next_timestamp(&[], Some(i64::MAX), 1_000), None);
        assert_eq!(
            policy.next_timestamp(&[], Some(i64::MAX - 1), 1_000),
            Some(i64::MAX)
        );
    }
}
