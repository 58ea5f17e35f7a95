// src/view/mod.rs
//! View controller for browsing and managing the history
//!
//! The controller keeps a local snapshot of the history, filters and sorts
//! it for display, and turns user actions into store requests. It never
//! edits the snapshot itself: a successful action is followed by a full
//! re-fetch, a failed one only raises a notification.

pub mod format;

use std::cmp::Reverse;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::capture::ClipboardError;
use crate::core::{Clock, Entry, HistoryError, Request, SystemClock};
use crate::service::StoreClient;

pub use format::{entry_count_label, format_relative_time, format_timestamp, truncate_text};

/// Asks the user to confirm a destructive action
pub trait Confirmer: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Answers every confirmation the same way
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl Confirmer for AutoConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Transient user feedback
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, level: NoticeLevel);
}

/// Notifier that writes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, level: NoticeLevel) {
        match level {
            NoticeLevel::Success => info!("✅ {}", message),
            NoticeLevel::Error => error!("❌ {}", message),
        }
    }
}

/// Writes text to the system clipboard
#[async_trait]
pub trait ClipboardWriter: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

pub const DELETE_PROMPT: &str = "Are you sure you want to delete this entry?";
pub const CLEAR_PROMPT: &str =
    "Are you sure you want to clear all clipboard history? This cannot be undone.";

#[derive(Debug, Clone)]
pub struct ViewConfig {
    /// Characters of entry text shown before truncation
    pub preview_chars: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            preview_chars: format::DEFAULT_PREVIEW_CHARS,
        }
    }
}

/// What happened to a user action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Applied,
    Cancelled,
    Failed,
}

/// One displayable history row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryRow {
    pub id: String,
    pub preview: String,
    pub relative_time: String,
    pub full_time: String,
    pub pinned: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedView {
    /// Nothing has been captured yet
    Empty,
    /// There is history, but the search matches none of it
    NoMatches,
    Entries(Vec<EntryRow>),
}

pub struct ViewController {
    client: StoreClient,
    confirmer: Box<dyn Confirmer>,
    notifier: Box<dyn Notifier>,
    clipboard: Box<dyn ClipboardWriter>,
    clock: Arc<dyn Clock>,
    config: ViewConfig,
    entries: Vec<Entry>,
    query: String,
}

impl ViewController {
    pub fn new(
        client: StoreClient,
        confirmer: Box<dyn Confirmer>,
        notifier: Box<dyn Notifier>,
        clipboard: Box<dyn ClipboardWriter>,
    ) -> Self {
        Self {
            client,
            confirmer,
            notifier,
            clipboard,
            clock: Arc::new(SystemClock),
            config: ViewConfig::default(),
            entries: Vec::new(),
            query: String::new(),
        }
    }

    pub fn with_config(mut self, config: ViewConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The cached snapshot, in stored order
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Re-fetch the snapshot from the store.
    ///
    /// An unreachable store leaves the snapshot as it was; a store that
    /// answers with a failure yields an empty snapshot.
    pub async fn refresh(&mut self) -> Result<(), HistoryError> {
        match self.client.send(Request::GetHistory).await {
            Ok(response) if response.success => {
                self.entries = response.history.unwrap_or_default();
                debug!("🔃 Loaded {} entries", self.entries.len());
                Ok(())
            }
            Ok(response) => {
                warn!("⚠️  Invalid or failed history response: {:?}", response.error);
                self.entries = Vec::new();
                Ok(())
            }
            Err(e) => {
                error!("❌ Runtime error: {}", e);
                self.notifier
                    .notify("Failed to load clipboard history", NoticeLevel::Error);
                Err(e)
            }
        }
    }

    /// Filtered and sorted view of the snapshot: pinned first, newest first
    pub fn visible_entries(&self) -> Vec<&Entry> {
        let needle = self.query.trim().to_lowercase();
        let mut visible: Vec<&Entry> = self
            .entries
            .iter()
            .filter(|e| e.text.to_lowercase().contains(&needle))
            .collect();
        visible.sort_by_key(|e| (Reverse(e.pinned), Reverse(e.timestamp)));
        visible
    }

    pub fn render(&self) -> RenderedView {
        let visible = self.visible_entries();
        if visible.is_empty() {
            return if self.entries.is_empty() {
                RenderedView::Empty
            } else {
                RenderedView::NoMatches
            };
        }

        let now = self.clock.now_millis();
        RenderedView::Entries(
            visible
                .into_iter()
                .map(|e| EntryRow {
                    id: e.id.clone(),
                    preview: truncate_text(&e.text, self.config.preview_chars),
                    relative_time: format_relative_time(e.timestamp, now),
                    full_time: format_timestamp(e.timestamp),
                    pinned: e.pinned,
                })
                .collect(),
        )
    }

    pub fn entry_count_label(&self) -> String {
        entry_count_label(&self.entries)
    }

    /// Put an entry's full text back on the clipboard
    pub async fn copy_entry(&self, id: &str) -> ActionOutcome {
        let Some(entry) = self.entries.iter().find(|e| e.id == id) else {
            self.notifier.notify("Failed to copy text", NoticeLevel::Error);
            return ActionOutcome::Failed;
        };

        match self.clipboard.write_text(&entry.text).await {
            Ok(()) => {
                self.notifier
                    .notify("Copied to clipboard!", NoticeLevel::Success);
                ActionOutcome::Applied
            }
            Err(e) => {
                error!("❌ Failed to copy text: {}", e);
                self.notifier.notify("Failed to copy text", NoticeLevel::Error);
                ActionOutcome::Failed
            }
        }
    }

    pub async fn toggle_pin(&mut self, id: &str) -> ActionOutcome {
        self.dispatch(
            Request::TogglePin { id: id.to_string() },
            None,
            "Failed to toggle pin status",
        )
        .await
    }

    pub async fn delete_entry(&mut self, id: &str) -> ActionOutcome {
        if !self.confirmer.confirm(DELETE_PROMPT) {
            return ActionOutcome::Cancelled;
        }
        self.dispatch(
            Request::DeleteEntry { id: id.to_string() },
            Some("Entry deleted"),
            "Failed to delete entry",
        )
        .await
    }

    pub async fn clear_all(&mut self) -> ActionOutcome {
        if !self.confirmer.confirm(CLEAR_PROMPT) {
            return ActionOutcome::Cancelled;
        }
        self.dispatch(
            Request::ClearHistory,
            Some("History cleared"),
            "Failed to clear history",
        )
        .await
    }

    async fn dispatch(
        &mut self,
        request: Request,
        success_notice: Option<&str>,
        failure_notice: &str,
    ) -> ActionOutcome {
        let kind = request.kind();
        match self.client.send(request).await {
            Ok(response) if response.success => {
                if let Err(e) = self.refresh().await {
                    debug!("🔃 Re-fetch after {} failed: {}", kind, e);
                }
                if let Some(message) = success_notice {
                    self.notifier.notify(message, NoticeLevel::Success);
                }
                ActionOutcome::Applied
            }
            Ok(response) => {
                error!("❌ {} failed: {:?}", kind, response.error);
                self.notifier.notify(failure_notice, NoticeLevel::Error);
                ActionOutcome::Failed
            }
            Err(e) => {
                error!("❌ Runtime error during {}: {}", kind, e);
                self.notifier.notify(failure_notice, NoticeLevel::Error);
                ActionOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ManualClock, RetentionPolicy};
    use crate::service::StoreService;
    use crate::storage::{HistoryRepository, MemoryStore};
    use crate::store::StoreManager;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    const NOW: i64 = 1_700_000_000_000;

    #[derive(Clone, Default)]
    struct Notices(Arc<Mutex<Vec<(String, NoticeLevel)>>>);

    impl Notifier for Notices {
        fn notify(&self, message: &str, level: NoticeLevel) {
            self.0.lock().unwrap().push((message.to_string(), level));
        }
    }

    impl Notices {
        fn last(&self) -> Option<(String, NoticeLevel)> {
            self.0.lock().unwrap().last().cloned()
        }
    }

    #[derive(Clone, Default)]
    struct Clipboard(Arc<Mutex<Option<String>>>);

    #[async_trait]
    impl ClipboardWriter for Clipboard {
        async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
            *self.0.lock().unwrap() = Some(text.to_string());
            Ok(())
        }
    }

    struct Fixture {
        service: StoreService,
        clock: Arc<ManualClock>,
        notices: Notices,
        clipboard: Clipboard,
    }

    impl Fixture {
        fn new() -> Self {
            let clock = Arc::new(ManualClock::new(NOW));
            let manager = StoreManager::with_policy(
                HistoryRepository::new(Arc::new(MemoryStore::new())),
                RetentionPolicy::default(),
                clock.clone(),
            );
            Self {
                service: StoreService::spawn(manager),
                clock,
                notices: Notices::default(),
                clipboard: Clipboard::default(),
            }
        }

        fn view(&self, confirm: bool) -> ViewController {
            ViewController::new(
                self.service.client(),
                Box::new(AutoConfirm(confirm)),
                Box::new(self.notices.clone()),
                Box::new(self.clipboard.clone()),
            )
            .with_clock(self.clock.clone())
        }

        async fn seed(&self, texts: &[&str]) -> Vec<String> {
            let client = self.service.client();
            for text in texts {
                client.add_entry(*text).await.unwrap();
            }
            client
                .get_history()
                .await
                .unwrap()
                .into_iter()
                .map(|e| e.id)
                .collect()
        }
    }

    fn visible_texts(view: &ViewController) -> Vec<String> {
        view.visible_entries()
            .into_iter()
            .map(|e| e.text.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_sort_pinned_first_then_newest() {
        let fx = Fixture::new();
        let ids = fx.seed(&["one", "two", "three", "four"]).await;
        fx.service.client().toggle_pin(ids[1].clone()).await.unwrap();

        let mut view = fx.view(true);
        view.refresh().await.unwrap();
        assert_eq!(visible_texts(&view), vec!["two", "four", "three", "one"]);
        assert_eq!(view.entry_count_label(), "4 entries (1 pinned)");
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let fx = Fixture::new();
        fx.seed(&["Hello World", "goodbye", "WORLDWIDE"]).await;

        let mut view = fx.view(true);
        view.refresh().await.unwrap();
        view.set_query("  world ");
        assert_eq!(visible_texts(&view), vec!["WORLDWIDE", "Hello World"]);

        view.set_query("absent");
        assert_eq!(view.render(), RenderedView::NoMatches);
    }

    #[tokio::test]
    async fn test_render_rows() {
        let fx = Fixture::new();
        let mut view = fx.view(true);
        view.refresh().await.unwrap();
        assert_eq!(view.render(), RenderedView::Empty);

        let long = "x".repeat(150);
        fx.seed(&[long.as_str()]).await;
        fx.clock.advance(5 * 60_000);
        view.refresh().await.unwrap();

        let RenderedView::Entries(rows) = view.render() else {
            panic!("expected rows");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].preview.chars().count(), 103);
        assert!(rows[0].preview.ends_with("..."));
        assert_eq!(rows[0].relative_time, "5m ago");
        assert!(!rows[0].pinned);
    }

    #[tokio::test]
    async fn test_pin_round_trips_and_refetches() {
        let fx = Fixture::new();
        let ids = fx.seed(&["a", "b"]).await;
        let mut view = fx.view(true);
        view.refresh().await.unwrap();

        assert_eq!(view.toggle_pin(&ids[0]).await, ActionOutcome::Applied);
        assert!(view.entries()[0].pinned);
        assert_eq!(view.toggle_pin(&ids[0]).await, ActionOutcome::Applied);
        assert!(!view.entries()[0].pinned);
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let fx = Fixture::new();
        let ids = fx.seed(&["keep me"]).await;

        let mut declined = fx.view(false);
        declined.refresh().await.unwrap();
        assert_eq!(declined.delete_entry(&ids[0]).await, ActionOutcome::Cancelled);
        assert_eq!(declined.clear_all().await, ActionOutcome::Cancelled);
        assert_eq!(fx.service.client().get_history().await.unwrap().len(), 1);

        let mut view = fx.view(true);
        view.refresh().await.unwrap();
        assert_eq!(view.delete_entry(&ids[0]).await, ActionOutcome::Applied);
        assert!(view.entries().is_empty());
        assert_eq!(
            fx.notices.last(),
            Some(("Entry deleted".to_string(), NoticeLevel::Success))
        );
    }

    #[tokio::test]
    async fn test_failed_action_leaves_state_unchanged() {
        let fx = Fixture::new();
        fx.seed(&["only"]).await;
        let mut view = fx.view(true);
        view.refresh().await.unwrap();
        let before = view.entries().to_vec();

        assert_eq!(view.delete_entry("missing").await, ActionOutcome::Failed);
        assert_eq!(view.entries(), &before[..]);
        assert_eq!(
            fx.notices.last(),
            Some(("Failed to delete entry".to_string(), NoticeLevel::Error))
        );
    }

    #[tokio::test]
    async fn test_unreachable_store_keeps_snapshot() {
        let fx = Fixture::new();
        fx.seed(&["cached"]).await;
        let mut view = fx.view(true);
        view.refresh().await.unwrap();

        fx.service.abort();
        tokio::task::yield_now().await;

        assert!(view.refresh().await.is_err());
        assert_eq!(view.entries().len(), 1);
        assert_eq!(view.clear_all().await, ActionOutcome::Failed);
        assert_eq!(view.entries().len(), 1);
    }

    #[tokio::test]
    async fn test_clear_all_and_copy() {
        let fx = Fixture::new();
        let ids = fx.seed(&["copy me", "other"]).await;
        let mut view = fx.view(true);
        view.refresh().await.unwrap();

        assert_eq!(view.copy_entry(&ids[0]).await, ActionOutcome::Applied);
        assert_eq!(fx.clipboard.0.lock().unwrap().as_deref(), Some("copy me"));
        assert_eq!(view.copy_entry("nope").await, ActionOutcome::Failed);

        assert_eq!(view.clear_all().await, ActionOutcome::Applied);
        assert!(view.entries().is_empty());
        assert_eq!(view.render(), RenderedView::Empty);
    }
}
