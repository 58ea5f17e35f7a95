// src/store.rs
//! Store manager: the single owner of the clipboard history
//!
//! Every operation reads the persisted list, transforms it, and writes the
//! whole list back. Callers never touch the list directly; they go through
//! [`StoreManager::handle`] (usually via the service queue, which runs one
//! request at a time).

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::core::{
    normalize_text, Clock, Entry, HistoryError, Request, Response, RetentionPolicy, SystemClock,
};
use crate::storage::HistoryRepository;

pub struct StoreManager {
    repository: HistoryRepository,
    policy: RetentionPolicy,
    clock: Arc<dyn Clock>,
}

impl StoreManager {
    /// Create a store manager with the default retention policy and wall clock
    pub fn new(repository: HistoryRepository) -> Self {
        Self::with_policy(repository, RetentionPolicy::default(), Arc::new(SystemClock))
    }

    pub fn with_policy(
        repository: HistoryRepository,
        policy: RetentionPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            policy,
            clock,
        }
    }

    /// Dispatch one protocol request and build its response
    pub async fn handle(&self, request: Request) -> Response {
        debug!("📨 Handling {}", request.kind());

        match request {
            Request::NewClipboardEntry { text } => self.add_entry(&text).await.map(|_| ()).into(),
            Request::GetHistory => match self.get_history().await {
                Ok(history) => Response::with_history(history),
                Err(e) => {
                    error!("❌ Error getting history: {}", e);
                    Response::history_failure(&e)
                }
            },
            Request::TogglePin { id } => self.toggle_pin(&id).await.map(|_| ()).into(),
            Request::DeleteEntry { id } => self.delete_entry(&id).await.into(),
            Request::ClearHistory => self.clear_history().await.into(),
        }
    }

    /// Validate, de-duplicate and append new clipboard text
    pub async fn add_entry(&self, raw: &str) -> Result<Entry, HistoryError> {
        let text = normalize_text(raw).ok_or(HistoryError::Validation)?;
        let mut history = self.repository.load().await?;

        if self.policy.is_recent_duplicate(&history, &text) {
            debug!("🔁 Skipping recent duplicate ({} chars)", text.len());
            return Err(HistoryError::Duplicate);
        }

        let last_issued = self.repository.last_issued().await?;
        let timestamp = self
            .policy
            .next_timestamp(&history, last_issued, self.clock.now_millis())
            .ok_or_else(|| {
                error!("❌ No timestamp left past {:?}", last_issued);
                HistoryError::TimestampExhausted
            })?;
        // the mark goes first so a failed history write never frees the id
        self.repository.set_last_issued(timestamp).await.map_err(|e| {
            error!("❌ Error saving id mark: {}", e);
            HistoryError::from(e)
        })?;
        let entry = Entry::new(text, timestamp);
        history.push(entry.clone());

        let evicted = self.policy.apply(&mut history);
        if evicted > 0 {
            info!(
                "🧹 Evicted {} unpinned entries (limit {})",
                evicted, self.policy.max_entries
            );
        }

        self.persist(&history).await?;
        info!("📋 Stored entry {} ({} total)", entry.id, history.len());
        Ok(entry)
    }

    /// The full history in stored order
    pub async fn get_history(&self) -> Result<Vec<Entry>, HistoryError> {
        Ok(self.repository.load().await?)
    }

    /// Flip the pin flag of an entry, returning the new value
    pub async fn toggle_pin(&self, id: &str) -> Result<bool, HistoryError> {
        let mut history = self.repository.load().await?;
        let entry = history
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| HistoryError::NotFound(id.to_string()))?;

        entry.pinned = !entry.pinned;
        let pinned = entry.pinned;

        self.persist(&history).await?;
        info!("📌 Entry {} pinned={}", id, pinned);
        Ok(pinned)
    }

    pub async fn delete_entry(&self, id: &str) -> Result<(), HistoryError> {
        let mut history = self.repository.load().await?;
        let before = history.len();
        history.retain(|e| e.id != id);

        if history.len() == before {
            warn!("⚠️  Delete requested for unknown entry {}", id);
            return Err(HistoryError::NotFound(id.to_string()));
        }

        self.persist(&history).await?;
        info!("🗑️  Deleted entry {}", id);
        Ok(())
    }

    /// Drop everything, pinned entries included
    pub async fn clear_history(&self) -> Result<(), HistoryError> {
        self.persist(&[]).await?;
        info!("🧽 History cleared");
        Ok(())
    }

    async fn persist(&self, history: &[Entry]) -> Result<(), HistoryError> {
        self.repository.save(history).await.map_err(|e| {
            error!("❌ Error saving history: {}", e);
            HistoryError::from(e)
        })
    }
}
