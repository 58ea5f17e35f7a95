// src/storage/mod.rs
//! Key-value storage collaborator and the history record kept in it
//!
//! The store manager persists the whole history as one record on every
//! mutation. Anything that can get and set JSON values by key can back it.

pub mod json_file;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::core::{Entry, StorageError};

pub use json_file::JsonFileStore;

/// Name of the record holding the history list
pub const HISTORY_KEY: &str = "history";

/// Name of the record holding the newest timestamp ever issued
pub const LAST_ISSUED_KEY: &str = "last_issued";

/// Minimal async key-value storage
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` when the key was never written
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;

    /// Replace the value stored under `key`
    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;
}

/// Volatile in-memory storage
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.records.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.records.lock().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// Typed access to the history record and its id high-water mark
#[derive(Clone)]
pub struct HistoryRepository {
    backend: Arc<dyn KeyValueStore>,
}

impl HistoryRepository {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Load the stored history. A missing record, or one that is not a list,
    /// reads as an empty history.
    pub async fn load(&self) -> Result<Vec<Entry>, StorageError> {
        match self.backend.get(HISTORY_KEY).await? {
            Some(value @ Value::Array(_)) => Ok(serde_json::from_value(value)?),
            Some(other) => {
                warn!(
                    "⚠️  Record '{}' is not a list ({}), treating as empty",
                    HISTORY_KEY,
                    json_kind(&other)
                );
                Ok(Vec::new())
            }
            None => Ok(Vec::new()),
        }
    }

    /// Persist the full history list
    pub async fn save(&self, history: &[Entry]) -> Result<(), StorageError> {
        let value = serde_json::to_value(history)?;
        self.backend.set(HISTORY_KEY, value).await?;
        debug!("💾 Saved {} entries under '{}'", history.len(), HISTORY_KEY);
        Ok(())
    }

    /// Newest timestamp ever issued, `None` when no usable mark is stored
    pub async fn last_issued(&self) -> Result<Option<i64>, StorageError> {
        match self.backend.get(LAST_ISSUED_KEY).await? {
            Some(Value::Number(n)) if n.is_i64() => Ok(n.as_i64()),
            Some(other) => {
                warn!(
                    "⚠️  Record '{}' is not an integer ({}), ignoring it",
                    LAST_ISSUED_KEY,
                    json_kind(&other)
                );
                Ok(None)
            }
            None => Ok(None),
        }
    }

    pub async fn set_last_issued(&self, timestamp: i64) -> Result<(), StorageError> {
        self.backend
            .set(LAST_ISSUED_KEY, Value::from(timestamp))
            .await
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
