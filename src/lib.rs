//! Clipboard History Library
//!
//! Captures copied text, keeps it as a bounded, de-duplicated history, and
//! lets a user browse, search, pin and delete entries.
//!
//! The pieces talk only through messages:
//! - [`capture::CaptureAgent`] (one per page) forwards new text,
//! - [`service::StoreService`] runs the [`store::StoreManager`], the only
//!   owner of the history,
//! - [`view::ViewController`] fetches snapshots and issues pin, delete and
//!   clear requests.

pub mod capture;
pub mod core;
pub mod service;
pub mod storage;
pub mod store;
pub mod view;

pub use crate::core::{Entry, HistoryError, Request, Response, RetentionPolicy};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::capture::{
        CaptureAgent, CaptureConfig, CaptureOutcome, CaptureTrigger, PageContext, PageEvent,
        PageSnapshot,
    };
    pub use crate::core::{
        Broadcast, Clock, Entry, HistoryError, Request, Response, RetentionPolicy, StorageError,
        SystemClock,
    };
    pub use crate::service::{StoreClient, StoreService};
    pub use crate::storage::{HistoryRepository, JsonFileStore, KeyValueStore, MemoryStore};
    pub use crate::store::StoreManager;
    pub use crate::view::{ActionOutcome, RenderedView, ViewConfig, ViewController};
}
