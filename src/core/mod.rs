// src/core/mod.rs
//! Core types: entries, retention, protocol messages and errors

pub mod clock;
pub mod entry;
pub mod errors;
pub mod protocol;
pub mod retention;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{normalize_text, Entry};
pub use errors::{HistoryError, StorageError};
pub use protocol::{Broadcast, Request, Response};
pub use retention::RetentionPolicy;
