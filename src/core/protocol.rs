// src/core/protocol.rs
//! Request/response messages exchanged with the store
//!
//! The shapes mirror the JSON messages passed between the page agents, the
//! UI and the background store: every request carries a `type` tag and gets
//! exactly one [`Response`].

use serde::{Deserialize, Serialize};

use super::entry::Entry;
use super::errors::HistoryError;

/// A request addressed to the store manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    NewClipboardEntry {
        #[serde(default)]
        text: String,
    },
    GetHistory,
    TogglePin {
        id: String,
    },
    DeleteEntry {
        id: String,
    },
    ClearHistory,
}

impl Request {
    /// Wire name of the request, used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            Request::NewClipboardEntry { .. } => "NEW_CLIPBOARD_ENTRY",
            Request::GetHistory => "GET_HISTORY",
            Request::TogglePin { .. } => "TOGGLE_PIN",
            Request::DeleteEntry { .. } => "DELETE_ENTRY",
            Request::ClearHistory => "CLEAR_HISTORY",
        }
    }
}

/// Fire-and-forget notifications broadcast by the store side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Broadcast {
    ExtensionReloaded,
}

/// The single reply to a [`Request`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<Entry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            success: true,
            history: None,
            error: None,
        }
    }

    pub fn with_history(history: Vec<Entry>) -> Self {
        Self {
            success: true,
            history: Some(history),
            error: None,
        }
    }

    pub fn failure(error: &HistoryError) -> Self {
        Self {
            success: false,
            history: None,
            error: Some(error.to_string()),
        }
    }

    /// Failed history read: still carries an (empty) list
    pub fn history_failure(error: &HistoryError) -> Self {
        Self {
            success: false,
            history: Some(Vec::new()),
            error: Some(error.to_string()),
        }
    }

    /// Convert a failed response into [`HistoryError::Rejected`]
    pub fn into_result(self) -> Result<Option<Vec<Entry>>, HistoryError> {
        if self.success {
            Ok(self.history)
        } else {
            Err(HistoryError::Rejected(
                self.error.unwrap_or_else(|| "Unknown error".to_string()),
            ))
        }
    }
}

impl From<Result<(), HistoryError>> for Response {
    fn from(result: Result<(), HistoryError>) -> Self {
        match result {
            Ok(()) => Response::ok(),
            Err(e) => Response::failure(&e),
        }
    }
}
