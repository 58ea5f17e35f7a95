// src/capture/mod.rs
//! Capture agent: turns copy-like page actions into new history entries
//!
//! One agent runs per page. It reacts to copy events, right-clicks and the
//! copy shortcut, pulls text out of the page with [`extract_text`], and
//! forwards anything new to the store. When nothing on the page yields text
//! it schedules a one-shot direct clipboard read a little later.
//!
//! Capture is best effort. Clipboard access is frequently refused, so a copy
//! can go unrecorded.

pub mod extraction;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::core::{Broadcast, Request};
use crate::service::StoreClient;

pub use extraction::{
    extract_text, from_clipboard_read, ExtractionSource, Extracted, FocusedElement, PageSnapshot,
};

/// Source of the current page state
pub trait PageContext: Send + Sync {
    fn snapshot(&self) -> PageSnapshot;
}

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("Clipboard access blocked: {0}")]
    Blocked(String),
}

/// Direct clipboard access, used as the deferred last resort
#[async_trait]
pub trait ClipboardReader: Send + Sync {
    async fn read_text(&self) -> Result<String, ClipboardError>;
}

/// Timing configuration for the agent
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Delay between a copy event and the capture
    pub copy_delay: Duration,

    /// Delay after a secondary-button press, giving a context-menu copy time to land
    pub context_menu_delay: Duration,

    /// Delay after the copy keyboard shortcut
    pub shortcut_delay: Duration,

    /// Delay before the direct clipboard read fallback
    pub fallback_delay: Duration,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            copy_delay: Duration::from_millis(50),
            context_menu_delay: Duration::from_millis(300),
            shortcut_delay: Duration::from_millis(50),
            fallback_delay: Duration::from_millis(300),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Primary,
    Middle,
    Secondary,
}

/// Raw page input the agent listens to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    Copy { payload: Option<String> },
    MouseDown { button: MouseButton },
    KeyDown { key: String, ctrl: bool, meta: bool },
}

/// A page event that warrants a capture attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureTrigger {
    Copy { payload: Option<String> },
    ContextMenu,
    Shortcut,
}

impl CaptureTrigger {
    pub fn from_event(event: PageEvent) -> Option<Self> {
        match event {
            PageEvent::Copy { payload } => Some(CaptureTrigger::Copy { payload }),
            PageEvent::MouseDown {
                button: MouseButton::Secondary,
            } => Some(CaptureTrigger::ContextMenu),
            PageEvent::KeyDown { key, ctrl, meta } if (ctrl || meta) && key == "c" => {
                Some(CaptureTrigger::Shortcut)
            }
            _ => None,
        }
    }

    fn delay(&self, config: &CaptureConfig) -> Duration {
        match self {
            CaptureTrigger::Copy { .. } => config.copy_delay,
            CaptureTrigger::ContextMenu => config.context_menu_delay,
            CaptureTrigger::Shortcut => config.shortcut_delay,
        }
    }

    fn payload(&self) -> Option<&str> {
        match self {
            CaptureTrigger::Copy { payload } => payload.as_deref(),
            _ => None,
        }
    }
}

/// Whether the agent still believes the store is reachable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Active,
    Inactive,
}

/// Result of one capture attempt
#[derive(Debug)]
pub enum CaptureOutcome {
    /// The store accepted the text
    Forwarded(String),
    /// The store answered, but refused (duplicate, empty, storage failure)
    Rejected(String),
    /// Same text as the previous capture, not sent
    SkippedRepeat,
    /// The agent is inactive
    SkippedInactive,
    /// Nothing to capture
    NothingFound,
    /// The store could not be reached; the agent is now inactive
    ChannelLost,
    /// Nothing on the page; a clipboard read is scheduled
    Deferred(JoinHandle<CaptureOutcome>),
}

#[derive(Debug)]
struct AgentStatus {
    state: AgentState,
    last_text: String,
}

struct AgentInner {
    client: StoreClient,
    page: Arc<dyn PageContext>,
    clipboard: Option<Arc<dyn ClipboardReader>>,
    config: CaptureConfig,
    status: Mutex<AgentStatus>,
}

/// Per-page capture agent. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct CaptureAgent {
    inner: Arc<AgentInner>,
}

impl CaptureAgent {
    pub fn new(
        client: StoreClient,
        page: Arc<dyn PageContext>,
        clipboard: Option<Arc<dyn ClipboardReader>>,
        config: CaptureConfig,
    ) -> Self {
        Self {
            inner: Arc::new(AgentInner {
                client,
                page,
                clipboard,
                config,
                status: Mutex::new(AgentStatus {
                    state: AgentState::Active,
                    last_text: String::new(),
                }),
            }),
        }
    }

    pub async fn state(&self) -> AgentState {
        self.inner.status.lock().await.state
    }

    /// React to a page event. Returns the scheduled capture, if the event
    /// is one the agent cares about.
    pub fn on_event(&self, event: PageEvent) -> Option<JoinHandle<CaptureOutcome>> {
        let trigger = CaptureTrigger::from_event(event)?;
        let delay = trigger.delay(&self.inner.config);
        let agent = self.clone();

        Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            agent.capture(trigger).await
        }))
    }

    /// Run the extraction chain now
    pub async fn capture(&self, trigger: CaptureTrigger) -> CaptureOutcome {
        if self.state().await == AgentState::Inactive {
            return CaptureOutcome::SkippedInactive;
        }

        let snapshot = self.inner.page.snapshot();
        if let Some(Extracted { source, text }) = extract_text(trigger.payload(), &snapshot) {
            debug!("✂️  Extracted {} chars via {:?}", text.len(), source);
            return self.save(text).await;
        }

        match &self.inner.clipboard {
            Some(_) => CaptureOutcome::Deferred(self.schedule_clipboard_read()),
            None => CaptureOutcome::NothingFound,
        }
    }

    /// Spawn the one-shot delayed clipboard read
    fn schedule_clipboard_read(&self) -> JoinHandle<CaptureOutcome> {
        let agent = self.clone();
        let delay = self.inner.config.fallback_delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(reader) = agent.inner.clipboard.clone() else {
                return CaptureOutcome::NothingFound;
            };

            match reader.read_text().await {
                Ok(raw) => match from_clipboard_read(&raw) {
                    Some(Extracted { source, text }) => {
                        debug!("✂️  Extracted {} chars via {:?}", text.len(), source);
                        agent.save(text).await
                    }
                    None => CaptureOutcome::NothingFound,
                },
                Err(e) => {
                    debug!("Final clipboard fallback failed: {}", e);
                    CaptureOutcome::NothingFound
                }
            }
        })
    }

    /// Forward trimmed text to the store unless it repeats the last capture
    pub async fn save(&self, text: String) -> CaptureOutcome {
        {
            let mut status = self.inner.status.lock().await;
            if status.state == AgentState::Inactive {
                return CaptureOutcome::SkippedInactive;
            }
            if text.is_empty() {
                return CaptureOutcome::NothingFound;
            }
            if text == status.last_text {
                return CaptureOutcome::SkippedRepeat;
            }
            status.last_text = text.clone();
        }

        match self
            .inner
            .client
            .send(Request::NewClipboardEntry { text: text.clone() })
            .await
        {
            Ok(response) if response.success => CaptureOutcome::Forwarded(text),
            Ok(response) => {
                let reason = response.error.unwrap_or_default();
                debug!("Store declined capture: {}", reason);
                CaptureOutcome::Rejected(reason)
            }
            Err(e) => {
                warn!("⚠️  Message failed, deactivating agent: {}", e);
                self.inner.status.lock().await.state = AgentState::Inactive;
                CaptureOutcome::ChannelLost
            }
        }
    }

    /// Apply a store-side broadcast
    pub async fn handle_broadcast(&self, message: Broadcast) {
        match message {
            Broadcast::ExtensionReloaded => {
                let mut status = self.inner.status.lock().await;
                status.state = AgentState::Active;
                status.last_text.clear();
                info!("🔄 Extension reload detected, resetting context");
            }
        }
    }

    /// Follow broadcasts until the sending side goes away
    pub fn listen(&self, mut broadcasts: broadcast::Receiver<Broadcast>) -> JoinHandle<()> {
        let agent = self.clone();
        tokio::spawn(async move {
            loop {
                match broadcasts.recv().await {
                    Ok(message) => agent.handle_broadcast(message).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!("Skipped {} broadcasts", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}
