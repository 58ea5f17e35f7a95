// src/service.rs
//! Message-passing front of the store manager
//!
//! The store manager runs in its own tokio task and drains a queue of
//! request envelopes one at a time. Each handler, storage write included,
//! finishes before the next request is looked at, so callers always observe
//! whole read-modify-write cycles. Callers talk to it through a cloneable
//! [`StoreClient`]; page agents additionally subscribe to reload broadcasts.

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::core::{Broadcast, Entry, HistoryError, Request, Response};
use crate::store::StoreManager;

/// Depth of the request queue
const REQUEST_QUEUE_DEPTH: usize = 64;
/// Reload notifications kept for slow subscribers
const BROADCAST_DEPTH: usize = 16;

/// A request paired with the channel its single response goes back on
struct Envelope {
    request: Request,
    reply: oneshot::Sender<Response>,
}

/// Owns the running store task
pub struct StoreService {
    client: StoreClient,
    broadcasts: broadcast::Sender<Broadcast>,
    task: JoinHandle<()>,
}

impl StoreService {
    /// Move the store manager into its own task and start serving requests
    pub fn spawn(manager: StoreManager) -> Self {
        let (request_tx, mut request_rx) = mpsc::channel::<Envelope>(REQUEST_QUEUE_DEPTH);
        let (broadcasts, _) = broadcast::channel(BROADCAST_DEPTH);

        let task = tokio::spawn(async move {
            info!("🚀 Store service started");
            while let Some(Envelope { request, reply }) = request_rx.recv().await {
                let kind = request.kind();
                let response = manager.handle(request).await;
                if reply.send(response).is_err() {
                    debug!("📭 Caller went away before the {} response", kind);
                }
            }
            info!("🛑 Store service stopped");
        });

        Self {
            client: StoreClient { tx: request_tx },
            broadcasts,
            task,
        }
    }

    /// A new handle for sending requests
    pub fn client(&self) -> StoreClient {
        self.client.clone()
    }

    /// Listen for store-side broadcasts
    pub fn subscribe(&self) -> broadcast::Receiver<Broadcast> {
        self.broadcasts.subscribe()
    }

    /// Tell every subscribed agent that the store side was reloaded.
    ///
    /// Fire and forget: a missing audience is logged, not reported.
    pub fn announce_reload(&self) {
        match self.broadcasts.send(Broadcast::ExtensionReloaded) {
            Ok(receivers) => info!("🔄 Reload announced to {} agents", receivers),
            Err(_) => debug!("🔄 Reload announced with no agents listening"),
        }
    }

    /// Stop accepting requests and wait for the in-flight ones to finish.
    ///
    /// Clients handed out earlier keep the queue open until they are dropped
    /// too; their later sends fail with a channel error once it closes.
    pub async fn shutdown(self) {
        let Self {
            client,
            broadcasts,
            task,
        } = self;
        // listeners see the broadcast channel close and release their clients
        drop(broadcasts);
        drop(client);
        if let Err(e) = task.await {
            warn!("⚠️  Store task ended abnormally: {}", e);
        }
    }

    /// Abort the store task immediately, simulating a torn-down context
    pub fn abort(&self) {
        self.task.abort();
    }
}

/// Caller side of the store protocol
#[derive(Debug, Clone)]
pub struct StoreClient {
    tx: mpsc::Sender<Envelope>,
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Envelope")
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

impl StoreClient {
    /// Send one request and wait for its response.
    ///
    /// A closed queue or a dropped reply both surface as
    /// [`HistoryError::Channel`]; a missing response counts as a failure.
    pub async fn send(&self, request: Request) -> Result<Response, HistoryError> {
        let kind = request.kind();
        let (reply, response) = oneshot::channel();

        self.tx
            .send(Envelope { request, reply })
            .await
            .map_err(|_| HistoryError::Channel(format!("store unreachable for {}", kind)))?;

        response
            .await
            .map_err(|_| HistoryError::Channel(format!("no response to {}", kind)))
    }

    pub async fn add_entry(&self, text: impl Into<String>) -> Result<(), HistoryError> {
        self.send(Request::NewClipboardEntry { text: text.into() })
            .await?
            .into_result()
            .map(|_| ())
    }

    pub async fn get_history(&self) -> Result<Vec<Entry>, HistoryError> {
        Ok(self
            .send(Request::GetHistory)
            .await?
            .into_result()?
            .unwrap_or_default())
    }

    pub async fn toggle_pin(&self, id: impl Into<String>) -> Result<(), HistoryError> {
        self.send(Request::TogglePin { id: id.into() })
            .await?
            .into_result()
            .map(|_| ())
    }

    pub async fn delete_entry(&self, id: impl Into<String>) -> Result<(), HistoryError> {
        self.send(Request::DeleteEntry { id: id.into() })
            .await?
            .into_result()
            .map(|_| ())
    }

    pub async fn clear_history(&self) -> Result<(), HistoryError> {
        self.send(Request::ClearHistory).await?.into_result().map(|_| ())
    }
}
