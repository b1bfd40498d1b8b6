//! Shared application state for the hub.
//!
//! [`AppState`] holds the broadcast channel that fans snapshots out to
//! every `WebSocket` client, the latest snapshot (served to new clients
//! and to the REST endpoints) and the sender half of the engine's event
//! channel for operator requests.

use std::sync::{Arc, PoisonError, RwLock};

use queuebot_core::engine::EngineEvent;
use queuebot_types::Snapshot;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

/// Capacity of the broadcast channel for snapshots.
///
/// A client that falls further behind than this receives
/// [`broadcast::error::RecvError::Lagged`] and skips to the newest
/// snapshot.
const BROADCAST_CAPACITY: usize = 64;

/// The most recent snapshot, kept both typed and serialized.
#[derive(Debug, Clone)]
pub struct LatestSnapshot {
    /// Typed snapshot for the status page.
    pub snapshot: Snapshot,
    /// The exact JSON text that was broadcast.
    pub json: Arc<str>,
}

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug)]
pub struct AppState {
    /// Broadcast sender for serialized snapshots.
    pub tx: broadcast::Sender<Arc<str>>,
    latest: RwLock<Option<LatestSnapshot>>,
    /// Engine event sender (absent when no engine is attached).
    pub control: Option<mpsc::Sender<EngineEvent>>,
}

impl AppState {
    /// Create a hub with no engine attached.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            tx,
            latest: RwLock::new(None),
            control: None,
        }
    }

    /// Create a hub that forwards operator requests to `control`.
    pub fn with_control(control: mpsc::Sender<EngineEvent>) -> Self {
        Self {
            control: Some(control),
            ..Self::new()
        }
    }

    /// Subscribe to the snapshot broadcast.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<str>> {
        self.tx.subscribe()
    }

    /// Serialize `snapshot` once, remember it and send it to every client.
    ///
    /// Returns the number of clients that received it.
    pub fn publish(&self, snapshot: Snapshot) -> usize {
        let json: Arc<str> = match serde_json::to_string(&snapshot) {
            Ok(json) => json.into(),
            Err(e) => {
                warn!(error = %e, "Failed to serialize snapshot");
                return 0;
            }
        };
        *self.latest.write().unwrap_or_else(PoisonError::into_inner) = Some(LatestSnapshot {
            snapshot,
            json: Arc::clone(&json),
        });
        // send fails only when there are no receivers, which is normal.
        self.tx.send(json).unwrap_or(0)
    }

    /// The last published snapshot, if any.
    pub fn latest(&self) -> Option<LatestSnapshot> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// JSON of the last published snapshot, if any.
    pub fn latest_json(&self) -> Option<Arc<str>> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|latest| Arc::clone(&latest.json))
    }

    /// Hand an event to the engine.
    ///
    /// Returns `false` if no engine is attached or it has stopped.
    pub async fn send_to_engine(&self, event: EngineEvent) -> bool {
        let Some(control) = &self.control else {
            debug!("No engine attached, dropping event");
            return false;
        };
        control.send(event).await.is_ok()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
