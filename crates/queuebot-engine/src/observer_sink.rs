//! Snapshot sink that feeds the hub.
//!
//! Every snapshot the engine publishes is handed to [`AppState`], which
//! serializes it once and broadcasts it to all connected `WebSocket`
//! clients.

use std::sync::Arc;

use queuebot_core::engine::SnapshotSink;
use queuebot_observer::state::AppState;
use queuebot_types::Snapshot;
use tracing::debug;

/// Bridges the engine's commit step to the hub.
pub struct ObserverSink {
    state: Arc<AppState>,
}

impl ObserverSink {
    /// Create a sink backed by the given hub state.
    pub const fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

impl SnapshotSink for ObserverSink {
    fn publish(&mut self, snapshot: Snapshot) {
        let queued = snapshot.queue.len();
        let receivers = self.state.publish(snapshot);
        debug!(queued, receivers, "Snapshot broadcast");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_reaches_subscribers_and_latest() {
        let state = Arc::new(AppState::new());
        let mut rx = state.subscribe();
        let mut sink = ObserverSink::new(Arc::clone(&state));

        sink.publish(Snapshot {
            queue: vec![String::from("Alice")],
            ..Snapshot::default()
        });

        let json = rx.recv().await.unwrap();
        assert!(json.contains("\"queue\":[\"Alice\"]"));
        assert_eq!(state.latest_json(), Some(json));
    }
}
