//! `WebSocket` endpoint shared by the overlay and the admin page.
//!
//! Clients connect to `GET /ws`. On accept they receive the latest
//! snapshot, then every snapshot the engine publishes. Text frames from
//! the client are operator requests (`{"action": ..., "payload": ...}`)
//! and are forwarded to the engine.
//!
//! If a client falls behind, lagged snapshots are skipped and the client
//! resumes from the newest one. Malformed frames are logged and the
//! connection stays open.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use queuebot_core::control::ControlRequest;
use queuebot_core::engine::EngineEvent;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection.
///
/// # Route
///
/// `GET /ws`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Turn one inbound text frame into an engine event.
///
/// Recognised requests become [`EngineEvent::Control`]. Valid JSON with an
/// unknown action or unusable payload becomes [`EngineEvent::Refresh`] so
/// the client still gets a snapshot back. Text that is not JSON yields
/// `None`.
pub fn frame_event(text: &str) -> Option<EngineEvent> {
    match ControlRequest::parse(text) {
        Ok(Some(request)) => Some(EngineEvent::Control(request)),
        Ok(None) => Some(EngineEvent::Refresh),
        Err(e) => {
            warn!(error = %e, "Malformed control frame");
            None
        }
    }
}

async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    debug!("WebSocket client connected");

    // Subscribe before reading the latest snapshot so nothing published
    // in between is missed.
    let mut rx = state.subscribe();
    if let Some(json) = state.latest_json() {
        if socket.send(Message::Text(json.as_ref().into())).await.is_err() {
            debug!("WebSocket client disconnected (initial send failed)");
            return;
        }
    }

    loop {
        tokio::select! {
            result = rx.recv() => match result {
                Ok(json) => {
                    if socket.send(Message::Text(json.as_ref().into())).await.is_err() {
                        debug!("WebSocket client disconnected (send failed)");
                        return;
                    }
                }
                Err(RecvError::Lagged(n)) => {
                    debug!(skipped = n, "WebSocket client lagged, skipping ahead");
                }
                Err(RecvError::Closed) => {
                    debug!("Broadcast channel closed, shutting down WebSocket");
                    return;
                }
            },
            msg = socket.recv() => match msg {
                Some(Ok(Message::Text(text))) => {
                    if let Some(event) = frame_event(text.as_str()) {
                        if !state.send_to_engine(event).await {
                            debug!("Engine unavailable, control frame dropped");
                        }
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    if socket.send(Message::Pong(data)).await.is_err() {
                        debug!("WebSocket client disconnected (pong failed)");
                        return;
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    debug!("WebSocket client disconnected");
                    return;
                }
                Some(Err(e)) => {
                    debug!(error = %e, "WebSocket error");
                    return;
                }
                Some(Ok(_)) => {}
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_action_becomes_control() {
        assert_eq!(
            frame_event(r#"{"action":"next"}"#),
            Some(EngineEvent::Control(ControlRequest::Advance))
        );
    }

    #[test]
    fn unknown_action_still_refreshes() {
        assert_eq!(frame_event(r#"{"action":"dance"}"#), Some(EngineEvent::Refresh));
        assert_eq!(frame_event(r#"{"payload":{}}"#), Some(EngineEvent::Refresh));
    }

    #[test]
    fn non_json_is_dropped() {
        assert_eq!(frame_event("not json"), None);
    }
}
