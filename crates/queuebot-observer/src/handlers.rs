//! HTTP endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/state` | Latest snapshot as JSON |
//! | `POST` | `/setup/save` | Save the channel and complete setup |

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{Html, IntoResponse, Response};
use queuebot_core::control::ControlRequest;
use queuebot_core::engine::EngineEvent;
use queuebot_types::ChatStatus;
use serde_json::Value;
use tracing::info;

use crate::error::ObserverError;
use crate::state::AppState;

/// Serve a minimal HTML page with the queue and bot status.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.latest().map(|latest| latest.snapshot).unwrap_or_default();
    let channel = escape_html(&snapshot.settings.channel);
    let current = snapshot.current.as_deref().map_or_else(|| String::from("-"), escape_html);
    let queued = snapshot.queue.len();
    let entries: String = snapshot
        .queue
        .iter()
        .map(|name| format!("<li>{}</li>", escape_html(name)))
        .collect();
    let status = match snapshot.settings.bot_status {
        ChatStatus::Connected => "CONNECTED",
        ChatStatus::Connecting => "CONNECTING",
        ChatStatus::Disconnected => "DISCONNECTED",
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Queuebot</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        .status {{ color: #3fb950; font-weight: bold; }}
    </style>
</head>
<body>
    <h1>Queuebot</h1>
    <p class="subtitle">Channel: {channel}</p>

    <p>Bot: <span class="status">{status}</span></p>

    <div>
        <div class="metric">
            <div class="label">Playing</div>
            <div class="value">{current}</div>
        </div>
        <div class="metric">
            <div class="label">Queued</div>
            <div class="value">{queued}</div>
        </div>
    </div>

    <ol>{entries}</ol>

    <p><a href="/api/state">/api/state</a> &middot; WebSocket at <code>/ws</code></p>
</body>
</html>"#
    ))
}

/// Return the latest snapshot as JSON.
///
/// # Errors
///
/// [`ObserverError::NotReady`] until the engine has published once.
pub async fn get_state(State(state): State<Arc<AppState>>) -> Result<Response, ObserverError> {
    let json = state.latest_json().ok_or(ObserverError::NotReady)?;
    Ok(([(CONTENT_TYPE, "application/json")], json.to_string()).into_response())
}

/// Save the channel and complete setup.
///
/// The body is JSON `{"channel": ...}`. The request is routed to the
/// engine as a settings save, which persists `config.json` and restarts
/// the chat session.
///
/// # Errors
///
/// [`ObserverError::ChannelMissing`] when the body has no usable channel
/// and [`ObserverError::EngineUnavailable`] when the engine has stopped.
pub async fn save_setup(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<StatusCode, ObserverError> {
    let channel = setup_channel(&body).ok_or(ObserverError::ChannelMissing)?;

    info!(%channel, "Setup saved");
    let event = EngineEvent::Control(ControlRequest::SettingsSave { channel });
    if !state.send_to_engine(event).await {
        return Err(ObserverError::EngineUnavailable);
    }
    Ok(StatusCode::OK)
}

/// Trimmed, lower-cased channel from a setup body.
fn setup_channel(body: &[u8]) -> Option<String> {
    let body: Value = serde_json::from_slice(body).ok()?;
    let channel = match body.get("channel")? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let channel = channel.trim().to_lowercase();
    (!channel.is_empty()).then_some(channel)
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html("<b>\"A&B\"</b>"), "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn setup_channel_is_normalized() {
        assert_eq!(setup_channel(br#"{"channel":"  DartsTV "}"#).as_deref(), Some("dartstv"));
        assert_eq!(setup_channel(br#"{"channel":"   "}"#), None);
        assert_eq!(setup_channel(br#"{"channel":null}"#), None);
        assert_eq!(setup_channel(b"{}"), None);
        assert_eq!(setup_channel(b"garbage"), None);
    }
}
