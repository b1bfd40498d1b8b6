//! Error types for the hub's HTTP endpoints.
//!
//! [`ObserverError`] converts into an Axum response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors returned by the HTTP endpoints.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// `POST /setup/save` without a usable channel.
    #[error("Channel missing")]
    ChannelMissing,

    /// No snapshot has been published yet.
    #[error("no snapshot published yet")]
    NotReady,

    /// The engine task has stopped accepting events.
    #[error("engine unavailable")]
    EngineUnavailable,
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::ChannelMissing => {
                // The setup page shows this body verbatim.
                return (StatusCode::BAD_REQUEST, self.to_string()).into_response();
            }
            Self::NotReady | Self::EngineUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
