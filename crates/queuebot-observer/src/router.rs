//! Axum router construction for the hub.
//!
//! Assembles the status page, REST routes and the `WebSocket` endpoint
//! into a single [`Router`] with CORS enabled so overlay pages served
//! from elsewhere can connect.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete router.
///
/// - `GET /` -- minimal HTML status page
/// - `GET /ws` -- snapshot stream and operator requests
/// - `GET /api/state` -- latest snapshot
/// - `POST /setup/save` -- save the channel and complete setup
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/ws", get(ws::ws_handler))
        .route("/api/state", get(handlers::get_state))
        .route("/setup/save", post(handlers::save_setup))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
