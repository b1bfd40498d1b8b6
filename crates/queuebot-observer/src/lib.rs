//! Display and operator hub for the queue bot.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws`) that pushes a full snapshot after
//!   every state change and accepts operator requests
//! - **REST endpoints** for the latest snapshot and first-run setup
//! - **Minimal HTML status page** (`GET /`)
//!
//! # Architecture
//!
//! The engine publishes snapshots into [`AppState`], which serializes each
//! one once and fans the text out over a [`tokio::sync::broadcast`]
//! channel. Operator requests travel the other way over the engine's
//! `mpsc` channel, so the engine remains the only writer.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

pub use router::build_router;
pub use server::{ServerConfig, ServerError};
pub use state::AppState;
