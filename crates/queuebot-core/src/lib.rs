//! Queue, stats and announcement engine for queuebot.
//!
//! This crate owns the state model and every rule that mutates it. Inputs
//! arrive as [`EngineEvent`]s on one channel and are handled sequentially
//! by a single task:
//!
//! ```text
//! chat line ------> interpreter --+
//! operator frame -> control ------+--> QueueState --> DocumentStore
//! timer tick -----> scheduler ----+         |
//!                                           +------> SnapshotSink
//! ```
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `queuebot-config.yaml` into
//!   strongly-typed structs.
//! - [`state`] -- The in-memory state model and its mutations.
//! - [`interpreter`] -- Chat command interpretation.
//! - [`control`] -- Operator control frames and their application.
//! - [`scheduler`] -- Announcement due-time arithmetic.
//! - [`snapshot`] -- Client snapshot assembly.
//! - [`chat`] -- [`ChatTransport`] trait and [`ChatSession`] state machine.
//! - [`engine`] -- The single-writer [`Engine`].
//! - [`runner`] -- The async loop driving the engine.
//!
//! [`EngineEvent`]: engine::EngineEvent
//! [`ChatTransport`]: chat::ChatTransport
//! [`ChatSession`]: chat::ChatSession
//! [`Engine`]: engine::Engine

pub mod chat;
pub mod config;
pub mod control;
pub mod engine;
pub mod interpreter;
#[cfg(any(test, feature = "test-util"))]
pub mod recording;
pub mod runner;
pub mod scheduler;
pub mod snapshot;
pub mod state;
