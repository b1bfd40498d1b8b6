//! Data layer for queuebot.
//!
//! State is persisted as one JSON document per concern. The engine loads
//! every document once at startup and overwrites the affected document
//! synchronously after each mutation. There are no partial writes.
//!
//! ```text
//! Engine mutation
//!     |
//!     +-- DocumentStore::put_raw(key, json) --> JsonFileStore (data dir)
//!                                          \--> MemoryStore   (tests)
//! ```
//!
//! # Modules
//!
//! - [`document`] -- Document keys and the [`DocumentStore`] trait
//! - [`file_store`] -- One pretty-printed JSON file per document
//! - [`memory_store`] -- Shared in-memory store for tests and dry runs
//! - [`error`] -- Shared error types

pub mod document;
pub mod error;
pub mod file_store;
pub mod memory_store;

// Re-export primary types for convenience.
pub use document::{DocumentKey, DocumentStore, DocumentStoreExt};
pub use error::StoreError;
pub use file_store::JsonFileStore;
pub use memory_store::MemoryStore;
