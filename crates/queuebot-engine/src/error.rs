//! Error types for the bot binary.
//!
//! [`EngineError`] wraps every startup failure so `main` can propagate
//! with `?`.

/// Top-level error for the bot binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration or credential loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: queuebot_core::config::ConfigError,
    },

    /// The data directory or a document could not be loaded.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: queuebot_store::StoreError,
    },

    /// The hub server failed to start.
    #[error("hub error: {source}")]
    Observer {
        /// The underlying startup error.
        #[from]
        source: queuebot_observer::startup::StartupError,
    },
}
