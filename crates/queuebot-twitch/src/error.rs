//! Error types for the Twitch transport.

/// Errors that end a chat connection.
#[derive(Debug, thiserror::Error)]
pub enum TwitchError {
    /// Socket connect, read or write failed.
    #[error("chat connection I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The server rejected the login.
    #[error("chat login rejected: {0}")]
    Auth(String),

    /// The server asked the client to reconnect.
    #[error("server requested reconnect")]
    ReconnectRequested,
}
