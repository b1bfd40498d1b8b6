//! Enumeration types shared between the engine and display clients.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Lifecycle state of the chat session.
///
/// `Disconnected -> Connecting -> Connected -> Disconnected`. Only
/// `Connected` allows sending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum ChatStatus {
    /// No connection and none in progress.
    #[default]
    Disconnected,
    /// A connection was requested; waiting for the transport.
    Connecting,
    /// Logged in and joined to the configured channel.
    Connected,
}

impl ChatStatus {
    /// Whether messages can be sent right now.
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&ChatStatus::Connecting).ok();
        assert_eq!(json.as_deref(), Some("\"connecting\""));
    }

    #[test]
    fn only_connected_is_connected() {
        assert!(ChatStatus::Connected.is_connected());
        assert!(!ChatStatus::Connecting.is_connected());
        assert!(!ChatStatus::Disconnected.is_connected());
    }
}
