//! Document keys and the key-value store abstraction.
//!
//! # Documents
//!
//! | Key | File | Shape |
//! |-----|------|-------|
//! | [`DocumentKey::Queue`] | `queue-data.json` | `{queue, current}` |
//! | [`DocumentKey::Stats`] | `stats-data.json` | `{[name]: StatsRecord}` |
//! | [`DocumentKey::Announcements`] | `loop-messages.json` | `[ScheduledAnnouncement]` |
//! | [`DocumentKey::Commands`] | `custom-commands.json` | `[CustomCommand]` |
//! | [`DocumentKey::Settings`] | `config.json` | `{channel, port, setupCompleted}` |

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StoreError;

/// Identifies one persisted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DocumentKey {
    /// Queue and current player.
    Queue,
    /// Per-player stats table.
    Stats,
    /// Scheduled announcement list.
    Announcements,
    /// Custom command list.
    Commands,
    /// Channel settings.
    Settings,
}

impl DocumentKey {
    /// Every document, in load order.
    pub const ALL: [Self; 5] = [
        Self::Settings,
        Self::Queue,
        Self::Stats,
        Self::Announcements,
        Self::Commands,
    ];

    /// File name used by [`JsonFileStore`](crate::JsonFileStore).
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Queue => "queue-data.json",
            Self::Stats => "stats-data.json",
            Self::Announcements => "loop-messages.json",
            Self::Commands => "custom-commands.json",
            Self::Settings => "config.json",
        }
    }
}

impl core::fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Durable key -> JSON document storage.
///
/// Writes are full-document overwrites and complete before returning.
pub trait DocumentStore: Send {
    /// Read the raw JSON text stored under `key`, or `None` if absent.
    fn get_raw(&self, key: DocumentKey) -> Result<Option<String>, StoreError>;

    /// Replace the document stored under `key`.
    fn put_raw(&mut self, key: DocumentKey, json: &str) -> Result<(), StoreError>;
}

/// Typed JSON helpers for any [`DocumentStore`].
pub trait DocumentStoreExt: DocumentStore {
    /// Read and deserialize the document under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if the stored JSON does not
    /// match `T`, or the store's own error if the read fails.
    fn get_json<T: DeserializeOwned>(&self, key: DocumentKey) -> Result<Option<T>, StoreError> {
        self.get_raw(key)?
            .map(|raw| serde_json::from_str(&raw).map_err(StoreError::from))
            .transpose()
    }

    /// Serialize `value` (pretty-printed) and store it under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if serialization fails, or the
    /// store's own error if the write fails.
    fn set_json<T: Serialize + ?Sized>(
        &mut self,
        key: DocumentKey,
        value: &T,
    ) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(value)?;
        self.put_raw(key, &json)
    }
}

impl<S: DocumentStore + ?Sized> DocumentStoreExt for S {}
