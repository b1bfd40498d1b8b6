//! Persisted documents for queuebot.
//!
//! Each concern is stored as one JSON document: the queue with the current
//! player, the stats table, the announcement list, the custom-command list
//! and the channel settings. Field names are camelCase on the wire so that
//! documents written by earlier installs load unchanged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{AnnouncementId, CommandId};

/// Default HTTP/WebSocket listen port.
pub const DEFAULT_PORT: u16 = 3000;

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

/// The waiting list together with the player currently on turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct QueueDocument {
    /// Display names in join order.
    #[serde(default)]
    pub queue: Vec<String>,
    /// The player on turn, removed from `queue` while active.
    #[serde(default)]
    pub current: Option<String>,
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Accumulated results for one player.
///
/// Created lazily on the first recorded result and only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct StatsRecord {
    /// Number of recorded games.
    #[serde(default)]
    #[ts(type = "number")]
    pub games: u64,
    /// Games where legs for exceeded legs against.
    #[serde(default)]
    #[ts(type = "number")]
    pub wins: u64,
    /// All other games, draws included.
    #[serde(default)]
    #[ts(type = "number")]
    pub losses: u64,
    /// Cumulative legs won.
    #[serde(default)]
    pub legs_for: f64,
    /// Cumulative legs lost.
    #[serde(default)]
    pub legs_against: f64,
    /// Sum of the per-game averages.
    #[serde(default)]
    pub avg_sum: f64,
}

impl StatsRecord {
    /// Fold one game result into the record.
    pub fn record(&mut self, legs_for: f64, legs_against: f64, average: f64) {
        self.games = self.games.saturating_add(1);
        if legs_for > legs_against {
            self.wins = self.wins.saturating_add(1);
        } else {
            self.losses = self.losses.saturating_add(1);
        }
        self.legs_for += legs_for;
        self.legs_against += legs_against;
        self.avg_sum += average;
    }

    /// Mean of the per-game averages, or `None` before the first game.
    #[allow(clippy::cast_precision_loss)]
    pub fn average(&self) -> Option<f64> {
        (self.games > 0).then(|| self.avg_sum / self.games as f64)
    }
}

/// Stats table keyed by the player name exactly as it was recorded.
pub type StatsDocument = BTreeMap<String, StatsRecord>;

// ---------------------------------------------------------------------------
// Scheduled announcements
// ---------------------------------------------------------------------------

/// A chat message re-sent every `interval_minutes` while enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ScheduledAnnouncement {
    /// Unique identifier.
    pub id: AnnouncementId,
    /// Text sent to chat.
    pub message: String,
    /// Minutes between sends. Always positive; may be fractional.
    pub interval_minutes: f64,
    /// Disabled announcements are never sent.
    pub enabled: bool,
    /// Epoch milliseconds of the last send (or of creation / last toggle).
    ///
    /// Absent only in documents written before the field existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub last_sent_at: Option<i64>,
}

impl ScheduledAnnouncement {
    /// Interval length in milliseconds.
    pub fn interval_ms(&self) -> f64 {
        self.interval_minutes * 60_000.0
    }
}

// ---------------------------------------------------------------------------
// Custom commands
// ---------------------------------------------------------------------------

/// An operator-defined chat trigger and its canned response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CustomCommand {
    /// Unique identifier.
    pub id: CommandId,
    /// Lower-cased trigger, including the leading `!`.
    pub name: String,
    /// Text sent to chat when the trigger matches.
    pub response: String,
}

// ---------------------------------------------------------------------------
// Channel settings
// ---------------------------------------------------------------------------

/// Runtime-editable settings persisted in `config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ChannelSettings {
    /// Lower-cased chat channel name without the leading `#`.
    #[serde(default)]
    pub channel: String,
    /// HTTP/WebSocket listen port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Set once an operator has saved a channel.
    #[serde(default)]
    pub setup_completed: bool,
}

impl ChannelSettings {
    /// Whether the chat session has everything it needs to connect.
    pub fn is_ready(&self) -> bool {
        self.setup_completed && !self.channel.is_empty()
    }
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            channel: String::new(),
            port: DEFAULT_PORT,
            setup_completed: false,
        }
    }
}

const fn default_port() -> u16 {
    DEFAULT_PORT
}
