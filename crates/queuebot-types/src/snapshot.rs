//! Full state snapshot pushed to every display client.
//!
//! There is no diffing: each change produces a complete [`Snapshot`].
//! Wire names match the overlay and admin pages (`loopMessages`,
//! `nextSendInSeconds`, `botConnected`).

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::ChatStatus;
use crate::ids::{AnnouncementId, CommandId};

/// Everything a display or admin client renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Snapshot {
    /// Player on turn.
    pub current: Option<String>,
    /// Head of the queue.
    pub next: Option<String>,
    /// Full queue in order.
    pub queue: Vec<String>,
    /// Scheduled announcements with time remaining.
    pub loop_messages: Vec<AnnouncementView>,
    /// Custom chat commands.
    pub custom_commands: Vec<CommandView>,
    /// Channel settings and chat connection state.
    pub settings: SettingsView,
}

/// Announcement as shown to clients: raw timestamps are replaced by a
/// countdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct AnnouncementView {
    /// Announcement id.
    pub id: AnnouncementId,
    /// Text sent to chat.
    pub message: String,
    /// Minutes between sends.
    pub interval_minutes: f64,
    /// Whether the announcement is active.
    pub enabled: bool,
    /// Whole seconds until the next send, rounded up, never negative.
    #[ts(type = "number")]
    pub next_send_in_seconds: u64,
}

/// Custom command as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CommandView {
    /// Command id.
    pub id: CommandId,
    /// Trigger, including the leading `!`.
    pub name: String,
    /// Canned response.
    pub response: String,
}

/// Settings and bot connection state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct SettingsView {
    /// Configured channel.
    pub channel: String,
    /// Whether an operator has completed setup.
    pub setup_completed: bool,
    /// `true` only while the chat session is connected.
    pub bot_connected: bool,
    /// Detailed chat session state.
    pub bot_status: ChatStatus,
}
