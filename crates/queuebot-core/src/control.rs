//! Operator control frames.
//!
//! Display/admin clients send `{"action": ..., "payload": ...}` text frames
//! over the WebSocket. [`ControlRequest::parse`] resolves the action tag
//! (including the legacy aliases) and validates the payload shape into one
//! enum; [`apply`] performs the mutation against the state model.
//!
//! Payload coercion is lenient: interval minutes may arrive as numeric
//! strings, ids as numbers and `enabled` as any truthy value. Game results
//! are the exception and must be JSON numbers.

use queuebot_types::ChannelSettings;
use serde_json::Value;
use tracing::debug;

use crate::state::{Changes, QueueState, Rejected};

/// A validated operator request.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlRequest {
    /// Move the queue head onto the current turn.
    Advance,
    /// Empty the queue and clear the current player.
    Clear,
    /// Remove the first queue entry equal to `name`.
    Remove {
        /// Exact display name.
        name: String,
    },
    /// Record a game result for the current player.
    RecordResult {
        /// Legs won.
        legs_for: f64,
        /// Legs lost.
        legs_against: f64,
        /// Three-dart average for the game.
        average: f64,
    },
    /// Create a scheduled announcement.
    AnnouncementAdd {
        /// Text to send.
        message: String,
        /// Minutes between sends.
        interval_minutes: f64,
    },
    /// Edit a scheduled announcement.
    AnnouncementUpdate {
        /// Announcement id.
        id: String,
        /// Text to send.
        message: String,
        /// Minutes between sends.
        interval_minutes: f64,
    },
    /// Enable or disable a scheduled announcement.
    AnnouncementToggle {
        /// Announcement id.
        id: String,
        /// New enabled flag.
        enabled: bool,
    },
    /// Delete a scheduled announcement.
    AnnouncementDelete {
        /// Announcement id.
        id: String,
    },
    /// Create a custom command.
    CommandAdd {
        /// Trigger including `!`.
        name: String,
        /// Canned response.
        response: String,
    },
    /// Edit a custom command.
    CommandUpdate {
        /// Command id.
        id: String,
        /// Trigger including `!`.
        name: String,
        /// Canned response.
        response: String,
    },
    /// Delete a custom command.
    CommandDelete {
        /// Command id.
        id: String,
    },
    /// Save the target channel and complete setup.
    SettingsSave {
        /// Channel name.
        channel: String,
    },
}

impl ControlRequest {
    /// Parse one inbound text frame.
    ///
    /// Returns `Ok(None)` for frames that are valid JSON but carry an
    /// unknown action or an unusable payload; those are ignored.
    ///
    /// # Errors
    ///
    /// Returns the JSON error for text that does not parse at all.
    pub fn parse(text: &str) -> Result<Option<Self>, serde_json::Error> {
        let frame: Value = serde_json::from_str(text)?;
        let Some(action) = frame.get("action").and_then(Value::as_str) else {
            debug!("Control frame without action");
            return Ok(None);
        };
        let payload = frame.get("payload").unwrap_or(&Value::Null);
        let request = Self::from_parts(action, payload);
        if request.is_none() {
            debug!(action, "Ignoring control frame");
        }
        Ok(request)
    }

    /// Build a request from an action tag and its payload.
    pub fn from_parts(action: &str, payload: &Value) -> Option<Self> {
        match action {
            "advance" | "next" => Some(Self::Advance),
            "clear" => Some(Self::Clear),
            "remove" => {
                let name = text_or_field(payload, "name")?;
                (!name.is_empty()).then_some(Self::Remove { name })
            }
            "record_result" | "result" | "record-result" => {
                let legs_for = payload.get("legsFor")?.as_f64()?;
                let legs_against = payload.get("legsAgainst")?.as_f64()?;
                let average = payload
                    .get("avg")
                    .or_else(|| payload.get("average"))?
                    .as_f64()?;
                Some(Self::RecordResult {
                    legs_for,
                    legs_against,
                    average,
                })
            }
            "announcement_add" | "loop_add" | "announcement-add" => Some(Self::AnnouncementAdd {
                message: field_string(payload, "message"),
                interval_minutes: field_number(payload, "intervalMinutes"),
            }),
            "announcement_update" | "loop_update" | "announcement-update" => {
                let id = non_empty(field_string(payload, "id"))?;
                Some(Self::AnnouncementUpdate {
                    id,
                    message: field_string(payload, "message"),
                    interval_minutes: field_number(payload, "intervalMinutes"),
                })
            }
            "announcement_toggle" | "loop_toggle" | "announcement-toggle" => {
                let id = non_empty(field_string(payload, "id"))?;
                Some(Self::AnnouncementToggle {
                    id,
                    enabled: payload.get("enabled").is_some_and(truthy),
                })
            }
            "announcement_delete" | "loop_delete" | "announcement-delete" => {
                let id = non_empty(text_or_field(payload, "id")?)?;
                Some(Self::AnnouncementDelete { id })
            }
            "command_add" | "command-add" => Some(Self::CommandAdd {
                name: field_string(payload, "name"),
                response: field_string(payload, "response"),
            }),
            "command_update" | "command-update" => {
                let id = non_empty(field_string(payload, "id"))?;
                Some(Self::CommandUpdate {
                    id,
                    name: field_string(payload, "name"),
                    response: field_string(payload, "response"),
                })
            }
            "command_delete" | "command-delete" => {
                let id = non_empty(text_or_field(payload, "id")?)?;
                Some(Self::CommandDelete { id })
            }
            "settings_save" | "settings-save" => Some(Self::SettingsSave {
                channel: field_string(payload, "channel"),
            }),
            _ => None,
        }
    }

    /// Canonical action tag, for logging.
    pub const fn action(&self) -> &'static str {
        match self {
            Self::Advance => "advance",
            Self::Clear => "clear",
            Self::Remove { .. } => "remove",
            Self::RecordResult { .. } => "record_result",
            Self::AnnouncementAdd { .. } => "announcement_add",
            Self::AnnouncementUpdate { .. } => "announcement_update",
            Self::AnnouncementToggle { .. } => "announcement_toggle",
            Self::AnnouncementDelete { .. } => "announcement_delete",
            Self::CommandAdd { .. } => "command_add",
            Self::CommandUpdate { .. } => "command_update",
            Self::CommandDelete { .. } => "command_delete",
            Self::SettingsSave { .. } => "settings_save",
        }
    }
}

/// What the engine should do after applying a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlOutcome {
    /// Documents to persist.
    pub changes: Changes,
    /// Tear down and re-establish the chat session.
    pub restart_chat: bool,
}

impl From<Changes> for ControlOutcome {
    fn from(changes: Changes) -> Self {
        Self {
            changes,
            restart_chat: false,
        }
    }
}

/// Apply `request` to the state model and channel settings.
///
/// Rejected requests leave everything unchanged and are logged at debug.
pub fn apply(
    state: &mut QueueState,
    settings: &mut ChannelSettings,
    request: &ControlRequest,
    now_ms: i64,
) -> ControlOutcome {
    let result: Result<ControlOutcome, Rejected> = match request {
        ControlRequest::Advance => {
            state.advance();
            Ok(Changes::QUEUE.into())
        }
        ControlRequest::Clear => {
            state.clear();
            Ok(Changes::QUEUE.into())
        }
        ControlRequest::Remove { name } => state.remove_exact(name).map(Into::into),
        ControlRequest::RecordResult {
            legs_for,
            legs_against,
            average,
        } => state
            .record_result(*legs_for, *legs_against, *average)
            .map(|player| {
                debug!(player = %player, "Result recorded");
                Changes {
                    queue: true,
                    stats: true,
                    ..Changes::NONE
                }
                .into()
            }),
        ControlRequest::AnnouncementAdd {
            message,
            interval_minutes,
        } => state
            .add_announcement(message, *interval_minutes, now_ms)
            .map(|_| Changes::ANNOUNCEMENTS.into()),
        ControlRequest::AnnouncementUpdate {
            id,
            message,
            interval_minutes,
        } => state
            .update_announcement(id, message, *interval_minutes)
            .map(|()| Changes::ANNOUNCEMENTS.into()),
        ControlRequest::AnnouncementToggle { id, enabled } => state
            .toggle_announcement(id, *enabled, now_ms)
            .map(|()| Changes::ANNOUNCEMENTS.into()),
        ControlRequest::AnnouncementDelete { id } => state
            .delete_announcement(id)
            .map(|()| Changes::ANNOUNCEMENTS.into()),
        ControlRequest::CommandAdd { name, response } => state
            .add_command(name, response)
            .map(|_| Changes::COMMANDS.into()),
        ControlRequest::CommandUpdate { id, name, response } => state
            .update_command(id, name, response)
            .map(|()| Changes::COMMANDS.into()),
        ControlRequest::CommandDelete { id } => {
            state.delete_command(id).map(|()| Changes::COMMANDS.into())
        }
        ControlRequest::SettingsSave { channel } => save_settings(settings, channel),
    };

    result.unwrap_or_else(|reason| {
        debug!(action = request.action(), %reason, "Control request rejected");
        ControlOutcome::default()
    })
}

fn save_settings(settings: &mut ChannelSettings, channel: &str) -> Result<ControlOutcome, Rejected> {
    let channel = channel.trim().to_lowercase();
    if channel.is_empty() {
        return Err(Rejected::EmptyChannel);
    }
    let restart_chat = settings.channel != channel || !settings.setup_completed;
    settings.channel = channel;
    settings.setup_completed = true;
    Ok(ControlOutcome {
        changes: Changes::SETTINGS,
        restart_chat,
    })
}

// ---------------------------------------------------------------------------
// Payload coercion
// ---------------------------------------------------------------------------

/// String form of a scalar; empty for null, false, objects and arrays.
fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => String::from("true"),
        _ => String::new(),
    }
}

fn field_string(payload: &Value, key: &str) -> String {
    payload.get(key).map(coerce_string).unwrap_or_default()
}

/// Numeric form of a field. Missing or unparseable values become NaN,
/// which every consumer rejects.
fn field_number(payload: &Value, key: &str) -> f64 {
    match payload.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse().unwrap_or(f64::NAN)
            }
        }
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        Some(Value::Null) => 0.0,
        _ => f64::NAN,
    }
}

/// A bare string payload, or `payload[key]`.
fn text_or_field(payload: &Value, key: &str) -> Option<String> {
    match payload {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get(key).map(coerce_string),
        _ => None,
    }
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
