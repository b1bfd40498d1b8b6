//! Chat session lifecycle and the transport abstraction.
//!
//! The [`ChatSession`] is an explicit state machine owned by the engine:
//!
//! ```text
//! Disconnected --connect()--> Connecting --Connected event--> Connected
//!      ^                          |                               |
//!      +-------- Disconnected event / disconnect() ---------------+
//! ```
//!
//! Transports run their I/O on their own tasks and report back through a
//! [`ChatEventSender`] tagged with the session generation that opened
//! them. Each connect and disconnect bumps the generation, so events from
//! a torn-down connection are recognised as stale and dropped.

use queuebot_types::{ChannelSettings, ChatStatus};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::EngineEvent;

/// Errors reported by a [`ChatTransport`].
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// No connection is open.
    #[error("chat transport is not connected")]
    NotConnected,

    /// The connection task has gone away.
    #[error("chat connection closed")]
    Closed,

    /// The transport could not start a connection.
    #[error("chat connect failed: {0}")]
    Connect(String),
}

/// Login credentials for the chat service.
#[derive(Clone, PartialEq, Eq)]
pub struct ChatCredentials {
    /// Bot account login name.
    pub username: String,
    /// OAuth token, with or without the `oauth:` prefix.
    pub token: String,
}

impl core::fmt::Debug for ChatCredentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChatCredentials")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// A chat message as reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Sender display name.
    pub sender: String,
    /// Raw message text.
    pub text: String,
    /// Sender is a moderator or the broadcaster.
    pub elevated: bool,
    /// Sent by the bot account itself.
    pub self_message: bool,
}

/// Lifecycle and message events from a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// Logged in and joined.
    Connected {
        /// Session generation.
        session: u64,
    },
    /// Connection lost or closed.
    Disconnected {
        /// Session generation.
        session: u64,
    },
    /// A channel message.
    Message {
        /// Session generation.
        session: u64,
        /// The message.
        message: IncomingMessage,
    },
}

impl ChatEvent {
    /// Generation of the session that produced this event.
    pub const fn session(&self) -> u64 {
        match self {
            Self::Connected { session }
            | Self::Disconnected { session }
            | Self::Message { session, .. } => *session,
        }
    }
}

/// Handle a transport uses to report events for one session.
#[derive(Debug, Clone)]
pub struct ChatEventSender {
    tx: mpsc::Sender<EngineEvent>,
    session: u64,
}

impl ChatEventSender {
    /// Create a sender tagged with `session`.
    pub const fn new(tx: mpsc::Sender<EngineEvent>, session: u64) -> Self {
        Self { tx, session }
    }

    /// The session generation this sender reports for.
    pub const fn session(&self) -> u64 {
        self.session
    }

    /// Report a successful login. Returns `false` once the engine is gone.
    pub async fn connected(&self) -> bool {
        self.emit(ChatEvent::Connected {
            session: self.session,
        })
        .await
    }

    /// Report a lost connection. Returns `false` once the engine is gone.
    pub async fn disconnected(&self) -> bool {
        self.emit(ChatEvent::Disconnected {
            session: self.session,
        })
        .await
    }

    /// Report a channel message. Returns `false` once the engine is gone.
    pub async fn message(&self, message: IncomingMessage) -> bool {
        self.emit(ChatEvent::Message {
            session: self.session,
            message,
        })
        .await
    }

    async fn emit(&self, event: ChatEvent) -> bool {
        self.tx.send(EngineEvent::Chat(event)).await.is_ok()
    }
}

/// A connection to a chat service.
///
/// Implementations must not block: `connect` starts the connection in the
/// background and reports progress through `events`, `say` queues a line
/// and `disconnect` tears the connection down.
pub trait ChatTransport: Send {
    /// Start connecting to `channel` (lower-case, without `#`).
    fn connect(
        &mut self,
        credentials: &ChatCredentials,
        channel: &str,
        events: ChatEventSender,
    ) -> Result<(), ChatError>;

    /// Send `text` to `channel`.
    fn say(&mut self, channel: &str, text: &str) -> Result<(), ChatError>;

    /// Close the connection, if any.
    fn disconnect(&mut self);
}

/// Owns the chat connection and its lifecycle state.
pub struct ChatSession {
    transport: Box<dyn ChatTransport>,
    credentials: ChatCredentials,
    events: mpsc::Sender<EngineEvent>,
    status: ChatStatus,
    generation: u64,
    channel: Option<String>,
}

impl core::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChatSession")
            .field("status", &self.status)
            .field("generation", &self.generation)
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}

impl ChatSession {
    /// Create a disconnected session.
    pub fn new(
        transport: Box<dyn ChatTransport>,
        credentials: ChatCredentials,
        events: mpsc::Sender<EngineEvent>,
    ) -> Self {
        Self {
            transport,
            credentials,
            events,
            status: ChatStatus::Disconnected,
            generation: 0,
            channel: None,
        }
    }

    /// Current lifecycle state.
    pub const fn status(&self) -> ChatStatus {
        self.status
    }

    /// Generation of the live (or most recent) connection.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Start connecting to the configured channel.
    ///
    /// No-op unless disconnected and setup is complete. Returns whether the
    /// state changed.
    pub fn connect(&mut self, settings: &ChannelSettings) -> bool {
        if self.status != ChatStatus::Disconnected {
            debug!(status = ?self.status, "Chat connect ignored: already active");
            return false;
        }
        if !settings.is_ready() {
            info!("Chat connect skipped: setup not completed");
            return false;
        }

        self.generation = self.generation.wrapping_add(1);
        let events = ChatEventSender::new(self.events.clone(), self.generation);
        match self
            .transport
            .connect(&self.credentials, &settings.channel, events)
        {
            Ok(()) => {
                info!(
                    channel = %settings.channel,
                    session = self.generation,
                    "Chat connecting"
                );
                self.status = ChatStatus::Connecting;
                self.channel = Some(settings.channel.clone());
                true
            }
            Err(e) => {
                warn!(error = %e, channel = %settings.channel, "Chat connect failed");
                false
            }
        }
    }

    /// Tear down the connection. No-op when already disconnected. Returns
    /// whether the state changed.
    pub fn disconnect(&mut self) -> bool {
        if self.status == ChatStatus::Disconnected {
            return false;
        }
        self.transport.disconnect();
        self.generation = self.generation.wrapping_add(1);
        self.status = ChatStatus::Disconnected;
        self.channel = None;
        info!("Chat disconnected");
        true
    }

    /// Send `text` to the live channel. Dropped unless connected; transport
    /// failures are logged and not retried.
    pub fn send(&mut self, text: &str) {
        if !self.status.is_connected() {
            debug!("Chat send dropped: not connected");
            return;
        }
        let Some(channel) = self.channel.as_deref() else {
            return;
        };
        if let Err(e) = self.transport.say(channel, text) {
            warn!(error = %e, "Chat send failed");
        }
    }

    /// Whether `event` belongs to the live connection.
    pub const fn is_current(&self, event: &ChatEvent) -> bool {
        event.session() == self.generation && !matches!(self.status, ChatStatus::Disconnected)
    }

    /// Apply a lifecycle event. Returns whether the state changed.
    pub fn on_event(&mut self, event: &ChatEvent) -> bool {
        if !self.is_current(event) {
            debug!(
                event_session = event.session(),
                session = self.generation,
                "Stale chat event dropped"
            );
            return false;
        }
        match event {
            ChatEvent::Connected { .. } => {
                if self.status == ChatStatus::Connected {
                    return false;
                }
                info!(channel = ?self.channel, "Chat connected");
                self.status = ChatStatus::Connected;
                true
            }
            ChatEvent::Disconnected { .. } => {
                warn!(channel = ?self.channel, "Chat connection lost");
                self.status = ChatStatus::Disconnected;
                self.channel = None;
                true
            }
            ChatEvent::Message { .. } => false,
        }
    }
}
