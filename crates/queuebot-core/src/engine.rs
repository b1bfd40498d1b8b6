//! The single-writer engine.
//!
//! [`Engine`] owns the state model, the channel settings, the document
//! store, the chat session and the snapshot sink. Every input (chat event,
//! operator request, timer tick) is handled here, one at a time, and every
//! handled input ends in the same commit step: write each touched document,
//! then publish a full snapshot.

use queuebot_store::{DocumentKey, DocumentStore, DocumentStoreExt, StoreError};
use queuebot_types::{
    ChannelSettings, ChatStatus, CustomCommand, QueueDocument, ScheduledAnnouncement, Snapshot,
    StatsDocument,
};
use tracing::{debug, info, warn};

use crate::chat::{ChatEvent, ChatSession};
use crate::config::CommandsConfig;
use crate::control::{self, ControlRequest};
use crate::interpreter::{self, ChatLine};
use crate::scheduler;
use crate::snapshot;
use crate::state::{Changes, QueueState};

/// Everything the engine task can be asked to handle.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A chat transport event.
    Chat(ChatEvent),
    /// A validated operator request.
    Control(ControlRequest),
    /// Re-publish the current snapshot without mutating anything.
    Refresh,
    /// Stop the engine loop.
    Shutdown,
}

/// Receives every published snapshot.
///
/// Implementations can use this to fan snapshots out to display clients.
pub trait SnapshotSink: Send {
    /// Called after each committed change.
    fn publish(&mut self, snapshot: Snapshot);
}

/// A sink that discards snapshots.
pub struct NoOpSink;

impl SnapshotSink for NoOpSink {
    fn publish(&mut self, _snapshot: Snapshot) {}
}

/// Owns all mutable state and its side-effect handles.
pub struct Engine {
    state: QueueState,
    settings: ChannelSettings,
    words: CommandsConfig,
    store: Box<dyn DocumentStore>,
    chat: ChatSession,
    sink: Box<dyn SnapshotSink>,
}

impl core::fmt::Debug for Engine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state)
            .field("settings", &self.settings)
            .field("chat", &self.chat)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Load every document from `store` and build the engine.
    ///
    /// Missing documents start empty. A missing settings document is
    /// written with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if a document cannot be read or does not
    /// parse, or if the default settings cannot be written.
    pub fn load(
        mut store: Box<dyn DocumentStore>,
        chat: ChatSession,
        sink: Box<dyn SnapshotSink>,
        words: CommandsConfig,
    ) -> Result<Self, StoreError> {
        let settings = if let Some(settings) = store.get_json(DocumentKey::Settings)? {
            settings
        } else {
            let defaults = ChannelSettings::default();
            store.set_json(DocumentKey::Settings, &defaults)?;
            info!(file = %DocumentKey::Settings, "Wrote default settings");
            defaults
        };
        let queue: QueueDocument = store.get_json(DocumentKey::Queue)?.unwrap_or_default();
        let stats: StatsDocument = store.get_json(DocumentKey::Stats)?.unwrap_or_default();
        let announcements: Vec<ScheduledAnnouncement> = store
            .get_json(DocumentKey::Announcements)?
            .unwrap_or_default();
        let commands: Vec<CustomCommand> =
            store.get_json(DocumentKey::Commands)?.unwrap_or_default();

        let state = QueueState::from_documents(queue, stats, announcements, commands);
        info!(
            queued = state.queue_len(),
            current = ?state.current(),
            announcements = state.announcements().len(),
            commands = state.commands().len(),
            channel = %settings.channel,
            "State loaded"
        );

        Ok(Self {
            state,
            settings,
            words,
            store,
            chat,
            sink,
        })
    }

    /// Connect chat (if setup is complete) and publish the initial snapshot.
    pub fn start(&mut self, now_ms: i64) {
        self.chat.connect(&self.settings);
        self.publish(now_ms);
    }

    /// Handle one event. Returns `false` when the engine should stop.
    pub fn handle(&mut self, event: EngineEvent, now_ms: i64) -> bool {
        match event {
            EngineEvent::Chat(event) => self.on_chat(&event, now_ms),
            EngineEvent::Control(request) => self.on_control(&request, now_ms),
            EngineEvent::Refresh => self.publish(now_ms),
            EngineEvent::Shutdown => {
                info!("Engine shutting down");
                self.chat.disconnect();
                return false;
            }
        }
        true
    }

    /// Send every due announcement. Does nothing while chat is not
    /// connected. Fired announcements are persisted and published once.
    pub fn on_tick(&mut self, now_ms: i64) {
        if !self.chat.status().is_connected() {
            return;
        }
        let due = scheduler::take_due(self.state.announcements_mut(), now_ms);
        if due.is_empty() {
            return;
        }
        debug!(count = due.len(), "Sending scheduled announcements");
        for message in &due {
            self.chat.send(message);
        }
        self.commit(Changes::ANNOUNCEMENTS, now_ms);
    }

    /// Build the snapshot clients would receive at `now_ms`.
    pub fn snapshot(&self, now_ms: i64) -> Snapshot {
        snapshot::build(&self.state, &self.settings, self.chat.status(), now_ms)
    }

    /// The state model.
    pub const fn state(&self) -> &QueueState {
        &self.state
    }

    /// The channel settings.
    pub const fn settings(&self) -> &ChannelSettings {
        &self.settings
    }

    /// The chat session state.
    pub const fn chat_status(&self) -> ChatStatus {
        self.chat.status()
    }

    /// Generation of the live chat connection.
    pub const fn chat_generation(&self) -> u64 {
        self.chat.generation()
    }

    fn on_chat(&mut self, event: &ChatEvent, now_ms: i64) {
        match event {
            ChatEvent::Message { message, .. } => {
                if !self.chat.is_current(event) {
                    debug!("Message from stale chat session dropped");
                    return;
                }
                let line = ChatLine {
                    sender: &message.sender,
                    text: &message.text,
                    elevated: message.elevated,
                    self_message: message.self_message,
                };
                let outcome = interpreter::interpret(&mut self.state, &self.words, &line);
                if let Some(reply) = outcome.reply {
                    self.chat.send(&reply);
                }
                if outcome.changes.any() {
                    self.commit(outcome.changes, now_ms);
                }
            }
            ChatEvent::Connected { .. } | ChatEvent::Disconnected { .. } => {
                if self.chat.on_event(event) {
                    self.publish(now_ms);
                }
            }
        }
    }

    fn on_control(&mut self, request: &ControlRequest, now_ms: i64) {
        debug!(action = request.action(), "Control request");
        let outcome = control::apply(&mut self.state, &mut self.settings, request, now_ms);
        if outcome.restart_chat {
            info!(channel = %self.settings.channel, "Channel settings changed, restarting chat");
            self.chat.disconnect();
            self.chat.connect(&self.settings);
        }
        self.commit(outcome.changes, now_ms);
    }

    /// Persist each touched document, then publish a snapshot.
    fn commit(&mut self, changes: Changes, now_ms: i64) {
        let store = self.store.as_mut();
        if changes.queue {
            persist(store, DocumentKey::Queue, &self.state.queue_document());
        }
        if changes.stats {
            persist(store, DocumentKey::Stats, self.state.stats());
        }
        if changes.announcements {
            persist(store, DocumentKey::Announcements, self.state.announcements());
        }
        if changes.commands {
            persist(store, DocumentKey::Commands, self.state.commands());
        }
        if changes.settings {
            persist(store, DocumentKey::Settings, &self.settings);
        }
        self.publish(now_ms);
    }

    fn publish(&mut self, now_ms: i64) {
        let snapshot = self.snapshot(now_ms);
        self.sink.publish(snapshot);
    }
}

fn persist<T: serde::Serialize + ?Sized>(
    store: &mut dyn DocumentStore,
    key: DocumentKey,
    value: &T,
) {
    if let Err(e) = store.set_json(key, value) {
        warn!(file = %key, error = %e, "Failed to persist document");
    }
}
