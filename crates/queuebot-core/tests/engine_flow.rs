//! End-to-end engine tests: chat lines, control requests and dispatcher
//! ticks against an in-memory store and a recording chat transport.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use queuebot_core::chat::{ChatCredentials, ChatEvent, ChatSession, IncomingMessage};
use queuebot_core::config::CommandsConfig;
use queuebot_core::control::ControlRequest;
use queuebot_core::engine::{Engine, EngineEvent, SnapshotSink};
use queuebot_core::recording::RecordingTransport;
use queuebot_core::runner::{RunEndReason, run_engine};
use queuebot_store::{DocumentKey, DocumentStoreExt, MemoryStore};
use queuebot_types::{
    AnnouncementId, ChannelSettings, ChatStatus, QueueDocument, ScheduledAnnouncement, Snapshot,
    StatsDocument,
};
use tokio::sync::mpsc;

/// Collects every published snapshot.
#[derive(Clone, Default)]
struct RecordingSink {
    snapshots: Arc<Mutex<Vec<Snapshot>>>,
}

impl RecordingSink {
    fn count(&self) -> usize {
        self.snapshots.lock().unwrap().len()
    }

    fn last(&self) -> Snapshot {
        self.snapshots.lock().unwrap().last().cloned().unwrap()
    }
}

impl SnapshotSink for RecordingSink {
    fn publish(&mut self, snapshot: Snapshot) {
        self.snapshots.lock().unwrap().push(snapshot);
    }
}

struct Harness {
    engine: Engine,
    store: MemoryStore,
    transport: RecordingTransport,
    sink: RecordingSink,
    _rx: mpsc::Receiver<EngineEvent>,
}

fn ready_settings() -> ChannelSettings {
    ChannelSettings {
        channel: String::from("darts"),
        setup_completed: true,
        ..ChannelSettings::default()
    }
}

fn harness_with(store: MemoryStore) -> Harness {
    let transport = RecordingTransport::new();
    let sink = RecordingSink::default();
    let (tx, rx) = mpsc::channel(16);
    let chat = ChatSession::new(
        Box::new(transport.clone()),
        ChatCredentials {
            username: String::from("queuebot"),
            token: String::from("oauth:test"),
        },
        tx,
    );
    let engine = Engine::load(
        Box::new(store.clone()),
        chat,
        Box::new(sink.clone()),
        CommandsConfig::default(),
    )
    .unwrap();
    Harness {
        engine,
        store,
        transport,
        sink,
        _rx: rx,
    }
}

fn connected_harness() -> Harness {
    let mut store = MemoryStore::new();
    store
        .set_json(DocumentKey::Settings, &ready_settings())
        .unwrap();
    let mut h = harness_with(store);
    h.engine.start(0);
    let session = h.engine.chat_generation();
    h.engine
        .handle(EngineEvent::Chat(ChatEvent::Connected { session }), 0);
    h.store.clear_writes().unwrap();
    h
}

fn chat(h: &mut Harness, sender: &str, text: &str, elevated: bool) {
    let session = h.engine.chat_generation();
    h.engine.handle(
        EngineEvent::Chat(ChatEvent::Message {
            session,
            message: IncomingMessage {
                sender: sender.to_owned(),
                text: text.to_owned(),
                elevated,
                self_message: false,
            },
        }),
        0,
    );
}

#[test]
fn first_start_writes_default_settings() {
    let store = MemoryStore::new();
    let mut h = harness_with(store);
    assert_eq!(h.store.writes().unwrap(), vec![DocumentKey::Settings]);
    let saved: ChannelSettings = h.store.get_json(DocumentKey::Settings).unwrap().unwrap();
    assert_eq!(saved, ChannelSettings::default());

    h.engine.start(0);
    assert!(h.transport.log().connects.is_empty());
    assert_eq!(h.engine.chat_status(), ChatStatus::Disconnected);
    assert_eq!(h.sink.count(), 1);
    assert!(!h.sink.last().settings.setup_completed);
}

#[test]
fn loads_existing_documents() {
    let mut store = MemoryStore::new();
    store
        .set_json(
            DocumentKey::Queue,
            &QueueDocument {
                queue: vec![String::from("Alice"), String::from("Bob")],
                current: Some(String::from("Carol")),
            },
        )
        .unwrap();
    store
        .set_json(DocumentKey::Stats, &StatsDocument::new())
        .unwrap();
    let h = harness_with(store);
    let snap = h.engine.snapshot(0);
    assert_eq!(snap.current.as_deref(), Some("Carol"));
    assert_eq!(snap.next.as_deref(), Some("Alice"));
    assert_eq!(snap.queue.len(), 2);
}

#[test]
fn connect_lifecycle_publishes() {
    let h = connected_harness();
    assert_eq!(h.transport.log().connects, vec![String::from("darts")]);
    assert_eq!(h.engine.chat_status(), ChatStatus::Connected);
    assert!(h.sink.last().settings.bot_connected);
    // start + connected
    assert_eq!(h.sink.count(), 2);
}

#[test]
fn join_replies_persists_and_broadcasts() {
    let mut h = connected_harness();
    let before = h.sink.count();
    chat(&mut h, "Alice", "!join", false);

    assert_eq!(
        h.transport.sent_texts(),
        vec![String::from(
            "@Alice joined the queue ✅ You are at position 1."
        )]
    );
    assert_eq!(h.store.writes().unwrap(), vec![DocumentKey::Queue]);
    let doc: QueueDocument = h.store.get_json(DocumentKey::Queue).unwrap().unwrap();
    assert_eq!(doc.queue, vec![String::from("Alice")]);
    assert_eq!(h.sink.count(), before + 1);
    assert_eq!(h.sink.last().queue, vec![String::from("Alice")]);
}

#[test]
fn reply_only_commands_do_not_persist() {
    let mut h = connected_harness();
    let before = h.sink.count();
    chat(&mut h, "Alice", "!queue", false);
    assert_eq!(h.transport.sent_texts(), vec![String::from("📋 The queue is empty.")]);
    assert!(h.store.writes().unwrap().is_empty());
    assert_eq!(h.sink.count(), before);
}

#[test]
fn result_flow_through_control() {
    let mut h = connected_harness();
    chat(&mut h, "Bob", "!join", false);
    chat(&mut h, "mod", "!next", true);
    assert_eq!(h.engine.state().current(), Some("Bob"));

    h.store.clear_writes().unwrap();
    h.engine.handle(
        EngineEvent::Control(ControlRequest::RecordResult {
            legs_for: 3.0,
            legs_against: 1.0,
            average: 55.5,
        }),
        0,
    );
    let writes = h.store.writes().unwrap();
    assert!(writes.contains(&DocumentKey::Stats));
    assert!(writes.contains(&DocumentKey::Queue));
    let stats: StatsDocument = h.store.get_json(DocumentKey::Stats).unwrap().unwrap();
    assert_eq!(stats["Bob"].games, 1);
    assert_eq!(stats["Bob"].wins, 1);
    assert!(h.sink.last().current.is_none());

    chat(&mut h, "Bob", "!stats", false);
    assert_eq!(
        h.transport.sent_texts().last().map(String::as_str),
        Some("📊 Bob | W/L 1-0 | Legs 3-1 | Avg 55.50")
    );
}

#[test]
fn ignored_control_still_broadcasts() {
    let mut h = connected_harness();
    let before = h.sink.count();
    h.engine.handle(
        EngineEvent::Control(ControlRequest::AnnouncementDelete {
            id: String::from("missing"),
        }),
        0,
    );
    assert!(h.store.writes().unwrap().is_empty());
    assert_eq!(h.sink.count(), before + 1);
}

#[test]
fn settings_save_restarts_chat() {
    let mut h = connected_harness();
    h.engine.handle(
        EngineEvent::Control(ControlRequest::SettingsSave {
            channel: String::from("OtherChan"),
        }),
        0,
    );
    let log = h.transport.log();
    assert_eq!(log.disconnects, 1);
    assert_eq!(
        log.connects,
        vec![String::from("darts"), String::from("otherchan")]
    );
    assert_eq!(h.engine.chat_status(), ChatStatus::Connecting);
    assert_eq!(h.store.writes().unwrap(), vec![DocumentKey::Settings]);
    assert_eq!(h.sink.last().settings.channel, "otherchan");

    // Saving the same channel again does not reconnect.
    h.engine.handle(
        EngineEvent::Control(ControlRequest::SettingsSave {
            channel: String::from("otherchan"),
        }),
        0,
    );
    assert_eq!(h.transport.log().connects.len(), 2);
}

#[test]
fn stale_session_messages_are_dropped() {
    let mut h = connected_harness();
    let old = h.engine.chat_generation();
    h.engine.handle(
        EngineEvent::Control(ControlRequest::SettingsSave {
            channel: String::from("elsewhere"),
        }),
        0,
    );
    h.engine.handle(
        EngineEvent::Chat(ChatEvent::Message {
            session: old,
            message: IncomingMessage {
                sender: String::from("ghost"),
                text: String::from("!join"),
                elevated: false,
                self_message: false,
            },
        }),
        0,
    );
    assert_eq!(h.engine.state().queue_len(), 0);
}

#[test]
fn tick_sends_due_announcements_once() {
    let mut h = connected_harness();
    h.engine.handle(
        EngineEvent::Control(ControlRequest::AnnouncementAdd {
            message: String::from("Follow the channel!"),
            interval_minutes: 1.0,
        }),
        1_000,
    );
    h.store.clear_writes().unwrap();
    let before = h.sink.count();

    h.engine.on_tick(30_000);
    assert!(h.transport.sent_texts().is_empty());
    assert_eq!(h.sink.count(), before);

    h.engine.on_tick(61_000);
    assert_eq!(
        h.transport.sent_texts(),
        vec![String::from("Follow the channel!")]
    );
    assert_eq!(h.store.writes().unwrap(), vec![DocumentKey::Announcements]);
    assert_eq!(h.sink.count(), before + 1);
    assert_eq!(h.sink.last().loop_messages[0].next_send_in_seconds, 60);
}

#[test]
fn tick_is_noop_while_disconnected() {
    let mut store = MemoryStore::new();
    store
        .set_json(
            DocumentKey::Announcements,
            &vec![ScheduledAnnouncement {
                id: AnnouncementId::from("legacy"),
                message: String::from("hi"),
                interval_minutes: 1.0,
                enabled: true,
                last_sent_at: None,
            }],
        )
        .unwrap();
    let mut h = harness_with(store);
    h.store.clear_writes().unwrap();
    h.engine.on_tick(1_000_000);
    assert!(h.transport.sent_texts().is_empty());
    assert!(h.store.writes().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn runner_ticks_and_shuts_down() {
    let mut store = MemoryStore::new();
    store
        .set_json(DocumentKey::Settings, &ready_settings())
        .unwrap();
    store
        .set_json(
            DocumentKey::Announcements,
            &vec![ScheduledAnnouncement {
                id: AnnouncementId::from("legacy"),
                message: String::from("never sent before"),
                interval_minutes: 60.0,
                enabled: true,
                last_sent_at: None,
            }],
        )
        .unwrap();

    let transport = RecordingTransport::new();
    let sink = RecordingSink::default();
    let (tx, rx) = mpsc::channel(16);
    let chat = ChatSession::new(
        Box::new(transport.clone()),
        ChatCredentials {
            username: String::from("queuebot"),
            token: String::from("oauth:test"),
        },
        tx.clone(),
    );
    let engine = Engine::load(
        Box::new(store),
        chat,
        Box::new(sink.clone()),
        CommandsConfig::default(),
    )
    .unwrap();

    let handle = tokio::spawn(run_engine(engine, rx, Duration::from_secs(5)));

    // First connect of a fresh session is generation 1.
    tx.send(EngineEvent::Chat(ChatEvent::Connected { session: 1 }))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(6)).await;
    tx.send(EngineEvent::Shutdown).await.unwrap();

    let result = handle.await.unwrap();
    assert_eq!(result.end_reason, RunEndReason::Shutdown);
    assert!(result.ticks >= 1);
    assert_eq!(
        transport.sent_texts(),
        vec![String::from("never sent before")]
    );
    assert_eq!(transport.log().disconnects, 1);
}

#[tokio::test]
async fn runner_stops_when_senders_drop() {
    let h = harness_with(MemoryStore::new());
    let (tx, rx) = mpsc::channel(4);
    drop(tx);
    let result = run_engine(h.engine, rx, Duration::from_secs(5)).await;
    assert_eq!(result.end_reason, RunEndReason::ChannelClosed);
    assert_eq!(result.events_handled, 0);
}
