//! Integration tests for the `queuebot-store` data layer.
//!
//! File store tests run against a fresh temporary directory each.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]

use queuebot_store::{DocumentKey, DocumentStore, DocumentStoreExt, JsonFileStore, MemoryStore};
use queuebot_types::{
    AnnouncementId, ChannelSettings, QueueDocument, ScheduledAnnouncement, StatsDocument,
    StatsRecord,
};

#[test]
fn missing_document_reads_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::open(dir.path()).unwrap();
    let doc: Option<QueueDocument> = store.get_json(DocumentKey::Queue).unwrap();
    assert!(doc.is_none());
}

#[test]
fn open_creates_nested_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    let store = JsonFileStore::open(&nested).unwrap();
    assert!(store.dir().is_dir());
}

#[test]
fn queue_document_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut store = JsonFileStore::open(dir.path()).unwrap();
        let doc = QueueDocument {
            queue: vec!["Alice".to_owned(), "bob".to_owned()],
            current: Some("Carol".to_owned()),
        };
        store.set_json(DocumentKey::Queue, &doc).unwrap();
    }

    let store = JsonFileStore::open(dir.path()).unwrap();
    let doc: QueueDocument = store.get_json(DocumentKey::Queue).unwrap().unwrap();
    assert_eq!(doc.queue, vec!["Alice".to_owned(), "bob".to_owned()]);
    assert_eq!(doc.current.as_deref(), Some("Carol"));
    assert!(!store.path_for(DocumentKey::Queue).with_extension("json.tmp").exists());
}

#[test]
fn writes_are_full_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = JsonFileStore::open(dir.path()).unwrap();

    let mut stats = StatsDocument::new();
    stats.insert("Bob".to_owned(), StatsRecord::default());
    stats.insert("Eve".to_owned(), StatsRecord::default());
    store.set_json(DocumentKey::Stats, &stats).unwrap();

    stats.remove("Eve");
    store.set_json(DocumentKey::Stats, &stats).unwrap();

    let loaded: StatsDocument = store.get_json(DocumentKey::Stats).unwrap().unwrap();
    assert_eq!(loaded.len(), 1);
    assert!(loaded.contains_key("Bob"));
}

#[test]
fn files_use_legacy_names_and_pretty_json() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = JsonFileStore::open(dir.path()).unwrap();
    store
        .set_json(DocumentKey::Settings, &ChannelSettings::default())
        .unwrap();

    let raw = std::fs::read_to_string(dir.path().join("config.json")).unwrap();
    assert!(raw.contains("\n  \"channel\": \"\""));
    assert!(raw.contains("\"setupCompleted\": false"));
    assert!(raw.contains("\"port\": 3000"));
}

#[test]
fn documents_from_older_installs_load() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("loop-messages.json"),
        r#"[{"id":"1712345678901-k3j9xq","message":"Follow!","intervalMinutes":10,"enabled":true,"lastSentAt":1712345678901}]"#,
    )
    .unwrap();

    let store = JsonFileStore::open(dir.path()).unwrap();
    let list: Vec<ScheduledAnnouncement> =
        store.get_json(DocumentKey::Announcements).unwrap().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].id, AnnouncementId::from("1712345678901-k3j9xq"));
    assert_eq!(list[0].last_sent_at, Some(1_712_345_678_901));
}

#[test]
fn corrupt_document_is_a_serialization_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("stats-data.json"), "{not json").unwrap();
    let store = JsonFileStore::open(dir.path()).unwrap();
    let result: Result<Option<StatsDocument>, _> = store.get_json(DocumentKey::Stats);
    assert!(matches!(
        result,
        Err(queuebot_store::StoreError::Serialization(_))
    ));
}

#[test]
fn memory_store_clones_share_documents() {
    let store = MemoryStore::new();
    let mut writer = store.clone();
    writer.put_raw(DocumentKey::Commands, "[]").unwrap();

    assert_eq!(
        store.get_raw(DocumentKey::Commands).unwrap().as_deref(),
        Some("[]")
    );
    assert_eq!(store.writes().unwrap(), vec![DocumentKey::Commands]);
    store.clear_writes().unwrap();
    assert!(store.writes().unwrap().is_empty());
}
