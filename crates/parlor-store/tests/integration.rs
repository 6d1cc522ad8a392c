//! Integration tests for the `parlor-store` `SQLite` backend.
//!
//! Tests run against a private in-memory database (or a throwaway file in
//! the temp dir), so no external services are needed.

// Integration tests use expect/unwrap extensively for clarity -- panicking
// on failure is the correct behavior in test code.
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

use parlor_store::{ChatStore, SqliteConfig, SqliteStore};
use parlor_types::{ChatMessage, ChatMetadata, MessageId, RegisteredRoom, RoomId};

async fn store() -> SqliteStore {
    SqliteStore::in_memory()
        .await
        .expect("in-memory SQLite should open")
}

fn message_at(jid: &str, content: &str, timestamp: &str) -> ChatMessage {
    let mut msg = ChatMessage::from_human(jid, "You", content);
    msg.timestamp = timestamp.to_owned();
    msg
}

fn room(name: &str) -> RegisteredRoom {
    let id = RoomId::from_display_name(name).unwrap();
    RegisteredRoom::web(&id, name, "Andy")
}

// =============================================================================
// Messages
// =============================================================================

#[tokio::test]
async fn history_is_chronological_and_bounded() {
    let store = store().await;
    for (i, ts) in [
        "2026-01-01T00:00:01.000Z",
        "2026-01-01T00:00:02.000Z",
        "2026-01-01T00:00:03.000Z",
        "2026-01-01T00:00:04.000Z",
    ]
    .iter()
    .enumerate()
    {
        store
            .append_message(&message_at("web:main", &format!("m{i}"), ts))
            .await
            .unwrap();
    }

    let recent = store.recent_messages("web:main", 3).await.unwrap();
    let contents: Vec<&str> = recent.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["m1", "m2", "m3"]);
}

#[tokio::test]
async fn history_breaks_timestamp_ties_by_insertion_order() {
    let store = store().await;
    for content in ["first", "second", "third"] {
        store
            .append_message(&message_at("web:main", content, "2026-01-01T00:00:00.000Z"))
            .await
            .unwrap();
    }

    let recent = store.recent_messages("web:main", 10).await.unwrap();
    let contents: Vec<&str> = recent.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["first", "second", "third"]);
}

#[tokio::test]
async fn history_is_scoped_to_room() {
    let store = store().await;
    store
        .append_message(&ChatMessage::from_human("web:a", "You", "hello-a"))
        .await
        .unwrap();
    store
        .append_message(&ChatMessage::from_human("web:b", "You", "hello-b"))
        .await
        .unwrap();

    let a = store.recent_messages("web:a", 50).await.unwrap();
    assert_eq!(a.len(), 1);
    assert_eq!(a[0].content, "hello-a");
    assert!(store.recent_messages("web:none", 50).await.unwrap().is_empty());
}

#[tokio::test]
async fn messages_round_trip_verbatim() {
    let store = store().await;
    let original = ChatMessage::from_agent("web:main", "Andy", Some("Researcher"), "a\nb \"c\"");
    store.append_message(&original).await.unwrap();

    let loaded = store.recent_messages("web:main", 1).await.unwrap();
    assert_eq!(loaded, vec![original]);
}

#[tokio::test]
async fn duplicate_message_ids_are_ignored() {
    let store = store().await;
    let mut msg = ChatMessage::from_human("web:main", "You", "once");
    msg.id = MessageId::from(String::from("1-dup"));
    store.append_message(&msg).await.unwrap();
    store.append_message(&msg).await.unwrap();

    assert_eq!(store.recent_messages("web:main", 10).await.unwrap().len(), 1);
}

// =============================================================================
// Chat metadata
// =============================================================================

#[tokio::test]
async fn upsert_chat_keeps_newest_time_and_existing_name() {
    let store = store().await;
    store
        .upsert_chat(&ChatMetadata::web(
            "web:main",
            Some("Main"),
            "2026-01-01T00:00:05.000Z",
        ))
        .await
        .unwrap();
    store
        .upsert_chat(&ChatMetadata::web("web:main", None, "2026-01-01T00:00:01.000Z"))
        .await
        .unwrap();

    let chat = store.chat("web:main").await.unwrap().unwrap();
    assert_eq!(chat.name.as_deref(), Some("Main"));
    assert_eq!(chat.last_message_time, "2026-01-01T00:00:05.000Z");
    assert_eq!(chat.channel, "web");
    assert!(chat.is_group);
}

#[tokio::test]
async fn unknown_chat_is_none() {
    let store = store().await;
    assert!(store.chat("web:missing").await.unwrap().is_none());
}

// =============================================================================
// Room registry
// =============================================================================

#[tokio::test]
async fn register_room_is_insert_if_absent() {
    let store = store().await;
    let first = room("My Project");
    assert!(store.register_room(&first).await.unwrap());

    let mut second = room("my project");
    second.name = String::from("Another name");
    assert!(!store.register_room(&second).await.unwrap());

    let stored = store.room("web:my-project").await.unwrap().unwrap();
    assert_eq!(stored.name, "My Project");
    assert_eq!(stored.folder, "web-my-project");
    assert!(!stored.requires_trigger);
}

#[tokio::test]
async fn concurrent_registration_has_one_winner() {
    let store = std::sync::Arc::new(store().await);
    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = std::sync::Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store.register_room(&room("Race")).await.unwrap()
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
    assert_eq!(store.rooms().await.unwrap().len(), 1);
}

fn chat_for(room: &RegisteredRoom) -> ChatMetadata {
    ChatMetadata::web(&room.jid, Some(&room.name), &room.added_at)
}

#[tokio::test]
async fn register_room_with_chat_writes_both_records() {
    let store = store().await;
    let work = room("Work");
    assert!(store.register_room_with_chat(&work, &chat_for(&work)).await.unwrap());

    assert!(store.room("web:work").await.unwrap().is_some());
    let chat = store.chat("web:work").await.unwrap().unwrap();
    assert_eq!(chat.name.as_deref(), Some("Work"));

    // A second registration changes nothing, including the metadata.
    let mut again = room("work");
    again.name = String::from("Renamed");
    assert!(!store.register_room_with_chat(&again, &chat_for(&again)).await.unwrap());
    let chat = store.chat("web:work").await.unwrap().unwrap();
    assert_eq!(chat.name.as_deref(), Some("Work"));
}

#[tokio::test]
async fn failed_chat_write_rolls_back_registration() {
    let store = store().await;
    sqlx::query(
        r"CREATE TRIGGER chats_unavailable BEFORE INSERT ON chats
          BEGIN SELECT RAISE(ABORT, 'chats unavailable'); END",
    )
    .execute(store.pool())
    .await
    .unwrap();

    let work = room("Work");
    assert!(store.register_room_with_chat(&work, &chat_for(&work)).await.is_err());
    assert!(store.room("web:work").await.unwrap().is_none());
    assert!(store.rooms().await.unwrap().is_empty());
}

#[tokio::test]
async fn rooms_are_listed_oldest_first() {
    let store = store().await;
    let mut b = room("Beta");
    b.added_at = String::from("2026-01-02T00:00:00.000Z");
    let mut a = room("Alpha");
    a.added_at = String::from("2026-01-01T00:00:00.000Z");
    store.register_room(&b).await.unwrap();
    store.register_room(&a).await.unwrap();

    let names: Vec<String> = store
        .rooms()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, ["Alpha", "Beta"]);
}

#[tokio::test]
async fn file_backed_store_persists_across_reconnects() {
    let dir = std::env::temp_dir().join(format!("parlor-store-{}", MessageId::generate()));
    std::fs::create_dir_all(&dir).unwrap();
    let url = format!("sqlite://{}", dir.join("parlor.db").display());
    let config = SqliteConfig::new(&url).with_max_connections(1);

    {
        let store = SqliteStore::connect(&config).await.unwrap();
        store.register_room(&room("Main")).await.unwrap();
        store.close().await;
    }

    let store = SqliteStore::connect(&config).await.unwrap();
    assert!(store.room("web:main").await.unwrap().is_some());
    store.close().await;
    let _ = std::fs::remove_dir_all(&dir);
}
