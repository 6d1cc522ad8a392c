//! End-to-end tests over a real TCP listener.
//!
//! The channel is connected on an ephemeral port and the SSE stream is
//! read with `reqwest`, so framing, keep-alive and shutdown are exercised
//! exactly as a browser would see them.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::missing_panics_doc
)]

use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use parlor_gateway::{GatewayConfig, NoopOrchestrator, WebChannel};
use parlor_store::{ChatStore, SqliteStore};

const TOKEN: &str = "e2e-token";

/// Read from the SSE body until `needle` shows up in the accumulated text.
async fn read_until<S, B>(stream: &mut S, buffer: &mut String, needle: &str)
where
    S: Stream<Item = reqwest::Result<B>> + Unpin,
    B: AsRef<[u8]>,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        while !buffer.contains(needle) {
            let chunk = stream.next().await.expect("stream ended").unwrap();
            buffer.push_str(&String::from_utf8_lossy(chunk.as_ref()));
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {needle:?}, got {buffer:?}"));
}

async fn connected_channel(config: GatewayConfig) -> (Arc<WebChannel>, String) {
    let store: Arc<dyn ChatStore> = Arc::new(SqliteStore::in_memory().await.unwrap());
    let channel = Arc::new(WebChannel::new(
        config,
        store,
        Arc::new(NoopOrchestrator),
    ));
    let addr = channel.connect().await.unwrap();
    (channel, format!("http://{addr}"))
}

#[tokio::test]
async fn test_sse_stream_delivers_sent_and_outbound_messages() {
    let (channel, base) =
        connected_channel(GatewayConfig::new(TOKEN).with_host("127.0.0.1").with_port(0)).await;
    assert!(channel.is_connected().await);
    assert_eq!(channel.name(), "web");
    assert!(channel.owns_jid("web:main"));
    assert!(!channel.owns_jid("tg:1"));

    let client = reqwest::Client::new();
    let response = client
        .get(format!("{base}/rooms/main/events?token={TOKEN}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert!(
        response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/event-stream")
    );

    let mut stream = response.bytes_stream();
    let mut buffer = String::new();
    read_until(&mut stream, &mut buffer, ": connected").await;

    let sent = client
        .post(format!("{base}/rooms/main/send"))
        .bearer_auth(TOKEN)
        .json(&serde_json::json!({ "text": "hello over the wire" }))
        .send()
        .await
        .unwrap();
    assert_eq!(sent.status(), reqwest::StatusCode::OK);

    read_until(&mut stream, &mut buffer, "hello over the wire").await;
    assert!(buffer.contains("event: message"));

    channel
        .send_message("web:main", "agent reply", None)
        .await
        .unwrap();
    read_until(&mut stream, &mut buffer, "agent reply").await;

    channel.disconnect().await;
    assert!(!channel.is_connected().await);

    // The stream ends once the hub is shut down.
    let rest = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(chunk) = stream.next().await {
            if chunk.is_err() {
                break;
            }
        }
    })
    .await;
    assert!(rest.is_ok());
}

#[tokio::test]
async fn test_idle_stream_receives_heartbeats() {
    let config = GatewayConfig::new(TOKEN)
        .with_port(0)
        .with_heartbeat_interval(Duration::from_millis(100));
    let (channel, base) = connected_channel(config).await;

    let response = reqwest::get(format!("{base}/rooms/main/events?token={TOKEN}"))
        .await
        .unwrap();
    let mut stream = response.bytes_stream();
    let mut buffer = String::new();
    read_until(&mut stream, &mut buffer, ": heartbeat").await;

    channel.disconnect().await;
}

#[tokio::test]
async fn test_closed_stream_is_unsubscribed() {
    // Short heartbeats make the server notice the closed socket quickly.
    let config = GatewayConfig::new(TOKEN)
        .with_port(0)
        .with_heartbeat_interval(Duration::from_millis(50));
    let (channel, base) = connected_channel(config).await;
    let hub = channel.state().hub.clone();

    let response = reqwest::get(format!("{base}/rooms/main/events?token={TOKEN}"))
        .await
        .unwrap();
    let mut stream = response.bytes_stream();
    let mut buffer = String::new();
    read_until(&mut stream, &mut buffer, ": connected").await;
    assert_eq!(hub.subscriber_count("web:main"), 1);

    drop(stream);

    let gone = tokio::time::timeout(Duration::from_secs(5), async {
        while hub.subscriber_count("web:main") > 0 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(gone.is_ok());

    channel.disconnect().await;
}

#[tokio::test]
async fn test_connect_registers_default_room_once() {
    let store: Arc<dyn ChatStore> = Arc::new(SqliteStore::in_memory().await.unwrap());
    let config = GatewayConfig::new(TOKEN)
        .with_port(0)
        .with_default_room("Lobby");

    let first = WebChannel::new(config.clone(), Arc::clone(&store), Arc::new(NoopOrchestrator));
    let addr = first.connect().await.unwrap();
    assert_eq!(first.connect().await.unwrap(), addr);
    first.disconnect().await;

    let second = WebChannel::new(config, Arc::clone(&store), Arc::new(NoopOrchestrator));
    second.connect().await.unwrap();
    second.disconnect().await;

    let rooms = store.rooms().await.unwrap();
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms.first().unwrap().jid, "web:lobby");
    assert_eq!(rooms.first().unwrap().name, "Lobby");
}
