//! Reference agent that echoes every browser message back into its room.
//!
//! The gateway calls the [`Orchestrator`] hooks synchronously from inside
//! request handlers, so [`EchoAgent`] only queues work there. Replies are
//! produced by [`run_replies`] on its own task and go back out through
//! [`WebChannel::send_message`].

use std::sync::Arc;

use parlor_gateway::{Orchestrator, WebChannel};
use parlor_store::ChatStore;
use parlor_types::{ChatMessage, ChatMetadata};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// A browser message waiting for a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    /// Room the message was posted in.
    pub jid: String,
    /// Message text.
    pub text: String,
}

/// [`Orchestrator`] that queues inbound messages for [`run_replies`].
pub struct EchoAgent {
    tx: mpsc::UnboundedSender<Inbound>,
    store: Arc<dyn ChatStore>,
}

impl EchoAgent {
    /// Create the agent and the receiving end of its work queue.
    pub fn new(store: Arc<dyn ChatStore>) -> (Self, mpsc::UnboundedReceiver<Inbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, store }, rx)
    }
}

impl Orchestrator for EchoAgent {
    fn on_inbound_message(&self, jid: &str, message: &ChatMessage) {
        let inbound = Inbound {
            jid: jid.to_owned(),
            text: message.content.clone(),
        };
        if self.tx.send(inbound).is_err() {
            warn!(room = jid, "Reply worker is gone, dropping inbound message");
        }
    }

    fn on_chat_metadata(&self, metadata: &ChatMetadata) {
        let store = Arc::clone(&self.store);
        let metadata = metadata.clone();
        tokio::spawn(async move {
            if let Err(e) = store.upsert_chat(&metadata).await {
                warn!(room = metadata.jid, error = %e, "Failed to record chat metadata");
            }
        });
    }
}

impl core::fmt::Debug for EchoAgent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EchoAgent")
            .field("worker_alive", &!self.tx.is_closed())
            .finish_non_exhaustive()
    }
}

/// The reply posted for `text`.
pub fn echo_reply(text: &str) -> String {
    format!("Echo: {text}")
}

/// Drain the work queue, replying through `channel` when `echo` is on.
///
/// Returns when every sender has been dropped.
pub async fn run_replies(
    mut rx: mpsc::UnboundedReceiver<Inbound>,
    channel: Arc<WebChannel>,
    echo: bool,
) {
    while let Some(inbound) = rx.recv().await {
        if !echo {
            debug!(room = inbound.jid, "Echo disabled, not replying");
            continue;
        }
        let reply = echo_reply(&inbound.text);
        if let Err(e) = channel.send_message(&inbound.jid, &reply, None).await {
            warn!(room = inbound.jid, error = %e, "Failed to send echo reply");
        }
    }
    debug!("Reply worker stopped");
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use std::time::Duration;

    use parlor_gateway::{GatewayConfig, HubEvent, NoopOrchestrator};
    use parlor_store::SqliteStore;

    use super::*;

    async fn memory_store() -> Arc<dyn ChatStore> {
        Arc::new(SqliteStore::in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn inbound_messages_are_queued_in_order() {
        let (agent, mut rx) = EchoAgent::new(memory_store().await);

        agent.on_inbound_message("web:main", &ChatMessage::from_human("web:main", "You", "one"));
        agent.on_inbound_message("web:main", &ChatMessage::from_human("web:main", "You", "two"));

        assert_eq!(rx.recv().await.unwrap().text, "one");
        let second = rx.recv().await.unwrap();
        assert_eq!(second.jid, "web:main");
        assert_eq!(second.text, "two");
    }

    #[tokio::test]
    async fn inbound_after_worker_exit_does_not_panic() {
        let (agent, rx) = EchoAgent::new(memory_store().await);
        drop(rx);
        agent.on_inbound_message("web:main", &ChatMessage::from_human("web:main", "You", "hi"));
    }

    #[tokio::test]
    async fn metadata_is_upserted_into_the_store() {
        let store = memory_store().await;
        let (agent, _rx) = EchoAgent::new(Arc::clone(&store));

        let metadata = ChatMetadata::web("web:main", Some("Main"), "2026-01-01T00:00:00.000Z");
        agent.on_chat_metadata(&metadata);

        let stored = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let Some(chat) = store.chat("web:main").await.unwrap() {
                    return chat;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("metadata never stored");
        assert_eq!(stored.name.as_deref(), Some("Main"));
    }

    #[test]
    fn echo_reply_prefixes_text() {
        assert_eq!(echo_reply("hello"), "Echo: hello");
    }

    #[tokio::test]
    async fn worker_replies_into_the_room() {
        let store = memory_store().await;
        let channel = Arc::new(WebChannel::new(
            GatewayConfig::new("token"),
            store,
            Arc::new(NoopOrchestrator),
        ));
        let mut subscription = channel.state().hub.subscribe("web:main");

        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_replies(rx, Arc::clone(&channel), true));
        tx.send(Inbound {
            jid: "web:main".to_owned(),
            text: "ping".to_owned(),
        })
        .unwrap();
        drop(tx);

        let event = subscription.recv().await.unwrap();
        let HubEvent::Message(json) = event else {
            panic!("expected a message event");
        };
        let message: ChatMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(message.content, "Echo: ping");
        assert!(message.is_bot_message);

        worker.await.unwrap();
    }

    #[tokio::test]
    async fn disabled_worker_stays_silent() {
        let store = memory_store().await;
        let channel = Arc::new(WebChannel::new(
            GatewayConfig::new("token"),
            Arc::clone(&store),
            Arc::new(NoopOrchestrator),
        ));

        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_replies(rx, channel, false));
        tx.send(Inbound {
            jid: "web:main".to_owned(),
            text: "ping".to_owned(),
        })
        .unwrap();
        drop(tx);
        worker.await.unwrap();

        assert!(store.recent_messages("web:main", 10).await.unwrap().is_empty());
    }
}
