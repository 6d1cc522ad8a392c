//! The storage contract the gateway depends on.
//!
//! The gateway never talks to a database directly. It holds an
//! `Arc<dyn ChatStore>` injected at construction, so the backing store can
//! be swapped (or faked in tests) without touching the request handlers.

use async_trait::async_trait;
use parlor_types::{ChatMessage, ChatMetadata, RegisteredRoom};

use crate::error::StoreError;

/// Durable message history, chat metadata and room registry.
///
/// Implementations must serialize writes internally; the gateway calls
/// these methods concurrently from many request handlers.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Append a message to its room's history.
    ///
    /// Appending the same `(id, chat_jid)` twice is a no-op.
    async fn append_message(&self, message: &ChatMessage) -> Result<(), StoreError>;

    /// Fetch the last `limit` messages of a room in chronological order.
    async fn recent_messages(&self, jid: &str, limit: u32)
    -> Result<Vec<ChatMessage>, StoreError>;

    /// Insert or update chat metadata.
    ///
    /// The newest `last_message_time` wins, and an update without a name
    /// keeps the stored one.
    async fn upsert_chat(&self, metadata: &ChatMetadata) -> Result<(), StoreError>;

    /// Fetch chat metadata for a room.
    async fn chat(&self, jid: &str) -> Result<Option<ChatMetadata>, StoreError>;

    /// Look up a single Room Registry entry.
    async fn room(&self, jid: &str) -> Result<Option<RegisteredRoom>, StoreError>;

    /// List every Room Registry entry, oldest first.
    async fn rooms(&self) -> Result<Vec<RegisteredRoom>, StoreError>;

    /// Register a room if no room with the same address or folder exists.
    ///
    /// The existence check and the insert are one atomic step. Returns
    /// `false` (and changes nothing) when the room already exists.
    async fn register_room(&self, room: &RegisteredRoom) -> Result<bool, StoreError>;

    /// Register a room and record its chat metadata in one transaction.
    ///
    /// Returns `false` (and changes nothing) when the room already exists.
    /// If the metadata cannot be written the registration is rolled back.
    async fn register_room_with_chat(
        &self,
        room: &RegisteredRoom,
        metadata: &ChatMetadata,
    ) -> Result<bool, StoreError>;
}
