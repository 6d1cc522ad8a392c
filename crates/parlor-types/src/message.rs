//! Chat messages, chat metadata and room registry records.
//!
//! Messages are immutable once constructed. Timestamps are ISO-8601 UTC
//! strings with a fixed millisecond precision so that lexical order and
//! chronological order agree (the store sorts on the string column).

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::MessageId;
use crate::room::{RoomId, WEB_CHANNEL};

/// Sender id recorded for messages typed by a human in a browser tab.
pub const WEB_USER_SENDER: &str = "web-user";

/// Sender id recorded for agent replies posted without a persona override.
pub const BOT_SENDER: &str = "bot";

/// Current time as an ISO-8601 UTC string with millisecond precision.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A single chat message in a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique message identifier.
    pub id: MessageId,
    /// Full address of the room this message belongs to.
    pub chat_jid: String,
    /// Sender id (`web-user`, `bot`, or a persona name).
    pub sender: String,
    /// Display name of the author.
    pub sender_name: String,
    /// Message text.
    pub content: String,
    /// Creation time, ISO-8601 UTC.
    pub timestamp: String,
    /// Whether the gateway's own side authored the message.
    pub is_from_me: bool,
    /// Whether an agent authored the message.
    pub is_bot_message: bool,
}

impl ChatMessage {
    /// Build a human-authored message.
    pub fn from_human(chat_jid: &str, sender_name: &str, content: &str) -> Self {
        Self {
            id: MessageId::generate(),
            chat_jid: chat_jid.to_owned(),
            sender: WEB_USER_SENDER.to_owned(),
            sender_name: sender_name.to_owned(),
            content: content.to_owned(),
            timestamp: now_timestamp(),
            is_from_me: false,
            is_bot_message: false,
        }
    }

    /// Build an agent-authored message.
    ///
    /// With no persona override the sender is [`BOT_SENDER`] and the
    /// display name is the assistant name. With an override, both the
    /// sender and the display name become the persona name, so several
    /// agents can post into one room under their own names.
    pub fn from_agent(
        chat_jid: &str,
        assistant_name: &str,
        persona: Option<&str>,
        content: &str,
    ) -> Self {
        let (sender, sender_name) = persona.map_or_else(
            || (BOT_SENDER.to_owned(), assistant_name.to_owned()),
            |name| (name.to_owned(), name.to_owned()),
        );
        Self {
            id: MessageId::generate(),
            chat_jid: chat_jid.to_owned(),
            sender,
            sender_name,
            content: content.to_owned(),
            timestamp: now_timestamp(),
            is_from_me: true,
            is_bot_message: true,
        }
    }
}

/// Per-room chat metadata kept alongside the message history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMetadata {
    /// Full room address.
    pub jid: String,
    /// Display name, if known.
    pub name: Option<String>,
    /// Time of the latest activity, ISO-8601 UTC.
    pub last_message_time: String,
    /// Channel kind (`web` for this gateway).
    pub channel: String,
    /// Whether the chat is a multi-participant room.
    pub is_group: bool,
}

impl ChatMetadata {
    /// Metadata for a web room, active at `timestamp`.
    pub fn web(jid: &str, name: Option<&str>, timestamp: &str) -> Self {
        Self {
            jid: jid.to_owned(),
            name: name.map(str::to_owned),
            last_message_time: timestamp.to_owned(),
            channel: WEB_CHANNEL.to_owned(),
            is_group: true,
        }
    }
}

/// A Room Registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredRoom {
    /// Full room address.
    pub jid: String,
    /// Human-readable display name.
    pub name: String,
    /// Storage folder owned by the room.
    pub folder: String,
    /// Conversation trigger string (for example `@Andy`).
    pub trigger: String,
    /// Registration time, ISO-8601 UTC.
    pub added_at: String,
    /// Whether messages must contain the trigger to reach the agent.
    pub requires_trigger: bool,
}

impl RegisteredRoom {
    /// Registry entry for a new web room.
    ///
    /// Web rooms are one-on-one with the agent, so every message reaches it
    /// without an explicit trigger.
    pub fn web(id: &RoomId, name: &str, assistant_name: &str) -> Self {
        Self {
            jid: id.jid(),
            name: name.to_owned(),
            folder: id.folder(),
            trigger: format!("@{assistant_name}"),
            added_at: now_timestamp(),
            requires_trigger: false,
        }
    }

    /// Short room identifier, if the entry is in the web address space.
    pub fn room_id(&self) -> Option<RoomId> {
        RoomId::from_jid(&self.jid)
    }
}
