//! Shared type definitions for the Parlor chat gateway.
//!
//! This crate is the single source of truth for the domain types passed
//! between the store, the gateway and the server binary. It performs no
//! I/O.
//!
//! # Modules
//!
//! - [`ids`] -- Subscriber and message identifiers
//! - [`room`] -- Room identifiers and the web address space
//! - [`message`] -- Chat messages, chat metadata and registry entries

pub mod ids;
pub mod message;
pub mod room;

// Re-export all public types at crate root for convenience.
pub use ids::{MessageId, SubscriberId};
pub use message::{
    BOT_SENDER, ChatMessage, ChatMetadata, RegisteredRoom, WEB_USER_SENDER, now_timestamp,
};
pub use room::{RoomId, RoomIdError, WEB_CHANNEL, WEB_JID_PREFIX, owns_jid};
