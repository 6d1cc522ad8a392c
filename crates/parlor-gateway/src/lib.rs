//! Web gateway for the Parlor chat system.
//!
//! This crate lets browser clients chat with an automated assistant in
//! named rooms over plain HTTP:
//!
//! - **Server-Sent Events** (`/rooms/{room}/events`) push every message
//!   posted to a room to all of its open streams, with periodic heartbeats
//! - **REST endpoints** to post messages, fetch history and list or create
//!   rooms
//! - **Minimal HTML pages** for the room list and each room's chat
//!
//! # Architecture
//!
//! Human messages are stored, handed to the host [`Orchestrator`], and
//! fanned out through the per-room [`Hub`]. Agent replies come back
//! through [`WebChannel::send_message`] and take the same store-then-fan-out
//! path. Durability lives entirely in the injected
//! [`ChatStore`](parlor_store::ChatStore); the hub keeps nothing.
//!
//! Every routed request must carry the shared access token, as a `token`
//! query parameter or an `Authorization: Bearer` header.

pub mod auth;
pub mod channel;
pub mod config;
pub mod error;
pub mod events;
pub mod handlers;
pub mod hub;
pub mod messages;
pub mod orchestrator;
pub mod pages;
pub mod rooms;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use channel::WebChannel;
pub use config::GatewayConfig;
pub use error::GatewayError;
pub use hub::{Hub, HubEvent, Subscription, SubscriptionHandle};
pub use orchestrator::{NoopOrchestrator, Orchestrator};
pub use router::build_router;
pub use server::ServerError;
pub use state::AppState;
