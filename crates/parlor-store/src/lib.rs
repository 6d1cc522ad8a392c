//! Storage layer for the Parlor chat gateway.
//!
//! The gateway delegates all durability to this crate: message history,
//! per-room chat metadata and the Room Registry. The live broadcast hub
//! never retains messages; clients that reconnect re-fetch history from
//! here.
//!
//! # Modules
//!
//! - [`store`] -- The [`ChatStore`] trait the gateway is written against
//! - [`sqlite`] -- `SQLite` implementation with embedded migrations
//! - [`error`] -- Shared error types

pub mod error;
pub mod sqlite;
pub mod store;

// Re-export primary types for convenience.
pub use error::StoreError;
pub use sqlite::{SqliteConfig, SqliteStore};
pub use store::ChatStore;
