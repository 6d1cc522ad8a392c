//! Identifier types for subscribers and messages.
//!
//! Subscribers get a strongly-typed UUID v7 wrapper so they cannot be
//! confused with any other identifier. Message identifiers are strings of
//! the form `<unix-millis>-<random suffix>`, which keeps them readable in
//! logs and sortable by creation time.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of the random base36 suffix appended to every [`MessageId`].
const MESSAGE_ID_SUFFIX_LEN: usize = 8;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

define_id! {
    /// Unique identifier for one live event-stream subscriber.
    SubscriberId
}

/// Unique identifier for a chat message.
///
/// Generated as `<unix-millis>-<8 random base36 chars>`. Collisions would
/// need two messages in the same millisecond drawing the same 41-bit
/// suffix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Generate a fresh message identifier.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let suffix: String = (0..MESSAGE_ID_SUFFIX_LEN)
            .filter_map(|_| char::from_digit(rng.random_range(0..36_u32), 36))
            .collect();
        Self(format!("{}-{suffix}", Utc::now().timestamp_millis()))
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for MessageId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for MessageId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}
