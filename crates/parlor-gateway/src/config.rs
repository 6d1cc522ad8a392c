//! Runtime settings for the web gateway.
//!
//! [`GatewayConfig`] is a plain value handed to [`WebChannel::new`]. The
//! server binary builds it from the YAML config file; tests build it with
//! [`GatewayConfig::new`] and the `with_*` setters.
//!
//! [`WebChannel::new`]: crate::channel::WebChannel::new

use std::time::Duration;

/// Default interval between keep-alive heartbeats on idle event streams.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Default maximum accepted request body size for message sends.
pub const DEFAULT_MAX_BODY_BYTES: usize = 100_000;

/// Default number of messages returned by the history endpoint.
pub const DEFAULT_HISTORY_LIMIT: u32 = 50;

/// Upper bound on the `limit` query parameter of the history endpoint.
pub const MAX_HISTORY_LIMIT: u32 = 500;

/// Default per-subscriber outbound queue depth.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 64;

/// Configuration for the web gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// The host address to bind to.
    pub host: String,
    /// The TCP port to listen on. `0` picks a free port.
    pub port: u16,
    /// Shared secret every request must present.
    pub auth_token: String,
    /// Display name used for agent-authored messages.
    pub assistant_name: String,
    /// Display name used for messages submitted from the browser.
    pub user_name: String,
    /// Display name of the room registered on connect.
    pub default_room: String,
    /// Interval between heartbeats on open event streams.
    pub heartbeat_interval: Duration,
    /// Maximum accepted body size for `POST /rooms/{room}/send`.
    pub max_body_bytes: usize,
    /// History returned when the client does not ask for a limit.
    pub history_limit: u32,
    /// Events queued per subscriber before it is considered gone.
    pub subscriber_buffer: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: String::from("127.0.0.1"),
            port: 3100,
            auth_token: String::new(),
            assistant_name: String::from("Andy"),
            user_name: String::from("You"),
            default_room: String::from("Main"),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            history_limit: DEFAULT_HISTORY_LIMIT,
            subscriber_buffer: DEFAULT_SUBSCRIBER_BUFFER,
        }
    }
}

impl GatewayConfig {
    /// Create a configuration with default settings and the given access token.
    pub fn new(auth_token: &str) -> Self {
        Self {
            auth_token: auth_token.to_owned(),
            ..Self::default()
        }
    }

    /// Set the bind address.
    #[must_use]
    pub fn with_host(mut self, host: &str) -> Self {
        host.clone_into(&mut self.host);
        self
    }

    /// Set the listening port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the assistant display name.
    #[must_use]
    pub fn with_assistant_name(mut self, name: &str) -> Self {
        name.clone_into(&mut self.assistant_name);
        self
    }

    /// Set the display name of the default room.
    #[must_use]
    pub fn with_default_room(mut self, name: &str) -> Self {
        name.clone_into(&mut self.default_room);
        self
    }

    /// Set the heartbeat interval.
    #[must_use]
    pub const fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Set the maximum send body size.
    #[must_use]
    pub const fn with_max_body_bytes(mut self, max: usize) -> Self {
        self.max_body_bytes = max;
        self
    }

    /// Set the default history limit.
    #[must_use]
    pub const fn with_history_limit(mut self, limit: u32) -> Self {
        self.history_limit = limit;
        self
    }

    /// Set the per-subscriber queue depth.
    #[must_use]
    pub const fn with_subscriber_buffer(mut self, buffer: usize) -> Self {
        self.subscriber_buffer = buffer;
        self
    }
}
