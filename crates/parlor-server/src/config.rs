//! Configuration loading for the Parlor server.
//!
//! The configuration lives in `parlor-config.yaml` in the working
//! directory. Every field has a default, so a missing file or a partial
//! file is fine. A handful of environment variables override the file so
//! deployments can inject secrets and addresses without editing it.

use std::path::Path;
use std::time::Duration;

use parlor_gateway::GatewayConfig;
use parlor_store::SqliteConfig;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override could not be parsed.
    #[error("invalid value {value:?} for {name}: {reason}")]
    InvalidOverride {
        /// The environment variable.
        name: &'static str,
        /// The rejected value.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level server configuration.
///
/// Mirrors the structure of `parlor-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ParlorConfig {
    /// Listening address.
    #[serde(default)]
    pub server: ServerConfig,

    /// Chat gateway behaviour.
    #[serde(default)]
    pub gateway: GatewaySection,

    /// Message store connection.
    #[serde(default)]
    pub store: StoreConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Reference agent configuration.
    #[serde(default)]
    pub agent: AgentConfig,
}

impl ParlorConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `PARLOR_HOST` overrides `server.host`
    /// - `PARLOR_PORT` overrides `server.port`
    /// - `PARLOR_AUTH_TOKEN` overrides `gateway.auth_token`
    /// - `ASSISTANT_NAME` overrides `gateway.assistant_name`
    /// - `DATABASE_URL` overrides `store.url`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::InvalidOverride`] if an override cannot be parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string. No overrides are applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(val) = lookup("PARLOR_HOST") {
            self.server.host = val;
        }
        if let Some(val) = lookup("PARLOR_PORT") {
            match val.trim().parse() {
                Ok(port) => self.server.port = port,
                Err(e) => {
                    return Err(ConfigError::InvalidOverride {
                        name: "PARLOR_PORT",
                        value: val,
                        reason: e.to_string(),
                    });
                }
            }
        }
        if let Some(val) = lookup("PARLOR_AUTH_TOKEN") {
            self.gateway.auth_token = Some(val);
        }
        if let Some(val) = lookup("ASSISTANT_NAME") {
            self.gateway.assistant_name = val;
        }
        if let Some(val) = lookup("DATABASE_URL") {
            self.store.url = val;
        }
        Ok(())
    }

    /// The configured access token, if it is set and not blank.
    pub fn auth_token(&self) -> Option<&str> {
        self.gateway
            .auth_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    /// Build the gateway settings, using `auth_token` as the access token.
    pub fn gateway_config(&self, auth_token: &str) -> GatewayConfig {
        let gateway = &self.gateway;
        GatewayConfig {
            host: self.server.host.clone(),
            port: self.server.port,
            auth_token: auth_token.to_owned(),
            assistant_name: gateway.assistant_name.clone(),
            user_name: gateway.user_name.clone(),
            default_room: gateway.default_room.clone(),
            heartbeat_interval: Duration::from_secs(gateway.heartbeat_secs.max(1)),
            max_body_bytes: gateway.max_body_bytes,
            history_limit: gateway.history_limit,
            subscriber_buffer: gateway.subscriber_buffer,
        }
    }

    /// Build the store connection settings.
    pub fn store_config(&self) -> SqliteConfig {
        SqliteConfig::new(&self.store.url).with_max_connections(self.store.max_connections)
    }
}

/// Listening address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Host or IP address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Chat gateway behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatewaySection {
    /// Display name of the assistant.
    #[serde(default = "default_assistant_name")]
    pub assistant_name: String,

    /// Display name of browser users.
    #[serde(default = "default_user_name")]
    pub user_name: String,

    /// Display name of the room registered at startup.
    #[serde(default = "default_room")]
    pub default_room: String,

    /// Seconds between keep-alive heartbeats on idle streams.
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,

    /// Maximum accepted send body in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Default number of history messages returned.
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,

    /// Events queued per subscriber before it is dropped.
    #[serde(default = "default_subscriber_buffer")]
    pub subscriber_buffer: usize,

    /// Shared access token. Generated at startup when absent.
    #[serde(default)]
    pub auth_token: Option<String>,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            assistant_name: default_assistant_name(),
            user_name: default_user_name(),
            default_room: default_room(),
            heartbeat_secs: default_heartbeat_secs(),
            max_body_bytes: default_max_body_bytes(),
            history_limit: default_history_limit(),
            subscriber_buffer: default_subscriber_buffer(),
            auth_token: None,
        }
    }
}

/// Message store connection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    /// `SQLite` connection URL.
    #[serde(default = "default_store_url")]
    pub url: String,

    /// Maximum number of pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Reference agent configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AgentConfig {
    /// Reply to every message with an echo.
    #[serde(default = "default_echo")]
    pub echo: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            echo: default_echo(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

const fn default_port() -> u16 {
    3100
}

fn default_assistant_name() -> String {
    "Andy".to_owned()
}

fn default_user_name() -> String {
    "You".to_owned()
}

fn default_room() -> String {
    "Main".to_owned()
}

const fn default_heartbeat_secs() -> u64 {
    30
}

const fn default_max_body_bytes() -> usize {
    100_000
}

const fn default_history_limit() -> u32 {
    50
}

const fn default_subscriber_buffer() -> usize {
    64
}

fn default_store_url() -> String {
    "sqlite://parlor.db".to_owned()
}

const fn default_max_connections() -> u32 {
    5
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_echo() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ParlorConfig::default();
        assert_eq!(config.server.port, 3100);
        assert_eq!(config.gateway.assistant_name, "Andy");
        assert_eq!(config.gateway.heartbeat_secs, 30);
        assert_eq!(config.store.url, "sqlite://parlor.db");
        assert!(config.agent.echo);
        assert!(config.auth_token().is_none());
    }

    #[test]
    fn parse_partial_yaml_fills_defaults() {
        let yaml = r#"
server:
  port: 8080
gateway:
  assistant_name: "Bob"
  auth_token: "s3cret"
logging:
  json: true
"#;
        let config = ParlorConfig::parse(yaml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.gateway.assistant_name, "Bob");
        assert_eq!(config.gateway.user_name, "You");
        assert_eq!(config.auth_token(), Some("s3cret"));
        assert!(config.logging.json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parse_empty_yaml_is_default() {
        let config = ParlorConfig::parse("{}").unwrap();
        assert_eq!(config, ParlorConfig::default());
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let result = ParlorConfig::parse("server: [unclosed");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn overrides_replace_file_values() {
        let vars: HashMap<&str, &str> = [
            ("PARLOR_HOST", "0.0.0.0"),
            ("PARLOR_PORT", "9000"),
            ("PARLOR_AUTH_TOKEN", "from-env"),
            ("ASSISTANT_NAME", "Eve"),
            ("DATABASE_URL", "sqlite::memory:"),
        ]
        .into_iter()
        .collect();

        let mut config = ParlorConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| (*v).to_owned()))
            .unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.auth_token(), Some("from-env"));
        assert_eq!(config.gateway.assistant_name, "Eve");
        assert_eq!(config.store.url, "sqlite::memory:");
    }

    #[test]
    fn invalid_port_override_is_an_error() {
        let mut config = ParlorConfig::default();
        let result =
            config.apply_overrides(|key| (key == "PARLOR_PORT").then(|| "not-a-port".to_owned()));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidOverride { name: "PARLOR_PORT", value, .. }) if value == "not-a-port"
        ));
        assert_eq!(config.server.port, 3100);
    }

    #[test]
    fn blank_token_counts_as_missing() {
        let config = ParlorConfig::parse("gateway:\n  auth_token: \"  \"\n").unwrap();
        assert!(config.auth_token().is_none());
    }

    #[test]
    fn gateway_config_carries_every_setting() {
        let config = ParlorConfig::parse(
            "gateway:\n  heartbeat_secs: 5\n  history_limit: 20\n  default_room: Lobby\n",
        )
        .unwrap();
        let gateway = config.gateway_config("tok");
        assert_eq!(gateway.auth_token, "tok");
        assert_eq!(gateway.heartbeat_interval, Duration::from_secs(5));
        assert_eq!(gateway.history_limit, 20);
        assert_eq!(gateway.default_room, "Lobby");
        assert_eq!(gateway.port, 3100);
    }
}
