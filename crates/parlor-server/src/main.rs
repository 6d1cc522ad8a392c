//! Parlor server binary.
//!
//! Hosts the web chat gateway with the reference echo agent behind it.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `parlor-config.yaml` (defaults if absent)
//! 2. Initialize structured logging
//! 3. Resolve the access token, generating one when none is configured
//! 4. Open the `SQLite` store and apply migrations
//! 5. Connect the web channel and start the reply worker
//! 6. Wait for Ctrl-C, then disconnect and close the store

mod agent;
mod config;
mod error;

use std::path::Path;
use std::sync::Arc;

use parlor_gateway::WebChannel;
use parlor_store::{ChatStore, SqliteStore};
use rand::Rng;
use rand::distr::Alphanumeric;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::agent::EchoAgent;
use crate::config::{LoggingConfig, ParlorConfig};
use crate::error::ServerError;

/// Configuration file looked up in the working directory.
const CONFIG_PATH: &str = "parlor-config.yaml";

/// Length of a generated access token.
const GENERATED_TOKEN_LEN: usize = 32;

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    let config = load_config()?;
    init_logging(&config.logging);

    info!("Parlor server starting");
    if !Path::new(CONFIG_PATH).exists() {
        info!("Config file not found, using defaults");
    }

    let token = config.auth_token().map_or_else(
        || {
            warn!("No auth token configured, generated one for this run");
            generate_token()
        },
        str::to_owned,
    );

    let store = Arc::new(SqliteStore::connect(&config.store_config()).await?);
    let chat_store: Arc<dyn ChatStore> = store.clone();

    let (echo_agent, inbound) = EchoAgent::new(Arc::clone(&chat_store));
    let channel = Arc::new(WebChannel::new(
        config.gateway_config(&token),
        chat_store,
        Arc::new(echo_agent),
    ));

    let addr = channel.connect().await?;
    info!(
        url = format!("http://{addr}/?token={token}"),
        "Open the chat in a browser"
    );

    let worker = tokio::spawn(agent::run_replies(
        inbound,
        Arc::clone(&channel),
        config.agent.echo,
    ));

    let signal = tokio::signal::ctrl_c().await;

    info!("Shutting down");
    channel.disconnect().await;
    // The agent's sender lives inside the channel, so the queue never
    // closes on its own.
    worker.abort();
    store.close().await;

    signal.map_err(|e| ServerError::Signal {
        message: e.to_string(),
    })?;

    info!("Parlor server stopped");
    Ok(())
}

/// Load configuration from the YAML file, falling back to defaults.
///
/// Environment overrides apply in both cases.
fn load_config() -> Result<ParlorConfig, ServerError> {
    let path = Path::new(CONFIG_PATH);
    if path.exists() {
        Ok(ParlorConfig::from_file(path)?)
    } else {
        let mut config = ParlorConfig::default();
        config.apply_env_overrides()?;
        Ok(config)
    }
}

/// Initialize the tracing subscriber. `RUST_LOG` takes precedence over
/// the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Random alphanumeric access token.
fn generate_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_TOKEN_LEN)
        .map(char::from)
        .collect()
}
