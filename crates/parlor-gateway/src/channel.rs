//! The web channel: the gateway as seen by the host orchestrator.
//!
//! [`WebChannel`] owns the shared [`AppState`] and the lifecycle of the
//! HTTP server. The orchestrator calls [`WebChannel::send_message`] to post
//! agent replies, and receives human messages through the
//! [`Orchestrator`] it handed in at construction.

use std::net::SocketAddr;
use std::sync::Arc;

use parlor_store::ChatStore;
use parlor_types::{WEB_CHANNEL, owns_jid};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::messages;
use crate::orchestrator::Orchestrator;
use crate::rooms;
use crate::server::{self, ServerError};
use crate::state::AppState;

/// A running server task and the token that stops it.
struct Running {
    addr: SocketAddr,
    shutdown: CancellationToken,
    task: JoinHandle<Result<(), ServerError>>,
}

/// Browser-facing chat channel.
pub struct WebChannel {
    state: Arc<AppState>,
    running: Mutex<Option<Running>>,
}

impl WebChannel {
    /// Create a disconnected channel.
    pub fn new(
        config: GatewayConfig,
        store: Arc<dyn ChatStore>,
        orchestrator: Arc<dyn Orchestrator>,
    ) -> Self {
        Self {
            state: Arc::new(AppState::new(config, store, orchestrator)),
            running: Mutex::new(None),
        }
    }

    /// Channel name reported to the orchestrator.
    #[allow(clippy::unused_self)]
    pub const fn name(&self) -> &'static str {
        WEB_CHANNEL
    }

    /// The shared application state.
    pub const fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Register the default room, bind the listener and start serving.
    ///
    /// Returns the bound address. Calling this on a connected channel
    /// returns the existing address.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRoomName`] if the configured default
    /// room name is unusable, [`GatewayError::Store`] if it cannot be
    /// registered, and [`GatewayError::Server`] if the address cannot be
    /// bound.
    pub async fn connect(&self) -> Result<SocketAddr, GatewayError> {
        let mut running = self.running.lock().await;
        if let Some(current) = running.as_ref() {
            return Ok(current.addr);
        }

        let config = &self.state.config;
        let default_room = rooms::ensure_room(
            self.state.store.as_ref(),
            &config.default_room,
            &config.assistant_name,
        )
        .await?;

        let listener = server::bind(&config.host, config.port).await?;
        let addr = server::local_addr(&listener)?;
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(server::serve(
            listener,
            Arc::clone(&self.state),
            shutdown.clone(),
        ));

        info!(%addr, default_room = %default_room, "Web channel listening");
        *running = Some(Running {
            addr,
            shutdown,
            task,
        });
        Ok(addr)
    }

    /// Post an agent-authored message to a room.
    ///
    /// Rooms outside the web address space are silently ignored. `sender`
    /// overrides the assistant display name for this one message.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Store`] if the message cannot be persisted;
    /// it is then not broadcast either.
    pub async fn send_message(
        &self,
        jid: &str,
        text: &str,
        sender: Option<&str>,
    ) -> Result<(), GatewayError> {
        messages::deliver(&self.state, jid, text, sender).await?;
        Ok(())
    }

    /// Whether a room address belongs to this channel.
    #[allow(clippy::unused_self)]
    pub fn owns_jid(&self, jid: &str) -> bool {
        owns_jid(jid)
    }

    /// Whether the server is running.
    pub async fn is_connected(&self) -> bool {
        self.running.lock().await.is_some()
    }

    /// The address the server is bound to, if connected.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.running.lock().await.as_ref().map(|r| r.addr)
    }

    /// Close every event stream and stop the server.
    ///
    /// Waits until the server has finished its open connections. The hub
    /// stays closed afterwards, so a disconnected channel is not meant to
    /// be connected again. Calling this on a disconnected channel does
    /// nothing.
    pub async fn disconnect(&self) {
        let Some(running) = self.running.lock().await.take() else {
            return;
        };

        self.state.hub.shutdown();
        running.shutdown.cancel();
        match running.task.await {
            Ok(Ok(())) => info!(addr = %running.addr, "Web channel disconnected"),
            Ok(Err(e)) => error!("Web server exited with error: {e}"),
            Err(e) => warn!("Web server task did not finish cleanly: {e}"),
        }
    }
}

impl core::fmt::Debug for WebChannel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WebChannel")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
