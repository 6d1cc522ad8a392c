//! Shared application state for the web gateway.
//!
//! [`AppState`] bundles the injected collaborators (store and
//! orchestrator), the gateway configuration and the broadcast [`Hub`].
//! It is wrapped in [`Arc`] and injected via Axum's `State` extractor.

use std::sync::Arc;

use parlor_store::ChatStore;

use crate::config::GatewayConfig;
use crate::hub::Hub;
use crate::orchestrator::Orchestrator;

/// Shared state for the Axum application.
#[derive(Clone)]
pub struct AppState {
    /// Gateway settings.
    pub config: GatewayConfig,
    /// Durable message history and room registry.
    pub store: Arc<dyn ChatStore>,
    /// Live fan-out of messages to open event streams.
    pub hub: Hub,
    /// Receiver of inbound message notifications.
    pub orchestrator: Arc<dyn Orchestrator>,
}

impl AppState {
    /// Create the state, with a fresh hub sized from `config`.
    pub fn new(
        config: GatewayConfig,
        store: Arc<dyn ChatStore>,
        orchestrator: Arc<dyn Orchestrator>,
    ) -> Self {
        let hub = Hub::new(config.heartbeat_interval, config.subscriber_buffer);
        Self {
            config,
            store,
            hub,
            orchestrator,
        }
    }
}

impl core::fmt::Debug for AppState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppState")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("hub", &self.hub)
            .finish_non_exhaustive()
    }
}
