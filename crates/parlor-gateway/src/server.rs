//! Gateway HTTP server lifecycle management.
//!
//! [`bind`] opens the listening socket and [`serve`] runs the Axum server
//! on it until the provided [`CancellationToken`] is cancelled, then
//! waits for open connections to finish.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// Bind a TCP listener on `host:port`.
///
/// `host` may be an IP address or a resolvable host name; port `0` picks
/// a free port.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the address cannot be resolved or is
/// already in use.
pub async fn bind(host: &str, port: u16) -> Result<TcpListener, ServerError> {
    TcpListener::bind((host, port))
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {host}:{port}: {e}")))
}

/// The address a listener is bound to.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the socket has no local address.
pub fn local_addr(listener: &TcpListener) -> Result<SocketAddr, ServerError> {
    listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("no local address: {e}")))
}

/// Serve the gateway on an already bound listener.
///
/// Returns `Ok(())` once `shutdown` is cancelled and every open
/// connection has completed.
///
/// # Errors
///
/// Returns [`ServerError::Serve`] if the server encounters a fatal I/O
/// error.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    let router = build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| ServerError::Serve(format!("serve error: {e}")))?;

    info!("Gateway server stopped");
    Ok(())
}

/// Errors that can occur when starting or running the gateway server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}
