//! Error types for the web gateway.
//!
//! [`GatewayError`] unifies all failure modes into a single enum that
//! can be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. Every
//! error body has the shape `{"error": "...", "status": <code>}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use parlor_store::StoreError;
use parlor_types::RoomIdError;
use tracing::error;

use crate::server::ServerError;

/// Errors that can occur in the web gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The request did not present the configured access token.
    #[error("unauthorized")]
    Unauthorized,

    /// The requested room or resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A room identifier in the request path is malformed.
    #[error("invalid room id: {0}")]
    InvalidRoomId(#[from] RoomIdError),

    /// A room display name yields no usable identifier.
    #[error("invalid room name: {0:?}")]
    InvalidRoomName(String),

    /// A room with the same identifier is already registered.
    #[error("room already exists: {name:?}")]
    RoomExists {
        /// The display name the client asked for.
        name: String,
    },

    /// The request body is not acceptable.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The request body exceeded the configured limit.
    #[error("payload too large (limit {limit} bytes)")]
    PayloadTooLarge {
        /// The configured limit in bytes.
        limit: usize,
    },

    /// The store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A page template failed to load or render.
    #[error("template error: {0}")]
    Template(String),

    /// The HTTP server could not be started.
    #[error(transparent)]
    Server(#[from] ServerError),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, String::from("unauthorized")),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::InvalidRoomId(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            Self::InvalidRoomName(_) => (
                StatusCode::BAD_REQUEST,
                String::from("room name must contain at least one letter or digit"),
            ),
            Self::RoomExists { name } => {
                let body = serde_json::json!({
                    "error": "room already exists",
                    "status": StatusCode::CONFLICT.as_u16(),
                    "name": name,
                });
                return (StatusCode::CONFLICT, axum::Json(body)).into_response();
            }
            Self::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::PayloadTooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, self.to_string())
            }
            Self::Store(e) => {
                error!("Store failure while handling request: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    String::from("internal storage error"),
                )
            }
            Self::Serialization(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("JSON error: {e}"))
            }
            Self::Template(msg) => {
                error!("Page rendering failed: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    String::from("page rendering failed"),
                )
            }
            Self::Server(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
