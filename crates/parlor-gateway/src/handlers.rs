//! HTTP handlers for the gateway's pages and REST endpoints.
//!
//! All handlers receive shared state via Axum's `State` extractor and
//! return either a success response or a [`GatewayError`] that converts
//! into the matching HTTP status. Authorization has already been checked
//! by the time a handler runs.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, JsonRejection, QueryRejection};
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use parlor_types::{ChatMessage, RoomId};
use serde::{Deserialize, Serialize};

use crate::auth::AccessToken;
use crate::config::MAX_HISTORY_LIMIT;
use crate::error::GatewayError;
use crate::messages;
use crate::pages;
use crate::rooms::{self, CreatedRoom, RoomSummary};
use crate::state::AppState;

// =============================================================================
// Pages
// =============================================================================

/// Query parameters of the root page.
#[derive(Debug, Default, Deserialize)]
pub struct IndexQuery {
    /// Always show the room list, even with a single room.
    pub list: Option<String>,
}

/// Serve the root page.
///
/// With exactly one room this is that room's chat page; otherwise (or
/// when `?list` is given) it is the room list.
///
/// # Route
///
/// `GET /`
pub async fn index(
    State(state): State<Arc<AppState>>,
    Extension(AccessToken(token)): Extension<AccessToken>,
    Query(params): Query<IndexQuery>,
) -> Result<Html<String>, GatewayError> {
    let mut registered = state.store.rooms().await?;
    let only_room = if params.list.is_none() && registered.len() == 1 {
        registered.pop()
    } else {
        None
    };

    if let Some((room, id)) = only_room.and_then(|room| room.room_id().map(|id| (room, id))) {
        return pages::chat_page(&room, &id, &token, &state.config.assistant_name);
    }

    let summaries = rooms::list_rooms(state.store.as_ref()).await?;
    pages::room_list_page(&summaries, &token)
}

/// Serve the chat page of one room.
///
/// # Route
///
/// `GET /{room}`
pub async fn room_page(
    State(state): State<Arc<AppState>>,
    Extension(AccessToken(token)): Extension<AccessToken>,
    Path(room): Path<String>,
) -> Result<Html<String>, GatewayError> {
    let id = RoomId::parse(&room)?;
    let registered = rooms::find_room(state.store.as_ref(), &id)
        .await?
        .ok_or_else(|| GatewayError::NotFound(format!("room {id} not found")))?;

    pages::chat_page(&registered, &id, &token, &state.config.assistant_name)
}

// =============================================================================
// Rooms
// =============================================================================

/// Request body of `POST /rooms`.
#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    /// Human-entered display name.
    pub name: Option<String>,
}

/// List every room, oldest first.
///
/// # Route
///
/// `GET /rooms`
pub async fn list_rooms(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RoomSummary>>, GatewayError> {
    Ok(Json(rooms::list_rooms(state.store.as_ref()).await?))
}

/// Create a room from a display name.
///
/// # Route
///
/// `POST /rooms`
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateRoomRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedRoom>), GatewayError> {
    let Json(request) = body.map_err(|e| GatewayError::InvalidRequest(e.body_text()))?;
    let name = request.name.unwrap_or_default();

    let created = rooms::create_room(
        state.store.as_ref(),
        &name,
        &state.config.assistant_name,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// =============================================================================
// Messages
// =============================================================================

/// Response body of a successful send.
#[derive(Debug, Serialize, Deserialize)]
pub struct SendResponse {
    /// Always `true`.
    pub ok: bool,
    /// The stored message.
    pub message: ChatMessage,
}

/// Accept a message typed into a room.
///
/// # Route
///
/// `POST /rooms/{room}/send`
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<SendResponse>, GatewayError> {
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            GatewayError::PayloadTooLarge {
                limit: state.config.max_body_bytes,
            }
        } else {
            GatewayError::InvalidRequest(rejection.body_text())
        }
    })?;

    let text = messages::parse_send_body(&body)?;
    let id = RoomId::parse(&room)?;
    let message = messages::ingest(&state, &id, &text).await?;

    Ok(Json(SendResponse { ok: true, message }))
}

/// Query parameters of the history endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    /// Maximum number of messages to return.
    pub limit: Option<u32>,
}

/// Fetch the most recent messages of a room in chronological order.
///
/// # Route
///
/// `GET /rooms/{room}/history?limit=N`
pub async fn history(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
    params: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<Vec<ChatMessage>>, GatewayError> {
    let Query(params) = params.map_err(|e| GatewayError::InvalidRequest(e.body_text()))?;
    let id = RoomId::parse(&room)?;
    let limit = params
        .limit
        .unwrap_or(state.config.history_limit)
        .clamp(1, MAX_HISTORY_LIMIT);

    let messages = state.store.recent_messages(&id.jid(), limit).await?;
    Ok(Json(messages))
}

/// Structured 404 for any path that matches no route.
pub async fn not_found() -> impl IntoResponse {
    GatewayError::NotFound(String::from("no such route"))
}
