//! Axum router construction for the web gateway.
//!
//! Assembles pages, REST endpoints and the SSE stream into a single
//! [`Router`]. Layers, from the outside in:
//!
//! 1. request tracing
//! 2. CORS for browser clients on other origins; the CORS layer answers
//!    every `OPTIONS` request itself with an empty success response
//! 3. access-token check (matched routes only, so unknown paths are 404)
//!
//! A known path requested with the wrong method is also a 404, with the
//! same JSON error body as any other unmatched request.

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::events;
use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router for the gateway.
///
/// The router includes:
/// - `GET /` -- room list, or the chat page when there is only one room
/// - `GET /rooms` -- list rooms
/// - `POST /rooms` -- create a room
/// - `GET /rooms/{room}/events` -- SSE stream of a room
/// - `POST /rooms/{room}/send` -- post a message
/// - `GET /rooms/{room}/history` -- recent messages
/// - `GET /{room}` -- chat page of a room
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    let body_limit = state.config.max_body_bytes;

    Router::new()
        // Pages
        .route("/", get(handlers::index))
        .route("/{room}", get(handlers::room_page))
        // Rooms
        .route("/rooms", get(handlers::list_rooms).post(handlers::create_room))
        // Per-room endpoints
        .route("/rooms/{room}/events", get(events::room_events))
        .route(
            "/rooms/{room}/send",
            post(handlers::send_message).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/rooms/{room}/history", get(handlers::history))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth::require_token,
        ))
        .method_not_allowed_fallback(handlers::not_found)
        .fallback(handlers::not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

