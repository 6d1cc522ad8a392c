//! Server-Sent Events stream of a room.
//!
//! Clients connect to `GET /rooms/{room}/events` and receive:
//!
//! - a `: connected` comment as soon as the stream opens
//! - one `event: message` frame per chat message, with the message JSON
//!   as `data`
//! - a `: heartbeat` comment whenever the hub's keep-alive fires
//!
//! The stream is backed by a hub [`Subscription`](crate::hub::Subscription).
//! When the client disconnects, Axum drops the response body, which
//! drops the subscription and unregisters it from the hub.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::sse::{Event, Sse};
use futures::stream::{self, Stream, StreamExt};
use parlor_types::RoomId;
use tracing::debug;

use crate::error::GatewayError;
use crate::hub::HubEvent;
use crate::state::AppState;

/// Open a live event stream for a room.
///
/// The room does not have to be registered; the hub is passive and a
/// stream for an unknown room simply never carries messages.
///
/// # Route
///
/// `GET /rooms/{room}/events`
pub async fn room_events(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, GatewayError> {
    let room = RoomId::parse(&room)?;
    let subscription = state.hub.subscribe(&room.jid());
    debug!(room = %room, subscriber = %subscription.handle().id(), "Event stream opened");

    let connected = stream::once(async { Ok(Event::default().comment("connected")) });
    let events = subscription.map(|event| Ok(to_sse(&event)));

    Ok(Sse::new(connected.chain(events)))
}

/// Convert a hub event into an SSE frame.
fn to_sse(event: &HubEvent) -> Event {
    match event {
        HubEvent::Heartbeat => Event::default().comment("heartbeat"),
        HubEvent::Message(json) => Event::default().event("message").data(&**json),
    }
}

