//! Message ingestion and delivery.
//!
//! Both directions follow the same shape: build the [`ChatMessage`],
//! persist it, then fan it out to the room's open event streams. A message
//! that cannot be stored is never broadcast.

use parlor_types::{ChatMessage, ChatMetadata, RoomId, owns_jid};
use serde_json::Value;
use tracing::debug;

use crate::error::GatewayError;
use crate::rooms;
use crate::state::AppState;

/// Extract the message text from a raw send body.
///
/// The body must be a JSON object whose `text` field is a string that is
/// not blank. The returned text is trimmed.
pub fn parse_send_body(body: &[u8]) -> Result<String, GatewayError> {
    let parsed: Value = serde_json::from_slice(body)
        .map_err(|e| GatewayError::InvalidRequest(format!("invalid JSON body: {e}")))?;
    let Some(object) = parsed.as_object() else {
        return Err(GatewayError::InvalidRequest(String::from(
            "body must be a JSON object",
        )));
    };

    let text = match object.get("text") {
        Some(Value::String(text)) => text,
        Some(Value::Null) | None => {
            return Err(GatewayError::InvalidRequest(String::from("text is required")));
        }
        Some(_) => {
            return Err(GatewayError::InvalidRequest(String::from(
                "text must be a string",
            )));
        }
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(GatewayError::InvalidRequest(String::from(
            "text must not be empty",
        )));
    }
    Ok(trimmed.to_owned())
}

/// Accept a message typed by a human into a room.
///
/// The message is stored, the orchestrator is notified (metadata first),
/// and the message is broadcast to the room. Returns the stored message.
///
/// # Errors
///
/// Returns [`GatewayError::NotFound`] for an unregistered room and
/// [`GatewayError::Store`] if the message cannot be persisted; in both
/// cases nothing is broadcast and the orchestrator is not called.
pub async fn ingest(
    state: &AppState,
    room: &RoomId,
    text: &str,
) -> Result<ChatMessage, GatewayError> {
    let registered = rooms::find_room(state.store.as_ref(), room)
        .await?
        .ok_or_else(|| GatewayError::NotFound(format!("room {room} not found")))?;

    let message = ChatMessage::from_human(&registered.jid, &state.config.user_name, text);
    state.store.append_message(&message).await?;

    let metadata = ChatMetadata::web(
        &registered.jid,
        Some(&registered.name),
        &message.timestamp,
    );
    state.orchestrator.on_chat_metadata(&metadata);
    state
        .orchestrator
        .on_inbound_message(&registered.jid, &message);

    let delivered = state.hub.publish(&registered.jid, &message);
    debug!(
        room = %room,
        message_id = %message.id,
        delivered,
        "Inbound message accepted"
    );
    Ok(message)
}

/// Deliver an agent-authored message to a room.
///
/// Rooms outside the web address space are ignored. `persona` overrides
/// the assistant display name for this one message.
///
/// # Errors
///
/// Returns [`GatewayError::Store`] if the message cannot be persisted, in
/// which case it is not broadcast.
pub async fn deliver(
    state: &AppState,
    jid: &str,
    text: &str,
    persona: Option<&str>,
) -> Result<Option<ChatMessage>, GatewayError> {
    if !owns_jid(jid) {
        debug!(room = jid, "Ignoring outbound message for a foreign room");
        return Ok(None);
    }

    let message = ChatMessage::from_agent(jid, &state.config.assistant_name, persona, text);
    state.store.append_message(&message).await?;

    let delivered = state.hub.publish(jid, &message);
    debug!(
        room = jid,
        message_id = %message.id,
        delivered,
        "Outbound message delivered"
    );
    Ok(Some(message))
}
