//! Room lifecycle: listing and creating rooms in the Room Registry.
//!
//! A room exists once it is registered in the store. Creation derives the
//! short identifier from the display name and registers it in one atomic
//! step, so two clients racing to create the same room get exactly one
//! success.

use parlor_store::ChatStore;
use parlor_types::{ChatMetadata, RegisteredRoom, RoomId, owns_jid};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::GatewayError;

/// A room as returned by `GET /rooms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    /// Short identifier used in URLs.
    pub id: String,
    /// Human-readable display name.
    pub name: String,
    /// Full room address.
    pub jid: String,
    /// When the room was registered.
    pub created_at: String,
}

impl RoomSummary {
    fn from_registered(room: RegisteredRoom) -> Option<Self> {
        let id = room.room_id()?;
        Some(Self {
            id: id.to_string(),
            name: room.name,
            jid: room.jid,
            created_at: room.added_at,
        })
    }
}

/// A room as returned by `POST /rooms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedRoom {
    /// Short identifier used in URLs.
    pub id: String,
    /// Human-readable display name.
    pub name: String,
    /// Full room address.
    pub jid: String,
}

/// List every web room, oldest first.
///
/// Registry entries outside the web address space are skipped.
pub async fn list_rooms(store: &dyn ChatStore) -> Result<Vec<RoomSummary>, GatewayError> {
    Ok(store
        .rooms()
        .await?
        .into_iter()
        .filter(|room| owns_jid(&room.jid))
        .filter_map(RoomSummary::from_registered)
        .collect())
}

/// Look up a web room by its short identifier.
pub async fn find_room(
    store: &dyn ChatStore,
    id: &RoomId,
) -> Result<Option<RegisteredRoom>, GatewayError> {
    Ok(store.room(&id.jid()).await?)
}

/// Create a room from a human-entered display name.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRoomName`] if the name has no letters
/// or digits, and [`GatewayError::RoomExists`] if a room with the derived
/// identifier is already registered. Nothing is modified in either case.
/// The registry entry and its chat metadata are written together, so a
/// storage failure leaves neither behind.
pub async fn create_room(
    store: &dyn ChatStore,
    name: &str,
    assistant_name: &str,
) -> Result<CreatedRoom, GatewayError> {
    let display_name = name.trim();
    let id = RoomId::from_display_name(display_name)
        .ok_or_else(|| GatewayError::InvalidRoomName(name.to_owned()))?;

    let room = RegisteredRoom::web(&id, display_name, assistant_name);
    let metadata = ChatMetadata::web(&room.jid, Some(display_name), &room.added_at);
    if !store.register_room_with_chat(&room, &metadata).await? {
        debug!(room = %id, "Room already registered");
        return Err(GatewayError::RoomExists {
            name: name.to_owned(),
        });
    }

    info!(room = %id, name = display_name, "Room created");
    Ok(CreatedRoom {
        id: id.to_string(),
        name: room.name,
        jid: room.jid,
    })
}

/// Make sure a room with the given display name exists.
///
/// Used on startup for the default room; an existing room is left as is.
pub async fn ensure_room(
    store: &dyn ChatStore,
    name: &str,
    assistant_name: &str,
) -> Result<RoomId, GatewayError> {
    match create_room(store, name, assistant_name).await {
        Ok(created) => Ok(RoomId::parse(&created.id)?),
        Err(GatewayError::RoomExists { .. }) => RoomId::from_display_name(name)
            .ok_or_else(|| GatewayError::InvalidRoomName(name.to_owned())),
        Err(e) => Err(e),
    }
}
