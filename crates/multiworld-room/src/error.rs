//! Error types for the room layer.
//!
//! The `Display` strings are the tail of the message shown to players;
//! the coordinator prefixes them with the failed operation
//! ("Unable to join room. ...").

use multiworld_protocol::{ClientId, PlayerId, ProtocolError, RoomId};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// A join named no room.
    #[error("No roomId provided.")]
    NoRoomId,

    /// The room does not exist.
    #[error("Room '{0}' does not exist.")]
    NotFound(RoomId),

    /// Another member already plays as this player number.
    #[error("Client with same playerId already exists in room.")]
    DuplicatePlayer(PlayerId),

    /// The room has reached its member limit.
    #[error("Room '{0}' is full.")]
    RoomFull(RoomId),

    /// The client is not in any room.
    #[error("User is not in a room.")]
    NotInRoom,

    /// The client is in a room, but not the one named.
    #[error("{}", not_in_this_room(.0))]
    NotInThisRoom(RoomId),

    /// The client points at a room whose member list does not contain it.
    #[error("Client is not in room.")]
    ClientNotInRoom(ClientId, RoomId),

    /// Items were reported before a map was loaded.
    #[error("Room has no item map loaded.")]
    NoMap(RoomId),

    /// The map has no route for this location and sender.
    #[error("Player {from} should not have a dummy item at location {location}.")]
    UnexpectedItem { location: String, from: PlayerId },

    /// The route's receiving player is not a member of the room.
    #[error("No player with playerId {0} in room!")]
    RecipientNotPresent(PlayerId),

    /// The item delivery could not be encoded.
    #[error("Could not deliver item: {0}")]
    Delivery(#[from] ProtocolError),
}

fn not_in_this_room(room_id: &RoomId) -> String {
    if room_id.is_empty() {
        "No roomId provided.".to_string()
    } else {
        format!("User is not in room '{room_id}'.")
    }
}
