//! Unified error type for the Multiworld server.

use multiworld_protocol::{ProtocolError, SchemaError};
use multiworld_room::RoomError;
use multiworld_session::SessionError;
use multiworld_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum MultiworldError {
    /// A transport-level error (accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A wire-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A structured payload failed validation.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A session-level error (authentication, unknown client).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level error (not found, duplicate player, routing).
    #[error(transparent)]
    Room(#[from] RoomError),
}
