//! Error types for the session layer.

use multiworld_protocol::ClientId;

/// Errors raised by the client registry.
///
/// The `Display` strings are the exact messages shown to players.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The authenticate request carried no `playerId`.
    #[error("Could not authenticate client. A playerId is required.")]
    MissingPlayerId,

    /// The `playerId` was present but not an integer.
    #[error("Could not authenticate client. The 'playerId' field is not a number.")]
    InvalidPlayerId,

    /// The configured client limit is already reached.
    #[error("Could not authenticate client. The server is full ({0} clients).")]
    CapacityReached(usize),

    /// No registered client has this identity. Either it never
    /// authenticated or it already logged out.
    #[error("User not in list of connected clients.")]
    NotConnected(ClientId),
}
