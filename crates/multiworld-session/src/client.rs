//! Client types: the server's record of one authenticated player.

use multiworld_protocol::{ClientId, ClientInfo, Envelope, Outbound, PlayerId, RoomId};
use multiworld_transport::ConnectionId;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// RegistryConfig
// ---------------------------------------------------------------------------

/// Limits applied by the [`ClientRegistry`](crate::ClientRegistry).
#[derive(Debug, Clone, Default)]
pub struct RegistryConfig {
    /// Maximum number of simultaneously registered clients.
    /// `None` (the default) means unlimited.
    pub max_clients: Option<usize>,
}

// ---------------------------------------------------------------------------
// ConnectionHandle
// ---------------------------------------------------------------------------

/// A reference to the connection a client talks over.
///
/// The connection itself is owned by the transport; this handle only
/// queues frames for its writer task, which writes them in queue order.
/// Cloning is cheap.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    sender: mpsc::UnboundedSender<Outbound>,
}

impl ConnectionHandle {
    /// Creates a handle plus the receiver its writer task should drain.
    pub fn channel(id: ConnectionId) -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { id, sender }, receiver)
    }

    /// The transport connection this handle writes to.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queues an envelope for delivery.
    ///
    /// Fire-and-forget: returns `false` if the connection's writer is gone,
    /// and nothing is retried.
    pub fn send(&self, envelope: Envelope) -> bool {
        self.push(Outbound::Envelope(envelope))
    }

    /// Queues the bare `{}` reply.
    pub fn send_empty(&self) -> bool {
        self.push(Outbound::Empty)
    }

    fn push(&self, frame: Outbound) -> bool {
        let delivered = self.sender.send(frame).is_ok();
        if !delivered {
            tracing::debug!(conn_id = %self.id, "dropping frame for closed connection");
        }
        delivered
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// One authenticated client.
///
/// `room_id` is a back-reference used for lookups; the room's member list
/// is the authoritative record of who is in it. Every join and leave
/// assigns it explicitly.
#[derive(Debug, Clone)]
pub struct Client {
    pub identity: ClientId,
    pub player_id: PlayerId,
    pub connection: ConnectionHandle,
    pub room_id: Option<RoomId>,
}

impl Client {
    /// The view of this client echoed back to game clients.
    pub fn info(&self) -> ClientInfo {
        ClientInfo {
            identity: self.identity.clone(),
            player_id: self.player_id,
            room_id: self.room_id.clone(),
        }
    }
}
