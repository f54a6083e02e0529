//! Maps one inbound envelope onto a coordinator call.
//!
//! Only `AUTHENTICATE` runs without a known client. Every other action
//! resolves the sender by `payload.identity` first, and the two actions
//! carrying structured data validate it before any state is touched.

use multiworld_protocol::schema::{validate_item_map, validate_item_report};
use multiworld_protocol::{Action, Category, ClientId, Envelope, Payload, RoomId};
use multiworld_session::{ConnectionHandle, SessionError};
use multiworld_transport::ConnectionId;

use crate::Multiworld;

const INVALID_ITEM_MAP: &str = "Cannot load item map. Map is not valid.";
const INVALID_ITEM: &str = "Cannot read item info.";

/// Handles one request and returns the reply for the sender.
///
/// `Ok(None)` means the request gets an empty reply (reserved `OTHER`
/// category).
///
/// # Errors
/// Authentication faults are returned as-is; the caller decides how to
/// surface them.
pub fn dispatch(
    multiworld: &mut Multiworld,
    envelope: Envelope,
    connection: &ConnectionHandle,
) -> Result<Option<Envelope>, SessionError> {
    if envelope.category != Category::Multi {
        tracing::debug!(conn_id = %connection.id(), action = %envelope.action, "ignoring non-MULTI envelope");
        return Ok(None);
    }

    let Envelope {
        action, payload, ..
    } = envelope;
    let conn_id = connection.id();

    let reply = match action {
        Action::Authenticate => {
            return multiworld
                .authenticate_client(&payload, connection.clone())
                .map(Some);
        }
        Action::Logout => with_client(multiworld, action, &payload, conn_id, |mw, id| {
            mw.remove_client(id)
        }),
        Action::CreateRoom => with_client(multiworld, action, &payload, conn_id, |mw, id| {
            mw.create_room(id)
        }),
        Action::JoinRoom => with_client(multiworld, action, &payload, conn_id, |mw, id| {
            let room_id = payload.room_id.clone().unwrap_or_else(|| RoomId::new(""));
            mw.join_room(&room_id, id)
        }),
        Action::LeaveRoom => with_client(multiworld, action, &payload, conn_id, |mw, id| {
            let room_id = payload
                .room_id
                .clone()
                .or_else(|| mw.client(id).and_then(|c| c.room_id.clone()))
                .unwrap_or_else(|| RoomId::new(""));
            mw.leave_room(&room_id, id)
        }),
        Action::LoadItemMap => with_client(multiworld, action, &payload, conn_id, |mw, id| {
            match validate_item_map(payload.item_map.as_ref()) {
                Ok(map) => mw.load_item_map(map, id),
                Err(e) => {
                    tracing::debug!(client_id = %id, error = %e, "item map rejected");
                    Envelope::error(action, INVALID_ITEM_MAP)
                }
            }
        }),
        Action::Item => with_client(multiworld, action, &payload, conn_id, |mw, id| {
            match validate_item_report(payload.item.as_ref()) {
                Ok(report) => mw.handle_item(report, id),
                Err(e) => {
                    tracing::debug!(client_id = %id, error = %e, "item report rejected");
                    Envelope::error(action, INVALID_ITEM)
                }
            }
        }),
    };
    Ok(Some(reply))
}

/// Resolves the sender by `payload.identity` and runs `serve` for it.
///
/// Unknown or missing identities get the not-connected error instead.
fn with_client(
    multiworld: &mut Multiworld,
    action: Action,
    payload: &Payload,
    conn_id: ConnectionId,
    serve: impl FnOnce(&mut Multiworld, &ClientId) -> Envelope,
) -> Envelope {
    let identity = payload
        .sender_identity()
        .cloned()
        .unwrap_or_else(|| ClientId::new(""));
    if multiworld.client(&identity).is_none() {
        tracing::debug!(%conn_id, %action, client_id = %identity, "request from unknown client");
        return Envelope::error(action, SessionError::NotConnected(identity).to_string());
    }
    serve(multiworld, &identity)
}
