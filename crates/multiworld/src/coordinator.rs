//! The session coordinator: one facade over the client registry and the
//! room directory.
//!
//! Every operation except [`Multiworld::authenticate_client`] answers with
//! an [`Envelope`]; domain failures come back as error envelopes
//! (`payload.error == true`) carrying the same action as the request.

use multiworld_protocol::{
    Action, ClientId, Envelope, ItemReport, ItemRoute, Payload, RoomId,
};
use multiworld_room::{Room, RoomDirectory, RoomError};
use multiworld_session::{Client, ClientRegistry, ConnectionHandle, SessionError};
use multiworld_transport::ConnectionId;

use crate::MultiworldConfig;

/// Owns all server state: who is connected and which rooms exist.
///
/// Not thread-safe by itself; the server keeps it behind one lock held
/// for the whole handling of an envelope.
pub struct Multiworld {
    clients: ClientRegistry,
    rooms: RoomDirectory,
}

impl Multiworld {
    /// Creates an empty coordinator with the given limits.
    pub fn new(config: MultiworldConfig) -> Self {
        Self {
            clients: ClientRegistry::new(config.registry()),
            rooms: RoomDirectory::new(config.rooms()),
        }
    }

    /// Registers a new client for `payload.playerId`.
    ///
    /// # Errors
    /// Malformed input and a full server are raised as [`SessionError`];
    /// there is no client yet to report them to.
    pub fn authenticate_client(
        &mut self,
        payload: &Payload,
        connection: ConnectionHandle,
    ) -> Result<Envelope, SessionError> {
        let client = self
            .clients
            .authenticate(payload.player_id.as_ref(), connection)?;
        Ok(Envelope::multi(
            Action::Authenticate,
            Payload {
                message: Some("Client successfully authenticated.".into()),
                identity: Some(client.identity.clone()),
                client: Some(client.info()),
                ..Payload::default()
            },
        ))
    }

    /// Creates a room with the client as its only member.
    pub fn create_room(&mut self, identity: &ClientId) -> Envelope {
        let Some(client) = self.clients.get_mut(identity) else {
            return not_connected(Action::CreateRoom, identity);
        };
        let room_id = self.rooms.create_room(client);
        Envelope::multi(
            Action::CreateRoom,
            Payload {
                message: Some(format!("Room '{room_id}' created successfully.")),
                room_id: Some(room_id),
                client: Some(client.info()),
                ..Payload::default()
            },
        )
    }

    /// Moves the client into `room_id`, leaving its current room first.
    pub fn join_room(&mut self, room_id: &RoomId, identity: &ClientId) -> Envelope {
        let Some(client) = self.clients.get_mut(identity) else {
            return not_connected(Action::JoinRoom, identity);
        };
        match self.rooms.join_room(room_id, client) {
            Ok(()) => Envelope::multi(
                Action::JoinRoom,
                Payload {
                    message: Some(format!("Room '{room_id}' joined successfully.")),
                    client: Some(client.info()),
                    ..Payload::default()
                },
            ),
            Err(e) => {
                tracing::debug!(%room_id, client_id = %identity, error = %e, "join rejected");
                Envelope::error(Action::JoinRoom, format!("Unable to join room. {e}"))
            }
        }
    }

    /// Takes the client out of `room_id`.
    pub fn leave_room(&mut self, room_id: &RoomId, identity: &ClientId) -> Envelope {
        let Some(client) = self.clients.get_mut(identity) else {
            return not_connected(Action::LeaveRoom, identity);
        };
        match self.rooms.leave_room(room_id, client) {
            Ok(()) => Envelope::multi(
                Action::LeaveRoom,
                Payload {
                    message: Some(format!("Room '{room_id}' left successfully.")),
                    client: Some(client.info()),
                    ..Payload::default()
                },
            ),
            Err(e) => {
                tracing::debug!(%room_id, client_id = %identity, error = %e, "leave rejected");
                Envelope::error(Action::LeaveRoom, format!("Unable to leave room. {e}"))
            }
        }
    }

    /// Logs the client out, leaving its room first.
    ///
    /// If leaving the room fails, that failure is returned and the client
    /// stays registered.
    pub fn remove_client(&mut self, identity: &ClientId) -> Envelope {
        let Some(client) = self.clients.get(identity) else {
            return not_connected(Action::Logout, identity);
        };
        if let Some(room_id) = client.room_id.clone() {
            let left = self.leave_room(&room_id, identity);
            if left.is_error() {
                return left;
            }
        }
        match self.clients.remove(identity) {
            Ok(_) => Envelope::multi(
                Action::Logout,
                Payload::message("User disconnected successfully."),
            ),
            Err(e) => Envelope::error(Action::Logout, e.to_string()),
        }
    }

    /// Replaces the item map of the client's current room.
    pub fn load_item_map(&mut self, map: Vec<ItemRoute>, identity: &ClientId) -> Envelope {
        let room_id = match self.current_room(Action::LoadItemMap, identity) {
            Ok(room_id) => room_id,
            Err(reply) => return reply,
        };
        match self.rooms.set_item_map(&room_id, map) {
            Ok(()) => Envelope::multi(
                Action::LoadItemMap,
                Payload {
                    message: Some(format!("Item map loaded into room '{room_id}'.")),
                    room_id: Some(room_id),
                    ..Payload::default()
                },
            ),
            Err(e) => Envelope::error(Action::LoadItemMap, e.to_string()),
        }
    }

    /// Routes an item the client found to the teammate it belongs to.
    ///
    /// The recipient gets an item delivery pushed to its connection; the
    /// returned envelope is the sender's confirmation.
    pub fn handle_item(&mut self, report: ItemReport, identity: &ClientId) -> Envelope {
        let room_id = match self.current_room(Action::Item, identity) {
            Ok(room_id) => room_id,
            Err(reply) => return reply,
        };
        match self.rooms.route_item(&room_id, &report.location, report.from) {
            Ok(route) => Envelope::multi(
                Action::Item,
                Payload::message(format!("Sent {} to player {}.", route.name, route.to)),
            ),
            Err(e) => {
                tracing::debug!(
                    %room_id,
                    client_id = %identity,
                    location = %report.location,
                    error = %e,
                    "item not routed"
                );
                Envelope::error(Action::Item, e.to_string())
            }
        }
    }

    /// Removes every client that authenticated over `conn_id`.
    ///
    /// Called when a connection closes without logging out. Returns how
    /// many clients were removed.
    pub fn disconnect(&mut self, conn_id: ConnectionId) -> usize {
        let mut removed = 0;
        for identity in self.clients.clients_on(conn_id) {
            let reply = self.remove_client(&identity);
            if reply.is_error() {
                tracing::warn!(
                    %conn_id,
                    client_id = %identity,
                    message = reply.message().unwrap_or_default(),
                    "cleanup after disconnect failed"
                );
            } else {
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::info!(%conn_id, removed, "connection clients removed");
        }
        removed
    }

    /// Looks up an authenticated client.
    pub fn client(&self, identity: &ClientId) -> Option<&Client> {
        self.clients.get(identity)
    }

    /// Number of authenticated clients.
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Looks up a live room.
    pub fn room(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn current_room(&self, action: Action, identity: &ClientId) -> Result<RoomId, Envelope> {
        let client = self
            .clients
            .get(identity)
            .ok_or_else(|| not_connected(action, identity))?;
        client
            .room_id
            .clone()
            .ok_or_else(|| Envelope::error(action, RoomError::NotInRoom.to_string()))
    }
}

impl Default for Multiworld {
    fn default() -> Self {
        Self::new(MultiworldConfig::default())
    }
}

fn not_connected(action: Action, identity: &ClientId) -> Envelope {
    Envelope::error(action, SessionError::NotConnected(identity.clone()).to_string())
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Naming convention: `test_{function}_{scenario}_{expected}`.

    use super::*;
    use multiworld_protocol::{Outbound, PlayerId};
    use serde_json::json;
    use tokio::sync::mpsc::UnboundedReceiver;

    struct Player {
        identity: ClientId,
        rx: UnboundedReceiver<Outbound>,
    }

    fn login(mw: &mut Multiworld, conn: u64, player: i64) -> Player {
        let (handle, rx) = ConnectionHandle::channel(ConnectionId::new(conn));
        let payload = Payload {
            player_id: Some(json!(player)),
            ..Payload::default()
        };
        let reply = mw.authenticate_client(&payload, handle).expect("should authenticate");
        Player {
            identity: reply.payload.identity.expect("identity in reply"),
            rx,
        }
    }

    fn room_of(mw: &Multiworld, player: &Player) -> Option<RoomId> {
        mw.client(&player.identity).and_then(|c| c.room_id.clone())
    }

    fn fire_map() -> Vec<ItemRoute> {
        vec![ItemRoute {
            name: "fire".into(),
            location: "a".into(),
            from: PlayerId(0),
            to: PlayerId(1),
        }]
    }

    fn report(location: &str, from: i64) -> ItemReport {
        ItemReport {
            name: "fire".into(),
            location: location.into(),
            from: PlayerId(from),
        }
    }

    // =====================================================================
    // authenticate_client()
    // =====================================================================

    #[test]
    fn test_authenticate_client_returns_identity_and_client() {
        let mut mw = Multiworld::default();
        let (handle, _rx) = ConnectionHandle::channel(ConnectionId::new(1));
        let payload = Payload {
            player_id: Some(json!(0)),
            ..Payload::default()
        };

        let reply = mw.authenticate_client(&payload, handle).unwrap();

        assert_eq!(reply.action, Action::Authenticate);
        assert!(!reply.is_error());
        assert_eq!(reply.message(), Some("Client successfully authenticated."));
        let client = reply.payload.client.expect("client echoed");
        assert!(!client.identity.as_str().is_empty());
        assert_eq!(client.player_id, PlayerId(0));
        assert_eq!(client.room_id, None);
        assert_eq!(mw.client_count(), 1);
    }

    #[test]
    fn test_authenticate_client_missing_player_id_raises() {
        let mut mw = Multiworld::default();
        let (handle, _rx) = ConnectionHandle::channel(ConnectionId::new(1));

        let result = mw.authenticate_client(&Payload::default(), handle);

        assert!(matches!(result, Err(SessionError::MissingPlayerId)));
        assert_eq!(mw.client_count(), 0);
    }

    #[test]
    fn test_authenticate_client_over_capacity_raises() {
        let mut mw = Multiworld::new(MultiworldConfig {
            max_clients: Some(1),
            ..MultiworldConfig::default()
        });
        login(&mut mw, 1, 0);
        let (handle, _rx) = ConnectionHandle::channel(ConnectionId::new(2));
        let payload = Payload {
            player_id: Some(json!(1)),
            ..Payload::default()
        };

        let result = mw.authenticate_client(&payload, handle);

        assert!(matches!(result, Err(SessionError::CapacityReached(1))));
    }

    // =====================================================================
    // create_room() / join_room()
    // =====================================================================

    #[test]
    fn test_create_room_reports_room_and_client() {
        let mut mw = Multiworld::default();
        let alice = login(&mut mw, 1, 0);

        let reply = mw.create_room(&alice.identity);

        let room_id = reply.payload.room_id.clone().expect("room id in reply");
        assert_eq!(
            reply.message(),
            Some(format!("Room '{room_id}' created successfully.").as_str())
        );
        assert_eq!(reply.payload.client.unwrap().room_id, Some(room_id.clone()));
        assert_eq!(mw.room_count(), 1);
    }

    #[test]
    fn test_create_room_unknown_client_returns_not_connected() {
        let mut mw = Multiworld::default();
        let reply = mw.create_room(&ClientId::new("ghost1"));
        assert!(reply.is_error());
        assert_eq!(reply.action, Action::CreateRoom);
        assert_eq!(reply.message(), Some("User not in list of connected clients."));
        assert_eq!(mw.room_count(), 0);
    }

    #[test]
    fn test_join_room_missing_room_prefixes_message() {
        let mut mw = Multiworld::default();
        let alice = login(&mut mw, 1, 0);

        let reply = mw.join_room(&RoomId::new("asdf"), &alice.identity);

        assert!(reply.is_error());
        assert_eq!(
            reply.message(),
            Some("Unable to join room. Room 'asdf' does not exist.")
        );
    }

    #[test]
    fn test_join_room_empty_id_prefixes_message() {
        let mut mw = Multiworld::default();
        let alice = login(&mut mw, 1, 0);

        let reply = mw.join_room(&RoomId::new(""), &alice.identity);

        assert_eq!(reply.message(), Some("Unable to join room. No roomId provided."));
    }

    #[test]
    fn test_join_room_duplicate_player_leaves_room_size_unchanged() {
        let mut mw = Multiworld::default();
        let alice = login(&mut mw, 1, 0);
        let impostor = login(&mut mw, 2, 0);
        let room_id = mw.create_room(&alice.identity).payload.room_id.unwrap();

        let reply = mw.join_room(&room_id, &impostor.identity);

        assert_eq!(
            reply.message(),
            Some("Unable to join room. Client with same playerId already exists in room.")
        );
        assert_eq!(mw.room(&room_id).unwrap().len(), 1);
    }

    #[test]
    fn test_join_room_from_other_room_moves_client() {
        let mut mw = Multiworld::default();
        let alice = login(&mut mw, 1, 0);
        let bob = login(&mut mw, 2, 1);
        let first = mw.create_room(&alice.identity).payload.room_id.unwrap();
        let second = mw.create_room(&bob.identity).payload.room_id.unwrap();

        let reply = mw.join_room(&first, &bob.identity);

        assert!(!reply.is_error());
        assert_eq!(room_of(&mw, &bob), Some(first.clone()));
        assert!(mw.room(&second).is_none(), "abandoned room is deleted");
        assert_eq!(mw.room(&first).unwrap().len(), 2);
    }

    // =====================================================================
    // leave_room()
    // =====================================================================

    #[test]
    fn test_leave_room_twice_second_reports_not_in_room() {
        let mut mw = Multiworld::default();
        let alice = login(&mut mw, 1, 0);
        let room_id = mw.create_room(&alice.identity).payload.room_id.unwrap();

        let first = mw.leave_room(&room_id, &alice.identity);
        let second = mw.leave_room(&room_id, &alice.identity);

        assert_eq!(
            first.message(),
            Some(format!("Room '{room_id}' left successfully.").as_str())
        );
        assert_eq!(
            second.message(),
            Some("Unable to leave room. User is not in a room.")
        );
        assert_eq!(mw.room_count(), 0);
    }

    #[test]
    fn test_leave_room_wrong_room_names_it() {
        let mut mw = Multiworld::default();
        let alice = login(&mut mw, 1, 0);
        mw.create_room(&alice.identity);

        let reply = mw.leave_room(&RoomId::new("asdf"), &alice.identity);

        assert_eq!(
            reply.message(),
            Some("Unable to leave room. User is not in room 'asdf'.")
        );
        assert_eq!(mw.room_count(), 1);
    }

    // =====================================================================
    // remove_client() / disconnect()
    // =====================================================================

    #[test]
    fn test_remove_client_leaves_room_then_unregisters() {
        let mut mw = Multiworld::default();
        let alice = login(&mut mw, 1, 0);
        let room_id = mw.create_room(&alice.identity).payload.room_id.unwrap();

        let reply = mw.remove_client(&alice.identity);

        assert_eq!(reply.action, Action::Logout);
        assert_eq!(reply.message(), Some("User disconnected successfully."));
        assert!(mw.room(&room_id).is_none());
        assert_eq!(mw.client_count(), 0);
    }

    #[test]
    fn test_remove_client_unknown_returns_not_connected() {
        let mut mw = Multiworld::default();
        let reply = mw.remove_client(&ClientId::new("ghost1"));
        assert!(reply.is_error());
        assert_eq!(reply.action, Action::Logout);
        assert_eq!(reply.message(), Some("User not in list of connected clients."));
    }

    #[test]
    fn test_disconnect_removes_only_clients_on_connection() {
        let mut mw = Multiworld::default();
        let alice = login(&mut mw, 1, 0);
        let bob = login(&mut mw, 2, 1);
        let room_id = mw.create_room(&alice.identity).payload.room_id.unwrap();
        mw.join_room(&room_id, &bob.identity);

        let removed = mw.disconnect(ConnectionId::new(1));

        assert_eq!(removed, 1);
        assert!(mw.client(&alice.identity).is_none());
        assert!(mw.client(&bob.identity).is_some());
        assert_eq!(mw.room(&room_id).unwrap().player_ids(), vec![PlayerId(1)]);
    }

    #[test]
    fn test_disconnect_unknown_connection_removes_nothing() {
        let mut mw = Multiworld::default();
        login(&mut mw, 1, 0);
        assert_eq!(mw.disconnect(ConnectionId::new(9)), 0);
        assert_eq!(mw.client_count(), 1);
    }

    // =====================================================================
    // load_item_map() / handle_item()
    // =====================================================================

    #[test]
    fn test_load_item_map_outside_room_returns_not_in_room() {
        let mut mw = Multiworld::default();
        let alice = login(&mut mw, 1, 0);

        let reply = mw.load_item_map(fire_map(), &alice.identity);

        assert!(reply.is_error());
        assert_eq!(reply.action, Action::LoadItemMap);
        assert_eq!(reply.message(), Some("User is not in a room."));
    }

    #[test]
    fn test_handle_item_before_map_returns_no_map() {
        let mut mw = Multiworld::default();
        let alice = login(&mut mw, 1, 0);
        mw.create_room(&alice.identity);

        let reply = mw.handle_item(report("a", 0), &alice.identity);

        assert_eq!(reply.message(), Some("Room has no item map loaded."));
    }

    #[test]
    fn test_handle_item_unmapped_location_returns_unexpected() {
        let mut mw = Multiworld::default();
        let alice = login(&mut mw, 1, 0);
        mw.create_room(&alice.identity);
        mw.load_item_map(fire_map(), &alice.identity);

        let reply = mw.handle_item(report("b", 0), &alice.identity);

        assert_eq!(
            reply.message(),
            Some("Player 0 should not have a dummy item at location b.")
        );
    }

    #[test]
    fn test_handle_item_recipient_absent_returns_error() {
        let mut mw = Multiworld::default();
        let alice = login(&mut mw, 1, 0);
        mw.create_room(&alice.identity);
        mw.load_item_map(fire_map(), &alice.identity);

        let reply = mw.handle_item(report("a", 0), &alice.identity);

        assert_eq!(reply.message(), Some("No player with playerId 1 in room!"));
    }

    #[test]
    fn test_handle_item_end_to_end_delivers_to_teammate() {
        let mut mw = Multiworld::default();
        let mut alice = login(&mut mw, 1, 0);
        let mut bob = login(&mut mw, 2, 1);
        let room_id = mw.create_room(&alice.identity).payload.room_id.unwrap();
        assert!(!mw.join_room(&room_id, &bob.identity).is_error());

        let loaded = mw.load_item_map(fire_map(), &alice.identity);
        assert_eq!(
            loaded.message(),
            Some(format!("Item map loaded into room '{room_id}'.").as_str())
        );

        let reply = mw.handle_item(report("a", 0), &alice.identity);

        assert!(!reply.is_error());
        assert_eq!(reply.message(), Some("Sent fire to player 1."));

        let delivery = bob
            .rx
            .try_recv()
            .ok()
            .and_then(Outbound::into_envelope)
            .expect("bob receives the item");
        assert_eq!(delivery.action, Action::Item);
        assert_eq!(
            delivery.payload.item,
            Some(json!({ "name": "fire", "location": "a", "from": 0, "to": 1 }))
        );
        assert!(alice.rx.try_recv().is_err());
    }
}
