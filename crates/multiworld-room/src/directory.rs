//! Room directory: creates rooms, moves clients between them, and deletes
//! rooms the moment they empty.

use std::collections::HashMap;

use multiworld_protocol::{ClientId, ItemRoute, PlayerId, RoomId};
use multiworld_session::{Client, generate_identity};

use crate::{Member, Room, RoomConfig, RoomError};

/// Owns every live room, keyed by room identity.
///
/// Invariants:
/// - a room exists only while it has at least one member
/// - `client.room_id == Some(r)` exactly when the client is a member of `r`
pub struct RoomDirectory {
    rooms: HashMap<RoomId, Room>,
    config: RoomConfig,
}

impl RoomDirectory {
    /// Creates an empty directory whose rooms use `config`.
    pub fn new(config: RoomConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            config,
        }
    }

    /// Creates a room with `client` as its only member.
    ///
    /// A client that is already in a room leaves it first.
    pub fn create_room(&mut self, client: &mut Client) -> RoomId {
        if let Some(current) = client.room_id.take() {
            self.detach(&current, &client.identity);
        }

        let room_id = RoomId::new(generate_identity(|candidate| {
            self.rooms.contains_key(&RoomId::new(candidate))
        }));
        let room = Room::new(room_id.clone(), Member::from(&*client), &self.config);
        self.rooms.insert(room_id.clone(), room);
        client.room_id = Some(room_id.clone());

        tracing::info!(%room_id, client_id = %client.identity, "room created");
        room_id
    }

    /// Moves `client` into the room `room_id`.
    ///
    /// If the client sits in a different room it leaves that room first,
    /// even when the join then fails; on failure `client.room_id` is
    /// `None`.
    ///
    /// # Errors
    /// - [`RoomError::NoRoomId`] if `room_id` is empty
    /// - [`RoomError::NotFound`] if the room does not exist
    /// - [`RoomError::DuplicatePlayer`] if a member already plays the
    ///   client's player number (including the client itself)
    /// - [`RoomError::RoomFull`] if the room is at its member limit
    pub fn join_room(&mut self, room_id: &RoomId, client: &mut Client) -> Result<(), RoomError> {
        if room_id.is_empty() {
            return Err(RoomError::NoRoomId);
        }
        if !self.rooms.contains_key(room_id) {
            return Err(RoomError::NotFound(room_id.clone()));
        }
        if client.room_id.as_ref() == Some(room_id) {
            return Err(RoomError::DuplicatePlayer(client.player_id));
        }

        if let Some(current) = client.room_id.take() {
            self.detach(&current, &client.identity);
        }

        let room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;
        room.add(Member::from(&*client))?;
        client.room_id = Some(room_id.clone());

        tracing::info!(
            %room_id,
            client_id = %client.identity,
            player_id = %client.player_id,
            members = room.len(),
            "client joined room"
        );
        Ok(())
    }

    /// Takes `client` out of the room `room_id`, deleting the room if it
    /// becomes empty.
    ///
    /// # Errors
    /// - [`RoomError::NotInRoom`] if the client has no room
    /// - [`RoomError::NotInThisRoom`] if `room_id` is not the client's room
    /// - [`RoomError::ClientNotInRoom`] if the room's member list does not
    ///   contain the client
    pub fn leave_room(&mut self, room_id: &RoomId, client: &mut Client) -> Result<(), RoomError> {
        let current = client.room_id.as_ref().ok_or(RoomError::NotInRoom)?;
        if current != room_id {
            return Err(RoomError::NotInThisRoom(room_id.clone()));
        }

        let room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::ClientNotInRoom(client.identity.clone(), room_id.clone()))?;
        room.remove(&client.identity)?;
        client.room_id = None;

        tracing::info!(%room_id, client_id = %client.identity, "client left room");
        self.collect_if_empty(room_id);
        Ok(())
    }

    /// Replaces a room's item map.
    ///
    /// # Errors
    /// Returns [`RoomError::NotFound`] if the room does not exist.
    pub fn set_item_map(&mut self, room_id: &RoomId, map: Vec<ItemRoute>) -> Result<(), RoomError> {
        let room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;
        tracing::info!(%room_id, routes = map.len(), "item map loaded");
        room.set_item_map(map);
        Ok(())
    }

    /// Routes an item found by `from` at `location` to its recipient and
    /// returns the matching route.
    ///
    /// # Errors
    /// - [`RoomError::NotFound`] if the room does not exist
    /// - [`RoomError::NoMap`], [`RoomError::UnexpectedItem`],
    ///   [`RoomError::RecipientNotPresent`], [`RoomError::Delivery`] as in [`Room`]
    pub fn route_item(
        &self,
        room_id: &RoomId,
        location: &str,
        from: PlayerId,
    ) -> Result<ItemRoute, RoomError> {
        let room = self
            .rooms
            .get(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;
        let route = room.item_route(location, from)?;
        let recipient = room.send_item(route)?;
        tracing::debug!(
            %room_id,
            item = %route.name,
            %from,
            to = %route.to,
            recipient = %recipient.identity,
            "item routed"
        );
        Ok(route.clone())
    }

    /// Looks up a room.
    pub fn get(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    /// Returns `true` if the room exists.
    pub fn contains(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    /// Returns the number of live rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Returns `true` if there are no rooms.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Best-effort removal used when a client switches rooms. The client's
    /// own `room_id` has already been cleared by the caller.
    fn detach(&mut self, room_id: &RoomId, identity: &ClientId) {
        let removed = match self.rooms.get_mut(room_id) {
            Some(room) => room.remove(identity).map(|_| ()),
            None => Err(RoomError::NotFound(room_id.clone())),
        };
        match removed {
            Ok(()) => {
                tracing::info!(%room_id, client_id = %identity, "client left room");
                self.collect_if_empty(room_id);
            }
            Err(e) => {
                tracing::debug!(%room_id, client_id = %identity, error = %e, "leave before switch failed");
            }
        }
    }

    fn collect_if_empty(&mut self, room_id: &RoomId) {
        if self.rooms.get(room_id).is_some_and(Room::is_empty) {
            self.rooms.remove(room_id);
            tracing::info!(%room_id, "room destroyed (empty)");
        }
    }
}

impl Default for RoomDirectory {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}
