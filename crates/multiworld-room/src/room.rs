//! A single room: its members and its item map.
//!
//! `Room` only enforces invariants local to itself (unique player numbers,
//! member limit, map lookups). Keeping each client's `room_id` in step
//! with membership is the [`RoomDirectory`](crate::RoomDirectory)'s job.

use multiworld_protocol::{ClientId, Envelope, ItemRoute, PlayerId, RoomId};
use multiworld_session::{Client, ConnectionHandle};

use crate::{RoomConfig, RoomError};

/// A room's copy of what it needs to know about one member.
#[derive(Debug, Clone)]
pub struct Member {
    pub identity: ClientId,
    pub player_id: PlayerId,
    pub connection: ConnectionHandle,
}

impl From<&Client> for Member {
    fn from(client: &Client) -> Self {
        Self {
            identity: client.identity.clone(),
            player_id: client.player_id,
            connection: client.connection.clone(),
        }
    }
}

/// A group of clients sharing one item map.
///
/// Members are kept in join order. No two members share a player number.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    members: Vec<Member>,
    item_map: Option<Vec<ItemRoute>>,
    max_members: Option<usize>,
}

impl Room {
    /// Creates a room whose only member is `founder`.
    pub(crate) fn new(id: RoomId, founder: Member, config: &RoomConfig) -> Self {
        Self {
            id,
            members: vec![founder],
            item_map: None,
            max_members: config.max_members,
        }
    }

    /// Returns the room's identity.
    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// Player numbers of all members, in join order.
    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.members.iter().map(|m| m.player_id).collect()
    }

    /// Returns `true` if the client with this identity is a member.
    pub fn contains(&self, identity: &ClientId) -> bool {
        self.members.iter().any(|m| &m.identity == identity)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The loaded item map, if any.
    pub fn item_map(&self) -> Option<&[ItemRoute]> {
        self.item_map.as_deref()
    }

    /// Appends a member.
    ///
    /// # Errors
    /// - [`RoomError::DuplicatePlayer`] if the identity or player number
    ///   is already present
    /// - [`RoomError::RoomFull`] if the member limit is reached
    pub(crate) fn add(&mut self, member: Member) -> Result<(), RoomError> {
        if self
            .members
            .iter()
            .any(|m| m.identity == member.identity || m.player_id == member.player_id)
        {
            return Err(RoomError::DuplicatePlayer(member.player_id));
        }
        if let Some(max) = self.max_members {
            if self.members.len() >= max {
                return Err(RoomError::RoomFull(self.id.clone()));
            }
        }
        self.members.push(member);
        Ok(())
    }

    /// Removes the member with this identity.
    ///
    /// # Errors
    /// Returns [`RoomError::ClientNotInRoom`] if no member has it.
    pub(crate) fn remove(&mut self, identity: &ClientId) -> Result<Member, RoomError> {
        let index = self
            .members
            .iter()
            .position(|m| &m.identity == identity)
            .ok_or_else(|| RoomError::ClientNotInRoom(identity.clone(), self.id.clone()))?;
        Ok(self.members.remove(index))
    }

    /// Replaces the item map wholesale.
    pub fn set_item_map(&mut self, map: Vec<ItemRoute>) {
        self.item_map = Some(map);
    }

    /// Finds the route for an item `from` found at `location`.
    ///
    /// If a map lists the same `(location, from)` pair twice, the first
    /// entry wins.
    ///
    /// # Errors
    /// - [`RoomError::NoMap`] if no map is loaded
    /// - [`RoomError::UnexpectedItem`] if the map has no such route
    pub fn item_route(&self, location: &str, from: PlayerId) -> Result<&ItemRoute, RoomError> {
        let map = self
            .item_map
            .as_ref()
            .ok_or_else(|| RoomError::NoMap(self.id.clone()))?;
        map.iter()
            .find(|route| route.location == location && route.from == from)
            .ok_or_else(|| RoomError::UnexpectedItem {
                location: location.to_string(),
                from,
            })
    }

    /// Pushes an item delivery to the member playing `route.to`.
    ///
    /// # Errors
    /// - [`RoomError::RecipientNotPresent`] if nobody in the room plays
    ///   that player number
    /// - [`RoomError::Delivery`] if the delivery cannot be encoded
    pub fn send_item(&self, route: &ItemRoute) -> Result<&Member, RoomError> {
        let recipient = self
            .members
            .iter()
            .find(|m| m.player_id == route.to)
            .ok_or(RoomError::RecipientNotPresent(route.to))?;
        recipient.connection.send(Envelope::item_delivery(route)?);
        Ok(recipient)
    }
}
