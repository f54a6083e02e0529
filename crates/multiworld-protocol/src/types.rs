//! Core protocol types for the Multiworld wire format.
//!
//! Requests and responses share one shape:
//!
//! ```text
//! { "category": "MULTI", "action": "JOIN_ROOM", "payload": { ... } }
//! ```
//!
//! Fields that need shape validation before the coordinator may look at
//! them (`playerId`, `itemMap`, `item`) are carried as raw JSON values and
//! only turned into typed data by [`crate::schema`] or the client registry.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The in-game player number a client claims when it authenticates.
///
/// Not globally unique: two clients may share a player number as long as
/// they never sit in the same room. Serializes as a plain JSON integer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub i64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identity assigned to a client on authentication.
///
/// Every request after authentication carries this string so the server
/// can find the client again.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    /// Wraps a raw identity string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identity of a room.
///
/// An empty `RoomId` is representable because clients may send `""`;
/// the room layer rejects it explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Wraps a raw room identity string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the empty identity.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Category / Action
// ---------------------------------------------------------------------------

/// Top-level message family.
///
/// Only `MULTI` is handled; `OTHER` is reserved and answered with an
/// empty reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Multi,
    Other,
}

/// What a request asks for (and what a response answers).
///
/// `LOGIN` and `LOAD_MULTI_MAP` are accepted as older spellings of
/// `AUTHENTICATE` and `LOAD_ITEM_MAP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    #[serde(alias = "LOGIN")]
    Authenticate,
    Logout,
    CreateRoom,
    JoinRoom,
    LeaveRoom,
    #[serde(alias = "LOAD_MULTI_MAP")]
    LoadItemMap,
    Item,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Authenticate => "AUTHENTICATE",
            Action::Logout => "LOGOUT",
            Action::CreateRoom => "CREATE_ROOM",
            Action::JoinRoom => "JOIN_ROOM",
            Action::LeaveRoom => "LEAVE_ROOM",
            Action::LoadItemMap => "LOAD_ITEM_MAP",
            Action::Item => "ITEM",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Item routing data
// ---------------------------------------------------------------------------

/// One entry of a room's item map: the item found by `from` at
/// `location` belongs to `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRoute {
    pub name: String,
    pub location: String,
    pub from: PlayerId,
    pub to: PlayerId,
}

/// An item pickup reported by the player who found it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemReport {
    #[serde(alias = "itemName")]
    pub name: String,
    #[serde(alias = "locationId")]
    pub location: String,
    #[serde(alias = "fromPlayer")]
    pub from: PlayerId,
}

/// The public view of a client echoed back in responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub identity: ClientId,
    pub player_id: PlayerId,
    /// `null` on the wire when the client is not in a room.
    #[serde(default)]
    pub room_id: Option<RoomId>,
}

// ---------------------------------------------------------------------------
// Payload / Envelope
// ---------------------------------------------------------------------------

/// Action-specific fields. Every field is optional; which ones matter
/// depends on the action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    /// Raw so that "missing" and "not an integer" stay distinguishable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<Value>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub identity: Option<ClientId>,

    /// Numbers are accepted and kept as their decimal text.
    #[serde(default, deserialize_with = "room_id_or_number", skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_map: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<Value>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientInfo>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub error: Option<bool>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Reads a value of the wrong shape as absent instead of rejecting the
/// whole payload.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

fn room_id_or_number<'de, D>(deserializer: D) -> Result<Option<RoomId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(id) => Some(RoomId::new(id)),
        Value::Number(n) => Some(RoomId::new(n.to_string())),
        _ => None,
    })
}

impl Payload {
    /// A payload carrying only a human-readable message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// The identity the sender claims: `identity`, or `client.identity`
    /// for clients that echo back the whole client object.
    pub fn sender_identity(&self) -> Option<&ClientId> {
        self.identity
            .as_ref()
            .or_else(|| self.client.as_ref().map(|c| &c.identity))
    }
}

/// The top-level message wrapper. Every message on the wire is an Envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub category: Category,
    pub action: Action,
    #[serde(default)]
    pub payload: Payload,
}

impl Envelope {
    /// A `MULTI` envelope with the given payload.
    pub fn multi(action: Action, payload: Payload) -> Self {
        Self {
            category: Category::Multi,
            action,
            payload,
        }
    }

    /// A structured domain error answering `action`.
    pub fn error(action: Action, message: impl Into<String>) -> Self {
        Self::multi(
            action,
            Payload {
                error: Some(true),
                message: Some(message.into()),
                ..Payload::default()
            },
        )
    }

    /// The notification pushed to the player who receives an item.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the route cannot be serialized.
    pub fn item_delivery(route: &ItemRoute) -> Result<Self, ProtocolError> {
        let item = serde_json::to_value(route).map_err(ProtocolError::Encode)?;
        Ok(Self::multi(
            Action::Item,
            Payload {
                item: Some(item),
                ..Payload::default()
            },
        ))
    }

    /// Returns `true` if this envelope reports a domain error.
    pub fn is_error(&self) -> bool {
        self.payload.error == Some(true)
    }

    /// The human-readable message, if any.
    pub fn message(&self) -> Option<&str> {
        self.payload.message.as_deref()
    }
}

// =========================================================================
// Tests
// =========================================================================
