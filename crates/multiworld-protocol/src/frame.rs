//! What travels over one connection, as the server sees it.
//!
//! Inbound frames are classified by `category` before `action` is read, so
//! a reserved category is recognised whatever its action says. Outbound
//! items are either an [`Envelope`] or the bare `{}` reply.

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::{Action, ClientId, Envelope, Payload};

/// One frame received from a game client.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// A `MULTI` request with a known action.
    Request(Envelope),
    /// Any other category. Reserved, answered with an empty reply.
    Reserved,
    /// A `MULTI` frame naming an action this server does not handle.
    UnknownAction(String),
}

impl Inbound {
    /// Classifies an already-parsed JSON frame.
    ///
    /// A payload that is not an object reads as an empty payload; the
    /// coordinator then answers with the usual structured error. A client
    /// echo too broken to decode still names its sender.
    pub fn classify(frame: Value) -> Self {
        let Value::Object(mut fields) = frame else {
            return Inbound::Reserved;
        };
        if fields.get("category").and_then(Value::as_str) != Some("MULTI") {
            return Inbound::Reserved;
        }

        let raw_action = fields.remove("action").unwrap_or(Value::Null);
        let Ok(action) = Action::deserialize(&raw_action) else {
            let name = match raw_action {
                Value::String(name) => name,
                other => other.to_string(),
            };
            return Inbound::UnknownAction(name);
        };

        let raw_payload = fields.remove("payload").unwrap_or(Value::Null);
        let echoed = raw_payload
            .pointer("/client/identity")
            .and_then(Value::as_str)
            .map(ClientId::new);
        let mut payload = Payload::deserialize(raw_payload).unwrap_or_default();
        if payload.sender_identity().is_none() {
            payload.identity = echoed;
        }
        Inbound::Request(Envelope::multi(action, payload))
    }
}

impl<'de> Deserialize<'de> for Inbound {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Inbound::classify)
    }
}

/// Something queued for a connection's writer.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Envelope(Envelope),
    /// Serializes as `{}`.
    Empty,
}

impl Outbound {
    /// The queued envelope, or `None` for an empty reply.
    pub fn into_envelope(self) -> Option<Envelope> {
        match self {
            Outbound::Envelope(envelope) => Some(envelope),
            Outbound::Empty => None,
        }
    }
}

impl From<Envelope> for Outbound {
    fn from(envelope: Envelope) -> Self {
        Outbound::Envelope(envelope)
    }
}

impl Serialize for Outbound {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Outbound::Envelope(envelope) => envelope.serialize(serializer),
            Outbound::Empty => serializer.serialize_map(Some(0))?.end(),
        }
    }
}
