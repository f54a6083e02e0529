//! Wire protocol for the Multiworld server.
//!
//! - **Types** ([`Envelope`], [`Action`], [`Payload`], [`ItemRoute`], ...):
//!   the message structures exchanged with game clients.
//! - **Schema** ([`schema`]): shape checks for item maps and item reports.
//! - **Frames** ([`Inbound`], [`Outbound`]): what one connection reads and
//!   writes, classified by category first.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): bytes to envelopes and back.
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Session / Room (state)
//! ```

mod codec;
mod error;
mod frame;
pub mod schema;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use frame::{Inbound, Outbound};
pub use schema::SchemaError;
pub use types::{
    Action, Category, ClientId, ClientInfo, Envelope, ItemReport, ItemRoute,
    Payload, PlayerId, RoomId,
};
