//! Client session management for the Multiworld server.
//!
//! 1. **Authentication**: a client states its player number
//!    ([`parse_player_id`])
//! 2. **Identity**: the server hands back a short random identity
//!    ([`generate_identity`])
//! 3. **Registry**: who is connected, and over which connection
//!    ([`ClientRegistry`])
//!
//! ```text
//! Room Layer (above)      ← moves clients in and out of rooms
//!     ↕
//! Session Layer (this crate)
//!     ↕
//! Protocol / Transport    ← ClientId, PlayerId, ConnectionId
//! ```

mod auth;
mod client;
mod error;
mod identity;
mod registry;

pub use auth::parse_player_id;
pub use client::{Client, ConnectionHandle, RegistryConfig};
pub use error::SessionError;
pub use identity::{IDENTITY_ALPHABET, IDENTITY_LEN, generate_identity};
pub use registry::ClientRegistry;
