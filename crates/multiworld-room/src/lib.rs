//! Room membership and item routing for the Multiworld server.
//!
//! A room is a small group of clients sharing one item map. Rooms are
//! created on demand and destroyed as soon as their last member leaves.
//!
//! # Key types
//!
//! - [`RoomDirectory`]: creates/destroys rooms, moves clients between them,
//!   routes items
//! - [`Room`]: one room's members and item map
//! - [`RoomConfig`]: per-room limits
//! - [`RoomError`]: every way a room operation can be refused

mod config;
mod directory;
mod error;
mod room;

pub use config::RoomConfig;
pub use directory::RoomDirectory;
pub use error::RoomError;
pub use room::{Member, Room};
