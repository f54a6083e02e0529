//! # Multiworld
//!
//! Session coordinator for multiworld randomizer games: players
//! authenticate, gather in rooms, load a shared item map, and forward each
//! item they pick up to the teammate it belongs to.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use multiworld::prelude::*;
//!
//! # async fn run() -> Result<(), MultiworldError> {
//! multiworld::init_tracing();
//! let server = MultiworldServer::builder()
//!     .bind("0.0.0.0:3000")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```
//!
//! The coordinator can also be driven directly, without a socket:
//!
//! ```rust
//! use multiworld::prelude::*;
//! use multiworld::{ConnectionHandle, ConnectionId};
//!
//! let mut mw = Multiworld::default();
//! let (conn, _outbound) = ConnectionHandle::channel(ConnectionId::new(1));
//! let payload = Payload { player_id: Some(0.into()), ..Payload::default() };
//!
//! let reply = mw.authenticate_client(&payload, conn).unwrap();
//! let me = reply.payload.identity.unwrap();
//! let created = mw.create_room(&me);
//! assert!(!created.is_error());
//! assert_eq!(mw.room_count(), 1);
//! ```

mod config;
mod coordinator;
mod dispatcher;
mod error;
mod handler;
mod server;

pub use config::MultiworldConfig;
pub use coordinator::Multiworld;
pub use dispatcher::dispatch;
pub use error::MultiworldError;
pub use multiworld_session::ConnectionHandle;
pub use multiworld_transport::ConnectionId;
pub use server::{MultiworldServer, MultiworldServerBuilder};

/// Installs a `tracing` subscriber filtered by `RUST_LOG` (default `info`).
///
/// Does nothing if a global subscriber is already set.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub mod prelude {
    pub use crate::{Multiworld, MultiworldConfig, MultiworldError, MultiworldServer, MultiworldServerBuilder};
    pub use multiworld_protocol::{
        Action, Category, ClientId, ClientInfo, Envelope, ItemReport, ItemRoute, Payload, PlayerId,
        RoomId,
    };
}
