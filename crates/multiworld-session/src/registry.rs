//! The client registry: every authenticated client, keyed by identity.
//!
//! # Concurrency note
//!
//! `ClientRegistry` is a plain `HashMap` wrapper and not thread-safe by
//! itself. It is owned by the coordinator, which the server keeps behind
//! a single lock for the duration of each request.

use std::collections::HashMap;

use multiworld_protocol::ClientId;
use multiworld_transport::ConnectionId;
use serde_json::Value;

use crate::auth::parse_player_id;
use crate::identity::generate_identity;
use crate::{Client, ConnectionHandle, RegistryConfig, SessionError};

/// Tracks all authenticated clients.
///
/// ```text
/// authenticate() ──→ [registered] ──→ remove()
///                         │
///                         └── room_id assigned/cleared by the room layer
/// ```
pub struct ClientRegistry {
    clients: HashMap<ClientId, Client>,
    config: RegistryConfig,
}

impl ClientRegistry {
    /// Creates a new, empty registry with the given limits.
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            clients: HashMap::new(),
            config,
        }
    }

    /// Registers a new client for the stated player number.
    ///
    /// Player numbers are not checked for uniqueness here; that only
    /// matters inside a room.
    ///
    /// # Errors
    /// - [`SessionError::MissingPlayerId`] / [`SessionError::InvalidPlayerId`]
    ///   if `player_id` is absent or not an integer
    /// - [`SessionError::CapacityReached`] if `max_clients` are registered
    pub fn authenticate(
        &mut self,
        player_id: Option<&Value>,
        connection: ConnectionHandle,
    ) -> Result<&Client, SessionError> {
        let player_id = parse_player_id(player_id)?;

        if let Some(max) = self.config.max_clients {
            if self.clients.len() >= max {
                return Err(SessionError::CapacityReached(max));
            }
        }

        let identity = ClientId::new(generate_identity(|candidate| {
            self.clients.contains_key(&ClientId::new(candidate))
        }));

        tracing::info!(
            client_id = %identity,
            %player_id,
            conn_id = %connection.id(),
            "client authenticated"
        );

        let client = Client {
            identity: identity.clone(),
            player_id,
            connection,
            room_id: None,
        };
        Ok(&*self.clients.entry(identity).or_insert(client))
    }

    /// Looks up a client by identity.
    pub fn get(&self, identity: &ClientId) -> Option<&Client> {
        self.clients.get(identity)
    }

    /// Looks up a client by identity for mutation.
    pub fn get_mut(&mut self, identity: &ClientId) -> Option<&mut Client> {
        self.clients.get_mut(identity)
    }

    /// Returns `true` if the identity is registered.
    pub fn contains(&self, identity: &ClientId) -> bool {
        self.clients.contains_key(identity)
    }

    /// Unregisters a client and returns its record.
    ///
    /// The caller is responsible for taking the client out of its room
    /// first; the registry does not know about rooms.
    ///
    /// # Errors
    /// Returns [`SessionError::NotConnected`] if the identity is unknown.
    pub fn remove(&mut self, identity: &ClientId) -> Result<Client, SessionError> {
        let client = self
            .clients
            .remove(identity)
            .ok_or_else(|| SessionError::NotConnected(identity.clone()))?;
        tracing::info!(client_id = %identity, "client removed");
        Ok(client)
    }

    /// Identities of every client that authenticated over `conn_id`.
    pub fn clients_on(&self, conn_id: ConnectionId) -> Vec<ClientId> {
        self.clients
            .values()
            .filter(|c| c.connection.id() == conn_id)
            .map(|c| c.identity.clone())
            .collect()
    }

    /// Returns the number of registered clients.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Returns `true` if no client is registered.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================
