//! `MultiworldServer` builder and server loop.
//!
//! This is the entry point for running a Multiworld server. It ties
//! together all the layers: transport → protocol → session → room.

use std::sync::Arc;

use multiworld_protocol::{Codec, JsonCodec};
use multiworld_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::{Multiworld, MultiworldConfig, MultiworldError};

/// Shared server state passed to each connection handler task.
///
/// The coordinator sits behind one lock; a handler holds it for the whole
/// dispatch of a request so multi-step operations are atomic.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) multiworld: Mutex<Multiworld>,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Multiworld server.
///
/// # Example
///
/// ```rust,no_run
/// use multiworld::prelude::*;
///
/// # async fn run() -> Result<(), MultiworldError> {
/// let server = MultiworldServer::builder()
///     .bind("0.0.0.0:3000")
///     .config(MultiworldConfig {
///         max_clients: Some(64),
///         ..MultiworldConfig::default()
///     })
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct MultiworldServerBuilder {
    bind_addr: String,
    config: MultiworldConfig,
}

impl MultiworldServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            config: MultiworldConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the client and room limits.
    pub fn config(mut self, config: MultiworldConfig) -> Self {
        self.config = config;
        self
    }

    /// Binds the listener and builds the server.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<MultiworldServer<JsonCodec>, MultiworldError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            multiworld: Mutex::new(Multiworld::new(self.config)),
            codec: JsonCodec,
        });

        Ok(MultiworldServer { transport, state })
    }
}

impl Default for MultiworldServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Multiworld server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct MultiworldServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl MultiworldServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> MultiworldServerBuilder {
        MultiworldServerBuilder::new()
    }
}

impl<C: Codec> MultiworldServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), MultiworldError> {
        tracing::info!(addr = ?self.local_addr().ok(), "multiworld server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
