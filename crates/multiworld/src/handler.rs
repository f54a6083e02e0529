//! Per-connection handler: read requests, dispatch, write replies.
//!
//! Each accepted connection gets its own Tokio task running this handler,
//! plus a writer task draining the connection's outbound channel. Replies,
//! including the bare `{}`, share that channel with item deliveries pushed
//! by other connections, so frames reach the socket in the order they were
//! queued.

use std::sync::Arc;

use multiworld_protocol::{Codec, Inbound, Outbound};
use multiworld_session::ConnectionHandle;
use multiworld_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use crate::MultiworldError;
use crate::dispatcher::dispatch;
use crate::server::ServerState;

/// Drop guard that cleans up a connection when the handler exits.
///
/// Stops the writer task and removes every client that authenticated over
/// the connection. Since `Drop` is synchronous, the async lock is taken in
/// a fire-and-forget task.
struct DisconnectGuard<C: Codec> {
    conn_id: ConnectionId,
    writer: JoinHandle<()>,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for DisconnectGuard<C> {
    fn drop(&mut self) {
        self.writer.abort();
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.multiworld.lock().await.disconnect(conn_id);
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), MultiworldError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let (handle, outbound) = ConnectionHandle::channel(conn_id);
    let writer = tokio::spawn(write_outbound(Arc::clone(&conn), Arc::clone(&state), outbound));
    let _guard = DisconnectGuard {
        conn_id,
        writer,
        state: Arc::clone(&state),
    };

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let envelope = match state.codec.decode(&data) {
            Ok(Inbound::Request(env)) => env,
            Ok(Inbound::Reserved) => {
                handle.send_empty();
                continue;
            }
            Ok(Inbound::UnknownAction(name)) => {
                tracing::warn!(%conn_id, action = %name, "unknown action, ignoring");
                continue;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode frame");
                continue;
            }
        };
        let action = envelope.action;
        tracing::debug!(%conn_id, %action, "request received");

        let result = {
            let mut multiworld = state.multiworld.lock().await;
            dispatch(&mut multiworld, envelope, &handle)
        };

        match result {
            Ok(Some(reply)) => {
                handle.send(reply);
            }
            Ok(None) => {
                handle.send_empty();
            }
            Err(e) => {
                tracing::warn!(%conn_id, %action, error = %e, "request rejected");
            }
        }
    }

    // _guard drops here → writer stops and the connection's clients are removed.
    Ok(())
}

/// Drains the outbound channel onto the socket until either side closes.
async fn write_outbound<C: Codec>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<C>>,
    mut outbound: UnboundedReceiver<Outbound>,
) {
    let conn_id = conn.id();
    while let Some(frame) = outbound.recv().await {
        let bytes = match state.codec.encode(&frame) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(%conn_id, error = %e, "failed to encode frame");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(%conn_id, error = %e, "send failed, stopping writer");
            break;
        }
    }
}
