//! Standalone Multiworld server.
//!
//! Environment:
//! - `MULTIWORLD_ADDR`: listen address (default `0.0.0.0:3000`)
//! - `MULTIWORLD_MAX_CLIENTS`: client limit (default 64, `0` = unlimited)
//! - `MULTIWORLD_MAX_ROOM_MEMBERS`: per-room limit (default unlimited)
//! - `RUST_LOG`: log filter (default `info`)

use multiworld::prelude::*;

const DEFAULT_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CLIENTS: usize = 64;

/// Reads a limit from `value`; `0` means unlimited.
fn parse_limit(name: &str, value: Option<String>, default: Option<usize>) -> Option<usize> {
    let Some(raw) = value else {
        return default;
    };
    match raw.trim().parse::<usize>() {
        Ok(0) => None,
        Ok(n) => Some(n),
        Err(e) => {
            tracing::warn!(%name, %raw, error = %e, "ignoring invalid limit");
            default
        }
    }
}

fn config_from_env() -> MultiworldConfig {
    MultiworldConfig {
        max_clients: parse_limit(
            "MULTIWORLD_MAX_CLIENTS",
            std::env::var("MULTIWORLD_MAX_CLIENTS").ok(),
            Some(DEFAULT_MAX_CLIENTS),
        ),
        max_room_members: parse_limit(
            "MULTIWORLD_MAX_ROOM_MEMBERS",
            std::env::var("MULTIWORLD_MAX_ROOM_MEMBERS").ok(),
            None,
        ),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    multiworld::init_tracing();

    let addr = std::env::var("MULTIWORLD_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let config = config_from_env();
    tracing::info!(
        %addr,
        max_clients = ?config.max_clients,
        max_room_members = ?config.max_room_members,
        "starting multiworld server"
    );

    let server = MultiworldServerBuilder::new()
        .bind(&addr)
        .config(config)
        .build()
        .await?;

    server.run().await?;
    Ok(())
}
