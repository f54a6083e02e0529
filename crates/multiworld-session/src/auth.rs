//! Self-asserted authentication.
//!
//! There is no credential check: a client authenticates by stating which
//! player number it is. The only thing validated is that the number is
//! actually there and is an integer.

use multiworld_protocol::PlayerId;
use serde_json::Value;

use crate::SessionError;

/// Extracts the player number from a raw `playerId` payload field.
///
/// # Errors
/// - [`SessionError::MissingPlayerId`] if the field is absent or `null`
/// - [`SessionError::InvalidPlayerId`] if it is not an integer (strings,
///   fractions, and numbers outside the `i64` range all count)
pub fn parse_player_id(value: Option<&Value>) -> Result<PlayerId, SessionError> {
    match value {
        None | Some(Value::Null) => Err(SessionError::MissingPlayerId),
        Some(v) => v
            .as_i64()
            .map(PlayerId)
            .ok_or(SessionError::InvalidPlayerId),
    }
}
