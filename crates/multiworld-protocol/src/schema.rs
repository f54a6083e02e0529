//! Shape validation for structured payloads.
//!
//! Item maps and item reports arrive as raw JSON. They are checked here,
//! before the coordinator runs, so a malformed payload can never touch
//! room state. Extra fields are ignored; every declared field is required
//! and `from`/`to` must be integers.

use serde_json::Value;

use crate::{ItemReport, ItemRoute};

/// Why a structured payload was rejected.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The payload field was absent or `null`.
    #[error("missing field '{0}'")]
    Missing(&'static str),

    /// The field was present but did not match the schema.
    #[error("field '{field}' does not match the schema: {source}")]
    Invalid {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Validates an item map: an array of `{ name, location, from, to }`.
///
/// An empty array is a valid (if useless) map.
pub fn validate_item_map(value: Option<&Value>) -> Result<Vec<ItemRoute>, SchemaError> {
    let value = present(value, "itemMap")?;
    serde_json::from_value(value.clone()).map_err(|source| SchemaError::Invalid {
        field: "itemMap",
        source,
    })
}

/// Validates an item report: `{ name, location, from }`.
pub fn validate_item_report(value: Option<&Value>) -> Result<ItemReport, SchemaError> {
    let value = present(value, "item")?;
    serde_json::from_value(value.clone()).map_err(|source| SchemaError::Invalid {
        field: "item",
        source,
    })
}

fn present<'a>(value: Option<&'a Value>, field: &'static str) -> Result<&'a Value, SchemaError> {
    match value {
        None | Some(Value::Null) => Err(SchemaError::Missing(field)),
        Some(v) => Ok(v),
    }
}
