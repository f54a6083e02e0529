//! Error types for the protocol layer.
//!
//! Each Multiworld crate defines its own error enum, so a `ProtocolError`
//! always means a serialization problem, never a room or session one.

/// Errors that can occur while encoding or decoding envelopes.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into bytes).
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Deserialization failed: malformed JSON, an unknown action, or a
    /// missing `category`/`action`.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),
}
