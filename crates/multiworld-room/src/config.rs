//! Room configuration.

/// Limits applied to every room a [`RoomDirectory`](crate::RoomDirectory)
/// creates.
#[derive(Debug, Clone, Default)]
pub struct RoomConfig {
    /// Maximum number of members per room. `None` (the default) means
    /// unlimited.
    pub max_members: Option<usize>,
}
