//! Server-wide limits.

use multiworld_room::RoomConfig;
use multiworld_session::RegistryConfig;

/// Limits for one [`Multiworld`](crate::Multiworld) instance.
///
/// `None` means unlimited, which is the default for both fields.
#[derive(Debug, Clone, Default)]
pub struct MultiworldConfig {
    /// Maximum number of simultaneously authenticated clients.
    pub max_clients: Option<usize>,
    /// Maximum number of members in any single room.
    pub max_room_members: Option<usize>,
}

impl MultiworldConfig {
    pub(crate) fn registry(&self) -> RegistryConfig {
        RegistryConfig {
            max_clients: self.max_clients,
        }
    }

    pub(crate) fn rooms(&self) -> RoomConfig {
        RoomConfig {
            max_members: self.max_room_members,
        }
    }
}
