//! Basic type definitions for the chat relay
//!
//! Provides the `SessionId` newtype and the name of the default room.

use uuid::Uuid;

/// Name of the room every session lands in after authenticating.
///
/// Always present in the room directory and never removed.
pub const DEFAULT_ROOM: &str = "Global";

/// Unique session identifier (newtype pattern)
///
/// Wraps a UUID v4 for type-safe session identification.
/// Implements Hash and Eq for use as HashMap keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random session ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_unique() {
        let id1 = SessionId::new();
        let id2 = SessionId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_session_id_display_is_uuid() {
        let id = SessionId::new();
        assert_eq!(id.to_string(), id.0.to_string());
        assert_eq!(id.to_string().len(), 36);
    }
}
