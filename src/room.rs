//! Room directory
//!
//! Owns the set of known room names. Rooms are never removed, and the
//! directory does no I/O: callers announce new rooms themselves.

use std::collections::HashSet;

use crate::types::DEFAULT_ROOM;

/// Known room names in creation order
///
/// Always contains `DEFAULT_ROOM` as its first entry.
#[derive(Debug)]
pub struct RoomDirectory {
    /// Names in insertion order
    order: Vec<String>,
    /// Same names, for O(1) lookup
    names: HashSet<String>,
}

impl RoomDirectory {
    /// Create a directory holding only the default room
    pub fn new() -> Self {
        let mut directory = Self {
            order: Vec::new(),
            names: HashSet::new(),
        };
        directory.create(DEFAULT_ROOM);
        directory
    }

    /// Add a room if it does not exist yet
    ///
    /// Returns true if the room was newly created. Names are case-sensitive
    /// and not validated, so the empty string is a valid room.
    pub fn create(&mut self, name: &str) -> bool {
        if !self.names.insert(name.to_string()) {
            return false;
        }
        self.order.push(name.to_string());
        true
    }

    /// Check whether a room exists
    pub fn exists(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Room names in creation order, default room first
    pub fn list(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Number of known rooms
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Default for RoomDirectory {
    fn default() -> Self {
        Self::new()
    }
}
