//! Username uniqueness ledger
//!
//! The registry only ever asks the ledger to reserve or release a name.

use std::collections::HashSet;

/// Reserves display names so no two sessions hold the same one.
pub trait UsernameLedger: Send {
    /// Reserve `name`. Returns true iff it was not already held.
    fn reserve(&mut self, name: &str) -> bool;

    /// Give `name` back. Releasing an unknown name does nothing.
    fn release(&mut self, name: &str);
}

/// In-memory ledger backed by a `HashSet`
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    names: HashSet<String>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UsernameLedger for InMemoryLedger {
    fn reserve(&mut self, name: &str) -> bool {
        if self.names.contains(name) {
            return false;
        }
        self.names.insert(name.to_string())
    }

    fn release(&mut self, name: &str) {
        self.names.remove(name);
    }
}
