//! Holder of the current authoritative snapshot.
//!
//! The store never edits a snapshot in place. Each sync installs a new one
//! wholesale and bumps the generation counter; readers get a shared handle
//! to whichever snapshot was fully installed last.

use std::sync::Arc;

use orchard_types::Snapshot;

/// Single-slot snapshot store.
#[derive(Debug, Clone, Default)]
pub struct StateStore {
    current: Option<Arc<Snapshot>>,
    generation: u64,
}

impl StateStore {
    /// Empty store; nothing has been synced yet.
    pub const fn new() -> Self {
        Self {
            current: None,
            generation: 0,
        }
    }

    /// Replace the current snapshot. Returns the new generation.
    pub fn install(&mut self, snapshot: Snapshot) -> u64 {
        self.current = Some(Arc::new(snapshot));
        self.generation = self.generation.saturating_add(1);
        self.generation
    }

    /// The current snapshot, if any sync has completed.
    pub fn current(&self) -> Option<&Snapshot> {
        self.current.as_deref()
    }

    /// Shared handle to the current snapshot.
    pub fn share(&self) -> Option<Arc<Snapshot>> {
        self.current.clone()
    }

    /// Number of installs so far.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Drop the current snapshot, e.g. when the session ends.
    pub fn clear(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use orchard_types::UserProfile;

    use super::*;

    fn snapshot(money: i64) -> Snapshot {
        Snapshot {
            user: UserProfile {
                username: "fern".to_owned(),
                money,
            },
            ..Snapshot::default()
        }
    }

    #[test]
    fn install_replaces_wholesale() {
        let mut store = StateStore::new();
        assert!(store.current().is_none());
        assert_eq!(store.install(snapshot(10)), 1);
        let held = store.share();
        assert_eq!(store.install(snapshot(20)), 2);

        assert_eq!(store.current().map(|s| s.user.money), Some(20));
        // A handle taken earlier still sees the snapshot it was taken from.
        assert_eq!(held.map(|s| s.user.money), Some(10));
    }

    #[test]
    fn clear_keeps_generation() {
        let mut store = StateStore::new();
        store.install(snapshot(1));
        store.clear();
        assert!(store.current().is_none());
        assert_eq!(store.generation(), 1);
    }
}
