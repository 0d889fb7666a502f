//! The client's copy of world state.

use std::sync::Arc;

use lorekeeper_core::model::{Npc, WorldEvent, WorldSnapshot};
use serde::Serialize;

/// Everything the client knows about the world, fetched together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorldView {
    /// Narrative state.
    pub snapshot: WorldSnapshot,
    /// NPCs in backend order.
    pub npcs: Vec<Npc>,
    /// Event history, newest first.
    pub events: Vec<WorldEvent>,
}

impl WorldView {
    /// Looks up an NPC by id.
    pub fn npc(&self, npc_id: &str) -> Option<&Npc> {
        self.npcs.iter().find(|npc| npc.id == npc_id)
    }

    /// Display name for `npc_id`, or the id itself when unknown.
    pub fn npc_name<'a>(&'a self, npc_id: &'a str) -> &'a str {
        self.npc(npc_id).map_or(npc_id, Npc::name)
    }

    /// The `limit` most recent events.
    pub fn recent_events(&self, limit: usize) -> &[WorldEvent] {
        &self.events[..self.events.len().min(limit)]
    }
}

/// Returns `true` iff world time moved between the two snapshots.
pub fn has_advanced(previous: &WorldSnapshot, current: &WorldSnapshot) -> bool {
    current.hours_passed != previous.hours_passed
}

/// What a reconcile did with a freshly fetched view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// Nothing was held yet; the view was installed.
    Initial,
    /// World time moved; the view replaced the held one.
    Advanced {
        /// Hours before.
        from: u64,
        /// Hours after.
        to: u64,
    },
    /// World time did not move; the fetched view was discarded.
    Unchanged,
}

/// Holds the latest known [`WorldView`].
///
/// The view is only ever replaced wholesale, so a reader holding the `Arc`
/// returned by [`WorldSyncStore::current`] never observes a mix of old and
/// new fields.
#[derive(Debug, Default)]
pub struct WorldSyncStore {
    current: Option<Arc<WorldView>>,
}

impl WorldSyncStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The held view, if any has been loaded.
    pub fn current(&self) -> Option<Arc<WorldView>> {
        self.current.clone()
    }

    /// Hours passed according to the held view.
    pub fn hours_passed(&self) -> Option<u64> {
        self.current.as_ref().map(|view| view.snapshot.hours_passed)
    }

    /// Unconditionally installs `view` and returns it.
    pub fn replace(&mut self, view: WorldView) -> Arc<WorldView> {
        let view = Arc::new(view);
        self.current = Some(Arc::clone(&view));
        view
    }

    /// Installs `fresh` only if nothing is held yet or world time moved.
    pub fn reconcile(&mut self, fresh: WorldView) -> Reconciliation {
        let Some(held) = &self.current else {
            self.replace(fresh);
            return Reconciliation::Initial;
        };
        if !has_advanced(&held.snapshot, &fresh.snapshot) {
            return Reconciliation::Unchanged;
        }
        let from = held.snapshot.hours_passed;
        let to = fresh.snapshot.hours_passed;
        self.replace(fresh);
        Reconciliation::Advanced { from, to }
    }
}
