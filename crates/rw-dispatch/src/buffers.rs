//! Deferred mutation buffers.
//!
//! The active-agent collection is traversed once per tick.  Any structural
//! change requested during that traversal — an agent finishing, a coupling
//! absorbing one, a detachment spawning one — lands in these buffers and is
//! applied at the tick boundary, so the traversal never observes an
//! insertion or removal under its feet.

use rw_agent::Agent;
use rw_core::TrainId;

/// Batched state changes, applied in order: removals, then additions.
#[derive(Debug, Default)]
pub struct MutationBuffers {
    /// New agents to index and append to the active collection.
    pub to_add: Vec<Agent>,
    /// Agents to remove from every index and collection, releasing their
    /// track resources.
    pub to_remove: Vec<TrainId>,
    /// Agents to remove from the active collection only; they stay in the
    /// id/name registries (reclassification, e.g. promotion to primary).
    pub to_remove_from_active: Vec<TrainId>,
}

impl MutationBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty() && self.to_remove_from_active.is_empty()
    }
}
