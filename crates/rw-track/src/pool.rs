//! Storage pools: the contract and a yard-based reference implementation.
//!
//! A pool is a named holding area trains can be extracted from at start of
//! service or stored into at end of service.  Extraction is not guaranteed
//! to succeed immediately — the outcome set below is the whole contract the
//! dispatcher needs.

use rustc_hash::FxHashMap;

use rw_agent::{Agent, Unit};
use rw_core::{SlotId, TrainId, UnitId};

// ── Contract ──────────────────────────────────────────────────────────────────

/// Outcome of a pool extraction attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PoolExtract {
    /// A stored train was released; proceed as placed.
    Formed,
    /// A train is available but cannot leave yet; reschedule with backoff.
    Delayed,
    /// The pool cannot ever satisfy this request; the session must abort.
    Failed,
    /// Nothing stored yet; reschedule without counting toward the retry
    /// ceiling — the pool may still fill up.
    NotCreated,
    /// Pool is empty but configured to fabricate stock; bypass the normal
    /// retry and attempt occupancy placement immediately.
    ForceCreated,
}

/// The pool collaborator as the dispatcher sees it.
pub trait StoragePool {
    /// Try to extract a train for `agent` from the named pool.  On
    /// `Formed`, the implementation re-owns the stored consist to `agent`
    /// (and may assign one if the agent has none).
    fn extract(&mut self, pool: &str, agent: &mut Agent, now: f64) -> PoolExtract;

    /// Store `agent` into the named pool at end of service.  `siblings` are
    /// agents being stored in the same batch, whose slots must not be
    /// double-booked.  `None` means no slot has room.
    fn create_in_pool(&mut self, pool: &str, agent: &Agent, siblings: &[TrainId])
    -> Option<SlotId>;
}

// ── Reference implementation ──────────────────────────────────────────────────

/// One storage slot: a dead-end track with finite usable length.
#[derive(Clone, Debug)]
struct StorageSlot {
    length_m: f32,
    rem_length_m: f32,
    /// Stored trains with the length each one consumes, oldest first.
    stored: Vec<(TrainId, f32)>,
}

/// A named yard: storage slots plus an exit that traffic may block.
#[derive(Clone, Debug)]
pub struct Yard {
    slots: Vec<StorageSlot>,
    /// While set, stored trains exist but cannot leave (`Delayed`).
    pub exit_blocked: bool,
    /// Fabricate stock when the yard runs empty (`ForceCreated`).
    pub force_creation: bool,
}

impl Yard {
    /// A yard with one slot per entry of `slot_lengths`.
    pub fn new(slot_lengths: impl IntoIterator<Item = f32>) -> Self {
        let slots = slot_lengths
            .into_iter()
            .map(|length_m| StorageSlot { length_m, rem_length_m: length_m, stored: Vec::new() })
            .collect();
        Self { slots, exit_blocked: false, force_creation: false }
    }

    /// Put `train` of `length_m` into the first slot with room.
    pub fn store(&mut self, train: TrainId, length_m: f32) -> Option<SlotId> {
        let (i, slot) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, s)| s.rem_length_m >= length_m)?;
        slot.rem_length_m -= length_m;
        slot.stored.push((train, length_m));
        Some(SlotId(i as u16))
    }

    /// Release the oldest stored train, restoring its slot length.
    fn take_oldest(&mut self) -> Option<TrainId> {
        for slot in &mut self.slots {
            if !slot.stored.is_empty() {
                let (train, length_m) = slot.stored.remove(0);
                slot.rem_length_m = slot.length_m.min(slot.rem_length_m + length_m);
                return Some(train);
            }
        }
        None
    }

    pub fn stored_count(&self) -> usize {
        self.slots.iter().map(|s| s.stored.len()).sum()
    }
}

/// The reference pool collaborator: a map of named yards.
#[derive(Clone, Debug, Default)]
pub struct YardPool {
    yards: FxHashMap<String, Yard>,
}

impl YardPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_yard(&mut self, name: impl Into<String>, yard: Yard) {
        self.yards.insert(name.into(), yard);
    }

    pub fn yard_mut(&mut self, name: &str) -> Option<&mut Yard> {
        self.yards.get_mut(name)
    }
}

impl StoragePool for YardPool {
    fn extract(&mut self, pool: &str, agent: &mut Agent, _now: f64) -> PoolExtract {
        // Referencing a pool that does not exist is a configuration defect
        // retrying can never fix.
        let Some(yard) = self.yards.get_mut(pool) else {
            return PoolExtract::Failed;
        };

        if yard.exit_blocked && yard.stored_count() > 0 {
            return PoolExtract::Delayed;
        }

        match yard.take_oldest() {
            None if yard.force_creation => PoolExtract::ForceCreated,
            None => PoolExtract::NotCreated,
            Some(stored) => {
                // Re-own the stored consist; fabricate a minimal one if the
                // agent arrived without units of its own.
                if agent.units.is_empty() {
                    agent.units.push(Unit::new(UnitId(stored.0), agent.id, true, 20.0));
                } else {
                    for unit in &mut agent.units {
                        unit.train = agent.id;
                    }
                }
                PoolExtract::Formed
            }
        }
    }

    fn create_in_pool(
        &mut self,
        pool: &str,
        agent: &Agent,
        _siblings: &[TrainId],
    ) -> Option<SlotId> {
        // Capacity is committed at store time, so same-batch siblings cannot
        // double-book a slot here; the parameter exists for implementations
        // that defer commitment.
        self.yards.get_mut(pool)?.store(agent.id, agent.length_m())
    }
}
