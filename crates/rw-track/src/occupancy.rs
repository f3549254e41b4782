//! Track-occupancy model: the contract and a per-section reference
//! implementation.

use rw_agent::{Agent, RouteClaim};
use rw_core::{SectionId, TrainId};

// ── Contract ──────────────────────────────────────────────────────────────────

/// The shared track/occupancy model as the dispatcher sees it.
///
/// `initial_reservation` must not mutate any shared state: a conflicting
/// attempt leaves the model exactly as it was, so the caller can retry later
/// with backoff.  Only `commit` claims resources.
pub trait Occupancy {
    /// Compute an initial reservation for `agent` from its planned path and
    /// the current occupancy state.  `None` means conflict — some resource
    /// the agent needs is held by another train.
    fn initial_reservation(&self, agent: &Agent) -> Option<RouteClaim>;

    /// Commit a previously computed reservation for `train`.
    fn commit(&mut self, train: TrainId, claim: &RouteClaim);

    /// Release everything held by `train` (it terminated or was absorbed).
    fn release(&mut self, train: TrainId);

    /// Advance signal/occupancy state, once per tick after agent updates.
    /// `force` recomputes even when nothing changed (pre-run requirement).
    fn update(&mut self, force: bool);

    /// Non-committing check used by the primary-readiness resolution: would
    /// an initial reservation succeed right now?
    fn route_clear(&self, agent: &Agent) -> bool {
        self.initial_reservation(agent).is_some()
    }
}

// ── Reference implementation ──────────────────────────────────────────────────

/// One track section with at most one occupant.
#[derive(Clone, Debug)]
pub struct Section {
    pub length_m: f32,
    occupant: Option<TrainId>,
}

impl Section {
    pub fn occupant(&self) -> Option<TrainId> {
        self.occupant
    }
}

/// A flat vector of sections, each exclusively held by at most one train.
///
/// Placement conflict is per-section occupancy on the footprint the agent
/// needs to stand on; no signalling graph is modeled.
#[derive(Clone, Debug, Default)]
pub struct SectionOccupancy {
    sections: Vec<Section>,
    /// Bumped on every (forced or dirty) update; a stand-in for the signal
    /// state revision downstream consumers would watch.
    revision: u64,
    dirty: bool,
}

impl SectionOccupancy {
    /// Build a model from per-section lengths.
    pub fn new(lengths: impl IntoIterator<Item = f32>) -> Self {
        let sections = lengths
            .into_iter()
            .map(|length_m| Section { length_m, occupant: None })
            .collect();
        Self { sections, revision: 0, dirty: false }
    }

    /// Convenience: `count` equal sections of `length_m` each.
    pub fn uniform(count: usize, length_m: f32) -> Self {
        Self::new(std::iter::repeat_n(length_m, count))
    }

    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.get(id.index())
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Sections of `agent.path` the standing train covers: the shortest
    /// prefix whose summed length reaches the consist length.
    fn footprint<'a>(&self, agent: &'a Agent) -> Option<&'a [SectionId]> {
        let need = agent.length_m();
        let mut covered = 0.0_f32;
        for (i, id) in agent.path.iter().enumerate() {
            covered += self.section(*id)?.length_m;
            if covered >= need {
                return Some(&agent.path[..=i]);
            }
        }
        None // path too short to stand the train
    }
}

impl Occupancy for SectionOccupancy {
    fn initial_reservation(&self, agent: &Agent) -> Option<RouteClaim> {
        let footprint = self.footprint(agent)?;
        let free = footprint.iter().all(|id| {
            self.section(*id)
                .is_some_and(|s| s.occupant.is_none() || s.occupant == Some(agent.id))
        });
        if !free {
            return None;
        }
        // The claim spans the whole planned path; the footprint only gates
        // whether the train can be stood up at its start.
        let length_m = agent
            .path
            .iter()
            .filter_map(|id| self.section(*id))
            .map(|s| s.length_m)
            .sum();
        Some(RouteClaim::new(agent.path.clone(), length_m))
    }

    fn commit(&mut self, train: TrainId, claim: &RouteClaim) {
        for id in &claim.sections {
            if let Some(section) = self.sections.get_mut(id.index()) {
                section.occupant = Some(train);
            }
        }
        self.dirty = true;
    }

    fn release(&mut self, train: TrainId) {
        for section in &mut self.sections {
            if section.occupant == Some(train) {
                section.occupant = None;
            }
        }
        self.dirty = true;
    }

    fn update(&mut self, force: bool) {
        if force || self.dirty {
            self.revision += 1;
            self.dirty = false;
        }
    }
}
