//! Consist units.
//!
//! A train's consist is a `Vec<Unit>`, lead unit first.  Coupling transfers
//! units between agents and rewrites their `train` field; the consist-intact
//! check in [`Agent`](crate::Agent) relies on that rewrite to detect an
//! agent whose vehicles now belong to someone else.

use rw_core::{TrainId, UnitId};

/// One vehicle (powered or trailing) of a consist.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Unit {
    pub id: UnitId,
    /// The train this unit currently belongs to.  Rewritten on coupling.
    pub train: TrainId,
    pub powered: bool,
    pub length_m: f32,
}

impl Unit {
    pub fn new(id: UnitId, train: TrainId, powered: bool, length_m: f32) -> Self {
        Self { id, train, powered, length_m }
    }
}
