//! `rw-save` — snapshot save/restore of the scheduler's agent collections.
//!
//! A snapshot carries three ordered collections — active agents, pending
//! queue, auto-generate agents — with each record tagged by its role
//! variant, the discriminator restore uses to rebuild the right lifecycle
//! state.  In timetable mode the primary agent is prepended to the active
//! collection, and restore re-seats it by role rather than by position.
//!
//! The concrete encoding is JSON via serde; only the record *ordering* is
//! contractual, the byte layout is not.

pub mod snapshot;

#[cfg(test)]
mod tests;

pub use snapshot::{
    Snapshot, SnapshotError, SnapshotResult, restore, restore_autopilot, save, save_autopilot,
};
