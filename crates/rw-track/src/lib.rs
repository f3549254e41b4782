//! `rw-track` — collaborator contracts the dispatcher consumes, plus
//! reference implementations.
//!
//! The dispatcher never looks inside the track model or the pool; it talks
//! to them through the two traits here.  Swap implementations at compile
//! time — the reference ones ([`SectionOccupancy`], [`YardPool`]) keep their
//! internals deliberately simple so the scheduling semantics, not the
//! modeling fidelity, is what gets exercised.
//!
//! | Module        | Contents                                          |
//! |---------------|---------------------------------------------------|
//! | [`occupancy`] | `Occupancy` trait, `SectionOccupancy`             |
//! | [`pool`]      | `StoragePool` trait, `PoolExtract`, `YardPool`    |

pub mod occupancy;
pub mod pool;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use occupancy::{Occupancy, Section, SectionOccupancy};
pub use pool::{PoolExtract, StoragePool, Yard, YardPool};
