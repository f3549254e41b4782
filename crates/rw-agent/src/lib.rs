//! `rw-agent` — the scheduled-train data model for the railwarp framework.
//!
//! An [`Agent`] is one autonomously (or, for the primary, manually)
//! controlled train tracked by the dispatcher.  This crate holds only data
//! and per-agent behavior; ownership, scheduling, and placement live in
//! `rw-dispatch`.
//!
//! # What lives here
//!
//! | Module       | Contents                                             |
//! |--------------|------------------------------------------------------|
//! | [`role`]     | `Role`, `Formation` — closed tagged variants         |
//! | [`movement`] | `MovementState`                                      |
//! | [`consist`]  | `Unit` — one vehicle of a train's consist            |
//! | [`claim`]    | `RouteClaim` — a committed track reservation         |
//! | [`agent`]    | `Agent` and its per-tick motion update               |

pub mod agent;
pub mod claim;
pub mod consist;
pub mod movement;
pub mod role;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use agent::Agent;
pub use claim::RouteClaim;
pub use consist::Unit;
pub use movement::MovementState;
pub use role::{Formation, Role};
