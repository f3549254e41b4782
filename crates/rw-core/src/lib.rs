//! `rw-core` — foundational types for the `railwarp` scheduling framework.
//!
//! This crate is a dependency of every other `rw-*` crate.  It intentionally
//! has no `rw-*` dependencies and minimal external ones (only `thiserror`,
//! plus optional `serde`).
//!
//! # What lives here
//!
//! | Module     | Contents                                          |
//! |------------|---------------------------------------------------|
//! | [`ids`]    | `TrainId`, `UnitId`, `SectionId`, `SlotId`        |
//! | [`time`]   | `Timestamp`, `SimClock`                           |
//! | [`cancel`] | `CancelToken` (cooperative cancellation)          |
//! | [`error`]  | `CoreError`, `CoreResult`                         |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                              |
//! |---------|-----------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types. |
//!           | Required by `rw-save`.                              |

pub mod cancel;
pub mod error;
pub mod ids;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use cancel::CancelToken;
pub use error::{CoreError, CoreResult};
pub use ids::{SectionId, SlotId, TrainId, UnitId};
pub use time::{SimClock, Timestamp};
