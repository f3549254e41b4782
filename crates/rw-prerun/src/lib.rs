//! `rw-prerun` — the time-warp engine.
//!
//! # Why this exists
//!
//! Agents scheduled before the human-controlled train becomes active must
//! already be placed and moving when real-time simulation begins.  The
//! engine fast-forwards the dispatcher's clock in coarse render-free steps
//! from the earliest scheduled start up to the activation time, then
//! resolves the primary train's readiness — which may itself require more
//! simulated time when the primary descends from another train's lifecycle.
//!
//! ```text
//! Running ──(clock reaches activation)──► AwaitingPrimaryReady
//!    AwaitingPrimaryReady ──(condition met)──────────► Ready
//!    AwaitingPrimaryReady ──(24 h horizon exhausted)─► Aborted
//! ```
//!
//! Cancellation is cooperative: a shared token is polled at every coarse
//! and fine step, and a requested cancel is a clean early return
//! ([`Warmup::Cancelled`]), never an error.  The caller must treat the
//! partially warmed state as unusable until it resumes or discards it.

pub mod engine;
pub mod error;

#[cfg(test)]
mod tests;

pub use engine::{Phase, PreRunConfig, PreRunEngine, Warmup};
pub use error::{PreRunError, PreRunResult};
