//! `rw-dispatch` — the tick-loop orchestrator.
//!
//! # Tick phases
//!
//! ```text
//! for each tick(dt):
//!   ① Clock     — advance own clock (pre-run) or adopt the host clock.
//!   ② Starts    — drain due agents from the pending queue, attempt
//!                 placement; successes join the active set immediately,
//!                 failures reschedule with backoff.
//!   ③ Update    — advance every active agent; broken consists and
//!                 exhausted routes are queued for removal, never removed
//!                 mid-traversal.
//!   ④ Removals  — apply the to-remove buffers: de-index, release track,
//!                 form queued successors of finished agents.
//!   ⑤ Additions — apply the to-add buffer: index and append.
//!   ⑥ World     — advance signal/occupancy state once, after all agents.
//! ```
//!
//! The buffering in ④/⑤ is the concurrency-safety mechanism of the whole
//! system even though execution is single-threaded: it prevents iterator
//! invalidation, and it guarantees a removal requested during ③ is honored
//! exactly once.

pub mod buffers;
pub mod dispatcher;
pub mod error;
pub mod observer;
pub mod placement;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use buffers::MutationBuffers;
pub use dispatcher::{DispatchConfig, Dispatcher};
pub use error::{DispatchError, DispatchResult};
pub use observer::{DispatchObserver, NoopObserver};
pub use placement::{Placement, attempt_place};
