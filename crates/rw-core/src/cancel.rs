//! Cooperative cancellation for long synchronous loops.
//!
//! The pre-run warm-up can fast-forward many simulated hours in one call.  A
//! host watchdog needs a way to bail out of that loop without preemption:
//! the loop polls a shared flag at every step boundary and returns early —
//! a clean return, not a resumable suspension.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A cloneable cancellation flag.
///
/// All clones observe the same flag; `request` from any clone is visible to
/// every poller.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask all pollers to stop at their next check point.
    pub fn request(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// `true` once cancellation has been requested.
    #[inline]
    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
