//! Dispatch observer trait for add/remove notifications.
//!
//! Distributed or spectator consumers (multiplayer broadcast, train-list
//! UIs) learn about agent lifecycle changes through these callbacks.  All
//! methods have default no-op implementations; correctness never depends on
//! an observer being attached.

use rw_agent::Agent;
use rw_core::TrainId;

/// Callbacks invoked by [`Dispatcher::tick`][crate::Dispatcher::tick] as
/// agents enter and leave the active collection.
pub trait DispatchObserver {
    /// An agent was placed (or formed) and joined the active collection.
    fn on_added(&mut self, _agent: &Agent) {}

    /// An agent was removed entirely — route exhausted or absorbed.
    fn on_removed(&mut self, _id: TrainId) {}

    /// End of one tick.  `active` is the post-mutation active-agent count.
    fn on_tick_end(&mut self, _now: f64, _active: usize) {}
}

/// A [`DispatchObserver`] that does nothing.  Use when you need to tick the
/// dispatcher but don't care about notifications.
pub struct NoopObserver;

impl DispatchObserver for NoopObserver {}
