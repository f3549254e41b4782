//! The placement protocol: materialize one agent into the shared world.
//!
//! Placement is an attempt, not a guarantee: the occupancy model refuses
//! when another train holds required resources, and pools have their own
//! outcome vocabulary.  All failure *handling* (backoff, ceilings, fatal
//! aborts) belongs to the [`Dispatcher`][crate::Dispatcher]; this module
//! only classifies the attempt.

use rw_agent::Agent;
use rw_agent::role::Formation;
use rw_track::{Occupancy, PoolExtract, StoragePool};

/// Outcome of one placement attempt, as the dispatcher handles it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Reservation committed, post-init passed; the agent is in the world.
    Placed,
    /// Required track is held by another train.  Reschedule with backoff;
    /// counts toward the abandonment ceiling.
    Conflict,
    /// The pool has stock but cannot release it yet.  Reschedule with
    /// backoff; counts toward the ceiling.
    PoolDelayed,
    /// The pool has nothing stored yet.  Reschedule, but do NOT count
    /// toward the ceiling — the pool may still fill up.
    PoolNotCreated,
    /// The pool can never satisfy this agent.  Fatal.
    PoolFailed { pool: String },
}

/// Attempt to place `agent` into the world.
///
/// Pool-formed agents are delegated to the pool collaborator first; its
/// `ForceCreated` outcome falls through to an immediate occupancy attempt,
/// and a conflict on a `Formed` extraction is treated as a blocked yard
/// exit (`PoolDelayed`), not a plain conflict.
///
/// With `activate`, a successfully placed agent is also brought into its
/// starting movement state; the pre-run engine places the primary without
/// activation and promotes it itself.
pub fn attempt_place<W, P>(
    agent: &mut Agent,
    world: &mut W,
    pool: &mut P,
    now: f64,
    activate: bool,
) -> Placement
where
    W: Occupancy,
    P: StoragePool,
{
    if let Some(Formation::FromPool { pool: name }) = agent.role.formation() {
        let name = name.clone();
        match pool.extract(&name, agent, now) {
            PoolExtract::Delayed => return Placement::PoolDelayed,
            PoolExtract::NotCreated => return Placement::PoolNotCreated,
            PoolExtract::Failed => return Placement::PoolFailed { pool: name },
            PoolExtract::Formed => {
                return if place_on_track(agent, world, activate) {
                    Placement::Placed
                } else {
                    Placement::PoolDelayed
                };
            }
            // Fabricated stock: go straight to the occupancy attempt.
            PoolExtract::ForceCreated => {}
        }
    }

    if place_on_track(agent, world, activate) {
        Placement::Placed
    } else {
        Placement::Conflict
    }
}

/// Reserve, commit, materialize off-stage, and post-init.
///
/// On any failure the world is left untouched: the reservation is computed
/// without mutation, and a post-init failure releases the fresh commitment
/// before reporting.
fn place_on_track<W: Occupancy>(agent: &mut Agent, world: &mut W, activate: bool) -> bool {
    let Some(claim) = world.initial_reservation(agent) else {
        return false;
    };
    world.commit(agent.id, &claim);
    agent.claim = Some(claim);
    agent.travelled_m = 0.0;
    // Displace the model out of the visible scene until activation.  This
    // is presentation state only; occupancy has already been decided.
    agent.offstage = true;

    if !agent.post_init(activate) {
        world.release(agent.id);
        agent.claim = None;
        return false;
    }
    true
}
