//! The `PreRunEngine` — coarse warm-up loop and readiness state machine.

use tracing::{debug, info};

use rw_agent::role::Formation;
use rw_core::{CancelToken, Timestamp, TrainId};
use rw_dispatch::{DispatchError, DispatchObserver, Dispatcher, Placement, attempt_place};
use rw_track::{Occupancy, StoragePool};

use crate::error::PreRunError;

// ── Configuration ─────────────────────────────────────────────────────────────

/// Step sizes and the readiness horizon.
#[derive(Clone, Debug)]
pub struct PreRunConfig {
    /// Clock step while fast-forwarding to the activation time.
    pub coarse_step_secs: f64,
    /// Clock step while re-checking primary readiness.
    pub fine_step_secs: f64,
    /// End of the schedulable day; readiness unresolved by then is fatal.
    pub horizon_secs: f64,
}

impl Default for PreRunConfig {
    fn default() -> Self {
        Self {
            coarse_step_secs: 5.0,
            fine_step_secs: 5.0,
            horizon_secs: Timestamp::DAY_SECS as f64,
        }
    }
}

// ── State machine ─────────────────────────────────────────────────────────────

/// Engine state, observable after `run` returns.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Running,
    AwaitingPrimaryReady,
    Ready,
    Aborted,
}

/// A successful (or cleanly cancelled) warm-up.
#[derive(Clone, Debug, PartialEq)]
pub enum Warmup {
    /// The primary is promoted; real-time ticking may begin.  `delayed_by`
    /// is how far past the planned activation the clock had to run.
    Completed { delayed_by_secs: f64 },
    /// An external cancel was observed at a step boundary.  State is
    /// partially warmed and must not be used as-is.
    Cancelled,
}

/// Drives a [`Dispatcher`] through the pre-run warm-up.
pub struct PreRunEngine {
    config: PreRunConfig,
    phase: Phase,
}

impl Default for PreRunEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PreRunEngine {
    pub fn new() -> Self {
        Self::with_config(PreRunConfig::default())
    }

    pub fn with_config(config: PreRunConfig) -> Self {
        Self { config, phase: Phase::Running }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Warm the dispatcher up to `activation_secs` and resolve the primary.
    ///
    /// On success the dispatcher's clock is handed back to the host at the
    /// (possibly delayed) activation time.  On cancellation the clock stays
    /// local and collections stay partially warmed.
    pub fn run<W, P, O>(
        &mut self,
        d: &mut Dispatcher<W, P>,
        activation_secs: f64,
        cancel: &CancelToken,
        obs: &mut O,
    ) -> Result<Warmup, PreRunError>
    where
        W: Occupancy,
        P: StoragePool,
        O: DispatchObserver,
    {
        self.phase = Phase::Running;

        // ── Coarse warm-up loop ───────────────────────────────────────────
        if let Some(first) = d.pending().next_time() {
            let first = first.as_secs_f64();
            if first < activation_secs {
                info!(pending = d.pending().len(), from = first, to = activation_secs,
                      "pre-run warm-up");
                d.begin_local_time(first - 1.0);

                let mut run_time = first;
                let mut last_hour = (first / 3_600.0) as u64;
                while run_time < activation_secs {
                    let dt = run_time - d.clock().now();
                    d.tick(dt, None, obs)?;
                    if cancel.is_requested() {
                        return Ok(Warmup::Cancelled);
                    }
                    // Role-specific early exit: the primary materialized
                    // mid-drain (e.g. a detachment during the warm-up).
                    if d.primary().is_some() {
                        break;
                    }
                    let hour = (run_time / 3_600.0) as u64;
                    if hour != last_hour {
                        debug!("pre-run reached {hour:02}:00");
                        last_hour = hour;
                    }
                    run_time += self.config.coarse_step_secs;
                }
            }
        }

        // ── Readiness resolution ──────────────────────────────────────────
        self.phase = Phase::AwaitingPrimaryReady;
        if !d.clock().is_local() {
            d.begin_local_time(activation_secs);
        }

        let outcome = self.resolve_primary(d, activation_secs, cancel, obs);
        self.phase = match &outcome {
            Ok(Warmup::Completed { .. }) => Phase::Ready,
            Ok(Warmup::Cancelled) => Phase::AwaitingPrimaryReady,
            Err(_) => Phase::Aborted,
        };
        outcome
    }

    // ── Resolution loop ───────────────────────────────────────────────────

    fn resolve_primary<W, P, O>(
        &mut self,
        d: &mut Dispatcher<W, P>,
        activation_secs: f64,
        cancel: &CancelToken,
        obs: &mut O,
    ) -> Result<Warmup, PreRunError>
    where
        W: Occupancy,
        P: StoragePool,
        O: DispatchObserver,
    {
        // Promoted during the warm-up: drop any placeholder and finish.
        if d.primary().is_some() {
            d.take_pending_primary();
            return Ok(self.finish(d, activation_secs));
        }

        let Some(pending) = d.peek_pending_primary() else {
            // No primary in this schedule (pure-AI session): nothing to
            // resolve.
            return Ok(self.finish(d, activation_secs));
        };
        let primary_id = pending.id;
        let formation = pending.role.formation().cloned().unwrap_or(Formation::OnTime);

        loop {
            if cancel.is_requested() {
                return Ok(Warmup::Cancelled);
            }
            if self.try_ready(d, primary_id, &formation, obs)? {
                return Ok(self.finish(d, activation_secs));
            }
            if d.clock().now() >= self.config.horizon_secs {
                return Err(self.horizon_cause(d, &formation));
            }
            d.tick(self.config.fine_step_secs, None, obs)?;
        }
    }

    /// One readiness check.  `Ok(true)` means the primary is promoted and
    /// the engine may stop.
    fn try_ready<W, P, O>(
        &self,
        d: &mut Dispatcher<W, P>,
        primary_id: TrainId,
        formation: &Formation,
        obs: &mut O,
    ) -> Result<bool, PreRunError>
    where
        W: Occupancy,
        P: StoragePool,
        O: DispatchObserver,
    {
        match formation {
            // Materialized earlier under the reserved id.
            Formation::PreCreated => {
                if d.agent(TrainId::PRIMARY).is_some() {
                    d.take_pending_primary(); // placeholder no longer needed
                    d.promote_existing_primary(TrainId::PRIMARY);
                    return Ok(true);
                }
                debug!("primary start delayed: pre-created train not materialized yet");
                Ok(false)
            }

            // Produced by a detachment, under the primary's own id.
            Formation::DetachedFrom(_) => {
                if d.agent(primary_id).is_some() {
                    d.take_pending_primary();
                    d.promote_existing_primary(primary_id);
                    return Ok(true);
                }
                debug!("primary start delayed: detachment has not happened yet");
                Ok(false)
            }

            // Formed from another train: that train must have started AND
            // subsequently disappeared (finished) before the primary can be
            // stood up in its place.
            Formation::FormedFrom(org) => {
                if d.not_started(*org) {
                    debug!(incoming = %org, "primary start delayed: incoming train has yet to start");
                    return Ok(false);
                }
                if let Some(incoming) = d.agent(*org) {
                    debug!(incoming = %org, delay = ?incoming.delay,
                           "primary start delayed: incoming train has not yet arrived");
                    return Ok(false);
                }
                self.place_pending_primary(d, obs)
            }

            // Independently placed (or pool-extracted): readiness is a
            // successful placement attempt.
            Formation::OnTime | Formation::FromPool { .. } => self.place_pending_primary(d, obs),
        }
    }

    /// Attempt to stand the queued primary up in the world.  Transient
    /// refusals re-queue it unchanged — primary retries ride the fine-step
    /// clock, not the 30 s backoff ladder.
    fn place_pending_primary<W, P, O>(
        &self,
        d: &mut Dispatcher<W, P>,
        obs: &mut O,
    ) -> Result<bool, PreRunError>
    where
        W: Occupancy,
        P: StoragePool,
        O: DispatchObserver,
    {
        let Some(mut agent) = d.take_pending_primary() else {
            return Ok(false);
        };
        let now = d.clock().now();
        match attempt_place(&mut agent, &mut d.world, &mut d.pool, now, false) {
            Placement::Placed => {
                d.finalize_primary(agent, obs);
                Ok(true)
            }
            Placement::Conflict => {
                if agent.has_powered_unit() {
                    debug!("primary start delayed: track is not clear");
                } else {
                    debug!("primary start delayed: train has no power");
                }
                d.schedule(agent);
                Ok(false)
            }
            Placement::PoolDelayed | Placement::PoolNotCreated => {
                debug!("primary start delayed: pool cannot release the train yet");
                d.schedule(agent);
                Ok(false)
            }
            Placement::PoolFailed { pool } => Err(PreRunError::Dispatch(
                DispatchError::PoolUnsatisfiable { train: agent.name, pool },
            )),
        }
    }

    /// Hand the clock back to the host and report the accumulated delay.
    fn finish<W, P>(&self, d: &mut Dispatcher<W, P>, activation_secs: f64) -> Warmup
    where
        W: Occupancy,
        P: StoragePool,
    {
        let delayed = (d.clock().now() - activation_secs).max(0.0);
        d.adopt_host_time(activation_secs + delayed);
        if delayed > 0.0 {
            info!("primary start delayed by {delayed:.0} s");
        } else {
            info!("primary started on time");
        }
        Warmup::Completed { delayed_by_secs: delayed }
    }

    /// The cause-specific error for an exhausted horizon.
    fn horizon_cause<W, P>(&self, d: &Dispatcher<W, P>, formation: &Formation) -> PreRunError
    where
        W: Occupancy,
        P: StoragePool,
    {
        match formation {
            Formation::FormedFrom(org) => {
                if d.not_started(*org) {
                    PreRunError::IncomingNeverRan { train: *org }
                } else {
                    PreRunError::IncomingNeverArrived { train: *org }
                }
            }
            _ => PreRunError::TrackNeverCleared,
        }
    }
}
