//! The `Agent` — one scheduled train — and its per-tick motion update.
//!
//! # Motion model
//!
//! Physics internals are not this crate's business; the dispatcher only
//! needs agents to progress along their committed claim and to finish.  The
//! update therefore integrates a point mass with a fixed acceleration and
//! brake rate along `claim.length_m`, braking so as to stop at the claim
//! end.  Anything finer (adhesion, gradients, brake pipes) belongs to the
//! host's vehicle model.

use rw_core::{SectionId, Timestamp, TrainId};

use crate::claim::RouteClaim;
use crate::consist::Unit;
use crate::movement::MovementState;
use crate::role::Role;

/// Longitudinal acceleration applied while running, m/s².
const ACCEL_MPS2: f32 = 0.25;
/// Service brake rate, m/s².
const BRAKE_MPS2: f32 = 0.5;
/// Integration sub-step used during pre-run, where tick deltas are coarse.
const PRE_RUN_SUBSTEP: f64 = 0.5;

/// One scheduled train.
///
/// Agents hold no reference back to their dispatcher; the dispatcher is the
/// sole owner and passes any context an update needs by argument.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Agent {
    pub id: TrainId,
    /// Original id kept when a service is re-formed under a new number.
    pub alias: Option<TrainId>,
    /// Service name, unique case-insensitively.
    pub name: String,
    /// Scheduled start.  Entries without one never enter the pending queue.
    pub start_time: Option<Timestamp>,
    pub role: Role,
    pub movement: MovementState,

    /// Speed the agent is placed with; > 0 means a flying start.
    pub initial_speed: f32,
    pub max_speed: f32,
    pub speed: f32,

    /// Accumulated placement-retry wait, seconds.  Grows by the retry step
    /// on each counting failure, resets to zero on successful placement.
    pub wait_time_accumulated: u32,

    /// Consist, lead unit first.
    pub units: Vec<Unit>,
    /// Planned path through the track model, in travel order.
    pub path: Vec<SectionId>,
    /// Committed reservation; `None` until placement succeeds.
    pub claim: Option<RouteClaim>,
    /// Distance progressed along `claim`.
    pub travelled_m: f32,

    /// Pool to store this agent into when its route is exhausted.
    pub store_in_pool: Option<String>,
    /// Last reported start delay, seconds — surfaced while a dependent
    /// agent waits on this one.
    pub delay: Option<u32>,
    /// Displaced out of the visible scene until activation.  Presentation
    /// only; never consulted by occupancy checks.
    pub offstage: bool,
}

impl Agent {
    /// A standing agent with an empty consist and no path.  Callers fill in
    /// the consist and path before inserting it anywhere.
    pub fn new(id: TrainId, name: impl Into<String>, start_time: Option<Timestamp>) -> Self {
        Self {
            id,
            alias: None,
            name: name.into(),
            start_time,
            role: Role::NotStarted { formation: crate::Formation::OnTime },
            movement: MovementState::Init,
            initial_speed: 0.0,
            max_speed: 40.0,
            speed: 0.0,
            wait_time_accumulated: 0,
            units: Vec::new(),
            path: Vec::new(),
            claim: None,
            travelled_m: 0.0,
            store_in_pool: None,
            delay: None,
            offstage: false,
        }
    }

    /// Lower-cased name, the key used by the case-insensitive name registry.
    pub fn name_key(&self) -> String {
        self.name.to_lowercase()
    }

    // ── Consist queries ───────────────────────────────────────────────────

    /// Total consist length.
    pub fn length_m(&self) -> f32 {
        self.units.iter().map(|u| u.length_m).sum()
    }

    /// `true` if at least one unit can move the train.
    pub fn has_powered_unit(&self) -> bool {
        self.units.iter().any(|u| u.powered)
    }

    /// `true` while this agent still owns its consist: non-empty, and the
    /// lead unit has not been rewritten to another train by a coupling.
    pub fn consist_intact(&self) -> bool {
        self.units.first().is_some_and(|lead| lead.train == self.id)
    }

    // ── Placement hooks ───────────────────────────────────────────────────

    /// Verify brake/propulsion readiness after a reservation has been
    /// committed.  Returns `false` if the agent cannot actually run, in
    /// which case the caller must treat the placement as failed.
    ///
    /// With `activate` the agent is also brought into its starting movement
    /// state; without, it stays `Init` for a later promotion (the pre-run
    /// engine activates the primary itself).
    pub fn post_init(&mut self, activate: bool) -> bool {
        if !self.consist_intact() || !self.has_powered_unit() || self.claim.is_none() {
            return false;
        }
        if activate {
            if self.initial_speed > 0.0 {
                self.initialize_moving();
            } else {
                self.apply_full_brakes();
            }
        }
        true
    }

    /// Flying start: adopt the initial speed and settle under brakes.
    pub fn initialize_moving(&mut self) {
        self.speed = self.initial_speed;
        self.movement = MovementState::Braking;
    }

    /// Standing start: brakes full, wait as a static consist.
    pub fn apply_full_brakes(&mut self) {
        self.speed = 0.0;
        self.movement = MovementState::Static;
    }

    // ── Route / termination queries ───────────────────────────────────────

    /// Metres of claim left ahead of the agent.
    pub fn remaining_m(&self) -> f32 {
        match &self.claim {
            Some(claim) => (claim.length_m - self.travelled_m).max(0.0),
            None => 0.0,
        }
    }

    /// `true` once the committed route is exhausted and the agent stands.
    pub fn finished(&self) -> bool {
        self.claim.is_some()
            && self.remaining_m() <= 0.0
            && self.speed == 0.0
            && self.movement == MovementState::Stopped
    }

    // ── Per-tick update ───────────────────────────────────────────────────

    /// Advance this agent by `dt` simulated seconds.
    ///
    /// During pre-run, ticks arrive in coarse steps; the update then
    /// integrates in fixed sub-steps so braking distances stay accurate.
    pub fn update(&mut self, dt: f64, now: f64, pre_run: bool) {
        if pre_run && dt > PRE_RUN_SUBSTEP {
            let mut left = dt;
            while left > 0.0 {
                let step = left.min(PRE_RUN_SUBSTEP);
                self.step(step, now - left);
                left -= step;
            }
        } else {
            self.step(dt, now);
        }
    }

    fn step(&mut self, dt: f64, _now: f64) {
        let dt = dt as f32;
        match self.movement {
            MovementState::Init => {
                if self.initial_speed > 0.0 {
                    self.speed = self.initial_speed;
                    self.movement = MovementState::Running;
                } else {
                    self.movement = MovementState::Static;
                }
            }
            MovementState::Static | MovementState::StationStop | MovementState::Stopped => {}
            MovementState::Braking => {
                self.speed = (self.speed - BRAKE_MPS2 * dt).max(0.0);
                self.advance(dt);
                if self.speed == 0.0 {
                    self.movement = if self.remaining_m() <= 0.0 {
                        MovementState::Stopped
                    } else {
                        // Settled from a flying start; resume running.
                        MovementState::Running
                    };
                }
            }
            MovementState::Running => {
                self.speed = (self.speed + ACCEL_MPS2 * dt).min(self.max_speed);
                self.advance(dt);
                // Brake so as to stand at the claim end.
                let stopping_m = (self.speed * self.speed) / (2.0 * BRAKE_MPS2);
                if self.remaining_m() <= stopping_m {
                    self.movement = MovementState::Braking;
                }
            }
        }
    }

    fn advance(&mut self, dt: f32) {
        if let Some(claim) = &self.claim {
            self.travelled_m = (self.travelled_m + self.speed * dt).min(claim.length_m);
            if self.travelled_m >= claim.length_m {
                self.speed = 0.0;
                self.movement = MovementState::Stopped;
            }
        }
    }
}
