//! The `Dispatcher` — owner of every agent collection and of the tick loop.

use rustc_hash::FxHashMap;
use tracing::{info, warn};

use rw_agent::role::Formation;
use rw_agent::{Agent, MovementState, Role};
use rw_core::{SimClock, TrainId};
use rw_schedule::StartList;
use rw_track::{Occupancy, StoragePool};

use crate::buffers::MutationBuffers;
use crate::error::{DispatchError, DispatchResult};
use crate::observer::DispatchObserver;
use crate::placement::{Placement, attempt_place};

// ── Configuration ─────────────────────────────────────────────────────────────

/// Retry tuning for failed placements.
#[derive(Clone, Debug)]
pub struct DispatchConfig {
    /// Seconds added to a failed agent's start time per counting retry.
    pub retry_step_secs: u32,
    /// Accumulated wait beyond which an agent is abandoned.
    pub retry_ceiling_secs: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { retry_step_secs: 30, retry_ceiling_secs: 900 }
    }
}

// ── Dispatcher ────────────────────────────────────────────────────────────────

/// The orchestrator.
///
/// Owns the pending queue, the active-agent collection, the id/name
/// registries, and the mutation buffers.  Agents hold no reference back;
/// the dispatcher's collections are the single source of agent lifetime.
///
/// # Type parameters
///
/// `W` is the track/occupancy model, `P` the storage-pool collaborator.
/// Both are compile-time seams — tests plug in the reference
/// implementations from `rw-track`, hosts plug in the real thing.
pub struct Dispatcher<W: Occupancy, P: StoragePool> {
    pub world: W,
    pub pool: P,
    config: DispatchConfig,
    clock: SimClock,

    pending: StartList,
    /// Every materialized agent (active, husks, autogen, the primary),
    /// keyed by id.  All mutation funnels through the buffer commit phase
    /// or initial placement.
    trains: FxHashMap<TrainId, Agent>,
    /// Lower-cased name → id.  Names are unique case-insensitively.
    by_name: FxHashMap<String, TrainId>,
    /// Ids of agents that have not yet started.  Backed-off agents leave
    /// and re-enter the queue transiently but stay listed here.
    start_reference: Vec<TrainId>,
    /// AI-updated agents, in traversal order.
    active: Vec<TrainId>,
    /// Pre-warmed agents activated out of band.
    autogen: Vec<TrainId>,
    buffers: MutationBuffers,
}

impl<W: Occupancy, P: StoragePool> Dispatcher<W, P> {
    pub fn new(world: W, pool: P, host_secs: f64) -> Self {
        Self::with_config(world, pool, host_secs, DispatchConfig::default())
    }

    pub fn with_config(world: W, pool: P, host_secs: f64, config: DispatchConfig) -> Self {
        Self {
            world,
            pool,
            config,
            clock: SimClock::new(host_secs),
            pending: StartList::new(),
            trains: FxHashMap::default(),
            by_name: FxHashMap::default(),
            start_reference: Vec::new(),
            active: Vec::new(),
            autogen: Vec::new(),
            buffers: MutationBuffers::new(),
        }
    }

    /// Rebuild a dispatcher from restored collections, in saved order.
    ///
    /// Id/name registries are re-established, pending entries re-enter the
    /// queue preserving relative order, committed claims are re-applied to
    /// the world, and a restored primary is registered without joining the
    /// AI-updated list (the host drives it).
    pub fn from_collections(
        world: W,
        pool: P,
        host_secs: f64,
        active: Vec<Agent>,
        pending: Vec<Agent>,
        autogen: Vec<Agent>,
    ) -> Self {
        let mut d = Self::new(world, pool, host_secs);
        for agent in active {
            if let Some(claim) = &agent.claim {
                d.world.commit(agent.id, claim);
            }
            if agent.role == Role::Primary {
                d.index(agent);
            } else {
                d.index_and_activate(agent);
            }
        }
        for agent in pending {
            d.schedule(agent);
        }
        for agent in autogen {
            d.register_autogen(agent);
        }
        d
    }

    // ── Intake ────────────────────────────────────────────────────────────

    /// Queue a loaded agent for its scheduled start.  Returns `false` (and
    /// drops the agent) if it has no start time.
    pub fn schedule(&mut self, agent: Agent) -> bool {
        let id = agent.id;
        if self.pending.insert(agent) {
            if !self.start_reference.contains(&id) {
                self.start_reference.push(id);
            }
            true
        } else {
            false
        }
    }

    /// Register a pre-warmed agent that is activated out of band, never via
    /// the pending queue.
    pub fn register_autogen(&mut self, mut agent: Agent) {
        agent.role = Role::AutoGenerate;
        let id = agent.id;
        self.index(agent);
        self.autogen.push(id);
    }

    // ── Clock control ─────────────────────────────────────────────────────

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Detach from the host clock and rewind for a warm-up run.
    pub fn begin_local_time(&mut self, secs: f64) {
        self.clock.set_local(secs);
    }

    /// Re-attach to the host clock; the warm-up is over.
    pub fn adopt_host_time(&mut self, host_secs: f64) {
        self.clock.hand_back(host_secs);
    }

    // ── Lookups ───────────────────────────────────────────────────────────

    pub fn agent(&self, id: TrainId) -> Option<&Agent> {
        self.trains.get(&id)
    }

    pub fn agent_mut(&mut self, id: TrainId) -> Option<&mut Agent> {
        self.trains.get_mut(&id)
    }

    pub fn agent_by_name(&self, name: &str) -> Option<&Agent> {
        let id = self.by_name.get(&name.to_lowercase())?;
        self.trains.get(id)
    }

    /// `true` while `id` has never been placed (still pending, including
    /// transient backoff re-queues).
    pub fn not_started(&self, id: TrainId) -> bool {
        self.start_reference.contains(&id)
    }

    pub fn pending(&self) -> &StartList {
        &self.pending
    }

    pub fn pending_mut(&mut self) -> &mut StartList {
        &mut self.pending
    }

    pub fn active_ids(&self) -> &[TrainId] {
        &self.active
    }

    pub fn active_agents(&self) -> impl Iterator<Item = &Agent> {
        self.active.iter().filter_map(|id| self.trains.get(id))
    }

    pub fn autogen_agents(&self) -> impl Iterator<Item = &Agent> {
        self.autogen.iter().filter_map(|id| self.trains.get(id))
    }

    /// The active agent holding the primary role, if promotion has happened.
    pub fn primary(&self) -> Option<&Agent> {
        self.trains.values().find(|a| a.role == Role::Primary)
    }

    // ── Tick ──────────────────────────────────────────────────────────────

    /// Run one tick of `dt` simulated seconds.
    ///
    /// `host_secs` is the host clock; it is adopted unless the dispatcher
    /// is free-running (pre-run).  Phases run in the fixed order documented
    /// on the crate root; the active collection is never structurally
    /// mutated while being traversed.
    pub fn tick<O: DispatchObserver>(
        &mut self,
        dt: f64,
        host_secs: Option<f64>,
        obs: &mut O,
    ) -> DispatchResult<()> {
        self.clock.tick(dt, host_secs);
        let now = self.clock.now();
        let pre_run = self.clock.is_local();

        // ② drain due starts and attempt placement.
        if self.pending.next_time().is_some_and(|t| t.is_due(now)) {
            for agent in self.pending.drain_startable(now) {
                self.start_reference.retain(|t| *t != agent.id);
                self.try_start(agent, obs)?;
            }
        }

        // ③ advance active agents over a stable copy of the list.
        let ids: Vec<TrainId> = self.active.clone();
        for id in ids {
            let Some(agent) = self.trains.get_mut(&id) else {
                continue;
            };
            match agent.role {
                // Husks are inert; the primary is driven by the host.
                Role::Incorporated { .. } | Role::Primary | Role::PrimaryPending { .. } => continue,
                Role::NotStarted { .. } | Role::Autonomous | Role::AutoGenerate => {}
            }
            if !agent.consist_intact() {
                self.buffers.to_remove.push(id);
                continue;
            }
            agent.update(dt, now, pre_run);
            if agent.finished() {
                if let Some(pool_name) = agent.store_in_pool.clone() {
                    if self.pool.create_in_pool(&pool_name, agent, &[]).is_none() {
                        warn!(train = %id, pool = %pool_name,
                              "no room in pool; train removed without storage");
                    }
                }
                self.buffers.to_remove.push(id);
            }
        }

        // ④ removals, ⑤ additions.
        self.apply_mutations(obs);

        // ⑥ advance signal/occupancy state once, after all agent updates.
        self.world.update(pre_run);
        obs.on_tick_end(now, self.active.len());
        Ok(())
    }

    // ── Placement with backoff ────────────────────────────────────────────

    fn try_start<O: DispatchObserver>(
        &mut self,
        mut agent: Agent,
        obs: &mut O,
    ) -> DispatchResult<()> {
        let now = self.clock.now();
        match attempt_place(&mut agent, &mut self.world, &mut self.pool, now, true) {
            Placement::Placed => {
                if agent.wait_time_accumulated > 0 {
                    agent.delay = Some(agent.wait_time_accumulated);
                }
                agent.wait_time_accumulated = 0;
                if let Role::NotStarted { .. } = agent.role {
                    agent.role = Role::Autonomous;
                }
                if agent.initial_speed > 0.0 {
                    // Extra zero-dt run so fresh signal claims settle within
                    // this same tick.
                    agent.update(0.0, now, true);
                }
                info!(train = %agent.id, name = %agent.name, "placed at {}", self.clock);
                obs.on_added(&agent);
                self.index_and_activate(agent);
                Ok(())
            }
            Placement::Conflict | Placement::PoolDelayed => {
                self.reschedule(agent, true);
                Ok(())
            }
            Placement::PoolNotCreated => {
                self.reschedule(agent, false);
                Ok(())
            }
            Placement::PoolFailed { pool } => {
                Err(DispatchError::PoolUnsatisfiable { train: agent.name, pool })
            }
        }
    }

    /// Push a failed agent's start forward and re-queue it.  `counts` is
    /// false for pool `NotCreated` outcomes, which must never drive the
    /// agent over the abandonment ceiling.
    fn reschedule(&mut self, mut agent: Agent, counts: bool) {
        let step = self.config.retry_step_secs;
        if let Some(start) = agent.start_time {
            agent.start_time = Some(start.offset(step));
        }
        if counts {
            agent.wait_time_accumulated += step;
            if agent.wait_time_accumulated > self.config.retry_ceiling_secs {
                warn!(train = %agent.id, name = %agent.name, start = ?agent.start_time,
                      "cannot place train after {} s of retries; abandoned",
                      agent.wait_time_accumulated);
                return;
            }
        }
        self.schedule(agent);
    }

    // ── Coupling operations ───────────────────────────────────────────────

    /// Transfer `victim`'s consist into `absorber` and leave the victim as
    /// an inert `Incorporated` husk.  The husk is skipped by the per-tick
    /// update and by the broken-consist removal check.
    pub fn absorb(&mut self, absorber: TrainId, victim: TrainId) -> bool {
        if absorber == victim || !self.trains.contains_key(&absorber) {
            return false;
        }
        let Some(v) = self.trains.get_mut(&victim) else {
            return false;
        };
        let mut units = std::mem::take(&mut v.units);
        v.role = Role::Incorporated { into: absorber };
        self.world.release(victim);

        for unit in &mut units {
            unit.train = absorber;
        }
        if let Some(a) = self.trains.get_mut(&absorber) {
            a.units.append(&mut units);
        }
        true
    }

    /// Split `units_from_rear` trailing units off `parent` into a new
    /// standing agent.  The new agent joins the world through the to-add
    /// buffer at this tick's boundary.
    pub fn detach(
        &mut self,
        parent: TrainId,
        units_from_rear: usize,
        new_id: TrainId,
        name: impl Into<String>,
    ) -> bool {
        let Some(p) = self.trains.get_mut(&parent) else {
            return false;
        };
        if units_from_rear == 0 || units_from_rear >= p.units.len() {
            return false;
        }
        let split = p.units.len() - units_from_rear;
        let mut units = p.units.split_off(split);
        for unit in &mut units {
            unit.train = new_id;
        }

        let mut agent = Agent::new(new_id, name, None);
        agent.units = units;
        agent.role = Role::Autonomous;
        agent.movement = MovementState::Static;
        self.buffers.to_add.push(agent);
        true
    }

    /// Queue an agent for removal from the active collection only; it stays
    /// registered (the host is taking it over).
    pub fn release_from_active(&mut self, id: TrainId) {
        self.buffers.to_remove_from_active.push(id);
    }

    // ── Primary promotion (driven by the pre-run engine) ──────────────────

    /// Remove the primary-slot entry from the pending queue, if present.
    pub fn take_pending_primary(&mut self) -> Option<Agent> {
        let agent = self.pending.remove_primary()?;
        self.start_reference.retain(|t| *t != agent.id);
        Some(agent)
    }

    /// The queued primary-slot entry, if promotion has not happened yet.
    pub fn peek_pending_primary(&self) -> Option<&Agent> {
        self.pending.iter().find(|a| a.role.is_primary_slot())
    }

    /// Finalize a resolved primary: promote its role, register it, and hand
    /// it to the host (it leaves the AI-updated list through the
    /// remove-from-active-only buffer).
    pub fn finalize_primary<O: DispatchObserver>(&mut self, mut agent: Agent, obs: &mut O) {
        debug_assert!(
            self.trains.values().all(|a| a.role != Role::Primary),
            "second primary promotion"
        );
        let id = agent.id;
        agent.role = Role::Primary;
        agent.movement = MovementState::Init;
        agent.offstage = false;
        self.start_reference.retain(|t| *t != id);
        obs.on_added(&agent);
        self.index_and_activate(agent);
        self.release_from_active(id);
        self.flush_mutations(obs);
    }

    /// Promote an already-materialized agent (pre-created under the
    /// reserved id, or produced by a detachment) to primary in place.
    /// Returns `false` if it is not there yet.
    pub fn promote_existing_primary(&mut self, id: TrainId) -> bool {
        debug_assert!(
            self.trains.values().all(|a| a.role != Role::Primary),
            "second primary promotion"
        );
        let Some(agent) = self.trains.get_mut(&id) else {
            return false;
        };
        agent.role = Role::Primary;
        agent.movement = MovementState::Init;
        agent.offstage = false;
        self.start_reference.retain(|t| *t != id);
        self.release_from_active(id);
        self.flush_mutations(&mut crate::NoopObserver);
        true
    }

    // ── Buffer commit ─────────────────────────────────────────────────────

    /// Apply all pending buffered mutations now.  Called at every tick
    /// boundary, and by the save path before serializing.
    pub fn flush_mutations<O: DispatchObserver>(&mut self, obs: &mut O) {
        self.apply_mutations(obs);
    }

    fn apply_mutations<O: DispatchObserver>(&mut self, obs: &mut O) {
        // ④ full removals first.
        let removed = std::mem::take(&mut self.buffers.to_remove);
        for id in removed {
            // `remove` returning None means a duplicate removal request;
            // honoring it once is the contract.
            let Some(agent) = self.trains.remove(&id) else {
                continue;
            };
            self.by_name.remove(&agent.name_key());
            self.active.retain(|t| *t != id);
            self.autogen.retain(|t| *t != id);
            self.world.release(id);
            obs.on_removed(id);
            self.form_successor(id, agent);
        }

        let dropped = std::mem::take(&mut self.buffers.to_remove_from_active);
        for id in dropped {
            self.active.retain(|t| *t != id);
        }

        // ⑤ additions.
        let added = std::mem::take(&mut self.buffers.to_add);
        for agent in added {
            obs.on_added(&agent);
            self.index_and_activate(agent);
        }
    }

    /// If a queued agent is formed from the termination of `source`, start
    /// it now: it inherits the finished consist and is placed through the
    /// to-add buffer (or rescheduled on conflict).
    ///
    /// A queued *primary* formed from `source` is not started here — the
    /// pre-run engine owns that promotion — but it does inherit the consist
    /// in place.
    fn form_successor(&mut self, source: TrainId, source_agent: Agent) {
        let Some(mut successor) = self.pending.take_formed_from(source) else {
            if let Some(primary) = self.pending.formed_from_mut(source) {
                let mut units = source_agent.units;
                if !units.is_empty() {
                    for unit in &mut units {
                        unit.train = primary.id;
                    }
                    primary.units = units;
                }
            }
            return;
        };
        let mut units = source_agent.units;
        if !units.is_empty() {
            for unit in &mut units {
                unit.train = successor.id;
            }
            successor.units = units;
        }
        // The formation event has fired; any retries from here go through
        // the normal queue path.
        successor.role = Role::NotStarted { formation: Formation::OnTime };

        let now = self.clock.now();
        match attempt_place(&mut successor, &mut self.world, &mut self.pool, now, true) {
            Placement::Placed => {
                self.start_reference.retain(|t| *t != successor.id);
                successor.wait_time_accumulated = 0;
                successor.role = Role::Autonomous;
                info!(train = %successor.id, formed_from = %source, "successor formed");
                self.buffers.to_add.push(successor);
            }
            _ => self.reschedule(successor, true),
        }
    }

    // ── Registry maintenance ──────────────────────────────────────────────

    fn index(&mut self, agent: Agent) {
        let id = agent.id;
        // Clear any stale entry before re-indexing under the same keys.
        if let Some(old) = self.trains.remove(&id) {
            self.by_name.remove(&old.name_key());
        }
        self.by_name.insert(agent.name_key(), id);
        self.trains.insert(id, agent);
    }

    fn index_and_activate(&mut self, agent: Agent) {
        let id = agent.id;
        self.index(agent);
        if !self.active.contains(&id) {
            self.active.push(id);
        }
    }
}
