//! Unit tests for rw-prerun.

use rw_agent::{Agent, Formation, Role, Unit};
use rw_core::{CancelToken, SectionId, SlotId, Timestamp, TrainId, UnitId};
use rw_dispatch::{Dispatcher, NoopObserver};
use rw_track::{PoolExtract, SectionOccupancy, StoragePool, YardPool};

use crate::{Phase, PreRunEngine, PreRunError, Warmup};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn agent_on(id: u32, start: u32, path: &[u32]) -> Agent {
    let train = TrainId(id);
    let mut agent = Agent::new(train, format!("svc {id}"), Some(Timestamp(start)));
    agent.units = vec![Unit::new(UnitId(id), train, true, 20.0)];
    agent.path = path.iter().map(|&s| SectionId(s)).collect();
    agent
}

fn primary_on(id: u32, start: u32, path: &[u32], formation: Formation) -> Agent {
    let mut agent = agent_on(id, start, path);
    agent.role = Role::PrimaryPending { formation };
    agent
}

fn dispatcher(sections: usize) -> Dispatcher<SectionOccupancy, YardPool> {
    Dispatcher::new(SectionOccupancy::uniform(sections, 100.0), YardPool::new(), 600.0)
}

const ACTIVATION: f64 = 600.0;

// ── Happy paths ───────────────────────────────────────────────────────────────

mod ready {
    use super::*;

    #[test]
    fn on_time_primary_promotes_without_delay() {
        let mut d = dispatcher(8);
        let mut early = agent_on(1, 50, &[0, 1]);
        early.initial_speed = 10.0;
        d.schedule(early);
        d.schedule(primary_on(5, 550, &[4, 5], Formation::OnTime));

        let mut engine = PreRunEngine::new();
        let outcome = engine
            .run(&mut d, ACTIVATION, &CancelToken::new(), &mut NoopObserver)
            .unwrap();

        assert_eq!(outcome, Warmup::Completed { delayed_by_secs: 0.0 });
        assert_eq!(engine.phase(), Phase::Ready);

        let primary = d.primary().unwrap();
        assert_eq!(primary.id, TrainId(5));
        assert!(primary.claim.is_some());
        assert!(!primary.offstage);
        // The early AI ran its 200 m route to completion during warm-up.
        assert!(d.agent(TrainId(1)).is_none());
        // Control is back with the host.
        assert!(!d.clock().is_local());
        assert_eq!(d.clock().now(), ACTIVATION);
        assert!(d.pending().is_empty());
    }

    #[test]
    fn no_primary_in_schedule_is_a_clean_finish() {
        let mut d = dispatcher(4);
        d.schedule(agent_on(1, 50, &[0, 1]));

        let mut engine = PreRunEngine::new();
        let outcome = engine
            .run(&mut d, ACTIVATION, &CancelToken::new(), &mut NoopObserver)
            .unwrap();
        assert_eq!(outcome, Warmup::Completed { delayed_by_secs: 0.0 });
        assert!(d.primary().is_none());
    }

    #[test]
    fn formed_from_waits_for_source_to_finish_and_inherits_consist() {
        let mut d = dispatcher(8);
        let mut source = agent_on(1, 50, &[0, 1]);
        source.initial_speed = 10.0;
        source.units.push(Unit::new(UnitId(70), TrainId(1), false, 20.0));
        d.schedule(source);

        let mut primary = primary_on(5, 500, &[4, 5], Formation::FormedFrom(TrainId(1)));
        primary.units.clear(); // the consist arrives with the incoming train
        d.schedule(primary);

        let mut engine = PreRunEngine::new();
        let outcome = engine
            .run(&mut d, ACTIVATION, &CancelToken::new(), &mut NoopObserver)
            .unwrap();
        assert!(matches!(outcome, Warmup::Completed { .. }));

        let promoted = d.primary().unwrap();
        assert_eq!(promoted.id, TrainId(5));
        assert_eq!(promoted.units.len(), 2);
        assert!(promoted.units.iter().all(|u| u.train == TrainId(5)));
        assert!(promoted.units.iter().any(|u| u.id == UnitId(70)));
    }

    #[test]
    fn detached_primary_promotes_once_detachment_lands() {
        let mut d = dispatcher(8);
        let mut parent = agent_on(1, 0, &[0, 1]);
        parent.units.push(Unit::new(UnitId(71), TrainId(1), true, 20.0));
        d.register_autogen(parent);
        d.schedule(primary_on(5, 550, &[4, 5], Formation::DetachedFrom(TrainId(1))));

        // Host performs the detachment before warm-up; it lands through the
        // to-add buffer at the first tick boundary.
        assert!(d.detach(TrainId(1), 1, TrainId(5), "primary portion"));

        let mut engine = PreRunEngine::new();
        let outcome = engine
            .run(&mut d, ACTIVATION, &CancelToken::new(), &mut NoopObserver)
            .unwrap();
        assert!(matches!(outcome, Warmup::Completed { .. }));
        assert_eq!(d.primary().unwrap().id, TrainId(5));
    }

    #[test]
    fn pre_created_primary_is_promoted_in_place() {
        let mut d = dispatcher(8);
        d.register_autogen(agent_on(0, 0, &[0, 1])); // reserved id, already materialized
        d.schedule(primary_on(0, 550, &[0, 1], Formation::PreCreated));

        let mut engine = PreRunEngine::new();
        let outcome = engine
            .run(&mut d, ACTIVATION, &CancelToken::new(), &mut NoopObserver)
            .unwrap();
        assert!(matches!(outcome, Warmup::Completed { .. }));
        assert_eq!(d.primary().unwrap().id, TrainId::PRIMARY);
        assert!(d.pending().is_empty());
    }
}

// ── Pool-formed primary ───────────────────────────────────────────────────────

mod pool {
    use super::*;

    /// A pool that answers `Delayed` a fixed number of times, then forms.
    struct FlakyPool {
        delays_left: u32,
        extracts: u32,
    }

    impl StoragePool for FlakyPool {
        fn extract(&mut self, _pool: &str, agent: &mut Agent, _now: f64) -> PoolExtract {
            self.extracts += 1;
            if self.delays_left > 0 {
                self.delays_left -= 1;
                return PoolExtract::Delayed;
            }
            for unit in &mut agent.units {
                unit.train = agent.id;
            }
            PoolExtract::Formed
        }

        fn create_in_pool(
            &mut self,
            _pool: &str,
            _agent: &Agent,
            _siblings: &[TrainId],
        ) -> Option<SlotId> {
            None
        }
    }

    /// Delayed extraction keeps the engine waiting and retrying on the
    /// fine-step clock; the session is never aborted.
    #[test]
    fn delayed_extraction_retries_until_formed() {
        let world = SectionOccupancy::uniform(8, 100.0);
        let pool = FlakyPool { delays_left: 3, extracts: 0 };
        let mut d = Dispatcher::new(world, pool, ACTIVATION);
        d.schedule(primary_on(
            5,
            550,
            &[0, 1],
            Formation::FromPool { pool: "yard".into() },
        ));

        let mut engine = PreRunEngine::new();
        let outcome = engine
            .run(&mut d, ACTIVATION, &CancelToken::new(), &mut NoopObserver)
            .unwrap();

        let Warmup::Completed { delayed_by_secs } = outcome else {
            panic!("expected completion, got {outcome:?}");
        };
        assert!(delayed_by_secs > 0.0, "delayed retries must push the clock");
        assert_eq!(engine.phase(), Phase::Ready);
        assert_eq!(d.pool.extracts, 4); // 3 delays + the forming attempt
        assert_eq!(d.primary().unwrap().id, TrainId(5));
    }

    #[test]
    fn failed_extraction_aborts_the_session() {
        let mut d = dispatcher(8);
        // No yard registered: the reference pool reports Failed.
        d.schedule(primary_on(
            5,
            550,
            &[0, 1],
            Formation::FromPool { pool: "nowhere".into() },
        ));

        let mut engine = PreRunEngine::new();
        let err = engine
            .run(&mut d, ACTIVATION, &CancelToken::new(), &mut NoopObserver)
            .unwrap_err();
        assert!(matches!(err, PreRunError::Dispatch(_)));
        assert_eq!(engine.phase(), Phase::Aborted);
    }
}

// ── Horizon timeouts ──────────────────────────────────────────────────────────

mod horizon {
    use super::*;

    /// Formed-from dependency whose source never starts at all: the abort
    /// cause must name the never-ran condition, not never-arrived.
    #[test]
    fn formed_from_source_never_started() {
        let mut d = dispatcher(8);
        // Source scheduled beyond the horizon: it will never start.
        d.schedule(agent_on(1, 90_000, &[0, 1]));
        d.schedule(primary_on(5, 500, &[4, 5], Formation::FormedFrom(TrainId(1))));

        let mut engine = PreRunEngine::new();
        let err = engine
            .run(&mut d, ACTIVATION, &CancelToken::new(), &mut NoopObserver)
            .unwrap_err();
        assert!(matches!(err, PreRunError::IncomingNeverRan { train } if train == TrainId(1)));
        assert_eq!(engine.phase(), Phase::Aborted);
    }

    #[test]
    fn formed_from_source_never_arrives() {
        let mut d = dispatcher(1_000);
        // Source starts but its route is far too long to finish in a day.
        let mut source = agent_on(1, 50, &(0..1_000u32).collect::<Vec<_>>());
        source.initial_speed = 1.0;
        source.max_speed = 1.0; // 100 km at 1 m/s: never arrives
        d.schedule(source);
        d.schedule(primary_on(5, 500, &[0], Formation::FormedFrom(TrainId(1))));

        let mut engine = PreRunEngine::new();
        let err = engine
            .run(&mut d, ACTIVATION, &CancelToken::new(), &mut NoopObserver)
            .unwrap_err();
        assert!(matches!(err, PreRunError::IncomingNeverArrived { train } if train == TrainId(1)));
    }

    #[test]
    fn blocked_track_never_clears() {
        let mut d = dispatcher(4);
        // A standing train holds the primary's footprint all day.
        d.schedule(agent_on(1, 50, &[0]));
        d.schedule(primary_on(5, 500, &[0, 1], Formation::OnTime));

        let mut engine = PreRunEngine::new();
        let err = engine
            .run(&mut d, ACTIVATION, &CancelToken::new(), &mut NoopObserver)
            .unwrap_err();
        assert!(matches!(err, PreRunError::TrackNeverCleared));
        assert_eq!(engine.phase(), Phase::Aborted);
    }
}

// ── Cancellation ──────────────────────────────────────────────────────────────

mod cancel {
    use super::*;

    #[test]
    fn requested_cancel_returns_cleanly_from_the_coarse_loop() {
        let mut d = dispatcher(4);
        d.schedule(agent_on(1, 50, &[0, 1]));
        d.schedule(primary_on(5, 550, &[2, 3], Formation::OnTime));

        let token = CancelToken::new();
        token.request();

        let mut engine = PreRunEngine::new();
        let outcome = engine
            .run(&mut d, ACTIVATION, &token, &mut NoopObserver)
            .unwrap();
        assert_eq!(outcome, Warmup::Cancelled);
        // Partially warmed: the clock is still local and no promotion ran.
        assert!(d.clock().is_local());
        assert!(d.primary().is_none());
    }

    #[test]
    fn cancel_during_readiness_wait() {
        // Primary scheduled after the activation time: no coarse loop runs,
        // so the cancel is observed inside the readiness wait itself.
        let mut d = dispatcher(4);
        d.schedule(primary_on(5, 650, &[0, 1], Formation::OnTime));

        let token = CancelToken::new();
        token.request();

        let mut engine = PreRunEngine::new();
        let outcome = engine
            .run(&mut d, ACTIVATION, &token, &mut NoopObserver)
            .unwrap();
        assert_eq!(outcome, Warmup::Cancelled);
        assert_eq!(engine.phase(), Phase::AwaitingPrimaryReady);
        assert!(d.pending().contains(TrainId(5)));
    }
}
