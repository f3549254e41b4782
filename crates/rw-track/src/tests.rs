//! Unit tests for rw-track.

use rw_agent::{Agent, Unit};
use rw_core::{SectionId, Timestamp, TrainId, UnitId};

use crate::{Occupancy, PoolExtract, SectionOccupancy, StoragePool, Yard, YardPool};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Agent with one 20 m powered unit and a path over the given sections.
fn agent_on(id: u32, path: &[u32]) -> Agent {
    let train = TrainId(id);
    let mut agent = Agent::new(train, format!("svc {id}"), Some(Timestamp(0)));
    agent.units = vec![Unit::new(UnitId(0), train, true, 20.0)];
    agent.path = path.iter().map(|&s| SectionId(s)).collect();
    agent
}

// ── SectionOccupancy ──────────────────────────────────────────────────────────

mod occupancy {
    use super::*;

    #[test]
    fn reservation_spans_whole_path() {
        let world = SectionOccupancy::uniform(4, 100.0);
        let agent = agent_on(1, &[0, 1, 2, 3]);
        let claim = world.initial_reservation(&agent).unwrap();
        assert_eq!(claim.sections.len(), 4);
        assert_eq!(claim.length_m, 400.0);
    }

    #[test]
    fn occupied_footprint_conflicts() {
        let mut world = SectionOccupancy::uniform(4, 100.0);
        let blocker = agent_on(2, &[0]);
        let claim = world.initial_reservation(&blocker).unwrap();
        world.commit(blocker.id, &claim);

        // Agent 1 needs to stand on section 0, held by agent 2.
        let agent = agent_on(1, &[0, 1, 2]);
        assert!(world.initial_reservation(&agent).is_none());
        assert!(!world.route_clear(&agent));
    }

    #[test]
    fn conflict_only_on_footprint_not_whole_path() {
        let mut world = SectionOccupancy::uniform(4, 100.0);
        let blocker = agent_on(2, &[3]);
        let claim = world.initial_reservation(&blocker).unwrap();
        world.commit(blocker.id, &claim);

        // 20 m train stands entirely on section 0; section 3 being occupied
        // further down the path must not block placement.
        let agent = agent_on(1, &[0, 1, 2, 3]);
        assert!(world.initial_reservation(&agent).is_some());
    }

    #[test]
    fn release_frees_sections() {
        let mut world = SectionOccupancy::uniform(2, 100.0);
        let first = agent_on(1, &[0, 1]);
        let claim = world.initial_reservation(&first).unwrap();
        world.commit(first.id, &claim);

        let second = agent_on(2, &[0, 1]);
        assert!(world.initial_reservation(&second).is_none());

        world.release(first.id);
        assert!(world.initial_reservation(&second).is_some());
    }

    #[test]
    fn reservation_does_not_mutate() {
        let world = SectionOccupancy::uniform(2, 100.0);
        let agent = agent_on(1, &[0, 1]);
        let _ = world.initial_reservation(&agent);
        // A second agent still sees free track.
        let other = agent_on(2, &[0, 1]);
        assert!(world.initial_reservation(&other).is_some());
    }

    #[test]
    fn path_too_short_for_consist() {
        let world = SectionOccupancy::uniform(1, 10.0);
        let agent = agent_on(1, &[0]); // 20 m train, 10 m of path
        assert!(world.initial_reservation(&agent).is_none());
    }

    #[test]
    fn forced_update_bumps_revision() {
        let mut world = SectionOccupancy::uniform(1, 100.0);
        let before = world.revision();
        world.update(false); // nothing dirty: no-op
        assert_eq!(world.revision(), before);
        world.update(true);
        assert_eq!(world.revision(), before + 1);
    }
}

// ── YardPool ──────────────────────────────────────────────────────────────────

mod pool {
    use super::*;

    fn pool_with(name: &str, yard: Yard) -> YardPool {
        let mut pool = YardPool::new();
        pool.add_yard(name, yard);
        pool
    }

    #[test]
    fn unknown_pool_is_failed() {
        let mut pool = YardPool::new();
        let mut agent = agent_on(1, &[]);
        assert_eq!(pool.extract("nowhere", &mut agent, 0.0), PoolExtract::Failed);
    }

    #[test]
    fn empty_yard_is_not_created() {
        let mut pool = pool_with("yard", Yard::new([100.0]));
        let mut agent = agent_on(1, &[]);
        assert_eq!(pool.extract("yard", &mut agent, 0.0), PoolExtract::NotCreated);
    }

    #[test]
    fn empty_yard_with_force_creation() {
        let mut yard = Yard::new([100.0]);
        yard.force_creation = true;
        let mut pool = pool_with("yard", yard);
        let mut agent = agent_on(1, &[]);
        assert_eq!(pool.extract("yard", &mut agent, 0.0), PoolExtract::ForceCreated);
    }

    #[test]
    fn blocked_exit_is_delayed() {
        let mut yard = Yard::new([100.0]);
        yard.store(TrainId(9), 40.0);
        yard.exit_blocked = true;
        let mut pool = pool_with("yard", yard);
        let mut agent = agent_on(1, &[]);
        assert_eq!(pool.extract("yard", &mut agent, 0.0), PoolExtract::Delayed);
    }

    #[test]
    fn stored_train_forms_and_reowns_consist() {
        let mut yard = Yard::new([100.0]);
        yard.store(TrainId(9), 40.0);
        let mut pool = pool_with("yard", yard);

        let mut agent = agent_on(1, &[]);
        agent.units[0].train = TrainId(9); // consist still owned by the stored train
        assert_eq!(pool.extract("yard", &mut agent, 0.0), PoolExtract::Formed);
        assert!(agent.consist_intact());
        assert_eq!(pool.yard_mut("yard").unwrap().stored_count(), 0);
    }

    #[test]
    fn formed_agent_without_units_gets_one() {
        let mut yard = Yard::new([100.0]);
        yard.store(TrainId(9), 40.0);
        let mut pool = pool_with("yard", yard);

        let mut agent = agent_on(1, &[]);
        agent.units.clear();
        assert_eq!(pool.extract("yard", &mut agent, 0.0), PoolExtract::Formed);
        assert!(agent.has_powered_unit());
        assert!(agent.consist_intact());
    }

    #[test]
    fn store_respects_capacity() {
        let mut yard = Yard::new([50.0]);
        assert!(yard.store(TrainId(1), 40.0).is_some());
        assert!(yard.store(TrainId(2), 40.0).is_none()); // 10 m left

        let mut pool = pool_with("yard", yard);
        let agent = agent_on(3, &[]); // 20 m
        assert!(pool.create_in_pool("yard", &agent, &[]).is_none());
    }

    #[test]
    fn extract_restores_slot_length() {
        let mut yard = Yard::new([50.0]);
        yard.store(TrainId(1), 40.0);
        let mut pool = pool_with("yard", yard);

        let mut agent = agent_on(2, &[]);
        assert_eq!(pool.extract("yard", &mut agent, 0.0), PoolExtract::Formed);

        // Freed length is usable again.
        assert!(pool.yard_mut("yard").unwrap().store(TrainId(3), 40.0).is_some());
    }
}
