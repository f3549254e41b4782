//! Snapshot structures and the save/restore entry points.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use rw_agent::Agent;
use rw_dispatch::{Dispatcher, NoopObserver};
use rw_track::{Occupancy, StoragePool};

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot encode/decode failed: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;

// ── Snapshot ──────────────────────────────────────────────────────────────────

/// The three agent collections, in contractual order.
///
/// Each agent record carries its role variant tag, which restore uses as
/// the constructor discriminator.
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    /// Active agents; in timetable mode the primary comes first.
    pub active: Vec<Agent>,
    /// Pending-queue agents, ascending start-time order.
    pub pending: Vec<Agent>,
    /// Auto-generate agents.
    pub autogen: Vec<Agent>,
}

impl Snapshot {
    /// Capture a dispatcher's collections.  Pending buffered mutations are
    /// flushed first so no agent is caught mid-transition.
    pub fn capture<W, P>(d: &mut Dispatcher<W, P>, timetable: bool) -> Self
    where
        W: Occupancy,
        P: StoragePool,
    {
        d.flush_mutations(&mut NoopObserver);

        let mut active: Vec<Agent> = Vec::new();
        if timetable {
            active.extend(d.primary().cloned());
        }
        active.extend(d.active_agents().cloned());

        Self {
            active,
            pending: d.pending().iter().cloned().collect(),
            autogen: d.autogen_agents().cloned().collect(),
        }
    }

    /// Rebuild a dispatcher around fresh collaborator instances.
    pub fn rebuild<W, P>(self, world: W, pool: P, host_secs: f64) -> Dispatcher<W, P>
    where
        W: Occupancy,
        P: StoragePool,
    {
        Dispatcher::from_collections(world, pool, host_secs, self.active, self.pending, self.autogen)
    }
}

// ── Entry points ──────────────────────────────────────────────────────────────

/// Serialize a dispatcher's collections to `writer`.
pub fn save<W, P, Out>(
    d: &mut Dispatcher<W, P>,
    timetable: bool,
    writer: Out,
) -> SnapshotResult<()>
where
    W: Occupancy,
    P: StoragePool,
    Out: Write,
{
    let snapshot = Snapshot::capture(d, timetable);
    serde_json::to_writer(writer, &snapshot)?;
    Ok(())
}

/// Deserialize collections from `reader` and rebuild a dispatcher.
pub fn restore<W, P, In>(
    reader: In,
    world: W,
    pool: P,
    host_secs: f64,
) -> SnapshotResult<Dispatcher<W, P>>
where
    W: Occupancy,
    P: StoragePool,
    In: Read,
{
    let snapshot: Snapshot = serde_json::from_reader(reader)?;
    Ok(snapshot.rebuild(world, pool, host_secs))
}

// ── Legacy single-agent autopilot path ────────────────────────────────────────

/// Reduced single-agent save used by the autopilot mode: one agent plus the
/// index of the unit the human occupies.
#[derive(Debug, Serialize, Deserialize)]
struct AutopilotSnapshot {
    agent: Agent,
    primary_unit: Option<usize>,
}

/// Persist one agent and the occupied-unit index.
pub fn save_autopilot<Out: Write>(
    agent: &Agent,
    primary_unit: Option<usize>,
    writer: Out,
) -> SnapshotResult<()> {
    let snapshot = AutopilotSnapshot { agent: agent.clone(), primary_unit };
    serde_json::to_writer(writer, &snapshot)?;
    Ok(())
}

/// Restore the single autopilot agent and the occupied-unit index.
pub fn restore_autopilot<In: Read>(reader: In) -> SnapshotResult<(Agent, Option<usize>)> {
    let snapshot: AutopilotSnapshot = serde_json::from_reader(reader)?;
    Ok((snapshot.agent, snapshot.primary_unit))
}
