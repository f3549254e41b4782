//! Agent roles and start formations.
//!
//! # Design
//!
//! Role is a closed tagged variant, exhaustively matched at every decision
//! point; each variant carries only the data its lifecycle stage needs.  The
//! start-condition descriptor ([`Formation`]) appears exactly where a start
//! can still happen: on `NotStarted` and `PrimaryPending`.

use rw_core::TrainId;

// ── Formation ─────────────────────────────────────────────────────────────────

/// How a not-yet-started agent comes into existence.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Formation {
    /// Placed independently at its scheduled start time.
    OnTime,
    /// Already materialized under the reserved primary id before activation.
    PreCreated,
    /// Formed when the named train finishes and is removed.
    FormedFrom(TrainId),
    /// Produced by a detachment from the named train.
    DetachedFrom(TrainId),
    /// Extracted from a named storage pool.
    FromPool { pool: String },
}

impl Formation {
    /// `true` if this agent is activated by another agent's lifecycle event
    /// rather than by the pending queue.
    pub fn is_event_driven(&self) -> bool {
        matches!(self, Formation::FormedFrom(_) | Formation::DetachedFrom(_))
    }
}

// ── Role ──────────────────────────────────────────────────────────────────────

/// Lifecycle role of an agent.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind"))]
pub enum Role {
    /// Scheduled, awaiting activation from the pending queue.
    NotStarted { formation: Formation },
    /// Actively simulated, autonomously controlled.
    Autonomous,
    /// The human-controlled train.  At most one active agent holds this.
    Primary,
    /// Will become the primary once its start condition resolves.
    PrimaryPending { formation: Formation },
    /// Pre-warmed by the host and activated out of band, never via the queue.
    AutoGenerate,
    /// Absorbed into another train's consist; kept as an inert husk.
    Incorporated { into: TrainId },
}

impl Role {
    /// `true` for the roles that occupy the (unique) primary slot.
    pub fn is_primary_slot(&self) -> bool {
        matches!(self, Role::Primary | Role::PrimaryPending { .. })
    }

    /// The start formation, for roles that still have a start ahead of them.
    pub fn formation(&self) -> Option<&Formation> {
        match self {
            Role::NotStarted { formation } | Role::PrimaryPending { formation } => Some(formation),
            Role::Autonomous | Role::Primary | Role::AutoGenerate | Role::Incorporated { .. } => {
                None
            }
        }
    }

    /// `true` if the queue's role-aware drain must leave this entry in place:
    /// primary-slot entries are resolved by the pre-run engine, event-driven
    /// formations by the lifecycle of the train they descend from.
    pub fn skip_auto_activation(&self) -> bool {
        if self.is_primary_slot() {
            return true;
        }
        self.formation().is_some_and(Formation::is_event_driven)
    }
}
