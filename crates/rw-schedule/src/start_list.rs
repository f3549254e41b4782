//! `StartList` — agents awaiting activation, sorted ascending by start time.

use tracing::warn;

use rw_agent::Agent;
use rw_core::{Timestamp, TrainId};

/// The pending-start queue.
///
/// Invariant: entries are sorted ascending by `start_time`, and every entry
/// has one — [`StartList::insert`] rejects agents without a scheduled start.
#[derive(Clone, Debug, Default)]
pub struct StartList {
    entries: Vec<Agent>,
}

impl StartList {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Insertion ─────────────────────────────────────────────────────────

    /// Insert `agent` in start-time order.
    ///
    /// An agent without a scheduled start time cannot be queued: the entry
    /// is logged and discarded, and `false` is returned.  Ties keep relative
    /// insertion order — the scan inserts before the first entry whose time
    /// is strictly greater.
    pub fn insert(&mut self, agent: Agent) -> bool {
        let Some(start) = agent.start_time else {
            warn!(train = %agent.id, name = %agent.name, "schedule entry has no start time; dropped");
            return false;
        };
        let pos = self
            .entries
            .iter()
            .position(|e| e.start_time.is_none_or(|t| t > start))
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, agent);
        true
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// The earliest scheduled start time, or `None` if the queue is empty.
    pub fn next_time(&self) -> Option<Timestamp> {
        self.entries.first().and_then(|e| e.start_time)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.entries.iter()
    }

    /// `true` if an entry with this id (or alias) is still queued.
    pub fn contains(&self, id: TrainId) -> bool {
        self.by_id(id).is_some()
    }

    // ── Draining ──────────────────────────────────────────────────────────

    /// Remove and return every entry due at `now`, in ascending time order.
    ///
    /// The sort invariant makes this a prefix scan: the first not-yet-due
    /// entry terminates it, and everything after stays untouched.
    pub fn drain_due(&mut self, now: f64) -> Vec<Agent> {
        let due = self
            .entries
            .iter()
            .take_while(|e| e.start_time.is_some_and(|t| t.is_due(now)))
            .count();
        self.entries.drain(..due).collect()
    }

    /// Role-aware variant of [`drain_due`](Self::drain_due): due entries
    /// whose role excludes them from automatic activation (primary slots,
    /// event-driven formations) are left in place and skipped over.
    pub fn drain_startable(&mut self, now: f64) -> Vec<Agent> {
        let mut out = Vec::new();
        let mut i = 0;
        while i < self.entries.len() {
            let entry = &self.entries[i];
            if !entry.start_time.is_some_and(|t| t.is_due(now)) {
                break;
            }
            if entry.role.skip_auto_activation() {
                i += 1;
            } else {
                out.push(self.entries.remove(i));
            }
        }
        out
    }

    // ── Targeted removal ──────────────────────────────────────────────────

    /// Remove the first primary-slot entry, if any.  Safe to call again —
    /// at most one entry is ever removed per call.
    pub fn remove_primary(&mut self) -> Option<Agent> {
        let pos = self.entries.iter().position(|e| e.role.is_primary_slot())?;
        Some(self.entries.remove(pos))
    }

    /// Find a queued entry by id or alias.
    pub fn by_id(&self, id: TrainId) -> Option<&Agent> {
        self.entries
            .iter()
            .find(|e| e.id == id || e.alias == Some(id))
    }

    /// Remove and return a queued entry by id or alias.
    pub fn take_by_id(&mut self, id: TrainId) -> Option<Agent> {
        let pos = self
            .entries
            .iter()
            .position(|e| e.id == id || e.alias == Some(id))?;
        Some(self.entries.remove(pos))
    }

    /// Remove and return the entry formed from `source`'s termination, if
    /// one is queued.  Primary-slot entries are never taken here — the
    /// pre-run readiness resolution owns those.
    pub fn take_formed_from(&mut self, source: TrainId) -> Option<Agent> {
        use rw_agent::Formation;
        let pos = self.entries.iter().position(|e| {
            !e.role.is_primary_slot()
                && e.role.formation() == Some(&Formation::FormedFrom(source))
        })?;
        Some(self.entries.remove(pos))
    }

    /// Mutable access to the queued entry (primary-slot entries included)
    /// formed from `source`'s termination.  Used to hand a finished train's
    /// consist over to the successor while it is still queued.
    pub fn formed_from_mut(&mut self, source: TrainId) -> Option<&mut Agent> {
        use rw_agent::Formation;
        self.entries
            .iter_mut()
            .find(|e| e.role.formation() == Some(&Formation::FormedFrom(source)))
    }

    /// Find a queued entry by name, case-insensitively.
    pub fn by_name(&self, name: &str) -> Option<&Agent> {
        self.entries
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name))
    }

    /// Remove and return a queued entry by name, case-insensitively.
    pub fn take_by_name(&mut self, name: &str) -> Option<Agent> {
        let pos = self
            .entries
            .iter()
            .position(|e| e.name.eq_ignore_ascii_case(name))?;
        Some(self.entries.remove(pos))
    }
}
