//! Simulation time model.
//!
//! # Design
//!
//! Two representations, deliberately kept apart:
//!
//! - [`Timestamp`] — a schedule time, whole seconds since the schedule day
//!   origin.  Using an integer as the canonical schedule unit means all
//!   backoff arithmetic (+30 s per failed placement) is exact and
//!   comparisons are O(1).
//! - [`SimClock`] — the running clock, `f64` seconds, because tick deltas
//!   arrive from the host as fractional frame times.
//!
//! The clock carries the `local` flag: while `local`, the scheduler is
//! free-running its own time (the pre-run warm-up advances it in coarse
//! steps); once handed back to the host, every tick adopts the host clock
//! instead.

use std::fmt;

// ── Timestamp ────────────────────────────────────────────────────────────────

/// A scheduled time of day, in whole seconds since the schedule day origin.
///
/// Stored as `u32`: a full day is 86,400 s, and backed-off start times may
/// drift past midnight without ever approaching overflow.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp(pub u32);

impl Timestamp {
    /// Length of the schedule day — also the pre-run readiness horizon.
    pub const DAY_SECS: u32 = 86_400;

    /// Return the timestamp `secs` seconds after `self`.
    #[inline]
    pub fn offset(self, secs: u32) -> Timestamp {
        Timestamp(self.0 + secs)
    }

    /// The timestamp as clock seconds, for comparison against [`SimClock`].
    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64
    }

    /// `true` once `now` has reached or passed this timestamp.
    #[inline]
    pub fn is_due(self, now: f64) -> bool {
        self.as_secs_f64() <= now
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = self.0 / 3_600;
        let m = (self.0 % 3_600) / 60;
        let s = self.0 % 60;
        write!(f, "{h:02}:{m:02}:{s:02}")
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// The scheduler's running clock.
///
/// `SimClock` is cheap to copy and intentionally holds no heap data.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// Current simulated time, seconds since the schedule day origin.
    now: f64,
    /// `true` while the scheduler free-runs its own time (pre-run warm-up).
    local: bool,
}

impl SimClock {
    /// A clock slaved to the host, starting at `host_secs`.
    pub fn new(host_secs: f64) -> Self {
        Self { now: host_secs, local: false }
    }

    /// Current simulated time in seconds.
    #[inline]
    pub fn now(&self) -> f64 {
        self.now
    }

    /// `true` while the clock is free-running (not following the host).
    #[inline]
    pub fn is_local(&self) -> bool {
        self.local
    }

    /// Detach from the host and rewind to `secs` for a warm-up run.
    pub fn set_local(&mut self, secs: f64) {
        self.now = secs;
        self.local = true;
    }

    /// Re-attach to the host clock at `host_secs` (warm-up finished).
    pub fn hand_back(&mut self, host_secs: f64) {
        self.now = host_secs;
        self.local = false;
    }

    /// Per-tick time update: a local clock advances by `dt`, a slaved clock
    /// adopts the host time instead (and ignores `dt`).
    pub fn tick(&mut self, dt: f64, host_secs: Option<f64>) {
        match (self.local, host_secs) {
            (false, Some(host)) => self.now = host,
            _ => self.now += dt,
        }
    }

    /// Break the current time into (hour, minute, second) for progress logs.
    pub fn hms(&self) -> (u32, u32, u32) {
        let total = self.now.max(0.0) as u64;
        let h = ((total / 3_600) % 24) as u32;
        let m = ((total % 3_600) / 60) as u32;
        let s = (total % 60) as u32;
        (h, m, s)
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, m, s) = self.hms();
        write!(f, "{h:02}:{m:02}:{s:02}")
    }
}
