//! Per-agent movement state tag.

/// The movement state of one agent.
///
/// `Init` is the state of a freshly placed (or freshly promoted) agent before
/// its first update; `Static` is a standing agent waiting for out-of-band
/// activation.  The remaining states are the simplified en-route cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MovementState {
    Init,
    Static,
    Running,
    Braking,
    StationStop,
    Stopped,
}

impl MovementState {
    /// `true` for states in which the agent holds a speed greater than zero
    /// or may acquire one on the next update.
    pub fn is_moving(self) -> bool {
        matches!(self, MovementState::Running | MovementState::Braking)
    }
}
