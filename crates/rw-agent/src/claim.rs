//! Committed track reservations.

use rw_core::SectionId;

/// A committed reservation: the track sections claimed for an agent's
/// initial placement, plus the usable length they add up to.
///
/// The occupancy model produces claims; the agent's motion update consumes
/// the total length to know when its route is exhausted.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteClaim {
    /// Claimed sections, in travel order.
    pub sections: Vec<SectionId>,
    /// Total usable length of the claimed sections.
    pub length_m: f32,
}

impl RouteClaim {
    pub fn new(sections: Vec<SectionId>, length_m: f32) -> Self {
        Self { sections, length_m }
    }
}
