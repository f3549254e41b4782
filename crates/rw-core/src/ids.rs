//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.  The inner integer is `pub` to allow
//! direct use where an index is needed, but callers should prefer the named
//! constants and helpers for clarity.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID" — equivalent to the type's MAX.
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

typed_id! {
    /// Service number of a scheduled train.  Unique across one session.
    pub struct TrainId(u32);
}

impl TrainId {
    /// The reserved id of the human-controlled train.  Every other service
    /// must be numbered above it.
    pub const PRIMARY: TrainId = TrainId(0);
}

typed_id! {
    /// One vehicle (powered or trailing) within a train's consist.
    pub struct UnitId(u32);
}

typed_id! {
    /// Index of a track section in the occupancy model.
    pub struct SectionId(u32);
}

typed_id! {
    /// Index of a storage slot within a yard pool.
    /// `u16` keeps pool bookkeeping compact (max 65,535 slots per yard).
    pub struct SlotId(u16);
}
