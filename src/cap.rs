//! The published cap value
//!
//! Ordering follows the numeric meaning of the cap: "no usable rung" (-1)
//! sorts below every index, and "uncapped" (+inf) sorts above every index.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Upper bound on the rung index the selection engine may request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CapLevel {
    /// The selector found no usable rung; consumers apply no restriction
    Unavailable,
    /// Rungs above this index must not be requested
    Index(usize),
    /// Capping is not active
    Uncapped,
}

impl CapLevel {
    /// Build a cap from a selector result
    pub fn from_selection(selection: Option<usize>) -> Self {
        selection.map_or(CapLevel::Unavailable, CapLevel::Index)
    }

    /// Highest rung index consumers may request, if restricted
    pub fn max_index(&self) -> Option<usize> {
        match self {
            CapLevel::Index(index) => Some(*index),
            CapLevel::Unavailable | CapLevel::Uncapped => None,
        }
    }

    /// Apply an external hard ceiling.
    ///
    /// `Unavailable` means "no restriction" to consumers, so a ceiling
    /// replaces it rather than being lost.
    pub fn clamp_to(self, ceiling: Option<usize>) -> Self {
        match (self, ceiling) {
            (_, None) => self,
            (CapLevel::Unavailable, Some(ceiling)) => CapLevel::Index(ceiling),
            (level, Some(ceiling)) => level.min(CapLevel::Index(ceiling)),
        }
    }

    /// True if consumers may request `index` under this cap
    pub fn permits(&self, index: usize) -> bool {
        self.max_index().map_or(true, |max| index <= max)
    }

    /// Signed form used by hosts that store the cap as a plain integer
    /// (`-1` for unavailable, `i64::MAX` for uncapped)
    pub fn as_i64(&self) -> i64 {
        match self {
            CapLevel::Unavailable => -1,
            CapLevel::Index(index) => *index as i64,
            CapLevel::Uncapped => i64::MAX,
        }
    }
}

impl Default for CapLevel {
    fn default() -> Self {
        CapLevel::Uncapped
    }
}

impl fmt::Display for CapLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapLevel::Unavailable => write!(f, "unavailable"),
            CapLevel::Index(index) => write!(f, "{}", index),
            CapLevel::Uncapped => write!(f, "uncapped"),
        }
    }
}
