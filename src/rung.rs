//! Encoding rungs
//!
//! A rung is one selectable encoding of the stream. Rungs are owned by the
//! host's rung list; this crate only reads them and refers to them by their
//! position in that list.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One selectable encoding of the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rung {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Bitrate in bits per second
    pub bitrate: u64,
}

impl Rung {
    /// Create a new rung
    pub fn new(width: u32, height: u32, bitrate: u64) -> Self {
        Self {
            width,
            height,
            bitrate,
        }
    }

    /// Value identity used by the exclusion set
    pub fn key(&self) -> RungKey {
        RungKey {
            width: self.width,
            height: self.height,
            bitrate: self.bitrate,
        }
    }

    /// True if both rungs encode at the same resolution
    pub fn same_dimensions(&self, other: &Rung) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// True if this rung is at least as wide or at least as tall as the target
    pub fn covers(&self, width: u32, height: u32) -> bool {
        self.width >= width || self.height >= height
    }
}

impl fmt::Display for Rung {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}@{}bps", self.width, self.height, self.bitrate)
    }
}

/// Snapshot of a rung's `(width, height, bitrate)` triple.
///
/// Exclusions match on value rather than index because the host may rebuild
/// its rung list and shift indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RungKey {
    pub width: u32,
    pub height: u32,
    pub bitrate: u64,
}

impl RungKey {
    /// True if `rung` carries exactly this triple
    pub fn matches(&self, rung: &Rung) -> bool {
        *self == rung.key()
    }
}

impl From<&Rung> for RungKey {
    fn from(rung: &Rung) -> Self {
        rung.key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_matches_on_all_three_fields() {
        let rung = Rung::new(1280, 720, 1_500_000);
        let key = rung.key();
        assert!(key.matches(&rung));
        assert!(!key.matches(&Rung::new(1280, 720, 1_400_000)));
        assert!(!key.matches(&Rung::new(1280, 721, 1_500_000)));
        assert!(!key.matches(&Rung::new(1281, 720, 1_500_000)));
    }

    #[test]
    fn covers_on_either_axis() {
        let rung = Rung::new(640, 360, 500_000);
        assert!(rung.covers(640, 360));
        assert!(rung.covers(700, 300));
        assert!(rung.covers(500, 400));
        assert!(!rung.covers(641, 361));
    }

    #[test]
    fn display_format() {
        assert_eq!(Rung::new(640, 360, 800_000).to_string(), "640x360@800000bps");
    }
}
