//! Rungs excluded after performance drops
//!
//! When the host reports dropped frames on a rung, that rung's triple is
//! recorded here and skipped by the selector until the stream restarts.

use tracing::{debug, info};

use crate::rung::{Rung, RungKey};

/// Append-only set of excluded rung triples
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    excluded: Vec<RungKey>,
}

impl ExclusionSet {
    /// Create an empty exclusion set
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `rung` is excluded by value
    pub fn contains(&self, rung: &Rung) -> bool {
        self.excluded.iter().any(|key| key.matches(rung))
    }

    /// True if `rung` may still be selected
    pub fn allows(&self, rung: &Rung) -> bool {
        !self.contains(rung)
    }

    /// Exclude `rung`. Returns false if it was already excluded.
    pub fn insert(&mut self, rung: &Rung) -> bool {
        if self.contains(rung) {
            return false;
        }
        self.excluded.push(rung.key());
        true
    }

    /// Record a performance drop on the rung at `index`.
    ///
    /// Out-of-range indices are ignored. Returns true if the set grew.
    pub fn record_drop(&mut self, index: usize, rungs: &[Rung]) -> bool {
        let Some(rung) = rungs.get(index) else {
            debug!("Ignoring drop for unknown rung {} ({} rungs)", index, rungs.len());
            return false;
        };

        if self.insert(rung) {
            info!("Excluding rung {} ({}) after performance drop", index, rung);
            true
        } else {
            debug!("Rung {} ({}) already excluded", index, rung);
            false
        }
    }

    /// Forget all exclusions (new stream)
    pub fn clear(&mut self) {
        self.excluded.clear();
    }

    pub fn len(&self) -> usize {
        self.excluded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.excluded.is_empty()
    }

    /// Excluded triples in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &RungKey> {
        self.excluded.iter()
    }
}
