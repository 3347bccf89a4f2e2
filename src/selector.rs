//! Rung filter and selector
//!
//! Picks the highest rung worth decoding for a given pixel footprint. Pure:
//! the result depends only on the arguments.

use crate::exclusion::ExclusionSet;
use crate::rung::Rung;

/// Select the cap index for a `target_width` x `target_height` footprint.
///
/// Candidates are the rungs at positions `<= ceiling` that are not excluded.
/// Scanning candidates in order, the first rung that covers the footprint on
/// either axis *and* is the last candidate at its resolution (its
/// highest-bitrate encoding) wins. If no candidate covers the footprint, the
/// highest candidate is returned.
///
/// Returns the winner's index in the unfiltered `rungs` list, or `None` when
/// no candidate exists.
pub fn select_cap(
    rungs: &[Rung],
    target_width: u32,
    target_height: u32,
    ceiling: usize,
    exclusions: &ExclusionSet,
) -> Option<usize> {
    let candidates: Vec<(usize, &Rung)> = rungs
        .iter()
        .enumerate()
        .take_while(|(index, _)| *index <= ceiling)
        .filter(|(_, rung)| exclusions.allows(rung))
        .collect();

    for (pos, &(index, rung)) in candidates.iter().enumerate() {
        let tier_top = candidates
            .get(pos + 1)
            .map_or(true, |(_, next)| !rung.same_dimensions(next));

        if tier_top && rung.covers(target_width, target_height) {
            return Some(index);
        }
    }

    candidates.last().map(|&(index, _)| index)
}
