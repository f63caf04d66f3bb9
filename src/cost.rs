//! Cost evaluation for a derived packing.
//!
//! The objective is total pairwise Manhattan wirelength between block
//! centers plus a heavy penalty for exceeding the die outline. The
//! penalty discourages out-of-outline states without forbidding them,
//! which keeps the search space connected. An auxiliary area term with
//! a decaying weight steers early search toward tight packings; it is
//! reported separately and folded in only through [`Cost::guided`].

use crate::types::{BBox, Cost, Outline, Placement};

/// Cost units charged per unit of outline overflow (width + height).
pub const OUTLINE_PENALTY_WEIGHT: f64 = 1_000.0;

const AREA_WEIGHT_INITIAL: f64 = 1.0;
const AREA_WEIGHT_FINAL: f64 = 0.1;

/// Linear interpolation of the auxiliary area weight from 1.0 toward
/// 0.1 across the iteration budget.
pub fn area_weight(iteration: u64, max_iterations: u64) -> f64 {
    if max_iterations == 0 {
        return AREA_WEIGHT_FINAL;
    }
    let frac = (iteration as f64 / max_iterations as f64).min(1.0);
    AREA_WEIGHT_INITIAL + (AREA_WEIGHT_FINAL - AREA_WEIGHT_INITIAL) * frac
}

/// Evaluate a packing. Wirelength is summed over all unordered block
/// pairs — O(n^2), acceptable for the tens-to-low-hundreds of blocks
/// floorplanning targets.
pub fn evaluate(placements: &[Placement], bbox: BBox, outline: Outline) -> Cost {
    let mut wirelength = 0.0;
    for i in 0..placements.len() {
        let (xi, yi) = placements[i].center();
        for j in (i + 1)..placements.len() {
            let (xj, yj) = placements[j].center();
            wirelength += (xi - xj).abs() + (yi - yj).abs();
        }
    }

    let excess_w = (bbox.width - outline.width).max(0.0);
    let excess_h = (bbox.height - outline.height).max(0.0);
    let penalty = OUTLINE_PENALTY_WEIGHT * (excess_w + excess_h);

    Cost {
        total: wirelength + penalty,
        wirelength,
        penalty,
        area: bbox.width * bbox.height,
    }
}

// -----------------------------------------------------------------
// Tests
// -----------------------------------------------------------------
