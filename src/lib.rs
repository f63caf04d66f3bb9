//! Fixed-outline floorplanning with a B*-tree packing representation
//! and simulated-annealing search.
//!
//! Rectangular blocks are packed by a binary tree whose structure
//! *is* the placement: a left child sits at its parent's right edge, a
//! right child stacks above it, and a contour sweep turns any tree
//! into an overlap-free layout. The annealer perturbs the tree (swap
//! payloads, rotate a block, move a subtree), scores each neighbor by
//! wirelength plus an outline penalty, and keeps or reverts the edit
//! under the Metropolis criterion.
//!
//! The search is heuristic, not optimal, and a run that never fits the
//! outline still returns its best layout with `feasible = false`.

pub mod anneal;
mod contour;
pub mod cost;
pub mod error;
pub mod prng;
pub mod state;
pub mod tree;
pub mod types;

pub use anneal::{run, run_chains, run_with_stop, sa_accept};
pub use error::{FloorplanError, Result};
pub use types::{
    BlockDims, FloorplanParams, FloorplanResult, Outline, Placement, TerminationReason,
};

/// Run the floorplanner on a JSON params string, returning the result
/// as JSON. Convenience wrapper over [`run_chains`] for callers that
/// speak the interchange format directly.
pub fn floorplan_json(params_json: &str) -> Result<String> {
    let params: FloorplanParams = serde_json::from_str(params_json)?;
    let result = run_chains(&params)?;
    Ok(serde_json::to_string(&result)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC_SCENARIO: &str = r#"{
        "seed": 42,
        "outline": {"width": 20.0, "height": 15.0},
        "blocks": [
            {"width": 4.0, "height": 5.0},
            {"width": 3.0, "height": 7.0},
            {"width": 6.0, "height": 2.0},
            {"width": 8.0, "height": 4.0},
            {"width": 5.0, "height": 6.0}
        ],
        "cooling_rate": 0.05,
        "max_iterations": 2000
    }"#;

    #[test]
    fn json_round_trip() {
        let out = floorplan_json(SPEC_SCENARIO).expect("run");
        let result: FloorplanResult = serde_json::from_str(&out).expect("parse result");
        assert_eq!(result.placements.len(), 5);
        assert!(result.feasible);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            floorplan_json("{not json"),
            Err(FloorplanError::Json(_))
        ));
    }

    #[test]
    fn invalid_block_reported_through_json_surface() {
        let bad = r#"{
            "seed": 1,
            "outline": {"width": 20.0, "height": 15.0},
            "blocks": [{"width": 0.0, "height": 5.0}]
        }"#;
        assert!(matches!(
            floorplan_json(bad),
            Err(FloorplanError::InvalidBlock { index: 0, .. })
        ));
    }
}
