//! Data types for the floorplanner's parameter/result interchange.
//!
//! Every struct here derives Serialize + Deserialize so a whole run can
//! round-trip through JSON (see [`crate::floorplan_json`]).

use serde::{Deserialize, Serialize};

use crate::error::{FloorplanError, Result};

fn is_false(v: &bool) -> bool {
    !v
}

// -- Geometry ------------------------------------------------------

/// Width/height of a placeable module. Immutable once validated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockDims {
    pub width: f64,
    pub height: f64,
}

/// The fixed die outline the packing must fit inside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    pub width: f64,
    pub height: f64,
}

/// Bounding box of a derived packing, anchored at the origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub width: f64,
    pub height: f64,
}

/// Final coordinates of one block, derived from the packing tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub id: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "is_false")]
    pub rotated: bool,
}

impl Placement {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

// -- Parameters ----------------------------------------------------

fn default_initial_temperature() -> f64 {
    100.0
}
fn default_cooling_rate() -> f64 {
    0.01
}
fn default_temperature_floor() -> f64 {
    1e-3
}
fn default_max_iterations() -> u64 {
    10_000
}
fn default_convergence_window() -> u64 {
    500
}
fn default_num_chains() -> u32 {
    1
}

/// Input to a floorplanning run: the block list, the outline, and the
/// annealing schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloorplanParams {
    pub seed: u64,
    pub outline: Outline,
    pub blocks: Vec<BlockDims>,
    #[serde(default = "default_initial_temperature")]
    pub initial_temperature: f64,
    /// Linear temperature decrement applied each iteration.
    #[serde(default = "default_cooling_rate")]
    pub cooling_rate: f64,
    /// The run stops once temperature falls to or below this value.
    #[serde(default = "default_temperature_floor")]
    pub temperature_floor: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u64,
    /// Stop after this many consecutive iterations without an accepted
    /// improving move.
    #[serde(default = "default_convergence_window")]
    pub convergence_window: u64,
    /// Independent annealing chains to run; the cheapest terminal state
    /// wins. Each chain gets its own PRNG stream from the same seed.
    #[serde(default = "default_num_chains")]
    pub num_chains: u32,
}

impl FloorplanParams {
    /// Reject structurally invalid input before any tree is built.
    ///
    /// Block geometry errors are fatal here; whether the search manages
    /// to fit the outline is a soft condition reported through
    /// [`FloorplanResult::feasible`] instead.
    pub fn validate(&self) -> Result<()> {
        for (index, block) in self.blocks.iter().enumerate() {
            let ok = block.width > 0.0
                && block.height > 0.0
                && block.width.is_finite()
                && block.height.is_finite();
            if !ok {
                return Err(FloorplanError::InvalidBlock {
                    index,
                    width: block.width,
                    height: block.height,
                });
            }
        }
        if !(self.outline.width > 0.0 && self.outline.height > 0.0) {
            return Err(FloorplanError::BadParams(format!(
                "outline must have positive dimensions, got {}x{}",
                self.outline.width, self.outline.height
            )));
        }
        if !(self.initial_temperature > 0.0) {
            return Err(FloorplanError::BadParams(format!(
                "initial_temperature must be positive, got {}",
                self.initial_temperature
            )));
        }
        if !(self.cooling_rate > 0.0) {
            return Err(FloorplanError::BadParams(format!(
                "cooling_rate must be positive, got {}",
                self.cooling_rate
            )));
        }
        Ok(())
    }
}

// -- Cost ----------------------------------------------------------

/// Cost breakdown for one derived packing.
///
/// `total` is the reported objective (wirelength + outline penalty).
/// `area` is kept separate: the controller folds it in with a decaying
/// weight to steer early search, but it is not part of the objective a
/// caller sees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Cost {
    pub total: f64,
    pub wirelength: f64,
    pub penalty: f64,
    pub area: f64,
}

impl Cost {
    /// True when the packing fits the outline (no penalty accrued).
    pub fn feasible(&self) -> bool {
        self.penalty == 0.0
    }

    /// Search-guidance value: objective plus the weighted area term.
    pub fn guided(&self, area_weight: f64) -> f64 {
        self.total + area_weight * self.area
    }
}

// -- Result --------------------------------------------------------

/// Why the annealing loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// No improving move accepted for `convergence_window` iterations.
    Converged,
    /// Temperature cooled to or below `temperature_floor`.
    TemperatureFloor,
    /// `max_iterations` reached.
    IterationBudget,
    /// External stop flag was raised between iterations.
    Cancelled,
}

/// The best floorplan found by a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloorplanResult {
    /// One entry per input block, indexed by block id.
    pub placements: Vec<Placement>,
    pub bbox: BBox,
    pub cost: Cost,
    /// False when even the best state overflows the outline; callers
    /// decide whether to retry with a larger outline or more iterations.
    pub feasible: bool,
    pub iterations: u64,
    pub termination: TerminationReason,
}

impl FloorplanResult {
    /// Plain-text rendering, one line per block. Presentation only.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for p in &self.placements {
            let rot = if p.rotated { " rotated" } else { "" };
            out.push_str(&format!(
                "block {}: ({}, {}) {}x{}{}\n",
                p.id, p.x, p.y, p.width, p.height, rot
            ));
        }
        out
    }
}

// -- Tests ---------------------------------------------------------
