//! Simulated-annealing search over the packing tree.
//!
//! Each iteration perturbs the tree, scores the neighbor, and applies
//! the Metropolis criterion; rejected moves are reverted through their
//! undo token rather than by cloning the state up front. Cloning only
//! happens when a new best is recorded. Temperature falls by a linear
//! decrement bounded at zero, and the run stops on the temperature
//! floor, the iteration budget, a stale-acceptance convergence window,
//! or an external stop flag — always returning the best snapshot
//! recorded so far, never a half-perturbed state.
//!
//! One run is inherently sequential (each iteration depends on the
//! previously accepted state), so parallelism lives a level up:
//! `run_chains` anneals independent chains from distinct PRNG streams
//! of the same seed and keeps the cheapest terminal result.

use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, trace};

use crate::cost::area_weight;
use crate::prng::Pcg32;
use crate::state::{FloorplanState, StepUndo};
use crate::types::{
    BlockDims, FloorplanParams, FloorplanResult, TerminationReason,
};

/// Metropolis acceptance for a minimization objective.
///
/// Improvements and ties are accepted without a PRNG draw. At zero
/// temperature a worsening move is rejected without a draw. Otherwise
/// a worsening move is accepted with P = exp(-(new - old) / T),
/// consuming one draw.
pub fn sa_accept(old_cost: f64, new_cost: f64, temperature: f64, rng: &mut Pcg32) -> bool {
    if new_cost <= old_cost {
        return true;
    }
    if temperature <= 0.0 {
        return false;
    }
    let p = (-(new_cost - old_cost) / temperature).exp();
    rng.next_float() < p
}

/// Linear cooling, bounded below by zero.
fn cool(temperature: f64, rate: f64) -> f64 {
    (temperature - rate).max(0.0)
}

fn result_from(
    state: &FloorplanState,
    iterations: u64,
    termination: TerminationReason,
) -> FloorplanResult {
    FloorplanResult {
        placements: state.placements.clone(),
        bbox: state.bbox,
        cost: state.cost,
        feasible: state.cost.feasible(),
        iterations,
        termination,
    }
}

/// Anneal one chain to termination. `stream` selects the PRNG sequence
/// so chains sharing a seed stay independent but reproducible.
fn anneal_chain(
    blocks: &[BlockDims],
    params: &FloorplanParams,
    stream: u64,
    stop: &AtomicBool,
) -> FloorplanResult {
    let mut rng = Pcg32::new(params.seed, stream);
    let mut state = FloorplanState::new(blocks, params.outline);

    let mut best_placements = state.placements.clone();
    let mut best_bbox = state.bbox;
    let mut best_cost = state.cost;

    let mut temperature = params.initial_temperature;
    let mut iteration: u64 = 0;
    let mut stale: u64 = 0;

    debug!(
        "chain {stream}: {} blocks, outline {}x{}, T0={}, initial cost {}",
        blocks.len(),
        params.outline.width,
        params.outline.height,
        temperature,
        state.cost.total
    );

    let termination = loop {
        if iteration >= params.max_iterations {
            break TerminationReason::IterationBudget;
        }
        if temperature <= params.temperature_floor {
            break TerminationReason::TemperatureFloor;
        }
        if stale >= params.convergence_window {
            break TerminationReason::Converged;
        }
        if stop.load(Ordering::Relaxed) {
            break TerminationReason::Cancelled;
        }

        let weight = area_weight(iteration, params.max_iterations);
        let old = state.cost;
        let token = state.perturb(&mut rng);

        let improved = if matches!(token, StepUndo::Noop) {
            false
        } else {
            let new = state.cost;
            if sa_accept(old.guided(weight), new.guided(weight), temperature, &mut rng) {
                if new.total < best_cost.total {
                    best_cost = new;
                    best_bbox = state.bbox;
                    best_placements.clone_from(&state.placements);
                    trace!("chain {stream}: iteration {iteration} best cost {}", new.total);
                }
                new.total < old.total
            } else {
                state.undo(token);
                false
            }
        };

        stale = if improved { 0 } else { stale + 1 };
        temperature = cool(temperature, params.cooling_rate);
        iteration += 1;
    };

    debug!(
        "chain {stream}: stopped after {iteration} iterations ({termination:?}), best cost {}",
        best_cost.total
    );

    FloorplanResult {
        placements: best_placements,
        bbox: best_bbox,
        cost: best_cost,
        feasible: best_cost.feasible(),
        iterations: iteration,
        termination,
    }
}

/// Run a single annealing chain.
pub fn run(params: &FloorplanParams) -> crate::error::Result<FloorplanResult> {
    let stop = AtomicBool::new(false);
    run_with_stop(params, &stop)
}

/// Run a single chain, checking `stop` between iterations. Raising the
/// flag terminates the run as `Cancelled` with the best state so far.
pub fn run_with_stop(
    params: &FloorplanParams,
    stop: &AtomicBool,
) -> crate::error::Result<FloorplanResult> {
    params.validate()?;
    if params.blocks.len() < 2 {
        // Zero pairs means zero wirelength: the initial packing is
        // already optimal, so no search runs at all.
        let state = FloorplanState::new(&params.blocks, params.outline);
        return Ok(result_from(&state, 0, TerminationReason::Converged));
    }
    Ok(anneal_chain(&params.blocks, params, 0, stop))
}

/// Run `params.num_chains` independent chains and keep the cheapest
/// terminal result. Chains share nothing but the input; they run in
/// parallel via scoped threads, with a serial fast path for one chain.
/// Deterministic for a fixed (seed, num_chains): ties keep the lowest
/// chain index.
pub fn run_chains(params: &FloorplanParams) -> crate::error::Result<FloorplanResult> {
    let stop = AtomicBool::new(false);
    let chains = params.num_chains.max(1);
    if chains == 1 {
        return run_with_stop(params, &stop);
    }
    params.validate()?;
    if params.blocks.len() < 2 {
        let state = FloorplanState::new(&params.blocks, params.outline);
        return Ok(result_from(&state, 0, TerminationReason::Converged));
    }

    let blocks = &params.blocks;
    let stop = &stop;
    let (first, rest) = std::thread::scope(|s| {
        let handles: Vec<_> = (1..chains)
            .map(|i| s.spawn(move || anneal_chain(blocks, params, i as u64, stop)))
            .collect();
        let first = anneal_chain(blocks, params, 0, stop);
        let rest: Vec<FloorplanResult> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        (first, rest)
    });

    let mut best = first;
    for r in rest {
        if r.cost.total < best.cost.total {
            best = r;
        }
    }
    Ok(best)
}

// -----------------------------------------------------------------
// Tests
// -----------------------------------------------------------------
