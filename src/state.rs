//! Floorplan state: a packing tree plus caches derived from it.
//!
//! The position map and cost are recomputed from the tree after every
//! structural edit; they are never authoritative. Perturbations return
//! an undo token so a rejected move can be reverted instead of cloning
//! the whole state up front.

use crate::contour::derive_positions;
use crate::cost::evaluate;
use crate::prng::Pcg32;
use crate::tree::{PackingTree, Side};
use crate::types::{BBox, BlockDims, Cost, Outline, Placement};

/// Undo token for reverting a single perturbation.
#[derive(Debug)]
pub enum StepUndo {
    /// Nothing changed (degenerate tree, no applicable operator).
    Noop,
    Swap {
        a: usize,
        b: usize,
    },
    Rotate {
        slot: usize,
    },
    Move {
        slot: usize,
        old_parent: usize,
        old_side: Side,
    },
}

const SWAP_WEIGHT: f64 = 1.0;
const ROTATE_WEIGHT: f64 = 1.0;
const MOVE_WEIGHT: f64 = 1.0;

/// Select index with probability proportional to weights. Returns
/// None if all weights are 0.
pub(crate) fn weighted_choice(rng: &mut Pcg32, weights: &[f64]) -> Option<usize> {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return None;
    }
    let r = rng.next_float() * total;
    let mut cumulative = 0.0;
    for (i, w) in weights.iter().enumerate() {
        cumulative += w;
        if r < cumulative {
            return Some(i);
        }
    }
    Some(weights.len() - 1)
}

pub struct FloorplanState {
    tree: PackingTree,
    outline: Outline,
    /// Derived from `tree`, indexed by block id. Cache, not ground truth.
    pub placements: Vec<Placement>,
    pub bbox: BBox,
    pub cost: Cost,
}

impl FloorplanState {
    pub fn new(blocks: &[BlockDims], outline: Outline) -> Self {
        let tree = PackingTree::build(blocks);
        let mut state = FloorplanState {
            tree,
            outline,
            placements: Vec::new(),
            bbox: BBox::default(),
            cost: Cost::default(),
        };
        state.refresh();
        state
    }

    pub fn tree(&self) -> &PackingTree {
        &self.tree
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    fn refresh(&mut self) {
        let (placements, bbox) = derive_positions(&self.tree);
        self.cost = evaluate(&placements, bbox, self.outline);
        self.placements = placements;
        self.bbox = bbox;
    }

    /// Apply one randomly chosen perturbation operator and re-derive the
    /// caches. Swap and move need two blocks; below that the state
    /// degrades to rotate-only, and an empty tree is a no-op.
    pub fn perturb(&mut self, rng: &mut Pcg32) -> StepUndo {
        let n = self.tree.len();
        if n == 0 {
            return StepUndo::Noop;
        }
        let pair_weight = if n >= 2 { SWAP_WEIGHT } else { 0.0 };
        let move_weight = if n >= 2 { MOVE_WEIGHT } else { 0.0 };
        let weights = [pair_weight, ROTATE_WEIGHT, move_weight];

        let undo = match weighted_choice(rng, &weights) {
            Some(0) => {
                let (a, b) = rng.two_distinct(n);
                self.tree.swap_payloads(a, b);
                StepUndo::Swap { a, b }
            }
            Some(1) => {
                let slot = rng.next_index(n);
                self.tree.rotate_payload(slot);
                StepUndo::Rotate { slot }
            }
            Some(2) => self.move_random_subtree(rng),
            _ => StepUndo::Noop,
        };

        if !matches!(undo, StepUndo::Noop) {
            self.refresh();
        }
        undo
    }

    /// Detach a random non-root node (with its subtree) and reattach it
    /// at a random free child slot outside that subtree. The vacated
    /// slot is always available again, so an attachment point exists.
    fn move_random_subtree(&mut self, rng: &mut Pcg32) -> StepUndo {
        let n = self.tree.len();
        let Some(root) = self.tree.root() else {
            return StepUndo::Noop;
        };
        let pick = rng.next_index(n - 1);
        let slot = if pick < root { pick } else { pick + 1 };

        let Some((old_parent, old_side)) = self.tree.detach(slot) else {
            return StepUndo::Noop;
        };

        let mut points = Vec::new();
        for s in 0..n {
            if self.tree.in_subtree(slot, s) {
                continue;
            }
            if self.tree.left(s).is_none() {
                points.push((s, Side::Left));
            }
            if self.tree.right(s).is_none() {
                points.push((s, Side::Right));
            }
        }
        let (dest, side) = points[rng.next_index(points.len())];
        self.tree.attach(slot, dest, side);

        StepUndo::Move {
            slot,
            old_parent,
            old_side,
        }
    }

    /// Revert a perturbation. The caches are re-derived from the
    /// restored tree, which reproduces the prior position map and cost
    /// bit-for-bit (the derivation is a pure function of the tree).
    pub fn undo(&mut self, token: StepUndo) {
        match token {
            StepUndo::Noop => return,
            StepUndo::Swap { a, b } => self.tree.swap_payloads(a, b),
            StepUndo::Rotate { slot } => self.tree.rotate_payload(slot),
            StepUndo::Move {
                slot,
                old_parent,
                old_side,
            } => {
                let _ = self.tree.detach(slot);
                self.tree.attach(slot, old_parent, old_side);
            }
        }
        self.refresh();
    }
}

// -----------------------------------------------------------------
// Tests
// -----------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(dims: &[(f64, f64)]) -> Vec<BlockDims> {
        dims.iter()
            .map(|&(width, height)| BlockDims { width, height })
            .collect()
    }

    fn spec_blocks() -> Vec<BlockDims> {
        blocks(&[(4.0, 5.0), (3.0, 7.0), (6.0, 2.0), (8.0, 4.0), (5.0, 6.0)])
    }

    fn outline() -> Outline {
        Outline {
            width: 20.0,
            height: 15.0,
        }
    }

    fn overlap(a: &Placement, b: &Placement) -> bool {
        a.x < b.x + b.width
            && b.x < a.x + a.width
            && a.y < b.y + b.height
            && b.y < a.y + a.height
    }

    fn assert_no_overlaps(placements: &[Placement]) {
        for i in 0..placements.len() {
            for j in (i + 1)..placements.len() {
                assert!(
                    !overlap(&placements[i], &placements[j]),
                    "blocks {i} and {j} overlap"
                );
            }
        }
    }

    /// (id, sorted dims) multiset — rotation transposes dims, so
    /// conservation is checked up to orientation.
    fn block_multiset(state: &FloorplanState) -> Vec<(usize, (u64, u64))> {
        let mut set: Vec<(usize, (u64, u64))> = state
            .tree()
            .payloads()
            .map(|p| {
                let a = p.width.to_bits();
                let b = p.height.to_bits();
                (p.id, if a <= b { (a, b) } else { (b, a) })
            })
            .collect();
        set.sort_unstable();
        set
    }

    #[test]
    fn initial_state_is_valid() {
        let state = FloorplanState::new(&spec_blocks(), outline());
        assert_eq!(state.placements.len(), 5);
        assert_no_overlaps(&state.placements);
        assert!(state.cost.total >= 0.0);
    }

    #[test]
    fn operator_storm_preserves_invariants() {
        let mut state = FloorplanState::new(&spec_blocks(), outline());
        let reference = block_multiset(&state);
        let mut rng = Pcg32::new(42, 0);
        for _ in 0..500 {
            state.perturb(&mut rng);
            assert_no_overlaps(&state.placements);
            assert_eq!(block_multiset(&state), reference);
        }
    }

    #[test]
    fn find_stays_exact_through_perturbations() {
        let mut state = FloorplanState::new(&spec_blocks(), outline());
        let mut rng = Pcg32::new(42, 0);
        for _ in 0..500 {
            state.perturb(&mut rng);
            for key in 0..5 {
                assert!(
                    state.tree().find(key).is_some(),
                    "key {key} lost after perturbation"
                );
            }
            assert!(state.tree().find(99).is_none());
        }
    }

    #[test]
    fn rejected_move_rolls_back_bit_for_bit() {
        let mut state = FloorplanState::new(&spec_blocks(), outline());
        let mut rng = Pcg32::new(7, 0);
        for _ in 0..200 {
            let before_placements = state.placements.clone();
            let before_cost = state.cost;
            let before_bbox = state.bbox;
            let token = state.perturb(&mut rng);
            state.undo(token);
            assert_eq!(state.placements, before_placements);
            assert_eq!(state.cost, before_cost);
            assert_eq!(state.bbox, before_bbox);
        }
    }

    #[test]
    fn single_block_degrades_to_rotate() {
        let mut state = FloorplanState::new(&blocks(&[(10.0, 10.0)]), outline());
        let mut rng = Pcg32::new(1, 0);
        for _ in 0..50 {
            match state.perturb(&mut rng) {
                StepUndo::Rotate { .. } | StepUndo::Noop => {}
                other => panic!("unexpected operator on 1 block: {other:?}"),
            }
            assert_eq!(state.placements.len(), 1);
            assert_eq!((state.placements[0].x, state.placements[0].y), (0.0, 0.0));
        }
    }

    #[test]
    fn empty_state_noops() {
        let mut state = FloorplanState::new(&[], outline());
        let mut rng = Pcg32::new(1, 0);
        assert!(matches!(state.perturb(&mut rng), StepUndo::Noop));
        assert!(state.is_empty());
        assert_eq!(state.cost.total, 0.0);
    }

    #[test]
    fn weighted_choice_respects_zeros() {
        let mut rng = Pcg32::new(3, 0);
        for _ in 0..100 {
            assert_eq!(weighted_choice(&mut rng, &[0.0, 1.0, 0.0]), Some(1));
        }
        assert_eq!(weighted_choice(&mut rng, &[0.0, 0.0]), None);
    }
}
