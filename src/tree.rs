//! Arena-backed B*-tree over block payloads.
//!
//! Every node carries a fixed search key (the block's input index) and a
//! mutable payload (block id, dimensions, rotation flag). Perturbation
//! operators move payloads between nodes or whole nodes between parents;
//! keys never change and slot i always holds key i, so `find` stays
//! exact on every reachable tree. Positions are never stored here —
//! they are derived from the structure by the contour rule (see the
//! `contour` module).

use std::cmp::Ordering;

use crate::types::BlockDims;

/// Which child slot of a parent a node hangs from. In the packing
/// convention, a left child sits directly right of its parent and a
/// right child directly above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// The block currently held by a node. Swap moves the whole payload;
/// rotate transposes its dimensions in place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockPayload {
    pub id: usize,
    pub width: f64,
    pub height: f64,
    pub rotated: bool,
}

#[derive(Debug, Clone)]
struct Node {
    key: usize,
    payload: BlockPayload,
    parent: Option<usize>,
    left: Option<usize>,
    right: Option<usize>,
    /// 1 + size(left) + size(right), maintained on every structural edit.
    size: usize,
}

/// B*-tree: arena of nodes plus a root slot. Slot i holds key i.
#[derive(Debug, Clone)]
pub struct PackingTree {
    nodes: Vec<Node>,
    root: Option<usize>,
}

impl PackingTree {
    /// Build a balanced tree: block i gets key i, the median key of each
    /// range becomes the subtree root. O(n log n) overall. Balancing is
    /// an initial-layout heuristic only; overlap-freedom comes from the
    /// contour rule, not from the shape of the tree.
    pub fn build(blocks: &[BlockDims]) -> Self {
        let mut nodes: Vec<Node> = blocks
            .iter()
            .enumerate()
            .map(|(i, b)| Node {
                key: i,
                payload: BlockPayload {
                    id: i,
                    width: b.width,
                    height: b.height,
                    rotated: false,
                },
                parent: None,
                left: None,
                right: None,
                size: 1,
            })
            .collect();
        let root = Self::build_range(&mut nodes, 0, blocks.len(), None);
        PackingTree { nodes, root }
    }

    fn build_range(
        nodes: &mut [Node],
        lo: usize,
        hi: usize,
        parent: Option<usize>,
    ) -> Option<usize> {
        if lo >= hi {
            return None;
        }
        let mid = lo + (hi - lo) / 2;
        nodes[mid].parent = parent;
        let left = Self::build_range(nodes, lo, mid, Some(mid));
        let right = Self::build_range(nodes, mid + 1, hi, Some(mid));
        nodes[mid].left = left;
        nodes[mid].right = right;
        nodes[mid].size = 1
            + left.map_or(0, |l| nodes[l].size)
            + right.map_or(0, |r| nodes[r].size);
        Some(mid)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<usize> {
        self.root
    }

    pub fn left(&self, slot: usize) -> Option<usize> {
        self.nodes[slot].left
    }

    pub fn right(&self, slot: usize) -> Option<usize> {
        self.nodes[slot].right
    }

    pub fn child(&self, slot: usize, side: Side) -> Option<usize> {
        match side {
            Side::Left => self.nodes[slot].left,
            Side::Right => self.nodes[slot].right,
        }
    }

    pub fn parent(&self, slot: usize) -> Option<usize> {
        self.nodes[slot].parent
    }

    pub fn payload(&self, slot: usize) -> &BlockPayload {
        &self.nodes[slot].payload
    }

    pub fn subtree_size(&self, slot: usize) -> usize {
        self.nodes[slot].size
    }

    /// Payloads in arena order (one per input block, always).
    pub fn payloads(&self) -> impl Iterator<Item = &BlockPayload> {
        self.nodes.iter().map(|n| &n.payload)
    }

    /// Keyed lookup: binary-search descent on build-time keys, with an
    /// arena-identity fallback for trees whose search ordering has been
    /// traded away by subtree moves.
    ///
    /// Returns the payload currently held by the node with this key.
    /// Exact on every reachable tree: payload swaps and rotations never
    /// relocate keys, and since slot i holds key i the fallback covers
    /// any ordering the moves produce. `None` means the key was never
    /// present.
    pub fn find(&self, key: usize) -> Option<&BlockPayload> {
        let mut cur = self.root;
        while let Some(slot) = cur {
            let node = &self.nodes[slot];
            cur = match key.cmp(&node.key) {
                Ordering::Equal => return Some(&node.payload),
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            };
        }
        self.nodes.get(key).map(|n| &n.payload)
    }

    /// Exchange the payloads of two distinct nodes. Tree shape, keys,
    /// and subtree sizes are untouched.
    pub fn swap_payloads(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (head, tail) = self.nodes.split_at_mut(hi);
        std::mem::swap(&mut head[lo].payload, &mut tail[0].payload);
    }

    /// Rotate the block at `slot` by 90 degrees: transpose its
    /// dimensions and toggle the rotation flag. Self-inverse.
    pub fn rotate_payload(&mut self, slot: usize) {
        let p = &mut self.nodes[slot].payload;
        std::mem::swap(&mut p.width, &mut p.height);
        p.rotated = !p.rotated;
    }

    /// Detach `slot` (with its whole subtree) from its parent, updating
    /// sizes along the old root path. Returns the vacated attachment
    /// point, or `None` when `slot` is the root (the root is never
    /// detached).
    pub fn detach(&mut self, slot: usize) -> Option<(usize, Side)> {
        let parent = self.nodes[slot].parent?;
        let side = if self.nodes[parent].left == Some(slot) {
            Side::Left
        } else {
            Side::Right
        };
        match side {
            Side::Left => self.nodes[parent].left = None,
            Side::Right => self.nodes[parent].right = None,
        }
        self.nodes[slot].parent = None;
        let moved = self.nodes[slot].size as isize;
        self.propagate_size(Some(parent), -moved);
        Some((parent, side))
    }

    /// Reattach a detached subtree under `dest`'s free `side` slot.
    /// `dest` must not lie inside the subtree rooted at `slot`.
    pub fn attach(&mut self, slot: usize, dest: usize, side: Side) {
        debug_assert!(self.child(dest, side).is_none());
        debug_assert!(!self.in_subtree(slot, dest));
        match side {
            Side::Left => self.nodes[dest].left = Some(slot),
            Side::Right => self.nodes[dest].right = Some(slot),
        }
        self.nodes[slot].parent = Some(dest);
        let moved = self.nodes[slot].size as isize;
        self.propagate_size(Some(dest), moved);
    }

    /// True when `slot` lies in the subtree rooted at `ancestor`
    /// (including `slot == ancestor`). O(depth) via parent walk.
    pub fn in_subtree(&self, ancestor: usize, slot: usize) -> bool {
        let mut cur = Some(slot);
        while let Some(s) = cur {
            if s == ancestor {
                return true;
            }
            cur = self.nodes[s].parent;
        }
        false
    }

    fn propagate_size(&mut self, mut cur: Option<usize>, delta: isize) {
        while let Some(slot) = cur {
            let s = self.nodes[slot].size as isize + delta;
            self.nodes[slot].size = s as usize;
            cur = self.nodes[slot].parent;
        }
    }
}

// -----------------------------------------------------------------
// Tests
// -----------------------------------------------------------------
