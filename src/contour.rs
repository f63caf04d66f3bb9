//! Contour-based position derivation.
//!
//! The packing tree stores no coordinates. Positions come from a
//! preorder traversal against a horizontal contour (skyline): a left
//! child starts at its parent's right edge, a right child at its
//! parent's own x, and each block's y is the skyline maximum over its
//! horizontal span, after which the skyline is raised to the block's
//! top. Every traversal of the same tree yields the same placement, so
//! a rejected perturbation restores positions bit-for-bit once the
//! tree edit is undone.

use crate::tree::PackingTree;
use crate::types::{BBox, Placement};

#[derive(Debug, Clone, Copy)]
struct Segment {
    x_start: f64,
    x_end: f64,
    y: f64,
}

/// Skyline over [0, +inf), kept as sorted, contiguous segments.
struct Contour {
    segments: Vec<Segment>,
}

impl Contour {
    fn new() -> Self {
        Contour {
            segments: vec![Segment {
                x_start: 0.0,
                x_end: f64::INFINITY,
                y: 0.0,
            }],
        }
    }

    /// Max skyline height over [x, x + width), then raise that span to
    /// the top of the new block. Returns the block's y. O(segments)
    /// per call; quadratic over a full traversal, fine at the block
    /// counts floorplanning targets.
    fn place(&mut self, x: f64, width: f64, height: f64) -> f64 {
        let x_end = x + width;
        let mut y = 0.0_f64;
        for seg in &self.segments {
            if seg.x_end <= x || seg.x_start >= x_end {
                continue;
            }
            if seg.y > y {
                y = seg.y;
            }
        }

        let mut next = Vec::with_capacity(self.segments.len() + 2);
        for seg in &self.segments {
            if seg.x_end <= x || seg.x_start >= x_end {
                next.push(*seg);
                continue;
            }
            if seg.x_start < x {
                next.push(Segment {
                    x_start: seg.x_start,
                    x_end: x,
                    y: seg.y,
                });
            }
            if seg.x_end > x_end {
                next.push(Segment {
                    x_start: x_end,
                    x_end: seg.x_end,
                    y: seg.y,
                });
            }
        }
        next.push(Segment {
            x_start: x,
            x_end,
            y: y + height,
        });
        next.sort_by(|a, b| a.x_start.total_cmp(&b.x_start));
        self.segments = next;

        y
    }
}

/// Derive every block's position and the packing bounding box from the
/// tree structure. Output is indexed by block id.
pub(crate) fn derive_positions(tree: &PackingTree) -> (Vec<Placement>, BBox) {
    let mut placements = vec![Placement::default(); tree.len()];
    let mut bbox = BBox::default();
    let Some(root) = tree.root() else {
        return (placements, bbox);
    };

    let mut contour = Contour::new();
    // Preorder: node, then left subtree (to the right of it), then
    // right subtree (above it). LIFO stack, so push right first.
    let mut stack = vec![(root, 0.0_f64)];
    while let Some((slot, x)) = stack.pop() {
        let p = tree.payload(slot);
        let y = contour.place(x, p.width, p.height);
        placements[p.id] = Placement {
            id: p.id,
            x,
            y,
            width: p.width,
            height: p.height,
            rotated: p.rotated,
        };
        bbox.width = bbox.width.max(x + p.width);
        bbox.height = bbox.height.max(y + p.height);
        if let Some(r) = tree.right(slot) {
            stack.push((r, x));
        }
        if let Some(l) = tree.left(slot) {
            stack.push((l, x + p.width));
        }
    }

    (placements, bbox)
}

// -----------------------------------------------------------------
// Tests
// -----------------------------------------------------------------
