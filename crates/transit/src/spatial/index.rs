//! R-tree nodes for spatial indexing of chain segments.
//!
//! Every segment of every indexed chain becomes one node, so a station can be
//! matched against the segments closest to it first.

use geo::{Coord, Line};
use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::geometry::segment_distance_2;
use crate::pathchain::PathChain;

// ============================================================================
// Chain Segment Spatial Node
// ============================================================================

#[derive(Clone, Debug)]
pub struct SegmentNode {
    /// Position of the chain in the indexed slice
    pub chain: usize,
    pub segment: usize,
    pub line: Line<f64>,
    aabb: AABB<[f64; 2]>,
}

impl SegmentNode {
    pub fn new(chain: usize, segment: usize, line: Line<f64>) -> Self {
        let start = [line.start.x, line.start.y];
        let end = [line.end.x, line.end.y];

        Self {
            chain,
            segment,
            line,
            aabb: AABB::from_corners(start, end),
        }
    }
}

impl RTreeObject for SegmentNode {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

impl PointDistance for SegmentNode {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        segment_distance_2(Coord { x: point[0], y: point[1] }, self.line.start, self.line.end)
    }
}

// ============================================================================
// Segment Index
// ============================================================================

/// Segments of a set of chains, nearest-first searchable
pub struct SegmentIndex {
    tree: RTree<SegmentNode>,
}

impl SegmentIndex {
    pub fn new(chains: &[PathChain]) -> Self {
        let segments = chains
            .iter()
            .enumerate()
            .flat_map(|(index, chain)| {
                chain
                    .path()
                    .lines()
                    .enumerate()
                    .map(move |(segment, line)| SegmentNode::new(index, segment, line))
            })
            .collect();

        Self {
            tree: RTree::bulk_load(segments),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Segments ordered by distance to `point`, with squared distances
    pub fn nearest(&self, point: Coord<f64>) -> impl Iterator<Item = (&SegmentNode, f64)> + '_ {
        let query = [point.x, point.y];
        self.tree
            .nearest_neighbor_iter(&query)
            .map(move |node| (node, node.distance_2(&query)))
    }
}
