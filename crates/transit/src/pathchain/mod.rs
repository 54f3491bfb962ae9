//! Connectivity topology reconstructed from unordered polylines.
//!
//! ## Pipeline
//!
//! 1. **Neighbor discovery**: paths whose endpoints coincide exactly become
//!    neighbors at that end.
//! 2. **T-intersections**: a dangling endpoint lying on the interior of
//!    another path splits that path in two (see [`intersection`]).
//! 3. **Grouping**: chains are collected into isolated groups by walking
//!    from every dead end, then from any loop left over.
//!
//! After step 2 the topology is frozen and shared behind an `Arc`, so
//! [`PathChain`] handles are cheap to clone and never dangle.

pub mod intersection;
pub mod locate;
pub mod traverse;
pub mod walker;

use std::collections::HashSet;
use std::sync::Arc;

use geo::{Coord, Line, LineString};
use tracing::debug;

use crate::geometry::{distance, polyline_length, PointOnPath, COLLINEAR_COSINE};
use crate::models::types::{GraphError, Result};

pub use intersection::{merge_t_intersection, merge_t_intersection_with};
pub use locate::{find_point_on_pathchain, find_point_on_pathchain_with, PointOnPathchain};
pub use traverse::{Traversal, TraversalStep};
pub use walker::{walk_chain, walk_chain_outward, BranchIdChain, Visit, VisitedSet, WalkStep};

// ============================================================================
// Paths
// ============================================================================

/// One end of a path
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PathEnd {
    Start,
    End,
}

impl PathEnd {
    pub fn opposite(self) -> Self {
        match self {
            Self::Start => Self::End,
            Self::End => Self::Start,
        }
    }

    fn slot(self) -> usize {
        match self {
            Self::Start => 0,
            Self::End => 1,
        }
    }
}

/// Which way a path is walked
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// First point to last point
    Forward,
    /// Last point to first point
    Backward,
}

impl Direction {
    /// End through which a walk in this direction enters the path
    pub fn entry(self) -> PathEnd {
        match self {
            Self::Forward => PathEnd::Start,
            Self::Backward => PathEnd::End,
        }
    }

    /// End through which a walk in this direction leaves the path
    pub fn exit(self) -> PathEnd {
        self.entry().opposite()
    }

    /// Direction that enters a path through `end`
    pub fn entering_at(end: PathEnd) -> Self {
        match end {
            PathEnd::Start => Self::Forward,
            PathEnd::End => Self::Backward,
        }
    }

    /// Direction that leaves a path through `end`
    pub fn exiting_at(end: PathEnd) -> Self {
        Self::entering_at(end.opposite())
    }

    pub fn reversed(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }
}

/// An open polyline of at least two points
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    line: LineString<f64>,
    length: f64,
}

impl Path {
    pub fn new(coords: Vec<Coord<f64>>) -> Result<Self> {
        if coords.len() < 2 {
            return Err(GraphError::InvalidPath(format!(
                "a path needs at least 2 points, got {}",
                coords.len()
            )));
        }
        if coords.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
            return Err(GraphError::InvalidPath("non-finite coordinate".into()));
        }
        if let Some(w) = coords.windows(2).find(|w| w[0] == w[1]) {
            return Err(GraphError::InvalidPath(format!(
                "repeated point ({}, {})",
                w[0].x, w[0].y
            )));
        }

        let length = polyline_length(&coords);
        Ok(Self {
            line: LineString::new(coords),
            length,
        })
    }

    /// Build from `[x, y]` pairs
    pub fn from_xy(points: &[[f64; 2]]) -> Result<Self> {
        Self::new(points.iter().map(|&[x, y]| Coord { x, y }).collect())
    }

    pub fn coords(&self) -> &[Coord<f64>] {
        &self.line.0
    }

    pub fn line_string(&self) -> &LineString<f64> {
        &self.line
    }

    pub fn lines(&self) -> impl Iterator<Item = Line<f64>> + '_ {
        self.line.lines()
    }

    pub fn endpoint(&self, end: PathEnd) -> Coord<f64> {
        let coords = self.coords();
        match end {
            PathEnd::Start => coords[0],
            PathEnd::End => coords[coords.len() - 1],
        }
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    /// Split at a point located on this path.
    ///
    /// Returns `None` when the point is one of the path's own endpoints.
    pub fn split_at(&self, at: Coord<f64>, hit: &PointOnPath) -> Option<(Path, Path)> {
        let coords = self.coords();
        let seg = hit.segment_index;
        if seg + 1 >= coords.len()
            || at == coords[0]
            || at == coords[coords.len() - 1]
        {
            return None;
        }

        let mut head: Vec<Coord<f64>> = coords[..=seg].to_vec();
        if coords[seg] != at {
            head.push(at);
        }
        let mut tail = vec![at];
        tail.extend_from_slice(&coords[seg + 1..]);

        Some((Path::new(head).ok()?, Path::new(tail).ok()?))
    }
}

// ============================================================================
// Path Internals
// ============================================================================

/// A path with its index and the paths touching each of its ends
#[derive(Clone, Debug, PartialEq)]
pub struct PathInternal {
    pub path: Path,
    pub index: usize,
    /// `[start neighbors, end neighbors]`
    pub neighbors: [Vec<usize>; 2],
}

impl PathInternal {
    pub fn new(index: usize, path: Path) -> Self {
        Self {
            path,
            index,
            neighbors: [Vec::new(), Vec::new()],
        }
    }

    pub fn neighbors_at(&self, end: PathEnd) -> &[usize] {
        &self.neighbors[end.slot()]
    }

    pub(crate) fn neighbors_at_mut(&mut self, end: PathEnd) -> &mut Vec<usize> {
        &mut self.neighbors[end.slot()]
    }

    pub fn is_dangling(&self, end: PathEnd) -> bool {
        self.neighbors_at(end).is_empty()
    }
}

fn register_neighbor(internal: &mut PathInternal, end: PathEnd, other: usize) {
    let list = internal.neighbors_at_mut(end);
    if !list.contains(&other) {
        list.push(other);
    }
}

/// Pair up paths whose endpoints coincide exactly.
pub fn discover_neighbors(paths: Vec<Path>) -> Vec<PathInternal> {
    let mut internals: Vec<PathInternal> = paths
        .into_iter()
        .enumerate()
        .map(|(index, path)| PathInternal::new(index, path))
        .collect();

    const ENDS: [PathEnd; 2] = [PathEnd::Start, PathEnd::End];

    for i in 0..internals.len() {
        for j in (i + 1)..internals.len() {
            for end_i in ENDS {
                for end_j in ENDS {
                    if internals[i].path.endpoint(end_i) == internals[j].path.endpoint(end_j) {
                        register_neighbor(&mut internals[i], end_i, j);
                        register_neighbor(&mut internals[j], end_j, i);
                    }
                }
            }
        }
    }

    internals
}

/// Neighbor discovery followed by the T-intersection pass.
pub fn build_path_internals(paths: Vec<Path>) -> Vec<PathInternal> {
    build_path_internals_with(paths, COLLINEAR_COSINE)
}

pub fn build_path_internals_with(paths: Vec<Path>, threshold: f64) -> Vec<PathInternal> {
    let mut internals = discover_neighbors(paths);
    merge_t_intersection_with(&mut internals, threshold);
    internals
}

// ============================================================================
// Path Chains
// ============================================================================

/// Read-only view over one path of a frozen topology
#[derive(Clone)]
pub struct PathChain {
    topology: Arc<[PathInternal]>,
    index: usize,
}

impl std::fmt::Debug for PathChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathChain")
            .field("index", &self.index)
            .field("neighbors", &self.internal().neighbors)
            .finish()
    }
}

impl PartialEq for PathChain {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.topology, &other.topology) && self.index == other.index
    }
}

impl Eq for PathChain {}

impl PathChain {
    fn at(topology: &Arc<[PathInternal]>, index: usize) -> Self {
        Self {
            topology: topology.clone(),
            index,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn internal(&self) -> &PathInternal {
        &self.topology[self.index]
    }

    pub fn path(&self) -> &Path {
        &self.internal().path
    }

    /// True if either end has no neighbor
    pub fn is_ended(&self) -> bool {
        let internal = self.internal();
        internal.is_dangling(PathEnd::Start) || internal.is_dangling(PathEnd::End)
    }

    /// Direction that starts a walk at this chain's dead end
    pub fn dead_end_direction(&self) -> Option<Direction> {
        let internal = self.internal();
        if internal.is_dangling(PathEnd::Start) {
            Some(Direction::Forward)
        } else if internal.is_dangling(PathEnd::End) {
            Some(Direction::Backward)
        } else {
            None
        }
    }

    /// Another chain of the same topology
    pub fn sibling(&self, index: usize) -> Option<PathChain> {
        (index < self.topology.len()).then(|| Self::at(&self.topology, index))
    }

    pub fn neighbors(&self, end: PathEnd) -> impl Iterator<Item = PathChain> + '_ {
        self.internal()
            .neighbors_at(end)
            .iter()
            .map(|&i| Self::at(&self.topology, i))
    }

    /// Chains reachable from this chain's exit when walked in `direction`,
    /// each with the direction it is entered in.
    pub fn next_chains(&self, direction: Direction) -> Vec<(PathChain, Direction)> {
        let junction = self.path().endpoint(direction.exit());
        self.neighbors(direction.exit())
            .map(|next| {
                // A T-split neighbor may meet the junction at its projection only
                let to_start = distance(next.path().endpoint(PathEnd::Start), junction);
                let to_end = distance(next.path().endpoint(PathEnd::End), junction);
                let entered = if to_start <= to_end {
                    Direction::Forward
                } else {
                    Direction::Backward
                };
                (next, entered)
            })
            .collect()
    }

    /// Depth-first traversal of everything reachable from this chain's exit.
    pub fn traverse(&self, direction: Direction) -> Traversal {
        Traversal::new(self.clone(), direction)
    }

    /// Like [`traverse`](Self::traverse), but also leaves this chain through
    /// its entry end, so the whole component is reached from any chain.
    pub fn traverse_outward(&self, direction: Direction) -> Traversal {
        Traversal::outward(self.clone(), direction)
    }
}

/// A maximal set of mutually reachable chains
#[derive(Clone, Debug)]
pub struct IsolatedPathChain {
    chains: Vec<PathChain>,
}

impl IsolatedPathChain {
    fn new(mut chains: Vec<PathChain>) -> Self {
        chains.sort_by_key(PathChain::index);
        Self { chains }
    }

    pub fn chains(&self) -> &[PathChain] {
        &self.chains
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    pub fn chain(&self, index: usize) -> Option<&PathChain> {
        self.chains
            .binary_search_by_key(&index, PathChain::index)
            .ok()
            .map(|pos| &self.chains[pos])
    }

    pub fn contains(&self, chain: &PathChain) -> bool {
        self.chain(chain.index()).is_some_and(|c| c == chain)
    }

    pub fn ended(&self) -> impl Iterator<Item = &PathChain> {
        self.chains.iter().filter(|c| c.is_ended())
    }

    /// First dead end, or the lowest chain of a closed loop
    pub fn walk_start(&self) -> Option<(PathChain, Direction)> {
        self.ended()
            .find_map(|c| c.dead_end_direction().map(|d| (c.clone(), d)))
            .or_else(|| self.chains.first().map(|c| (c.clone(), Direction::Forward)))
    }
}

/// Build the isolated chain groups of a path set.
pub fn build_pathchain(paths: Vec<Path>) -> Vec<IsolatedPathChain> {
    build_pathchain_with(paths, COLLINEAR_COSINE)
}

/// [`build_pathchain`] with a custom collinearity threshold for the
/// T-intersection pass.
pub fn build_pathchain_with(paths: Vec<Path>, threshold: f64) -> Vec<IsolatedPathChain> {
    let path_count = paths.len();
    let internals = build_path_internals_with(paths, threshold);
    let topology: Arc<[PathInternal]> = internals.into();

    let chains: Vec<PathChain> = (0..topology.len())
        .map(|i| PathChain::at(&topology, i))
        .collect();

    let mut grouped: HashSet<usize> = HashSet::new();
    let mut groups = Vec::new();

    let mut collect_from = |start: &PathChain, direction: Direction, grouped: &mut HashSet<usize>| {
        let members: Vec<PathChain> = start.traverse_outward(direction).map(|step| step.chain).collect();
        grouped.extend(members.iter().map(PathChain::index));
        groups.push(IsolatedPathChain::new(members));
    };

    for chain in chains.iter().filter(|c| c.is_ended()) {
        if grouped.contains(&chain.index()) {
            continue;
        }
        if let Some(direction) = chain.dead_end_direction() {
            collect_from(chain, direction, &mut grouped);
        }
    }

    // Closed loops have no dead end
    for chain in &chains {
        if !grouped.contains(&chain.index()) {
            collect_from(chain, Direction::Forward, &mut grouped);
        }
    }

    groups.sort_by_key(|g| g.chains.first().map(PathChain::index));

    debug!(
        paths = path_count,
        chains = chains.len(),
        groups = groups.len(),
        "Built path chains"
    );

    groups
}
