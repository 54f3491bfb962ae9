//! Turning located points into a weighted graph.
//!
//! The builder walks one isolated chain group. Every point becomes a node,
//! and every vertex where chains meet gets a junction node shared by all the
//! chains touching it. Along each chain the entry junction, the points in
//! walk order and the exit junction are joined by arcs costed by the
//! distance between them. Afterwards junctions that do not mark a real fork
//! are pruned or spliced out, so cycles and side branches keep their true
//! along-route distances. Points are split into groups by a caller key and
//! each group yields its own graph, with its own junctions.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::marker::PhantomData;

use geo::Coord;
use tracing::{debug, trace};

use super::Graph;
use crate::identifiers::NodeId;
use crate::models::types::{GraphError, Result};
use crate::pathchain::locate::PointOnPathchain;
use crate::pathchain::walker::{walk_chain_outward, BranchIdChain, Visit, VisitedSet, WalkStep};
use crate::pathchain::{Direction, IsolatedPathChain, PathChain, PathEnd};

/// Where a junction node is about to be created
#[derive(Clone, Debug)]
pub struct JunctionSite<'a, G> {
    pub group: &'a G,
    pub position: Coord<f64>,
    /// Chain whose end first reached this vertex
    pub chain: usize,
    pub end: PathEnd,
    /// Branch of the walk step that reached it
    pub branch: &'a BranchIdChain,
}

struct GroupState<I> {
    graph: Graph<I>,
    /// Junction standing at each chain end, filled in for every chain
    /// meeting at a vertex once the vertex is reached
    vertices: HashMap<(usize, PathEnd), NodeId>,
    junctions: HashSet<NodeId>,
    points: usize,
}

impl<I> GroupState<I> {
    fn new() -> Self {
        Self {
            graph: Graph::new(),
            vertices: HashMap::new(),
            junctions: HashSet::new(),
            points: 0,
        }
    }

    /// Arc unless both ends are the same node
    fn link(&mut self, a: NodeId, b: NodeId, cost: f64) -> Result<()> {
        if a != b {
            self.graph.connect(a, b, cost)?;
        }
        Ok(())
    }
}

pub struct GraphBuilder<P, G, I, N, J, K> {
    create_node: N,
    create_junction: J,
    group_of: K,
    _marker: PhantomData<fn(&P) -> (G, I)>,
}

/// Create a graph builder.
///
/// * `create_node` makes the node for a located point
/// * `create_junction` makes the node for a vertex between chains
/// * `group_of` names the graph a point belongs to
pub fn build_graph_builder<P, G, I, N, J, K>(
    create_node: N,
    create_junction: J,
    group_of: K,
) -> GraphBuilder<P, G, I, N, J, K>
where
    G: Eq + Hash + Clone,
    N: FnMut(&P, &PointOnPathchain) -> (NodeId, I),
    J: FnMut(&JunctionSite<'_, G>) -> (NodeId, I),
    K: Fn(&P) -> G,
{
    GraphBuilder {
        create_node,
        create_junction,
        group_of,
        _marker: PhantomData,
    }
}

impl<P, G, I, N, J, K> GraphBuilder<P, G, I, N, J, K>
where
    G: Eq + Hash + Clone,
    N: FnMut(&P, &PointOnPathchain) -> (NodeId, I),
    J: FnMut(&JunctionSite<'_, G>) -> (NodeId, I),
    K: Fn(&P) -> G,
{
    /// Build one graph per group from the points lying on `pathchain`.
    ///
    /// The walk begins at `start`, or at the group's default walk start, and
    /// leaves the start chain through both ends. Points on chains outside
    /// `pathchain` are ignored, and groups without any point produce no
    /// graph.
    pub fn build(
        &mut self,
        pathchain: &IsolatedPathChain,
        points: &[(P, PointOnPathchain)],
        start: Option<(PathChain, Direction)>,
    ) -> Result<HashMap<G, Graph<I>>> {
        let mut groups: Vec<G> = Vec::new();
        let mut point_groups: Vec<usize> = Vec::with_capacity(points.len());
        let mut by_chain: HashMap<usize, Vec<usize>> = HashMap::new();

        for (i, (payload, at)) in points.iter().enumerate() {
            let group = (self.group_of)(payload);
            let slot = match groups.iter().position(|g| *g == group) {
                Some(slot) => slot,
                None => {
                    groups.push(group);
                    groups.len() - 1
                }
            };
            point_groups.push(slot);
            if pathchain.contains(&at.chain) {
                by_chain.entry(at.chain.index()).or_default().push(i);
            }
        }

        let Some((start, direction)) = start.or_else(|| pathchain.walk_start()) else {
            return Ok(HashMap::new());
        };

        let mut states: Vec<GroupState<I>> = groups.iter().map(|_| GroupState::new()).collect();
        let mut failure: Option<GraphError> = None;
        let mut visited = VisitedSet::new();
        let create_node = &mut self.create_node;
        let create_junction = &mut self.create_junction;

        walk_chain_outward(&start, direction, &mut visited, |step: &WalkStep<'_>| {
            let mut walker = StepContext {
                points,
                point_groups: &point_groups,
                on_chain: by_chain.get(&step.chain.index()).map(Vec::as_slice).unwrap_or(&[]),
                create_node: &mut *create_node,
                create_junction: &mut *create_junction,
            };
            for (slot, state) in states.iter_mut().enumerate() {
                if let Err(err) = walker.visit(step, slot, &groups[slot], state) {
                    failure = Some(err);
                    return Visit::<()>::Stop;
                }
            }
            Visit::Continue
        });

        if let Some(err) = failure {
            return Err(err);
        }

        let mut graphs = HashMap::new();
        for (group, mut state) in groups.into_iter().zip(states) {
            if state.points == 0 {
                continue;
            }
            prune_junctions(&mut state.graph, &state.junctions)?;
            trace!(nodes = state.graph.len(), points = state.points, "Built group graph");
            graphs.insert(group, state.graph);
        }

        debug!(groups = graphs.len(), chains = pathchain.len(), "Built graphs from pathchain");
        Ok(graphs)
    }
}

struct StepContext<'a, P, N, J> {
    points: &'a [(P, PointOnPathchain)],
    point_groups: &'a [usize],
    on_chain: &'a [usize],
    create_node: &'a mut N,
    create_junction: &'a mut J,
}

impl<'a, P, N, J> StepContext<'a, P, N, J> {
    fn visit<G, I>(&mut self, step: &WalkStep<'_>, slot: usize, group: &G, state: &mut GroupState<I>) -> Result<()>
    where
        N: FnMut(&P, &PointOnPathchain) -> (NodeId, I),
        J: FnMut(&JunctionSite<'_, G>) -> (NodeId, I),
    {
        let mut here: Vec<(f64, usize)> = self
            .on_chain
            .iter()
            .filter(|&&i| self.point_groups[i] == slot)
            .map(|&i| (self.points[i].1.distance_along(step.direction), i))
            .collect();
        here.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut last = self.vertex(step, step.direction.entry(), group, state)?;
        let mut cursor = 0.0;
        for (along, i) in here {
            let (payload, at) = &self.points[i];
            let (id, item) = (self.create_node)(payload, at);
            state.graph.add(id, item)?;
            state.points += 1;

            state.link(last, id, (along - cursor).max(0.0))?;
            last = id;
            cursor = along;
        }

        let exit = self.vertex(step, step.direction.exit(), group, state)?;
        state.link(last, exit, (step.chain.path().length() - cursor).max(0.0))
    }

    /// Junction at `end` of the step's chain, placed on first use
    fn vertex<G, I>(&mut self, step: &WalkStep<'_>, end: PathEnd, group: &G, state: &mut GroupState<I>) -> Result<NodeId>
    where
        J: FnMut(&JunctionSite<'_, G>) -> (NodeId, I),
    {
        let key = (step.chain.index(), end);
        if let Some(&id) = state.vertices.get(&key) {
            return Ok(id);
        }

        let site = JunctionSite {
            group,
            position: step.chain.path().endpoint(end),
            chain: key.0,
            end,
            branch: step.branch,
        };
        let (id, item) = (self.create_junction)(&site);
        state.graph.add(id, item)?;
        state.junctions.insert(id);
        state.vertices.insert(key, id);

        for (next, entered) in step.chain.next_chains(Direction::exiting_at(end)) {
            state.vertices.entry((next.index(), entered.entry())).or_insert(id);
        }
        trace!(junction = %id, chain = key.0, ?end, "Placed junction");
        Ok(id)
    }
}

/// Drop junctions that join fewer than two nodes and splice out junctions
/// joining exactly two.
fn prune_junctions<I>(graph: &mut Graph<I>, junctions: &HashSet<NodeId>) -> Result<()> {
    let mut order: Vec<NodeId> = junctions.iter().copied().collect();
    order.sort();

    loop {
        let mut changed = false;
        for &id in &order {
            let Some(node) = graph.node(id) else {
                continue;
            };
            let arms: Vec<(NodeId, f64)> = node
                .arcs
                .iter()
                .filter_map(|arc| arc.other_end(id).map(|end| (end.node, arc.cost)))
                .collect();

            match arms.as_slice() {
                [] | [_] => {
                    graph.remove_node(id);
                }
                [(x, cx), (y, cy)] => {
                    let (x, y, cost) = (*x, *y, cx + cy);
                    graph.remove_node(id);
                    if x != y {
                        graph.connect(x, y, cost)?;
                    }
                }
                _ => continue,
            }
            changed = true;
        }
        if !changed {
            return Ok(());
        }
    }
}
