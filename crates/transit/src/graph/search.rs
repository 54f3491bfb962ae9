//! Dijkstra over any [`NodeStore`].
//!
//! Arc ends that do not resolve are skipped and reported back in
//! [`PathSearch::unresolved`], so a caller holding a partially loaded graph
//! can fetch what is missing and search again.

use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::{BinaryHeap, HashMap};

use super::{is_valid_cost, ArcEnd, GraphArc, GraphNode, NodeStore};
use crate::identifiers::NodeId;

/// Outcome of one shortest-path search
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathSearch {
    /// Inclusive node sequence, empty when unreachable
    pub nodes: Vec<NodeId>,
    pub cost: Option<f64>,
    /// Arc ends met during the search that the store could not resolve
    pub unresolved: Vec<ArcEnd>,
}

impl PathSearch {
    pub fn is_found(&self) -> bool {
        !self.nodes.is_empty()
    }
}

/// The stored arc cost
pub fn arc_cost<I>(arc: &GraphArc, _a: &GraphNode<I>, _b: &GraphNode<I>) -> f64 {
    arc.cost
}

#[derive(Copy, Clone, PartialEq)]
struct State {
    cost: f64,
    node: NodeId,
}

impl Eq for State {}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Shortest path from `start` to `end`.
///
/// `cost_fn` receives the arc and its two resolved ends in `(a, b)` order.
/// Arcs priced negative or non-finite by `cost_fn` are treated as impassable.
pub fn search<I, S, F>(store: &S, start: NodeId, end: NodeId, mut cost_fn: F) -> PathSearch
where
    S: NodeStore<I> + ?Sized,
    F: FnMut(&GraphArc, &GraphNode<I>, &GraphNode<I>) -> f64,
{
    let mut result = PathSearch::default();
    if store.resolve(&ArcEnd::local(start)).is_none() {
        return result;
    }
    if start == end {
        result.nodes.push(start);
        result.cost = Some(0.0);
        return result;
    }

    let mut dist: HashMap<NodeId, f64> = HashMap::new();
    let mut prev: HashMap<NodeId, NodeId> = HashMap::new();
    let mut pq = BinaryHeap::new();

    dist.insert(start, 0.0);
    pq.push(State {
        cost: 0.0,
        node: start,
    });

    while let Some(State { cost, node }) = pq.pop() {
        if node == end {
            break;
        }
        if cost > dist.get(&node).copied().unwrap_or(f64::INFINITY) {
            continue;
        }
        let Some(current) = store.resolve(&ArcEnd::local(node)) else {
            continue;
        };

        for arc in &current.arcs {
            let Some(far) = arc.other_end(node) else {
                continue;
            };
            let Some(next) = store.resolve(far) else {
                if !result.unresolved.contains(far) {
                    result.unresolved.push(far.clone());
                }
                continue;
            };

            let step = if arc.a.node == node {
                cost_fn(arc, current, next)
            } else {
                cost_fn(arc, next, current)
            };
            if !is_valid_cost(step) {
                continue;
            }

            let candidate = cost + step;
            let improved = match dist.entry(next.id) {
                Entry::Occupied(mut e) => {
                    if candidate < *e.get() {
                        e.insert(candidate);
                        true
                    } else {
                        false
                    }
                }
                Entry::Vacant(e) => {
                    e.insert(candidate);
                    true
                }
            };
            if improved {
                prev.insert(next.id, node);
                pq.push(State {
                    cost: candidate,
                    node: next.id,
                });
            }
        }
    }

    let Some(&total) = dist.get(&end) else {
        return result;
    };

    let mut nodes = vec![end];
    let mut at = end;
    while let Some(&p) = prev.get(&at) {
        nodes.push(p);
        at = p;
    }
    nodes.reverse();

    result.nodes = nodes;
    result.cost = Some(total);
    result
}

/// Inclusive node sequence of the cheapest path, or empty if unreachable
pub fn find_shortest_path<I, S, F>(store: &S, start: NodeId, end: NodeId, cost_fn: F) -> Vec<NodeId>
where
    S: NodeStore<I> + ?Sized,
    F: FnMut(&GraphArc, &GraphNode<I>, &GraphNode<I>) -> f64,
{
    search(store, start, end, cost_fn).nodes
}
