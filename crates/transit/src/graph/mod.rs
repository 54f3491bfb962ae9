//! Node/arc graph with lazily resolved endpoints.
//!
//! Nodes live in an arena ([`Graph`]) keyed by [`NodeId`]; arcs refer to
//! their ends by id only. Anything that can turn an [`ArcEnd`] into a node
//! implements [`NodeStore`], which is how the same search runs over a single
//! in-memory graph or over a partially loaded, partitioned one.

pub mod arc;
pub mod builder;
pub mod merge;
pub mod node;
pub mod search;
pub mod serialize;

use std::collections::HashMap;

use tracing::trace;

use crate::identifiers::NodeId;
use crate::models::types::{GraphError, Result};

pub use arc::{ArcEnd, GraphArc};
pub use builder::{build_graph_builder, GraphBuilder, JunctionSite};
pub use merge::{build_duplicate_nodes_merger, build_node_merger};
pub use node::GraphNode;
pub use search::{arc_cost, find_shortest_path, search, PathSearch};
pub use serialize::{deserialize, serialize, GraphFile, SerializedArc, SerializedNode};

/// Resolves arc ends to nodes
pub trait NodeStore<I> {
    /// `None` when the node is not available here
    fn resolve(&self, end: &ArcEnd) -> Option<&GraphNode<I>>;
}

/// Arena owning every node of one loaded graph
#[derive(Clone, Debug)]
pub struct Graph<I> {
    nodes: HashMap<NodeId, GraphNode<I>>,
}

impl<I> Default for Graph<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I> NodeStore<I> for Graph<I> {
    fn resolve(&self, end: &ArcEnd) -> Option<&GraphNode<I>> {
        self.nodes.get(&end.node)
    }
}

impl<I> FromIterator<GraphNode<I>> for Graph<I> {
    fn from_iter<T: IntoIterator<Item = GraphNode<I>>>(iter: T) -> Self {
        Self {
            nodes: iter.into_iter().map(|node| (node.id, node)).collect(),
        }
    }
}

impl<I> Graph<I> {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&GraphNode<I>> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut GraphNode<I>> {
        self.nodes.get_mut(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode<I>> {
        self.nodes.values()
    }

    /// Node ids in ascending order
    pub fn ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Nodes in ascending id order
    pub fn into_nodes(self) -> Vec<GraphNode<I>> {
        let mut nodes: Vec<GraphNode<I>> = self.nodes.into_values().collect();
        nodes.sort_by_key(|n| n.id);
        nodes
    }

    /// Insert or replace a node, returning the replaced one
    pub fn insert(&mut self, node: GraphNode<I>) -> Option<GraphNode<I>> {
        self.nodes.insert(node.id, node)
    }

    /// Add a new node without arcs
    pub fn add(&mut self, id: NodeId, item: I) -> Result<()> {
        if self.nodes.contains_key(&id) {
            return Err(GraphError::InvalidData(format!("duplicate node {id}")));
        }
        self.nodes.insert(id, GraphNode::new(id, item));
        Ok(())
    }

    /// Join two nodes with an undirected arc
    pub fn connect(&mut self, a: NodeId, b: NodeId, cost: f64) -> Result<()> {
        self.connect_arc(GraphArc::new(a, b, cost))
    }

    /// Append `arc` to both of its ends, which must exist here
    pub fn connect_arc(&mut self, arc: GraphArc) -> Result<()> {
        if !is_valid_cost(arc.cost) {
            return Err(GraphError::InvalidData(format!(
                "arc {} - {} has invalid cost {}",
                arc.a.node, arc.b.node, arc.cost
            )));
        }
        if arc.a.node == arc.b.node {
            return Err(GraphError::InvalidData(format!("self-loop on {}", arc.a.node)));
        }
        for end in [arc.a.node, arc.b.node] {
            if !self.nodes.contains_key(&end) {
                return Err(GraphError::NodeNotFound(end));
            }
        }

        trace!(a = %arc.a.node, b = %arc.b.node, cost = arc.cost, "connect");
        self.attach(arc);
        Ok(())
    }

    /// Append `arc` to whichever of its ends exist here
    pub(crate) fn attach(&mut self, arc: GraphArc) {
        let (a, b) = (arc.a.node, arc.b.node);
        if let Some(node) = self.nodes.get_mut(&b) {
            node.arcs.push(arc.clone());
        }
        if a != b {
            if let Some(node) = self.nodes.get_mut(&a) {
                node.arcs.push(arc);
            }
        }
    }

    /// Remove every arc joining `a` and `b`, returning how many were removed
    pub fn disconnect(&mut self, a: NodeId, b: NodeId) -> usize {
        let mut removed = 0;
        if let Some(node) = self.nodes.get_mut(&a) {
            let before = node.arcs.len();
            node.arcs.retain(|arc| !arc.joins(a, b));
            removed = before - node.arcs.len();
        }
        if let Some(node) = self.nodes.get_mut(&b) {
            let before = node.arcs.len();
            node.arcs.retain(|arc| !arc.joins(a, b));
            removed = removed.max(before - node.arcs.len());
        }
        removed
    }

    /// Remove a node and its arcs from every neighbor present here
    pub fn remove_node(&mut self, id: NodeId) -> Option<GraphNode<I>> {
        let node = self.nodes.remove(&id)?;
        for neighbor in node.neighbor_ids() {
            if let Some(other) = self.nodes.get_mut(&neighbor) {
                other.arcs.retain(|arc| !arc.touches(id));
            }
        }
        Some(node)
    }
}

pub(crate) fn is_valid_cost(cost: f64) -> bool {
    cost.is_finite() && cost >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u64) -> NodeId {
        NodeId::new(raw)
    }

    fn triangle() -> Graph<char> {
        let mut graph = Graph::new();
        for (raw, item) in [(1, 'a'), (2, 'b'), (3, 'c')] {
            graph.add(id(raw), item).unwrap();
        }
        graph.connect(id(1), id(2), 1.0).unwrap();
        graph.connect(id(2), id(3), 2.0).unwrap();
        graph.connect(id(3), id(1), 3.0).unwrap();
        graph
    }

    #[test]
    fn test_connect_is_undirected() {
        let graph = triangle();
        assert_eq!(graph.node(id(1)).unwrap().degree(), 2);
        assert_eq!(graph.node(id(2)).unwrap().arcs_to(id(1)).count(), 1);
        assert_eq!(graph.node(id(1)).unwrap().arcs_to(id(2)).count(), 1);
    }

    #[test]
    fn test_connect_rejects_bad_input() {
        let mut graph = triangle();
        assert!(matches!(graph.connect(id(1), id(9), 1.0), Err(GraphError::NodeNotFound(_))));
        assert!(graph.connect(id(1), id(2), -1.0).is_err());
        assert!(graph.connect(id(1), id(2), f64::NAN).is_err());
        assert!(graph.connect(id(1), id(1), 1.0).is_err());
        assert!(graph.add(id(1), 'x').is_err());
    }

    #[test]
    fn test_disconnect_removes_both_sides() {
        let mut graph = triangle();
        assert_eq!(graph.disconnect(id(1), id(2)), 1);
        assert_eq!(graph.node(id(1)).unwrap().degree(), 1);
        assert_eq!(graph.node(id(2)).unwrap().degree(), 1);
        assert_eq!(graph.disconnect(id(1), id(2)), 0);
    }

    #[test]
    fn test_remove_node() {
        let mut graph = triangle();
        let removed = graph.remove_node(id(3)).unwrap();
        assert_eq!(removed.item, 'c');
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.node(id(1)).unwrap().degree(), 1);
        assert_eq!(graph.node(id(2)).unwrap().degree(), 1);
        assert!(graph.remove_node(id(3)).is_none());
    }

    #[test]
    fn test_ids_are_sorted() {
        let graph: Graph<()> = [3, 1, 2].into_iter().map(|raw| GraphNode::new(id(raw), ())).collect();
        assert_eq!(graph.ids(), vec![id(1), id(2), id(3)]);
    }
}
