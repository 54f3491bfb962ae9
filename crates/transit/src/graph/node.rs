use super::arc::GraphArc;
use crate::identifiers::NodeId;

/// A graph node: identity, payload, and the arcs touching it
#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode<I> {
    pub id: NodeId,
    pub item: I,
    pub arcs: Vec<GraphArc>,
}

impl<I> GraphNode<I> {
    pub fn new(id: NodeId, item: I) -> Self {
        Self {
            id,
            item,
            arcs: Vec::new(),
        }
    }

    pub fn degree(&self) -> usize {
        self.arcs.len()
    }

    /// Ids on the far side of every arc
    pub fn neighbor_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.arcs
            .iter()
            .filter_map(move |arc| arc.other_end(self.id).map(|end| end.node))
    }

    pub fn arcs_to(&self, other: NodeId) -> impl Iterator<Item = &GraphArc> + '_ {
        self.arcs.iter().filter(move |arc| arc.joins(self.id, other))
    }
}
