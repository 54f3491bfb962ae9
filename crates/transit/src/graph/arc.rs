//! Weighted, undirected arcs with lazily resolved endpoints.
//!
//! An arc never owns or borrows its endpoints. Each end is a [`NodeId`]
//! plus, for arcs crossing a partition boundary, the partition holding that
//! node. Resolution goes through a [`NodeStore`], which may not have the
//! node at hand; that case means "edge currently unusable".

use serde::{Deserialize, Serialize};

use super::node::GraphNode;
use super::NodeStore;
use crate::identifiers::{NodeId, PartitionKey};

/// One end of an arc
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArcEnd {
    pub node: NodeId,
    /// Set only on partition-aware arcs
    pub partition: Option<PartitionKey>,
}

impl ArcEnd {
    pub fn local(node: NodeId) -> Self {
        Self { node, partition: None }
    }

    pub fn in_partition(node: NodeId, partition: PartitionKey) -> Self {
        Self {
            node,
            partition: Some(partition),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphArc {
    pub a: ArcEnd,
    pub b: ArcEnd,
    pub cost: f64,
}

impl GraphArc {
    pub fn new(a: NodeId, b: NodeId, cost: f64) -> Self {
        Self {
            a: ArcEnd::local(a),
            b: ArcEnd::local(b),
            cost,
        }
    }

    pub fn is_partitioned(&self) -> bool {
        self.a.partition.is_some() || self.b.partition.is_some()
    }

    pub fn joins(&self, x: NodeId, y: NodeId) -> bool {
        (self.a.node == x && self.b.node == y) || (self.a.node == y && self.b.node == x)
    }

    pub fn touches(&self, node: NodeId) -> bool {
        self.a.node == node || self.b.node == node
    }

    /// The end belonging to `node`
    pub fn end_of(&self, node: NodeId) -> Option<&ArcEnd> {
        if self.a.node == node {
            Some(&self.a)
        } else if self.b.node == node {
            Some(&self.b)
        } else {
            None
        }
    }

    /// The end opposite to `node`
    pub fn other_end(&self, node: NodeId) -> Option<&ArcEnd> {
        if self.a.node == node {
            Some(&self.b)
        } else if self.b.node == node {
            Some(&self.a)
        } else {
            None
        }
    }

    /// Resolve both ends.
    pub fn resolve<'s, I, S>(&self, store: &'s S) -> Option<(&'s GraphNode<I>, &'s GraphNode<I>)>
    where
        S: NodeStore<I> + ?Sized,
    {
        Some((store.resolve(&self.a)?, store.resolve(&self.b)?))
    }

    /// Node on the other side of `from`.
    ///
    /// `None` if `from` is not an end of this arc or either end does not
    /// resolve in `store`.
    pub fn to<'s, I, S>(&self, from: NodeId, store: &'s S) -> Option<&'s GraphNode<I>>
    where
        S: NodeStore<I> + ?Sized,
    {
        let (a, b) = self.resolve(store)?;
        if a.id == from {
            Some(b)
        } else if b.id == from {
            Some(a)
        } else {
            None
        }
    }
}
