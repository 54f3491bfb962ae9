//! Persisted graph format.
//!
//! A [`GraphFile`] stores nodes with their payload and every undirected arc
//! once. Arcs leaving the serialized node set are kept along with the
//! partition keys of both ends, so a partition file can be loaded on its own
//! before the partitions it points into.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{ArcEnd, Graph, GraphArc, GraphNode};
use crate::identifiers::{NodeId, PartitionKey};
use crate::models::types::{GraphError, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SerializedNode<I> {
    pub id: NodeId,
    pub item: I,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SerializedArc {
    pub a: NodeId,
    pub b: NodeId,
    pub cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a_partition: Option<PartitionKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b_partition: Option<PartitionKey>,
}

impl From<&GraphArc> for SerializedArc {
    fn from(arc: &GraphArc) -> Self {
        Self {
            a: arc.a.node,
            b: arc.b.node,
            cost: arc.cost,
            a_partition: arc.a.partition.clone(),
            b_partition: arc.b.partition.clone(),
        }
    }
}

impl From<SerializedArc> for GraphArc {
    fn from(arc: SerializedArc) -> Self {
        GraphArc {
            a: ArcEnd {
                node: arc.a,
                partition: arc.a_partition,
            },
            b: ArcEnd {
                node: arc.b,
                partition: arc.b_partition,
            },
            cost: arc.cost,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphFile<I> {
    pub nodes: Vec<SerializedNode<I>>,
    pub arcs: Vec<SerializedArc>,
}

impl<I> Default for GraphFile<I> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            arcs: Vec::new(),
        }
    }
}

impl<I: Serialize> GraphFile<I> {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl<I: for<'de> Deserialize<'de>> GraphFile<I> {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Serialize a set of nodes, ordered by id.
pub fn serialize<'n, I, It>(nodes: It) -> GraphFile<I>
where
    I: Clone + 'n,
    It: IntoIterator<Item = &'n GraphNode<I>>,
{
    let mut nodes: Vec<&GraphNode<I>> = nodes.into_iter().collect();
    nodes.sort_by_key(|n| n.id);
    let members: HashSet<NodeId> = nodes.iter().map(|n| n.id).collect();

    let mut file = GraphFile::default();
    for node in &nodes {
        file.nodes.push(SerializedNode {
            id: node.id,
            item: node.item.clone(),
        });
        for arc in &node.arcs {
            let Some(far) = arc.other_end(node.id) else {
                continue;
            };
            // Arcs inside the set are written once, from their `a` end
            if !members.contains(&far.node) || arc.a.node == node.id {
                file.arcs.push(SerializedArc::from(arc));
            }
        }
    }
    file
}

/// Rebuild a graph from a file.
///
/// Arc ends outside the file stay unresolved until their partition is
/// available.
pub fn deserialize<I>(file: GraphFile<I>) -> Result<Graph<I>> {
    let mut graph = Graph::new();
    for node in file.nodes {
        graph.add(node.id, node.item)?;
    }
    for arc in file.arcs {
        if !graph.contains(arc.a) && !graph.contains(arc.b) {
            return Err(GraphError::InvalidData(format!(
                "arc {} - {} touches no node of the file",
                arc.a, arc.b
            )));
        }
        graph.attach(GraphArc::from(arc));
    }
    Ok(graph)
}
