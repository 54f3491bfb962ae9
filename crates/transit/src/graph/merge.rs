//! Collapsing several nodes that stand for one real place.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use itertools::Itertools;
use tracing::debug;

use super::{ArcEnd, Graph, GraphArc, GraphNode};
use crate::identifiers::{NodeId, PartitionKey};
use crate::models::types::{GraphError, Result};

struct KeptArc {
    own_partition: Option<PartitionKey>,
    far: ArcEnd,
    total: f64,
    count: usize,
}

/// Build a merger that replaces a set of nodes by one node from `combine`.
///
/// Arcs between members of the set are dropped. Arcs leaving the set are
/// kept and rewired on both sides to the merged node; several arcs to the
/// same target collapse into one whose cost is their mean. An error from
/// `combine` aborts the merge before the graph is touched.
pub fn build_node_merger<I, F>(mut combine: F) -> impl FnMut(&mut Graph<I>, &[NodeId]) -> Result<NodeId>
where
    F: FnMut(&[&GraphNode<I>]) -> Result<(NodeId, I)>,
{
    move |graph, ids| {
        let ids: Vec<NodeId> = ids.iter().copied().unique().collect();
        if ids.is_empty() {
            return Err(GraphError::InvalidData("nothing to merge".to_string()));
        }
        let members: HashSet<NodeId> = ids.iter().copied().collect();

        let nodes = ids
            .iter()
            .map(|&id| graph.node(id).ok_or(GraphError::NodeNotFound(id)))
            .collect::<Result<Vec<_>>>()?;

        let (merged_id, item) = combine(&nodes)?;
        if graph.contains(merged_id) && !members.contains(&merged_id) {
            return Err(GraphError::InvalidData(format!(
                "merged node {merged_id} already exists"
            )));
        }

        let mut kept: Vec<KeptArc> = Vec::new();
        let mut by_target: HashMap<NodeId, usize> = HashMap::new();
        for node in &nodes {
            for arc in &node.arcs {
                let (Some(own), Some(far)) = (arc.end_of(node.id), arc.other_end(node.id)) else {
                    continue;
                };
                if members.contains(&far.node) {
                    continue;
                }
                match by_target.get(&far.node) {
                    Some(&slot) => {
                        kept[slot].total += arc.cost;
                        kept[slot].count += 1;
                    }
                    None => {
                        by_target.insert(far.node, kept.len());
                        kept.push(KeptArc {
                            own_partition: own.partition.clone(),
                            far: far.clone(),
                            total: arc.cost,
                            count: 1,
                        });
                    }
                }
            }
        }

        for id in &ids {
            graph.remove_node(*id);
        }
        graph.insert(GraphNode::new(merged_id, item));
        for k in kept {
            graph.attach(GraphArc {
                a: ArcEnd {
                    node: merged_id,
                    partition: k.own_partition,
                },
                b: k.far,
                cost: k.total / k.count as f64,
            });
        }

        debug!(merged = %merged_id, members = ids.len(), "Merged nodes");
        Ok(merged_id)
    }
}

/// Build a merger that groups nodes by `key_of` and merges every group
/// holding more than one node.
///
/// Returns the resulting node ids, one per group in order of first
/// appearance.
pub fn build_duplicate_nodes_merger<I, K, KF, F>(
    key_of: KF,
    combine: F,
) -> impl FnMut(&mut Graph<I>, &[NodeId]) -> Result<Vec<NodeId>>
where
    K: Eq + Hash,
    KF: Fn(&GraphNode<I>) -> K,
    F: FnMut(&[&GraphNode<I>]) -> Result<(NodeId, I)>,
{
    let mut merge = build_node_merger(combine);

    move |graph, ids| {
        let mut groups: Vec<Vec<NodeId>> = Vec::new();
        let mut slots: HashMap<K, usize> = HashMap::new();
        for &id in ids.iter().unique() {
            let node = graph.node(id).ok_or(GraphError::NodeNotFound(id))?;
            let slot = *slots.entry(key_of(node)).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(id);
        }

        groups
            .into_iter()
            .map(|group| match group.as_slice() {
                [single] => Ok(*single),
                members => merge(graph, members),
            })
            .collect()
    }
}
