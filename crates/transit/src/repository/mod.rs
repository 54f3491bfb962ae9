//! Partitioned node storage with on-demand loading.
//!
//! A large graph is split into partitions (typically one per operator) that
//! are persisted and loaded independently. Arcs crossing a partition
//! boundary carry the partition key of both ends, so a loaded partition can
//! name nodes it does not hold yet.

pub mod store;
pub mod traits;

use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use tracing::{debug, trace};

use crate::graph::{deserialize, search, serialize, ArcEnd, Graph, GraphArc, GraphNode, NodeStore, PathSearch};
use crate::identifiers::{NodeId, PartitionKey};
use crate::models::types::{GraphError, Result};

pub use store::{FilePartitionStore, MemoryPartitionStore};
pub use traits::{PartitionLoader, PartitionPersister};

pub struct PartitionedRepository<I> {
    partitions: HashMap<PartitionKey, HashMap<NodeId, GraphNode<I>>>,
    index: HashMap<NodeId, PartitionKey>,
    loaded: HashSet<PartitionKey>,
    loader: Box<dyn PartitionLoader<I>>,
    persister: Box<dyn PartitionPersister<I>>,
}

impl<I> NodeStore<I> for PartitionedRepository<I> {
    fn resolve(&self, end: &ArcEnd) -> Option<&GraphNode<I>> {
        let key = match &end.partition {
            Some(key) => key,
            None => self.index.get(&end.node)?,
        };
        self.partitions.get(key)?.get(&end.node)
    }
}

impl<I> PartitionedRepository<I> {
    pub fn new(
        loader: impl PartitionLoader<I> + 'static,
        persister: impl PartitionPersister<I> + 'static,
    ) -> Self {
        Self {
            partitions: HashMap::new(),
            index: HashMap::new(),
            loaded: HashSet::new(),
            loader: Box::new(loader),
            persister: Box::new(persister),
        }
    }

    /// Use one store for both loading and persisting
    pub fn with_store<S>(store: S) -> Self
    where
        S: PartitionLoader<I> + PartitionPersister<I> + Clone + 'static,
    {
        Self::new(store.clone(), store)
    }

    /// Keep `node` in memory under `key`
    pub fn register(&mut self, node: GraphNode<I>, key: PartitionKey) {
        trace!(node = %node.id, partition = %key, "Registering node");
        self.index.insert(node.id, key.clone());
        self.partitions.entry(key).or_default().insert(node.id, node);
    }

    /// Node by id alone, among what is already in memory
    pub fn node(&self, id: NodeId) -> Option<&GraphNode<I>> {
        self.resolve(&ArcEnd::local(id))
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Keys of the partitions held in memory, ascending
    pub fn partition_keys(&self) -> Vec<PartitionKey> {
        self.partitions.keys().cloned().sorted().collect()
    }

    pub fn partition_nodes(&self, key: &PartitionKey) -> impl Iterator<Item = &GraphNode<I>> {
        self.partitions.get(key).into_iter().flat_map(|nodes| nodes.values())
    }

    /// Whether `key` has been read through the loader
    pub fn is_loaded(&self, key: &PartitionKey) -> bool {
        self.loaded.contains(key)
    }

    /// Look a node up, loading its partition on a miss.
    ///
    /// The loader runs at most once per partition. A node still missing
    /// afterwards is [`GraphError::NodeNotFound`].
    pub async fn get(&mut self, id: NodeId, key: &PartitionKey) -> Result<&GraphNode<I>> {
        let present = self.partitions.get(key).is_some_and(|nodes| nodes.contains_key(&id));
        if !present && !self.loaded.contains(key) {
            self.load_partition(key).await?;
        }
        self.partitions
            .get(key)
            .and_then(|nodes| nodes.get(&id))
            .ok_or(GraphError::NodeNotFound(id))
    }

    /// Read a partition through the loader and merge it into memory.
    ///
    /// Nodes registered before the load win over loaded copies.
    pub async fn load_partition(&mut self, key: &PartitionKey) -> Result<()> {
        let file = self.loader.load(key).await?;
        let graph = deserialize(file)?;
        let count = graph.len();

        let nodes = self.partitions.entry(key.clone()).or_default();
        for node in graph.into_nodes() {
            self.index.entry(node.id).or_insert_with(|| key.clone());
            nodes.entry(node.id).or_insert(node);
        }
        self.loaded.insert(key.clone());

        debug!(partition = %key, nodes = count, "Loaded partition");
        Ok(())
    }

    /// Persist every partition held in memory, once each
    pub async fn store(&self) -> Result<()>
    where
        I: Clone,
    {
        for key in self.partition_keys() {
            let file = serialize(self.partition_nodes(&key));
            self.persister.persist(&key, &file).await?;
            debug!(partition = %key, nodes = file.nodes.len(), arcs = file.arcs.len(), "Stored partition");
        }
        Ok(())
    }

    /// Shortest path across partitions.
    ///
    /// Whenever a search runs into arcs leading to partitions that were never
    /// loaded, those partitions are loaded and the search is repeated.
    pub async fn find_shortest_path<F>(&mut self, start: NodeId, end: NodeId, mut cost_fn: F) -> Result<PathSearch>
    where
        F: FnMut(&GraphArc, &GraphNode<I>, &GraphNode<I>) -> f64,
    {
        loop {
            let found = search(&*self, start, end, &mut cost_fn);
            let missing: Vec<PartitionKey> = found
                .unresolved
                .iter()
                .filter_map(|end| end.partition.clone())
                .filter(|key| !self.loaded.contains(key))
                .unique()
                .collect();

            if missing.is_empty() {
                return Ok(found);
            }
            for key in missing {
                self.load_partition(&key).await?;
            }
        }
    }
}

/// Register every node of `graph` under `key_of`, marking arcs whose ends
/// fall in different partitions with both keys.
///
/// Returns the number of boundary arcs.
pub fn partition<I, K>(repository: &mut PartitionedRepository<I>, graph: Graph<I>, key_of: K) -> usize
where
    K: Fn(&GraphNode<I>) -> PartitionKey,
{
    let keys: HashMap<NodeId, PartitionKey> = graph.nodes().map(|node| (node.id, key_of(node))).collect();

    let mut boundary = 0;
    for mut node in graph.into_nodes() {
        let Some(key) = keys.get(&node.id).cloned() else {
            continue;
        };
        for arc in node.arcs.iter_mut() {
            let (Some(a), Some(b)) = (keys.get(&arc.a.node), keys.get(&arc.b.node)) else {
                continue;
            };
            if a == b {
                continue;
            }
            arc.a.partition = Some(a.clone());
            arc.b.partition = Some(b.clone());
            if arc.a.node == node.id {
                boundary += 1;
            }
        }
        repository.register(node, key);
    }

    debug!(nodes = keys.len(), boundary, "Partitioned graph");
    boundary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::arc_cost;

    const A: NodeId = NodeId::new(1);
    const B: NodeId = NodeId::new(2);
    const C: NodeId = NodeId::new(3);

    fn east() -> PartitionKey {
        PartitionKey::new("east")
    }

    fn west() -> PartitionKey {
        PartitionKey::new("west")
    }

    /// A and B in the east, C in the west, joined A - B - C
    fn split_graph() -> Graph<String> {
        let mut graph = Graph::new();
        graph.add(A, "east".to_string()).unwrap();
        graph.add(B, "east".to_string()).unwrap();
        graph.add(C, "west".to_string()).unwrap();
        graph.connect(A, B, 1.0).unwrap();
        graph.connect(B, C, 2.0).unwrap();
        graph
    }

    fn key_of(node: &GraphNode<String>) -> PartitionKey {
        PartitionKey::new(&node.item)
    }

    #[tokio::test]
    async fn test_get_hits_memory_first() {
        let store = MemoryPartitionStore::new();
        let mut repo: PartitionedRepository<String> = PartitionedRepository::with_store(store.clone());
        repo.register(GraphNode::new(A, "east".to_string()), east());

        assert_eq!(repo.get(A, &east()).await.unwrap().id, A);
        assert_eq!(store.loads(), 0);
    }

    #[test]
    fn test_partition_marks_boundary_arcs() {
        let mut repo: PartitionedRepository<String> = PartitionedRepository::with_store(MemoryPartitionStore::new());

        assert_eq!(partition(&mut repo, split_graph(), key_of), 1);
        assert_eq!(repo.partition_keys(), vec![east(), west()]);

        let b = repo.node(B).unwrap();
        let local = b.arcs_to(A).next().unwrap();
        assert!(!local.is_partitioned());

        let boundary = b.arcs_to(C).next().unwrap();
        assert_eq!(boundary.a, ArcEnd::in_partition(B, east()));
        assert_eq!(boundary.b, ArcEnd::in_partition(C, west()));
    }

    #[tokio::test]
    async fn test_get_loads_partition_once() {
        let store = MemoryPartitionStore::new();
        let mut writer = PartitionedRepository::with_store(store.clone());
        partition(&mut writer, split_graph(), key_of);
        writer.store().await.unwrap();
        assert_eq!(store.keys().unwrap(), vec![east(), west()]);

        let mut reader: PartitionedRepository<String> = PartitionedRepository::with_store(store.clone());
        assert_eq!(reader.get(A, &east()).await.unwrap().item, "east");
        assert_eq!(reader.get(B, &east()).await.unwrap().id, B);
        assert!(matches!(reader.get(C, &east()).await, Err(GraphError::NodeNotFound(_))));
        assert_eq!(store.loads(), 1);
        assert!(reader.is_loaded(&east()));
        assert!(!reader.is_loaded(&west()));
    }

    #[tokio::test]
    async fn test_missing_partition_fails() {
        let mut repo: PartitionedRepository<String> = PartitionedRepository::with_store(MemoryPartitionStore::new());
        let result = repo.get(A, &PartitionKey::new("nowhere")).await;
        assert!(matches!(result, Err(GraphError::PartitionNotFound(_))));
    }

    #[tokio::test]
    async fn test_shortest_path_loads_neighbors() {
        let store = MemoryPartitionStore::new();
        let mut writer = PartitionedRepository::with_store(store.clone());
        partition(&mut writer, split_graph(), key_of);
        writer.store().await.unwrap();

        let mut reader: PartitionedRepository<String> = PartitionedRepository::with_store(store.clone());
        reader.get(A, &east()).await.unwrap();

        let found = reader.find_shortest_path(A, C, arc_cost).await.unwrap();
        assert_eq!(found.nodes, vec![A, B, C]);
        assert_eq!(found.cost, Some(3.0));
        assert!(reader.is_loaded(&west()));
        assert_eq!(store.loads(), 2);
    }
}
