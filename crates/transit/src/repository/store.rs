//! Partition stores shipped with the crate.

use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::traits::{PartitionLoader, PartitionPersister};
use crate::graph::GraphFile;
use crate::identifiers::PartitionKey;
use crate::models::types::{GraphError, Result};

// ============================================================================
// Files
// ============================================================================

/// One JSON file per partition, named `<key>.json`, inside a directory
#[derive(Clone, Debug)]
pub struct FilePartitionStore {
    dir: PathBuf,
}

impl FilePartitionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &PartitionKey) -> Result<PathBuf> {
        let name = key.as_str();
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(GraphError::InvalidData(format!(
                "partition key {name:?} is not a valid file name"
            )));
        }
        Ok(self.dir.join(format!("{name}.json")))
    }
}

impl<I> PartitionLoader<I> for FilePartitionStore
where
    I: DeserializeOwned + Send,
{
    fn load<'a>(
        &'a self,
        key: &'a PartitionKey,
    ) -> Pin<Box<dyn Future<Output = Result<GraphFile<I>>> + Send + 'a>> {
        Box::pin(async move {
            let path = self.path_for(key)?;
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    return Err(GraphError::PartitionNotFound(key.clone()));
                }
                Err(err) => return Err(err.into()),
            };
            let file: GraphFile<I> = serde_json::from_slice(&bytes)?;
            debug!(partition = %key, path = %path.display(), nodes = file.nodes.len(), "Read partition file");
            Ok(file)
        })
    }
}

impl<I> PartitionPersister<I> for FilePartitionStore
where
    I: Serialize + Sync,
{
    fn persist<'a>(
        &'a self,
        key: &'a PartitionKey,
        file: &'a GraphFile<I>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let path = self.path_for(key)?;
            let bytes = serde_json::to_vec(file)?;

            tokio::fs::create_dir_all(&self.dir).await?;
            let mut out = tokio::fs::File::create(&path).await?;
            out.write_all(&bytes).await?;
            out.flush().await?;

            debug!(partition = %key, path = %path.display(), bytes = bytes.len(), "Wrote partition file");
            Ok(())
        })
    }
}

// ============================================================================
// Memory
// ============================================================================

/// In-process store keeping each partition as its JSON document.
///
/// Clones share the same contents.
#[derive(Clone, Debug, Default)]
pub struct MemoryPartitionStore {
    partitions: Arc<Mutex<HashMap<PartitionKey, String>>>,
    loads: Arc<AtomicUsize>,
}

impl MemoryPartitionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<PartitionKey, String>>> {
        self.partitions
            .lock()
            .map_err(|_| GraphError::InvalidData("partition store lock poisoned".to_string()))
    }

    /// Stored partition keys in ascending order
    pub fn keys(&self) -> Result<Vec<PartitionKey>> {
        let mut keys: Vec<PartitionKey> = self.lock()?.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    pub fn contains(&self, key: &PartitionKey) -> Result<bool> {
        Ok(self.lock()?.contains_key(key))
    }

    /// Number of successful loads served so far
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }
}

impl<I> PartitionLoader<I> for MemoryPartitionStore
where
    I: DeserializeOwned + Send,
{
    fn load<'a>(
        &'a self,
        key: &'a PartitionKey,
    ) -> Pin<Box<dyn Future<Output = Result<GraphFile<I>>> + Send + 'a>> {
        Box::pin(async move {
            let json = self
                .lock()?
                .get(key)
                .cloned()
                .ok_or_else(|| GraphError::PartitionNotFound(key.clone()))?;
            let file = serde_json::from_str(&json)?;
            self.loads.fetch_add(1, Ordering::Relaxed);
            Ok(file)
        })
    }
}

impl<I> PartitionPersister<I> for MemoryPartitionStore
where
    I: Serialize + Sync,
{
    fn persist<'a>(
        &'a self,
        key: &'a PartitionKey,
        file: &'a GraphFile<I>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let json = serde_json::to_string(file)?;
            self.lock()?.insert(key.clone(), json);
            Ok(())
        })
    }
}
