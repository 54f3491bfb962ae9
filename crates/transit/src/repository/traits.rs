//! Pluggable partition IO.
//!
//! The repository never touches storage itself. Implement these to decide
//! where partition files live.

use std::future::Future;
use std::pin::Pin;

use crate::graph::GraphFile;
use crate::identifiers::PartitionKey;
use crate::models::types::Result;

/// Read one partition
pub trait PartitionLoader<I>: Send + Sync {
    fn load<'a>(
        &'a self,
        key: &'a PartitionKey,
    ) -> Pin<Box<dyn Future<Output = Result<GraphFile<I>>> + Send + 'a>>;
}

/// Write one partition, replacing any previous copy
pub trait PartitionPersister<I>: Send + Sync {
    fn persist<'a>(
        &'a self,
        key: &'a PartitionKey,
        file: &'a GraphFile<I>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}
