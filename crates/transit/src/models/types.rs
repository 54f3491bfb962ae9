//! Core data types and enums for transit graphs.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::identifiers::*;

// ============================================================================
// Enums
// ============================================================================

/// Kind of vehicle serving a route
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum RouteMode {
    Rail = 0,
    Bus = 1,
}

/// What a graph node stands for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A station or bus stop from the input records
    Station,
    /// Synthetic node where route branches meet
    Junction,
}

// ============================================================================
// Data Structures
// ============================================================================

/// Payload carried by every node of an assembled transit graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkNode {
    pub kind: NodeKind,
    pub station_id: Option<StationIdentifier>,
    pub name: Arc<str>,
    pub operator: OperatorIdentifier,
    pub routes: Vec<RouteIdentifier>,
    pub mode: RouteMode,
    /// Stations sharing a group are one place for transfer purposes
    pub group_id: Option<GroupIdentifier>,
    pub position: [f64; 2],
}

impl NetworkNode {
    pub fn is_junction(&self) -> bool {
        self.kind == NodeKind::Junction
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Station not found: {0}")]
    StationNotFound(StationIdentifier),

    #[error("Operator not found: {0}")]
    OperatorNotFound(OperatorIdentifier),

    #[error("Partition not found: {0}")]
    PartitionNotFound(PartitionKey),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GraphError>;
