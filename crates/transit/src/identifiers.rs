//! Type-safe, efficient identifiers for transit entities and graph nodes.
//!
//! Entity identifiers use Arc<str> for cheap cloning and minimal memory overhead.
//! [`NodeId`] is a 64-bit hash so that the same station maps to the same node
//! in every independently built or loaded partition.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use twox_hash::XxHash64;

macro_rules! impl_identifier {
    ($name:ident) => {
        #[derive(Clone, Debug, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(s: impl AsRef<str>) -> Self {
                Self(s.as_ref().into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
            }
        }

        impl Eq for $name {}

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                self.0.cmp(&other.0)
            }
        }

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.0.hash(state);
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }
    };
}

impl_identifier!(StationIdentifier);
impl_identifier!(RouteIdentifier);
impl_identifier!(OperatorIdentifier);
impl_identifier!(GroupIdentifier);
impl_identifier!(PartitionKey);

impl From<&OperatorIdentifier> for PartitionKey {
    fn from(operator: &OperatorIdentifier) -> Self {
        Self(operator.0.clone())
    }
}

const NODE_ID_SEED: u64 = 0x7472_616e_7369_7400;

/// Identity of a graph node, stable across partitions and rebuilds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Hash an arbitrary key into a node id.
    pub fn from_key(key: impl AsRef<str>) -> Self {
        Self(XxHash64::oneshot(NODE_ID_SEED, key.as_ref().as_bytes()))
    }

    /// Node of a station once merged across an operator's routes.
    pub fn for_station(operator: &OperatorIdentifier, station: &StationIdentifier) -> Self {
        Self::from_key(format!("operator:{operator}/station:{station}"))
    }

    /// Node of a station as seen by a single route, before merging.
    pub fn for_route_station(route: &RouteIdentifier, station: &StationIdentifier) -> Self {
        Self::from_key(format!("route:{route}/station:{station}"))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:016x}", self.0)
    }
}
