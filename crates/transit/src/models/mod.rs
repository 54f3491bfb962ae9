//! Transit data models, types, and traits.

pub mod records;
pub mod traits;
pub mod types;

// Re-exports for convenience
pub use records::{BusRoute, Railroad, StationRecord};
pub use traits::{RouteFeature, TransitItem};
pub use types::{GraphError, NetworkNode, NodeKind, Result, RouteMode};
