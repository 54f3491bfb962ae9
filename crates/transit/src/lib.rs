//! # transit-graph
//!
//! Routable transit graphs from raw route geometry.
//!
//! ## Features
//!
//! - **Topology recovery**: Unordered polylines become connected chains,
//!   with spurs ending mid-line split into proper T-junctions
//! - **Station placement**: Stations are projected onto chains through an
//!   R-tree segment index
//! - **Graph building**: Consecutive stations are joined by along-route
//!   distance, with junction nodes at forks
//! - **Partitioning**: One file per operator, loaded on demand while routing
//!
//! ## Example
//!
//! ```
//! use transit_graph::prelude::*;
//! use geo::Coord;
//!
//! let line = Railroad {
//!     id: RouteIdentifier::new("red"),
//!     operator: OperatorIdentifier::new("metro"),
//!     name: "Red Line".into(),
//!     rails: vec![
//!         Path::from_xy(&[[0.0, 0.0], [10.0, 0.0]]).unwrap(),
//!         Path::from_xy(&[[10.0, 0.0], [10.0, 5.0]]).unwrap(),
//!     ],
//!     stations: vec![
//!         StationRecord::new("a", "A", Coord { x: 0.0, y: 0.0 }),
//!         StationRecord::new("b", "B", Coord { x: 10.0, y: 5.0 }),
//!     ],
//! };
//!
//! let network = assemble_network(&[&line], &NetworkConfig::default()).unwrap();
//! let operator = OperatorIdentifier::new("metro");
//! let a = NodeId::for_station(&operator, &StationIdentifier::new("a"));
//! let b = NodeId::for_station(&operator, &StationIdentifier::new("b"));
//!
//! assert_eq!(find_shortest_path(&network, a, b, arc_cost), vec![a, b]);
//! assert_eq!(network.node(a).unwrap().arcs[0].cost, 15.0);
//! ```

pub mod config;
pub mod geometry;
pub mod graph;
pub mod identifiers;
pub mod models;
pub mod network;
pub mod pathchain;
pub mod repository;
pub mod spatial;

// Re-exports for convenience
pub mod prelude {
    pub use crate::config::NetworkConfig;
    pub use crate::graph::{
        arc_cost, build_duplicate_nodes_merger, build_graph_builder, build_node_merger, deserialize,
        find_shortest_path, serialize, ArcEnd, Graph, GraphArc, GraphFile, GraphNode, NodeStore,
    };
    pub use crate::identifiers::*;
    pub use crate::models::{records::*, traits::*, types::*};
    pub use crate::network::{assemble_network, build_route_graph, partition_by_operator, RoutePlanner};
    pub use crate::pathchain::{
        build_pathchain, build_pathchain_with, find_point_on_pathchain, IsolatedPathChain, Path, PathChain,
    };
    pub use crate::repository::{
        partition, FilePartitionStore, MemoryPartitionStore, PartitionLoader, PartitionPersister,
        PartitionedRepository,
    };
}

pub use prelude::*;
