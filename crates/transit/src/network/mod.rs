//! Transit networks built from route records, and routing over them.

pub mod assembly;
pub mod planner;

pub use assembly::{assemble_network, build_route_graph, partition_by_operator};
pub use planner::{transit_cost, PlannedRoute, RoutePlanner};
