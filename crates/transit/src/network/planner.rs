//! Station-to-station routing over a partitioned network.

use tracing::debug;

use crate::config::NetworkConfig;
use crate::graph::{GraphArc, GraphNode};
use crate::identifiers::*;
use crate::models::traits::TransitItem;
use crate::models::types::{GraphError, NetworkNode, Result, RouteMode};
use crate::repository::PartitionedRepository;

/// Result of a station-to-station query
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlannedRoute {
    pub nodes: Vec<NodeId>,
    /// Stations passed, junctions left out
    pub stations: Vec<StationIdentifier>,
    /// `None` when the destination is unreachable
    pub cost: Option<f64>,
}

impl PlannedRoute {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Cost of travelling `arc` under the transit policy.
///
/// Moving between two nodes of one transfer group run by the same operator
/// is free. Arcs between two bus stops are scaled by `bus_cost_factor`.
pub fn transit_cost<T: TransitItem>(config: &NetworkConfig, arc: &GraphArc, a: &T, b: &T) -> f64 {
    let same_group = matches!((a.group(), b.group()), (Some(x), Some(y)) if x == y);
    if same_group && a.operator() == b.operator() {
        return 0.0;
    }
    if a.mode() == RouteMode::Bus && b.mode() == RouteMode::Bus {
        return arc.cost * config.bus_cost_factor;
    }
    arc.cost
}

pub struct RoutePlanner {
    repository: PartitionedRepository<NetworkNode>,
    config: NetworkConfig,
}

impl RoutePlanner {
    pub fn new(repository: PartitionedRepository<NetworkNode>, config: NetworkConfig) -> Self {
        Self { repository, config }
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn repository(&self) -> &PartitionedRepository<NetworkNode> {
        &self.repository
    }

    pub fn into_repository(self) -> PartitionedRepository<NetworkNode> {
        self.repository
    }

    async fn locate(&mut self, station: &StationIdentifier, operator: &OperatorIdentifier) -> Result<NodeId> {
        let id = NodeId::for_station(operator, station);
        match self.repository.get(id, &PartitionKey::from(operator)).await {
            Ok(_) => Ok(id),
            Err(GraphError::NodeNotFound(_)) => Err(GraphError::StationNotFound(station.clone())),
            Err(GraphError::PartitionNotFound(_)) => Err(GraphError::OperatorNotFound(operator.clone())),
            Err(err) => Err(err),
        }
    }

    /// Cheapest route between two stations, each named with its operator.
    ///
    /// An unknown station or operator is an error; an unreachable
    /// destination gives an empty route.
    pub async fn find_route(
        &mut self,
        from: (&StationIdentifier, &OperatorIdentifier),
        to: (&StationIdentifier, &OperatorIdentifier),
    ) -> Result<PlannedRoute> {
        let start = self.locate(from.0, from.1).await?;
        let end = self.locate(to.0, to.1).await?;

        let config = self.config.clone();
        let found = self
            .repository
            .find_shortest_path(start, end, |arc: &GraphArc, a: &GraphNode<NetworkNode>, b: &GraphNode<NetworkNode>| {
                transit_cost(&config, arc, &a.item, &b.item)
            })
            .await?;

        let stations = found
            .nodes
            .iter()
            .filter_map(|&id| self.repository.node(id))
            .filter_map(|node| node.item.station().cloned())
            .collect();

        debug!(from = %from.0, to = %to.0, hops = found.nodes.len(), cost = ?found.cost, "Planned route");
        Ok(PlannedRoute {
            nodes: found.nodes,
            stations,
            cost: found.cost,
        })
    }
}
