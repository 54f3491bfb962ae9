//! Building a transit graph from route records.

use std::collections::{BTreeMap, HashSet};

use itertools::Itertools;
use tracing::{debug, info};

use crate::config::NetworkConfig;
use crate::graph::{build_duplicate_nodes_merger, build_graph_builder, build_node_merger, Graph, GraphNode, JunctionSite};
use crate::identifiers::*;
use crate::models::records::StationRecord;
use crate::models::traits::RouteFeature;
use crate::models::types::{GraphError, NetworkNode, NodeKind, Result};
use crate::pathchain::{build_pathchain_with, PathEnd};
use crate::pathchain::locate::{PathChainLocator, PointOnPathchain};
use crate::repository::{partition, PartitionedRepository};

/// Graph of a single route, with one node per located station.
///
/// Stations that lie on none of the route's paths are skipped.
pub fn build_route_graph<R>(feature: &R, config: &NetworkConfig) -> Result<Graph<NetworkNode>>
where
    R: RouteFeature + ?Sized,
{
    let route = feature.id();
    if feature.paths().is_empty() {
        return Err(GraphError::InvalidPath(format!("route {route} has no paths")));
    }

    let groups = build_pathchain_with(feature.paths().to_vec(), config.collinearity_threshold);
    let locator = PathChainLocator::with_threshold(&groups, config.collinearity_threshold);

    let mut seen = HashSet::new();
    let mut points: Vec<(&StationRecord, PointOnPathchain)> = Vec::new();
    for station in feature.stations() {
        if !seen.insert(&station.id) {
            debug!(route = %route, station = %station.id, "Duplicate station on route");
            continue;
        }
        match locator.locate(station.position) {
            Some(at) => points.push((station, at)),
            None => debug!(route = %route, station = %station.id, "Station is off every path; skipping"),
        }
    }

    let mut builder = build_graph_builder(
        |station: &&StationRecord, _: &PointOnPathchain| {
            let node = NetworkNode {
                kind: NodeKind::Station,
                station_id: Some(station.id.clone()),
                name: station.name.clone(),
                operator: feature.operator().clone(),
                routes: vec![route.clone()],
                mode: feature.mode(),
                group_id: station.group_id.clone(),
                position: [station.position.x, station.position.y],
            };
            (NodeId::for_route_station(route, &station.id), node)
        },
        |site: &JunctionSite<'_, ()>| {
            let end = match site.end {
                PathEnd::Start => "start",
                PathEnd::End => "end",
            };
            let node = NetworkNode {
                kind: NodeKind::Junction,
                station_id: None,
                name: format!("{} junction", feature.name()).into(),
                operator: feature.operator().clone(),
                routes: vec![route.clone()],
                mode: feature.mode(),
                group_id: None,
                position: [site.position.x, site.position.y],
            };
            (NodeId::from_key(format!("route:{route}/junction:{}/{end}", site.chain)), node)
        },
        |_: &&StationRecord| (),
    );

    let mut graph = Graph::new();
    for group in &groups {
        for (_, part) in builder.build(group, &points, None)? {
            for node in part.into_nodes() {
                if graph.insert(node).is_some() {
                    return Err(GraphError::InvalidData(format!("route {route} produced a node twice")));
                }
            }
        }
    }

    debug!(
        route = %route,
        chains = groups.iter().map(|g| g.len()).sum::<usize>(),
        located = points.len(),
        nodes = graph.len(),
        "Built route graph"
    );
    Ok(graph)
}

/// Combined node for every appearance of one station within one operator
fn merge_station(nodes: &[&GraphNode<NetworkNode>]) -> Result<(NodeId, NetworkNode)> {
    let first = nodes
        .first()
        .ok_or_else(|| GraphError::InvalidData("no station to merge".to_string()))?;
    let mut item = first.item.clone();
    item.routes = nodes
        .iter()
        .flat_map(|n| n.item.routes.iter().cloned())
        .sorted()
        .dedup()
        .collect();
    if item.group_id.is_none() {
        item.group_id = nodes.iter().find_map(|n| n.item.group_id.clone());
    }

    let id = match &item.station_id {
        Some(station) => NodeId::for_station(&item.operator, station),
        None => first.id,
    };
    Ok((id, item))
}

/// Assemble every route into one network.
///
/// A station served by several routes of one operator becomes a single node
/// with id [`NodeId::for_station`]. Stations sharing a transfer group are
/// then joined by transfer arcs: free within one operator, and
/// `cross_operator_transfer_cost` between operators.
pub fn assemble_network(features: &[&dyn RouteFeature], config: &NetworkConfig) -> Result<Graph<NetworkNode>> {
    let ordered: Vec<&dyn RouteFeature> = features
        .iter()
        .copied()
        .sorted_by(|a, b| a.id().cmp(b.id()))
        .collect();
    if let Some((dup, _)) = ordered.iter().tuple_windows().find(|(a, b)| a.id() == b.id()) {
        return Err(GraphError::InvalidData(format!("route {} given twice", dup.id())));
    }

    let mut network: Graph<NetworkNode> = Graph::new();
    for feature in &ordered {
        for node in build_route_graph(*feature, config)?.into_nodes() {
            if network.insert(node).is_some() {
                return Err(GraphError::InvalidData(format!(
                    "route {} collides with another route",
                    feature.id()
                )));
            }
        }
    }

    let stations: Vec<NodeId> = network
        .ids()
        .into_iter()
        .filter(|&id| network.node(id).is_some_and(|n| !n.item.is_junction()))
        .collect();

    let mut merge_duplicates = build_duplicate_nodes_merger(
        |node: &GraphNode<NetworkNode>| (node.item.operator.clone(), node.item.station_id.clone()),
        merge_station,
    );
    let merged = merge_duplicates(&mut network, &stations)?;

    // Stations served by a single route still carry their per-route id
    let mut rename = build_node_merger(merge_station);
    let mut station_nodes = Vec::with_capacity(merged.len());
    for id in merged {
        let target = network
            .node(id)
            .and_then(|n| n.item.station_id.as_ref().map(|s| NodeId::for_station(&n.item.operator, s)));
        match target {
            Some(target) if target != id => station_nodes.push(rename(&mut network, &[id])?),
            _ => station_nodes.push(id),
        }
    }

    let transfers = connect_transfer_groups(&mut network, &station_nodes, config)?;

    info!(
        routes = ordered.len(),
        nodes = network.len(),
        stations = station_nodes.len(),
        transfers,
        "Assembled network"
    );
    Ok(network)
}

fn connect_transfer_groups(
    network: &mut Graph<NetworkNode>,
    stations: &[NodeId],
    config: &NetworkConfig,
) -> Result<usize> {
    let mut groups: BTreeMap<GroupIdentifier, Vec<NodeId>> = BTreeMap::new();
    for &id in stations.iter().sorted() {
        if let Some(group) = network.node(id).and_then(|n| n.item.group_id.clone()) {
            groups.entry(group).or_default().push(id);
        }
    }

    let mut transfers = 0;
    for members in groups.values() {
        for (&a, &b) in members.iter().tuple_combinations() {
            let (Some(x), Some(y)) = (network.node(a), network.node(b)) else {
                continue;
            };
            let cost = if x.item.operator == y.item.operator {
                0.0
            } else {
                config.cross_operator_transfer_cost
            };
            network.connect(a, b, cost)?;
            transfers += 1;
        }
    }
    Ok(transfers)
}

/// Register an assembled network with one partition per operator.
///
/// Returns the number of arcs crossing between operators.
pub fn partition_by_operator(repository: &mut PartitionedRepository<NetworkNode>, network: Graph<NetworkNode>) -> usize {
    partition(repository, network, |node| PartitionKey::from(&node.item.operator))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::graph::{arc_cost, search};
    use crate::models::records::{BusRoute, Railroad};
    use crate::pathchain::Path;
    use approx::assert_relative_eq;
    use geo::Coord;

    fn c(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    pub(crate) fn metro_line() -> Railroad {
        Railroad {
            id: RouteIdentifier::new("red"),
            operator: OperatorIdentifier::new("metro"),
            name: "Red Line".into(),
            rails: vec![
                Path::from_xy(&[[0.0, 0.0], [10.0, 0.0]]).unwrap(),
                Path::from_xy(&[[10.0, 0.0], [20.0, 0.0]]).unwrap(),
            ],
            stations: vec![
                StationRecord::new("a", "A", c(0.0, 0.0)),
                StationRecord::new("b", "B", c(10.0, 0.0)).with_group("hub"),
                StationRecord::new("c", "C", c(20.0, 0.0)),
            ],
        }
    }

    pub(crate) fn city_bus() -> BusRoute {
        BusRoute {
            id: RouteIdentifier::new("b1"),
            operator: OperatorIdentifier::new("city"),
            name: "Bus 1".into(),
            paths: vec![Path::from_xy(&[[10.0, 0.0], [10.0, 10.0]]).unwrap()],
            stops: vec![
                StationRecord::new("hub_stop", "Hub", c(10.0, 0.0)).with_group("hub"),
                StationRecord::new("d", "D", c(10.0, 10.0)),
            ],
        }
    }

    pub(crate) fn station(operator: &str, station: &str) -> NodeId {
        NodeId::for_station(&OperatorIdentifier::new(operator), &StationIdentifier::new(station))
    }

    fn route_station(route: &str, station: &str) -> NodeId {
        NodeId::for_route_station(&RouteIdentifier::new(route), &StationIdentifier::new(station))
    }

    fn cost(graph: &Graph<NetworkNode>, a: NodeId, b: NodeId) -> f64 {
        graph.node(a).unwrap().arcs_to(b).next().unwrap().cost
    }

    #[test]
    fn test_route_graph() {
        let mut line = metro_line();
        line.stations.push(StationRecord::new("far", "Far away", c(5.0, 40.0)));

        let graph = build_route_graph(&line, &NetworkConfig::default()).unwrap();
        assert_eq!(graph.len(), 3);
        assert_relative_eq!(cost(&graph, route_station("red", "a"), route_station("red", "b")), 10.0);
        assert_relative_eq!(cost(&graph, route_station("red", "b"), route_station("red", "c")), 10.0);
        assert!(!graph.contains(route_station("red", "far")));
    }

    #[test]
    fn test_route_graph_over_joined_loops() {
        let line = Railroad {
            id: RouteIdentifier::new("loop"),
            operator: OperatorIdentifier::new("metro"),
            name: "Loop Line".into(),
            rails: [
                [[0.0, 0.0], [10.0, 0.0]],
                [[10.0, 0.0], [12.0, 2.0]],
                [[12.0, 2.0], [12.0, -2.0]],
                [[12.0, -2.0], [10.0, 0.0]],
                [[0.0, 0.0], [-2.0, 2.0]],
                [[-2.0, 2.0], [-2.0, -2.0]],
                [[-2.0, -2.0], [0.0, 0.0]],
            ]
            .iter()
            .map(|p| Path::from_xy(p).unwrap())
            .collect(),
            stations: vec![
                StationRecord::new("p", "P", c(5.0, 0.0)),
                StationRecord::new("q", "Q", c(12.0, 0.0)),
                StationRecord::new("r", "R", c(-2.0, 0.0)),
            ],
        };

        let graph = build_route_graph(&line, &NetworkConfig::default()).unwrap();
        assert_eq!(graph.nodes().filter(|n| !n.item.is_junction()).count(), 3);

        let found = search(&graph, route_station("loop", "p"), route_station("loop", "q"), arc_cost);
        assert_relative_eq!(found.cost.unwrap(), 7.0 + 2.0 * 2f64.sqrt());
    }

    #[test]
    fn test_collinearity_threshold_applies_to_junctions() {
        let mut line = metro_line();
        line.rails = vec![
            Path::from_xy(&[[0.0, 0.0], [10.0, 0.0]]).unwrap(),
            Path::from_xy(&[[5.0, 1.0], [5.0, 5.0]]).unwrap(),
        ];
        line.stations = vec![
            StationRecord::new("a", "A", c(0.0, 0.0)),
            StationRecord::new("s", "S", c(5.0, 5.0)),
        ];
        let (a, s) = (route_station("red", "a"), route_station("red", "s"));

        let strict = build_route_graph(&line, &NetworkConfig::default()).unwrap();
        assert!(search(&strict, a, s, arc_cost).cost.is_none());

        let config = NetworkConfig {
            collinearity_threshold: 0.95,
            ..NetworkConfig::default()
        };
        let loose = build_route_graph(&line, &config).unwrap();
        assert_relative_eq!(search(&loose, a, s, arc_cost).cost.unwrap(), 9.0);
    }

    #[test]
    fn test_merge_station_rejects_empty_set() {
        assert!(matches!(merge_station(&[]), Err(GraphError::InvalidData(_))));
    }

    #[test]
    fn test_route_without_paths_fails() {
        let mut line = metro_line();
        line.rails.clear();
        assert!(build_route_graph(&line, &NetworkConfig::default()).is_err());
    }

    #[test]
    fn test_same_station_merges_within_operator() {
        let red = metro_line();
        let mut blue = metro_line();
        blue.id = RouteIdentifier::new("blue");
        blue.rails = vec![Path::from_xy(&[[10.0, 0.0], [10.0, -10.0]]).unwrap()];
        blue.stations = vec![
            StationRecord::new("b", "B", c(10.0, 0.0)).with_group("hub"),
            StationRecord::new("e", "E", c(10.0, -10.0)),
        ];

        let network = assemble_network(&[&red, &blue], &NetworkConfig::default()).unwrap();
        assert_eq!(network.len(), 4);

        let b = network.node(station("metro", "b")).unwrap();
        assert_eq!(b.item.routes, vec![RouteIdentifier::new("blue"), RouteIdentifier::new("red")]);
        assert_eq!(b.degree(), 3);
        assert!(network.contains(station("metro", "e")));
        assert!(!network.contains(route_station("red", "a")));
    }

    #[test]
    fn test_transfer_arcs_follow_groups() {
        let config = NetworkConfig::default();
        let network = assemble_network(&[&city_bus(), &metro_line()], &config).unwrap();
        assert_eq!(network.len(), 5);

        let transfer = cost(&network, station("metro", "b"), station("city", "hub_stop"));
        assert_relative_eq!(transfer, config.cross_operator_transfer_cost);
        assert_relative_eq!(cost(&network, station("city", "hub_stop"), station("city", "d")), 10.0);
    }

    #[test]
    fn test_duplicate_routes_fail() {
        let red = metro_line();
        let again = metro_line();
        assert!(assemble_network(&[&red, &again], &NetworkConfig::default()).is_err());
    }

    #[test]
    fn test_partition_by_operator() {
        let network = assemble_network(&[&city_bus(), &metro_line()], &NetworkConfig::default()).unwrap();
        let mut repository = PartitionedRepository::with_store(crate::repository::MemoryPartitionStore::new());

        assert_eq!(partition_by_operator(&mut repository, network), 1);
        assert_eq!(
            repository.partition_keys(),
            vec![PartitionKey::new("city"), PartitionKey::new("metro")]
        );
    }
}
