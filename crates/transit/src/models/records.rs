//! Route records handed over by the import collaborator.

use std::sync::Arc;

use geo::Coord;

use crate::identifiers::*;
use crate::models::traits::RouteFeature;
use crate::models::types::RouteMode;
use crate::pathchain::Path;

/// A station or bus stop located somewhere along a route
#[derive(Clone, Debug, PartialEq)]
pub struct StationRecord {
    pub id: StationIdentifier,
    pub name: Arc<str>,
    pub position: Coord<f64>,
    pub group_id: Option<GroupIdentifier>,
}

impl StationRecord {
    pub fn new(id: impl Into<StationIdentifier>, name: &str, position: Coord<f64>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position,
            group_id: None,
        }
    }

    pub fn with_group(mut self, group: impl Into<GroupIdentifier>) -> Self {
        self.group_id = Some(group.into());
        self
    }
}

/// A rail line: its tracks and stations
#[derive(Clone, Debug)]
pub struct Railroad {
    pub id: RouteIdentifier,
    pub operator: OperatorIdentifier,
    pub name: Arc<str>,
    pub rails: Vec<Path>,
    pub stations: Vec<StationRecord>,
}

/// A bus route: its road geometry and stops
#[derive(Clone, Debug)]
pub struct BusRoute {
    pub id: RouteIdentifier,
    pub operator: OperatorIdentifier,
    pub name: Arc<str>,
    pub paths: Vec<Path>,
    pub stops: Vec<StationRecord>,
}

impl RouteFeature for Railroad {
    fn id(&self) -> &RouteIdentifier {
        &self.id
    }

    fn operator(&self) -> &OperatorIdentifier {
        &self.operator
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn mode(&self) -> RouteMode {
        RouteMode::Rail
    }

    fn paths(&self) -> &[Path] {
        &self.rails
    }

    fn stations(&self) -> &[StationRecord] {
        &self.stations
    }
}

impl RouteFeature for BusRoute {
    fn id(&self) -> &RouteIdentifier {
        &self.id
    }

    fn operator(&self) -> &OperatorIdentifier {
        &self.operator
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn mode(&self) -> RouteMode {
        RouteMode::Bus
    }

    fn paths(&self) -> &[Path] {
        &self.paths
    }

    fn stations(&self) -> &[StationRecord] {
        &self.stops
    }
}
