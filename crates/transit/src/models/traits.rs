//! Core traits for transit entities.
//!
//! These traits define what the graph pipeline needs from input records and
//! node payloads. Implementations can come from any import collaborator.

use crate::identifiers::*;
use crate::models::records::StationRecord;
use crate::models::types::{NetworkNode, RouteMode};
use crate::pathchain::Path;

// ============================================================================
// Input Traits
// ============================================================================

/// A digitized route: track or road geometry plus the stops along it
pub trait RouteFeature {
    fn id(&self) -> &RouteIdentifier;
    fn operator(&self) -> &OperatorIdentifier;
    fn name(&self) -> &str;
    fn mode(&self) -> RouteMode;

    /// Unordered polylines making up the route
    fn paths(&self) -> &[Path];

    /// Stations or stops served by the route
    fn stations(&self) -> &[StationRecord];
}

// ============================================================================
// Node Payload Traits
// ============================================================================

/// Node payload consulted by the transit cost policy
pub trait TransitItem {
    fn operator(&self) -> &OperatorIdentifier;
    fn mode(&self) -> RouteMode;

    /// Transfer group (stations considered the same place)
    fn group(&self) -> Option<&GroupIdentifier> {
        None
    }

    fn station(&self) -> Option<&StationIdentifier> {
        None
    }
}

impl TransitItem for NetworkNode {
    fn operator(&self) -> &OperatorIdentifier {
        &self.operator
    }

    fn mode(&self) -> RouteMode {
        self.mode
    }

    fn group(&self) -> Option<&GroupIdentifier> {
        self.group_id.as_ref()
    }

    fn station(&self) -> Option<&StationIdentifier> {
        self.station_id.as_ref()
    }
}
