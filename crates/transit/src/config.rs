//! Tunables for graph assembly and route costs.

use serde::{Deserialize, Serialize};

use crate::models::types::Result;

/// Network-wide settings shared by assembly and the route planner
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Cost of a transfer arc between stations of different operators
    pub cross_operator_transfer_cost: f64,

    /// Multiplier applied to arcs between two bus stops
    pub bus_cost_factor: f64,

    /// Minimum cosine for a point to count as lying on a segment
    pub collinearity_threshold: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            cross_operator_transfer_cost: 300.0,
            bus_cost_factor: 1.0,
            collinearity_threshold: crate::geometry::COLLINEAR_COSINE,
        }
    }
}

impl NetworkConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = NetworkConfig::from_json_str(r#"{ "bus_cost_factor": 2.5 }"#).unwrap();
        assert_eq!(config.bus_cost_factor, 2.5);
        assert_eq!(config.cross_operator_transfer_cost, 300.0);
        assert_eq!(config.collinearity_threshold, 0.999);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        assert!(NetworkConfig::from_json_str("{ not json").is_err());
    }
}
