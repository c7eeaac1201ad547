// SPDX-License-Identifier: MIT OR Apache-2.0
//! Configuration for the allocation core

use crate::builder::BundleMode;
use crate::error::Error;
use crate::scorer::Metric;
use serde::{Deserialize, Serialize};

/// Allocation algorithm selection
///
/// The algorithm is fixed at construction; hosts pick a variant here and the
/// outer API stays the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Algorithm {
    /// Consensus-based bundle auction
    #[default]
    Cbba,
}

/// Tunables for one agent's core instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum number of tasks an agent may claim at once
    pub bundle_capacity: usize,
    /// Spatial candidate radius around the agent, meters
    pub query_radius: f64,
    /// Path scoring metric
    pub metric: Metric,
    /// Discount factor for the time-discounted metric, in (0, 1)
    pub lambda: f64,
    /// How much of the bundle a single tick may fill
    pub bundle_mode: BundleMode,
    /// Which algorithm drives the engine
    pub algorithm: Algorithm,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bundle_capacity: 10,
            query_radius: 100.0,
            metric: Metric::Rpt,
            lambda: 0.95,
            bundle_mode: BundleMode::Add,
            algorithm: Algorithm::Cbba,
        }
    }
}

impl Config {
    pub fn with_bundle_capacity(mut self, capacity: usize) -> Self {
        self.bundle_capacity = capacity;
        self
    }

    pub fn with_query_radius(mut self, radius: f64) -> Self {
        self.query_radius = radius;
        self
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.lambda = lambda;
        self
    }

    pub fn with_bundle_mode(mut self, mode: BundleMode) -> Self {
        self.bundle_mode = mode;
        self
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Parse a configuration from JSON; absent fields keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|e| Error::ConfigError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = Config::default();
        assert_eq!(c.bundle_capacity, 10);
        assert_eq!(c.query_radius, 100.0);
        assert_eq!(c.metric, Metric::Rpt);
        assert_eq!(c.lambda, 0.95);
        assert_eq!(c.bundle_mode, BundleMode::Add);
        assert_eq!(c.algorithm, Algorithm::Cbba);
    }

    #[test]
    fn builder_chain() {
        let c = Config::default()
            .with_bundle_capacity(4)
            .with_query_radius(50.0)
            .with_metric(Metric::Tdr)
            .with_lambda(0.9)
            .with_bundle_mode(BundleMode::FullBundle);
        assert_eq!(c.bundle_capacity, 4);
        assert_eq!(c.query_radius, 50.0);
        assert_eq!(c.metric, Metric::Tdr);
        assert_eq!(c.lambda, 0.9);
        assert_eq!(c.bundle_mode, BundleMode::FullBundle);
    }

    #[test]
    fn json_partial_overrides() {
        let c = Config::from_json_str(r#"{"bundle_capacity": 3, "metric": "Tdr"}"#).unwrap();
        assert_eq!(c.bundle_capacity, 3);
        assert_eq!(c.metric, Metric::Tdr);
        assert_eq!(c.query_radius, 100.0);
    }

    #[test]
    fn json_garbage_is_an_error() {
        assert!(matches!(
            Config::from_json_str("not json"),
            Err(Error::ConfigError(_))
        ));
    }
}
