//! Path search configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Edge weighting used by the search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathStrategy {
    /// Angle-space length only
    Shortest,
    /// Length divided by the clearance to the nearest obstacle
    #[default]
    PenaliseWalls,
}

/// Path search settings. Lengths are in radians.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathConfig {
    /// Edge weighting.
    /// Default: PenaliseWalls
    pub strategy: PathStrategy,

    /// Longest path segment kept by subdivision (0 disables).
    /// Default: 1 degree
    pub max_segment_length: f64,

    /// Interior vertices closer than this to their predecessor are dropped (0 disables).
    /// Default: 0
    pub min_vertex_distance: f64,

    /// Weight factor for edges running inside inverted regions.
    /// Default: 1.0
    pub inverted_region_weight: f64,

    /// Nearest graph nodes tried when attaching start and target.
    /// Default: 32
    pub attach_candidates: usize,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            strategy: PathStrategy::PenaliseWalls,
            max_segment_length: 1.0_f64.to_radians(),
            min_vertex_distance: 0.0,
            inverted_region_weight: 1.0,
            attach_candidates: 32,
        }
    }
}

impl PathConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(mut self, strategy: PathStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_max_segment_length(mut self, length: f64) -> Self {
        self.max_segment_length = length;
        self
    }

    pub fn with_min_vertex_distance(mut self, distance: f64) -> Self {
        self.min_vertex_distance = distance;
        self
    }

    pub fn with_inverted_region_weight(mut self, weight: f64) -> Self {
        self.inverted_region_weight = weight;
        self
    }

    pub fn with_attach_candidates(mut self, candidates: usize) -> Self {
        self.attach_candidates = candidates;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max_segment_length >= 0.0 && self.max_segment_length.is_finite()) {
            return Err(ConfigError::invalid(
                "path.max_segment_length",
                "non-negative",
                self.max_segment_length,
            ));
        }
        if !(self.min_vertex_distance >= 0.0 && self.min_vertex_distance.is_finite()) {
            return Err(ConfigError::invalid(
                "path.min_vertex_distance",
                "non-negative",
                self.min_vertex_distance,
            ));
        }
        if !(self.inverted_region_weight > 0.0 && self.inverted_region_weight.is_finite()) {
            return Err(ConfigError::invalid(
                "path.inverted_region_weight",
                "positive",
                self.inverted_region_weight,
            ));
        }
        if self.attach_candidates == 0 {
            return Err(ConfigError::invalid(
                "path.attach_candidates",
                "at least 1",
                self.attach_candidates,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_names() {
        let s: PathStrategy = serde_yaml::from_str("penalise_walls").unwrap();
        assert_eq!(s, PathStrategy::PenaliseWalls);
        assert_eq!(serde_yaml::to_string(&PathStrategy::Shortest).unwrap().trim(), "shortest");
    }

    #[test]
    fn test_zero_weight_rejected() {
        let config = PathConfig::new().with_inverted_region_weight(0.0);
        assert!(config.validate().is_err());
        assert!(PathConfig::default().validate().is_ok());
    }
}
