//! Path configuration section.

use serde::{Deserialize, Serialize};

use super::defaults;
use crate::path::{PathConfig, PathStrategy};

/// Path settings section (angles in degrees)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathSection {
    /// Edge weighting
    #[serde(default = "defaults::strategy")]
    pub strategy: PathStrategy,

    /// Longest path segment after subdivision (0 disables)
    #[serde(default = "defaults::max_segment_length")]
    pub max_segment_length: f64,

    /// Drop interior vertices closer than this (0 disables)
    #[serde(default)]
    pub min_vertex_distance: f64,

    /// Weight factor for edges inside inverted regions
    #[serde(default = "defaults::inverted_region_weight")]
    pub inverted_region_weight: f64,

    /// Nearest nodes tried when attaching start and target
    #[serde(default = "defaults::attach_candidates")]
    pub attach_candidates: usize,
}

impl Default for PathSection {
    fn default() -> Self {
        Self {
            strategy: defaults::strategy(),
            max_segment_length: defaults::max_segment_length(),
            min_vertex_distance: 0.0,
            inverted_region_weight: defaults::inverted_region_weight(),
            attach_candidates: defaults::attach_candidates(),
        }
    }
}

impl PathSection {
    /// Runtime settings with lengths converted to radians.
    pub fn to_path_config(&self) -> PathConfig {
        PathConfig::new()
            .with_strategy(self.strategy)
            .with_max_segment_length(self.max_segment_length.to_radians())
            .with_min_vertex_distance(self.min_vertex_distance.to_radians())
            .with_inverted_region_weight(self.inverted_region_weight)
            .with_attach_candidates(self.attach_candidates)
    }
}
