//! Configuration for region simplification.

use serde::{Deserialize, Serialize};

/// Contour to segment-region conversion settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// Extra simplification tolerance in cells on top of collinear merging.
    /// Vertices closer than this to the chord of their neighbours are dropped.
    /// Default: 0.0 (exact cell boundaries)
    pub simplify_tolerance: f64,
}

impl RegionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter for the simplification tolerance.
    pub fn with_simplify_tolerance(mut self, tolerance: f64) -> Self {
        self.simplify_tolerance = tolerance;
        self
    }
}
