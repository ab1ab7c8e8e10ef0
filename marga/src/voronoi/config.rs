//! Configuration for Voronoi construction.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Settings for the segment-site Voronoi builder.
///
/// All lengths are in cells.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoronoiConfig {
    /// Samples per cell along each axis used to locate the diagram.
    /// Two samples resolve corridors one cell wide.
    /// Default: 2
    pub subsamples: usize,

    /// Tolerance for distance comparisons (near ties count as equal).
    /// Default: 1e-6
    pub eps: f64,

    /// Drop edges that come closer to an obstacle than `safety_margin`.
    /// Default: false
    pub use_safety_margin: bool,

    /// Minimum edge clearance when `use_safety_margin` is set.
    /// Default: 0.5
    pub safety_margin: f64,

    /// Sampling step along parabolic edges.
    /// Default: 0.5
    pub parabola_step: f64,
}

impl Default for VoronoiConfig {
    fn default() -> Self {
        Self {
            subsamples: 2,
            eps: 1e-6,
            use_safety_margin: false,
            safety_margin: 0.5,
            parabola_step: 0.5,
        }
    }
}

impl VoronoiConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter for samples per cell.
    pub fn with_subsamples(mut self, subsamples: usize) -> Self {
        self.subsamples = subsamples;
        self
    }

    /// Builder-style setter for the comparison tolerance.
    pub fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    /// Enable the safety margin filter with the given clearance.
    pub fn with_safety_margin(mut self, margin: f64) -> Self {
        self.use_safety_margin = true;
        self.safety_margin = margin;
        self
    }

    /// Builder-style setter for the parabola sampling step.
    pub fn with_parabola_step(mut self, step: f64) -> Self {
        self.parabola_step = step;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(2..=8).contains(&self.subsamples) {
            return Err(ConfigError::invalid(
                "voronoi.subsamples",
                "between 2 and 8",
                self.subsamples,
            ));
        }
        if !(self.eps > 0.0 && self.eps < 0.01) {
            return Err(ConfigError::invalid("voronoi.eps", "in (0, 0.01)", self.eps));
        }
        if !(self.parabola_step > 0.0 && self.parabola_step.is_finite()) {
            return Err(ConfigError::invalid(
                "voronoi.parabola_step",
                "positive",
                self.parabola_step,
            ));
        }
        if self.use_safety_margin && !(self.safety_margin >= 0.0 && self.safety_margin.is_finite()) {
            return Err(ConfigError::invalid(
                "voronoi.safety_margin",
                "non-negative",
                self.safety_margin,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(VoronoiConfig::default().validate().is_ok());
    }

    #[test]
    fn test_single_subsample_rejected() {
        let err = VoronoiConfig::new().with_subsamples(1).validate().unwrap_err();
        assert!(err.to_string().contains("voronoi.subsamples"));
    }
}
