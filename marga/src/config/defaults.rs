//! Default value functions for serde deserialization.

use super::grid::AxisSettings;
use crate::path::PathStrategy;

/// Monochromator/analyser scattering angle range (degrees).
pub fn axis1() -> AxisSettings {
    AxisSettings {
        begin: -4.0,
        end: 184.0,
        step: 2.0,
    }
}

/// Sample scattering angle range (degrees).
pub fn axis2() -> AxisSettings {
    AxisSettings {
        begin: -188.0,
        end: 188.0,
        step: 2.0,
    }
}

pub fn strategy() -> PathStrategy {
    PathStrategy::PenaliseWalls
}

pub fn max_segment_length() -> f64 {
    1.0
}

pub fn inverted_region_weight() -> f64 {
    1.0
}

pub fn attach_candidates() -> usize {
    32
}
