//! Grid configuration section.

use serde::{Deserialize, Serialize};

use super::defaults;
use crate::core::AngleRange;
use crate::error::ConfigError;
use crate::grid::SweepConfig;

/// One axis in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisSettings {
    pub begin: f64,
    pub end: f64,
    pub step: f64,
}

impl AxisSettings {
    /// Range in radians.
    pub fn to_range(&self) -> AngleRange {
        AngleRange::from_degrees(self.begin, self.end, self.step)
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        if !(self.step > 0.0 && self.step.is_finite()) {
            return Err(ConfigError::invalid(field, "a positive step", self.step));
        }
        if !(self.begin.is_finite() && self.end.is_finite() && self.end > self.begin) {
            return Err(ConfigError::invalid(
                field,
                "a finite range with end > begin",
                format!("[{}, {}]", self.begin, self.end),
            ));
        }
        Ok(())
    }
}

/// Grid settings section
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSection {
    /// Axis 1 (a2 or a6), degrees
    #[serde(default = "defaults::axis1")]
    pub axis1: AxisSettings,

    /// Axis 2 (a4), degrees
    #[serde(default = "defaults::axis2")]
    pub axis2: AxisSettings,

    /// Sweep worker threads (0 = hardware concurrency)
    #[serde(default)]
    pub max_threads: usize,
}

impl Default for GridSection {
    fn default() -> Self {
        Self {
            axis1: defaults::axis1(),
            axis2: defaults::axis2(),
            max_threads: 0,
        }
    }
}

impl GridSection {
    /// Both axes in radians.
    pub fn to_ranges(&self) -> (AngleRange, AngleRange) {
        (self.axis1.to_range(), self.axis2.to_range())
    }

    pub fn to_sweep_config(&self) -> SweepConfig {
        SweepConfig::new().with_max_threads(self.max_threads)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.axis1.validate("grid.axis1")?;
        self.axis2.validate("grid.axis2")
    }
}
