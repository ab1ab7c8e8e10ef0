//! Main PlannerConfig and conversion methods.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::grid::GridSection;
use super::path::PathSection;
use crate::error::ConfigError;
use crate::grid::SweepConfig;
use crate::path::PathConfig;
use crate::region::RegionConfig;
use crate::voronoi::VoronoiConfig;

/// Full planner configuration loaded from YAML
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Grid extent and sweep settings
    #[serde(default)]
    pub grid: GridSection,

    /// Region simplification settings
    #[serde(default)]
    pub region: RegionConfig,

    /// Voronoi construction settings
    #[serde(default)]
    pub voronoi: VoronoiConfig,

    /// Path search settings
    #[serde(default)]
    pub path: PathSection,
}

impl PlannerConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_yaml(&contents)
    }

    /// Parse from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Check every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.grid.validate()?;
        if !(self.region.simplify_tolerance >= 0.0 && self.region.simplify_tolerance.is_finite()) {
            return Err(ConfigError::invalid(
                "region.simplify_tolerance",
                "non-negative",
                self.region.simplify_tolerance,
            ));
        }
        self.voronoi.validate()?;
        self.path_config().validate()
    }

    pub fn sweep_config(&self) -> SweepConfig {
        self.grid.to_sweep_config()
    }

    pub fn region_config(&self) -> RegionConfig {
        self.region.clone()
    }

    pub fn voronoi_config(&self) -> VoronoiConfig {
        self.voronoi.clone()
    }

    /// Path settings in radians
    pub fn path_config(&self) -> PathConfig {
        self.path.to_path_config()
    }
}
