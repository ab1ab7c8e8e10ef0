//! Region polygons as YAML.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};
use crate::region::RegionSet;

/// One region polygon.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionRecord {
    pub inverted: bool,
    pub touches_border: bool,
    /// Polygon corners as `[angle1, angle2]` in degrees
    pub vertices: Vec<[f64; 2]>,
}

/// All regions of a configuration space.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionDocument {
    pub region_count: usize,
    pub regions: Vec<RegionRecord>,
}

impl RegionDocument {
    pub fn from_regions(regions: &RegionSet) -> Self {
        let records: Vec<RegionRecord> = regions
            .regions
            .iter()
            .map(|region| RegionRecord {
                inverted: region.inverted(),
                touches_border: region.touches_border(),
                vertices: region
                    .vertices()
                    .iter()
                    .map(|&p| {
                        let [a1, a2] = regions.mapping.to_angles(p);
                        [a1.to_degrees(), a2.to_degrees()]
                    })
                    .collect(),
            })
            .collect();
        Self {
            region_count: records.len(),
            regions: records,
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| PlannerError::Io(std::io::Error::other(e)))
    }
}

/// Save region polygons to a YAML file.
pub fn save_regions(regions: &RegionSet, path: &Path) -> Result<()> {
    std::fs::write(path, RegionDocument::from_regions(regions).to_yaml()?)?;
    Ok(())
}
