//! Instrument description made of angle-space obstacle shapes.
//!
//! ```yaml
//! name: demo
//! timestamp: 1700000000
//! senses: { monochromator: ccw, sample: cw, analyser: ccw }
//! limits: { angle1: [-4.0, 184.0], angle2: [-188.0, 188.0] }
//! obstacles:
//!   - shape: rectangle
//!     min: [40.0, -20.0]
//!     max: [60.0, 20.0]
//!   - shape: circle
//!     centre: [90.0, 0.0]
//!     radius: 15.0
//!   - shape: band
//!     from: [40.0, -120.0]
//!     to: [140.0, 120.0]
//!     half_width: 2.5
//! ```
//!
//! Coordinates are `[angle1, angle2]` in degrees.

use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use super::{InstrumentSpace, ScatteringSenses};
use crate::core::{Point2D, point_segment_distance};
use crate::error::LoadError;
use crate::grid::{CollisionOracle, OracleError};

/// Forbidden area of the configuration space (degrees).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Obstacle {
    /// Axis-aligned box, bounds inclusive
    Rectangle { min: [f64; 2], max: [f64; 2] },
    /// Disc
    Circle { centre: [f64; 2], radius: f64 },
    /// Points within `half_width` of the segment `from`-`to`
    Band {
        from: [f64; 2],
        to: [f64; 2],
        half_width: f64,
    },
}

impl Obstacle {
    pub fn contains(&self, p: Point2D) -> bool {
        match *self {
            Obstacle::Rectangle { min, max } => {
                p.x >= min[0] && p.x <= max[0] && p.y >= min[1] && p.y <= max[1]
            }
            Obstacle::Circle { centre, radius } => p.distance(Point2D::from(centre)) <= radius,
            Obstacle::Band {
                from,
                to,
                half_width,
            } => point_segment_distance(p, Point2D::from(from), Point2D::from(to)) <= half_width,
        }
    }

    fn validate(&self) -> Result<(), String> {
        let finite = |v: &[f64]| v.iter().all(|x| x.is_finite());
        match *self {
            Obstacle::Rectangle { min, max } => {
                if !(finite(&min) && finite(&max)) || min[0] > max[0] || min[1] > max[1] {
                    return Err(format!("rectangle {min:?}..{max:?} is empty"));
                }
            }
            Obstacle::Circle { centre, radius } => {
                if !(finite(&centre) && radius > 0.0 && radius.is_finite()) {
                    return Err(format!("circle at {centre:?} needs a positive radius"));
                }
            }
            Obstacle::Band {
                from,
                to,
                half_width,
            } => {
                if !(finite(&from) && finite(&to) && half_width > 0.0 && half_width.is_finite()) {
                    return Err(format!("band {from:?}-{to:?} needs a positive half width"));
                }
            }
        }
        Ok(())
    }
}

/// Allowed angle interval per axis (degrees); everything outside collides.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AngleLimits {
    pub angle1: [f64; 2],
    pub angle2: [f64; 2],
}

impl AngleLimits {
    pub fn contains(&self, p: Point2D) -> bool {
        p.x >= self.angle1[0] && p.x <= self.angle1[1] && p.y >= self.angle2[0] && p.y <= self.angle2[1]
    }
}

/// Instrument space described by obstacle shapes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapeSpace {
    #[serde(default)]
    pub name: String,

    /// Seconds since the Unix epoch
    #[serde(default)]
    pub timestamp: u64,

    #[serde(default)]
    pub senses: ScatteringSenses,

    #[serde(default)]
    pub limits: Option<AngleLimits>,

    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
}

impl ShapeSpace {
    pub fn new(obstacles: Vec<Obstacle>) -> Self {
        Self {
            obstacles,
            ..Self::default()
        }
    }

    /// Parse and validate a YAML description; `origin` names it in errors.
    pub fn from_yaml(yaml: &str, origin: &str) -> Result<Self, LoadError> {
        let space: Self = serde_yaml::from_str(yaml).map_err(|e| LoadError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        space.validate()?;
        Ok(space)
    }

    /// Read a description from disk.
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let mut space = Self::default();
        space.load(path)?;
        Ok(space)
    }

    pub fn validate(&self) -> Result<(), LoadError> {
        for (idx, obstacle) in self.obstacles.iter().enumerate() {
            obstacle
                .validate()
                .map_err(|msg| LoadError::Invalid(format!("obstacle {idx}: {msg}")))?;
        }
        if let Some(limits) = self.limits {
            if !(limits.angle1[0] < limits.angle1[1] && limits.angle2[0] < limits.angle2[1]) {
                return Err(LoadError::Invalid(format!("empty angle limits {limits:?}")));
            }
        }
        Ok(())
    }

    /// Collision test in degrees.
    pub fn collides_deg(&self, angle1: f64, angle2: f64) -> bool {
        let p = Point2D::new(angle1, angle2);
        if self.limits.is_some_and(|l| !l.contains(p)) {
            return true;
        }
        self.obstacles.iter().any(|o| o.contains(p))
    }
}

impl InstrumentSpace for ShapeSpace {
    fn load(&mut self, path: &Path) -> Result<u64, LoadError> {
        let origin = path.display().to_string();
        let yaml = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: origin.clone(),
            source,
        })?;
        *self = Self::from_yaml(&yaml, &origin)?;
        debug!(
            "[ShapeSpace] loaded '{}' from {} with {} obstacles",
            self.name,
            origin,
            self.obstacles.len()
        );
        Ok(self.timestamp)
    }
}

impl CollisionOracle for ShapeSpace {
    fn is_colliding(&self, angle1: f64, angle2: f64) -> Result<bool, OracleError> {
        if !(angle1.is_finite() && angle2.is_finite()) {
            return Err(OracleError(format!(
                "non-finite configuration ({angle1}, {angle2})"
            )));
        }
        Ok(self.collides_deg(angle1.to_degrees(), angle2.to_degrees()))
    }
}
