//! Instrument collaborators.
//!
//! The planner itself only needs a [`CollisionOracle`](crate::grid::CollisionOracle)
//! and query angles. This module defines the loader and kinematics seams
//! around it and ships a shape-based instrument description used by the CLI
//! and the tests.

mod shapes;
mod tas;

pub use shapes::{AngleLimits, Obstacle, ShapeSpace};
pub use tas::{FixedWavevector, TasCalculator};

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LoadError, Result};

/// Loads an instrument description.
pub trait InstrumentSpace {
    /// Replace the current description with the one stored at `path`.
    ///
    /// Returns the timestamp recorded in the file (seconds since the Unix
    /// epoch, `0` when absent).
    fn load(&mut self, path: &Path) -> std::result::Result<u64, LoadError>;
}

/// Rotation sense of one scattering axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sense {
    /// Counter-clockwise, positive angles
    #[default]
    Ccw,
    /// Clockwise, negative angles
    Cw,
}

impl Sense {
    /// Sign applied to angles measured in this sense.
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Sense::Ccw => 1.0,
            Sense::Cw => -1.0,
        }
    }
}

/// Scattering senses of the three instrument axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatteringSenses {
    pub monochromator: Sense,
    pub sample: Sense,
    pub analyser: Sense,
}

impl Default for ScatteringSenses {
    /// The usual W configuration: ccw, cw, ccw.
    fn default() -> Self {
        Self {
            monochromator: Sense::Ccw,
            sample: Sense::Cw,
            analyser: Sense::Ccw,
        }
    }
}

/// Instrument angles in radians, scattering senses applied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TasAngles {
    /// Monochromator crystal angle
    pub a1: f64,
    /// Monochromator scattering angle
    pub a2: f64,
    /// Sample scattering angle
    pub a4: f64,
    /// Analyser crystal angle
    pub a5: f64,
    /// Analyser scattering angle
    pub a6: f64,
}

impl TasAngles {
    /// Configuration-space point `[a2, a4]`.
    pub fn monochromator_point(&self) -> [f64; 2] {
        [self.a2, self.a4]
    }

    /// Configuration-space point `[a6, a4]`.
    pub fn analyser_point(&self) -> [f64; 2] {
        [self.a6, self.a4]
    }
}

/// Computes instrument angles for a scattering condition.
pub trait ForwardKinematics {
    /// Angles for momentum transfer `q` (1/A) and energy transfer `e` (meV).
    fn angles(&self, q: f64, e: f64) -> Result<TasAngles>;
}
