//! Error types for Marga.
//!
//! Every pipeline stage returns an explicit [`Result`]. A failed stage aborts
//! the remaining stages; nothing is retried internally. An unreachable target
//! is not an error: it is reported through [`crate::path::Path::ok`].

use std::fmt;

use thiserror::Error;

/// Pipeline stage that produced a [`PlannerError::Geometry`] failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Boundary tracing on the occupancy grid
    Contour,
    /// Contour to segment region conversion
    Region,
    /// Segment-site Voronoi construction
    Voronoi,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Contour => write!(f, "contour extraction"),
            Stage::Region => write!(f, "region simplification"),
            Stage::Voronoi => write!(f, "voronoi construction"),
        }
    }
}

/// Marga error type
#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Configuration space error: {0}")]
    ConfigSpace(#[from] ConfigSpaceError),

    #[error("Geometry error during {stage}: {message}")]
    Geometry { stage: Stage, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Kinematics error: {0}")]
    Kinematics(#[from] KinematicsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlannerError {
    /// Shorthand for a geometry failure in `stage`.
    pub fn geometry(stage: Stage, message: impl Into<String>) -> Self {
        PlannerError::Geometry {
            stage,
            message: message.into(),
        }
    }
}

/// Failure to load an instrument description.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid instrument description: {0}")]
    Invalid(String),
}

/// Failure while building the configuration-space grid.
#[derive(Error, Debug)]
pub enum ConfigSpaceError {
    #[error("degenerate angle range on axis {axis}: {reason}")]
    DegenerateRange { axis: usize, reason: String },

    #[error("collision oracle failed at cell ({i}, {j}) = ({angle1}, {angle2}) rad: {message}")]
    OracleFailed {
        i: usize,
        j: usize,
        angle1: f64,
        angle2: f64,
        message: String,
    },

    #[error("cannot start worker pool: {0}")]
    ThreadPool(String),
}

/// Angles that cannot be reached for a requested scattering condition.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KinematicsError {
    #[error("{crystal} Bragg condition cannot be met for k = {k} 1/A (d = {d} A)")]
    Bragg {
        crystal: &'static str,
        k: f64,
        d: f64,
    },

    #[error("energy transfer {energy} meV needs a negative kinetic energy")]
    Energy { energy: f64 },

    #[error("scattering triangle cannot be closed for |Q| = {q} 1/A")]
    ScatteringTriangle { q: f64 },
}

/// Invalid configuration value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(String),

    #[error("cannot parse config: {0}")]
    Parse(String),

    #[error("{field} must be {requirement}, got {value}")]
    InvalidValue {
        field: &'static str,
        requirement: &'static str,
        value: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(
        field: &'static str,
        requirement: &'static str,
        value: impl ToString,
    ) -> Self {
        ConfigError::InvalidValue {
            field,
            requirement,
            value: value.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PlannerError>;
