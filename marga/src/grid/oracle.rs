//! Collision oracle consumed by the grid sweep.

use thiserror::Error;

/// Failure of a single collision evaluation.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct OracleError(pub String);

/// Black-box collision predicate over one angular configuration.
///
/// Implementations must be deterministic for a given angle pair and safe to
/// call from several worker threads at once; the sweep evaluates cells in an
/// unspecified order.
pub trait CollisionOracle: Sync {
    /// Whether any pair of instrument components overlaps at `(angle1, angle2)`
    /// (radians).
    fn is_colliding(&self, angle1: f64, angle2: f64) -> Result<bool, OracleError>;
}

impl<F> CollisionOracle for F
where
    F: Fn(f64, f64) -> bool + Sync,
{
    fn is_colliding(&self, angle1: f64, angle2: f64) -> Result<bool, OracleError> {
        Ok(self(angle1, angle2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_oracle() {
        let oracle = |a1: f64, a2: f64| a1 + a2 > 1.0;
        assert_eq!(oracle.is_colliding(0.2, 0.3), Ok(false));
        assert_eq!(oracle.is_colliding(0.8, 0.3), Ok(true));
    }
}
