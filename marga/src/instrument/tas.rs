//! Triple-axis angle calculation.
//!
//! ```text
//!   E  = E_KI - E_KF = 2.072124 (ki^2 - kf^2)   meV, k in 1/A
//!   k  = pi / (d sin(theta))                     Bragg, d in A
//!   Q^2 = ki^2 + kf^2 - 2 ki kf cos(a4)
//! ```

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::{ForwardKinematics, ScatteringSenses, TasAngles};
use crate::error::{KinematicsError, Result};

/// `E = E_TO_K2 * k^2` for neutrons (meV, 1/A).
pub const E_TO_K2: f64 = 2.072124;

/// Which wavevector is kept constant during a scan.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixedWavevector {
    Ki(f64),
    Kf(f64),
}

/// Angle calculator for a triple-axis spectrometer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TasCalculator {
    /// Monochromator d-spacing (A)
    pub mono_d: f64,
    /// Analyser d-spacing (A)
    pub ana_d: f64,
    pub fixed: FixedWavevector,
    pub senses: ScatteringSenses,
}

impl Default for TasCalculator {
    /// PG(002) monochromator and analyser, kf = 1.4 1/A.
    fn default() -> Self {
        Self {
            mono_d: 3.355,
            ana_d: 3.355,
            fixed: FixedWavevector::Kf(1.4),
            senses: ScatteringSenses::default(),
        }
    }
}

impl TasCalculator {
    pub fn new(mono_d: f64, ana_d: f64, fixed: FixedWavevector) -> Self {
        Self {
            mono_d,
            ana_d,
            fixed,
            senses: ScatteringSenses::default(),
        }
    }

    pub fn with_fixed(mut self, fixed: FixedWavevector) -> Self {
        self.fixed = fixed;
        self
    }

    pub fn with_senses(mut self, senses: ScatteringSenses) -> Self {
        self.senses = senses;
        self
    }

    /// `(ki, kf)` for an energy transfer.
    pub fn wavevectors(&self, e: f64) -> std::result::Result<(f64, f64), KinematicsError> {
        let (ki2, kf2) = match self.fixed {
            FixedWavevector::Ki(ki) => (ki * ki, ki * ki - e / E_TO_K2),
            FixedWavevector::Kf(kf) => (kf * kf + e / E_TO_K2, kf * kf),
        };
        if !(ki2 > 0.0 && kf2 > 0.0) {
            return Err(KinematicsError::Energy { energy: e });
        }
        Ok((ki2.sqrt(), kf2.sqrt()))
    }

    /// Energy transfer in meV.
    pub fn energy(ki: f64, kf: f64) -> f64 {
        E_TO_K2 * (ki * ki - kf * kf)
    }
}

/// Bragg angle theta of a crystal with spacing `d` for wavevector `k`.
fn bragg_angle(
    crystal: &'static str,
    k: f64,
    d: f64,
) -> std::result::Result<f64, KinematicsError> {
    let s = PI / (d * k);
    if !(s.is_finite() && (-1.0..=1.0).contains(&s)) {
        return Err(KinematicsError::Bragg { crystal, k, d });
    }
    Ok(s.asin())
}

/// Unsigned sample scattering angle closing the triangle ki, kf, Q.
fn scattering_angle(ki: f64, kf: f64, q: f64) -> std::result::Result<f64, KinematicsError> {
    let c = (ki * ki + kf * kf - q * q) / (2.0 * ki * kf);
    if !(c.is_finite() && (-1.0..=1.0).contains(&c)) {
        return Err(KinematicsError::ScatteringTriangle { q });
    }
    Ok(c.acos())
}

impl ForwardKinematics for TasCalculator {
    fn angles(&self, q: f64, e: f64) -> Result<TasAngles> {
        let (ki, kf) = self.wavevectors(e)?;
        let mono = bragg_angle("monochromator", ki, self.mono_d)? * self.senses.monochromator.sign();
        let ana = bragg_angle("analyser", kf, self.ana_d)? * self.senses.analyser.sign();
        let a4 = scattering_angle(ki, kf, q)? * self.senses.sample.sign();
        Ok(TasAngles {
            a1: mono,
            a2: 2.0 * mono,
            a4,
            a5: ana,
            a6: 2.0 * ana,
        })
    }
}
