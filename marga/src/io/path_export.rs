//! Path export for instrument control.
//!
//! Paths are written as `a4 a2` pairs in degrees, the column order used by
//! the instrument control scripts.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path as FsPath;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::instrument::FixedWavevector;
use crate::path::Path;

/// Output flavour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathFormat {
    /// Two-column text file
    #[default]
    Raw,
    /// Nomad `dr` commands
    Nomad,
}

/// Writes paths in one of the [`PathFormat`]s.
#[derive(Clone, Debug)]
pub struct PathExporter {
    format: PathFormat,
    precision: usize,
    fixed: Option<FixedWavevector>,
}

impl Default for PathExporter {
    fn default() -> Self {
        Self::new(PathFormat::Raw)
    }
}

impl PathExporter {
    pub fn new(format: PathFormat) -> Self {
        Self {
            format,
            precision: 6,
            fixed: None,
        }
    }

    /// Significant digits per angle.
    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision.max(1);
        self
    }

    /// Record the fixed wavevector in the output.
    pub fn with_fixed_wavevector(mut self, fixed: FixedWavevector) -> Self {
        self.fixed = Some(fixed);
        self
    }

    pub fn write<W: Write>(&self, path: &Path, out: &mut W) -> std::io::Result<()> {
        match self.format {
            PathFormat::Raw => self.write_raw(path, out),
            PathFormat::Nomad => self.write_nomad(path, out),
        }
    }

    pub fn save(&self, path: &Path, file: &FsPath) -> Result<()> {
        let mut out = BufWriter::new(File::create(file)?);
        self.write(path, &mut out)?;
        out.flush()?;
        Ok(())
    }

    fn write_raw<W: Write>(&self, path: &Path, out: &mut W) -> std::io::Result<()> {
        let width = self.precision * 2;
        if let Some(fixed) = self.fixed {
            let (k, is_kf) = kfix(fixed);
            writeln!(out, "#")?;
            writeln!(out, "# k_fix = {k}")?;
            writeln!(out, "# k_fix_is_kf = {is_kf}")?;
            writeln!(out, "#")?;
        }
        writeln!(
            out,
            "# {:>w1$} {:>w2$}",
            "a4 (deg)",
            "a2 (deg)",
            w1 = width.saturating_sub(2),
            w2 = width
        )?;
        for v in &path.vertices {
            let (a4, a2) = (v[1].to_degrees(), v[0].to_degrees());
            writeln!(
                out,
                "{:>width$} {:>width$}",
                self.number(a4),
                self.number(a2)
            )?;
        }
        Ok(())
    }

    fn write_nomad<W: Write>(&self, path: &Path, out: &mut W) -> std::io::Result<()> {
        let width = self.precision * 2;
        if let Some(fixed) = self.fixed {
            let (k, is_kf) = kfix(fixed);
            writeln!(out, "dr {} {k}", if is_kf { "kf" } else { "ki" })?;
            writeln!(out)?;
        }
        for v in &path.vertices {
            let (a4, a2) = (v[1].to_degrees(), v[0].to_degrees());
            writeln!(
                out,
                "dr a4 {:<width$} a2 {:<width$}",
                self.number(a4),
                self.number(a2)
            )?;
        }
        Ok(())
    }

    /// Angle rounded to `precision` significant digits, trailing zeros dropped.
    fn number(&self, value: f64) -> String {
        if value == 0.0 {
            return "0".to_string();
        }
        if !value.is_finite() {
            return value.to_string();
        }
        let magnitude = value.abs().log10().floor() as i32;
        let decimals = (self.precision as i32 - 1 - magnitude).max(0) as usize;
        let text = format!("{value:.decimals$}");
        if text.contains('.') {
            text.trim_end_matches('0').trim_end_matches('.').to_string()
        } else {
            text
        }
    }
}

fn kfix(fixed: FixedWavevector) -> (f64, bool) {
    match fixed {
        FixedWavevector::Ki(k) => (k, false),
        FixedWavevector::Kf(k) => (k, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathStatus;

    fn path() -> Path {
        Path::new(
            PathStatus::Found,
            vec![
                [40.0_f64.to_radians(), (-90.0_f64).to_radians()],
                [42.5_f64.to_radians(), 0.0],
            ],
        )
    }

    #[test]
    fn test_raw_columns_are_a4_a2() {
        let mut out = Vec::new();
        PathExporter::default().write(&path(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with('#'));
        assert!(lines[0].contains("a4 (deg)"));
        let cols: Vec<f64> = lines[1].split_whitespace().map(|c| c.parse().unwrap()).collect();
        assert_eq!(cols, vec![-90.0, 40.0]);
        let cols: Vec<f64> = lines[2].split_whitespace().map(|c| c.parse().unwrap()).collect();
        assert_eq!(cols, vec![0.0, 42.5]);
    }

    #[test]
    fn test_nomad_commands() {
        let mut out = Vec::new();
        PathExporter::new(PathFormat::Nomad)
            .with_fixed_wavevector(FixedWavevector::Kf(1.4))
            .write(&path(), &mut out)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "dr kf 1.4");
        assert_eq!(lines[1], "");
        let words: Vec<&str> = lines[2].split_whitespace().collect();
        assert_eq!(words, vec!["dr", "a4", "-90", "a2", "40"]);
    }
}
