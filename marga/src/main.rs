//! Marga command line planner.
//!
//! Usage:
//!   marga --instrument space.yaml --start 80,-60 --target 80,60 --path path.dat
//!   marga --instrument space.yaml --q-start 1.2 --e-start 0 --q-target 2.0 --e-target 3 --svg plan.svg
//!
//! Angles are `a2,a4` in degrees.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{error, info, warn};

use marga::PlannerConfig;
use marga::grid::LogProgress;
use marga::instrument::{FixedWavevector, ForwardKinematics, ShapeSpace, TasCalculator};
use marga::io::{
    PathExporter, PathFormat, SvgConfig, SvgVisualizer, save_lines_tool, save_regions,
};
use marga::{Planner, Result};

/// Collision-free paths through the a2/a4 configuration space
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Planner configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Instrument description (obstacle shapes)
    #[arg(short, long)]
    instrument: PathBuf,

    /// Start configuration `a2,a4` in degrees
    #[arg(long, value_parser = parse_pair, allow_hyphen_values = true)]
    start: Option<[f64; 2]>,

    /// Target configuration `a2,a4` in degrees
    #[arg(long, value_parser = parse_pair, allow_hyphen_values = true)]
    target: Option<[f64; 2]>,

    /// Start momentum transfer |Q| (1/A)
    #[arg(long, requires = "e_start", conflicts_with = "start")]
    q_start: Option<f64>,

    /// Start energy transfer (meV)
    #[arg(long, allow_hyphen_values = true)]
    e_start: Option<f64>,

    /// Target momentum transfer |Q| (1/A)
    #[arg(long, requires = "e_target", conflicts_with = "target")]
    q_target: Option<f64>,

    /// Target energy transfer (meV)
    #[arg(long, allow_hyphen_values = true)]
    e_target: Option<f64>,

    /// Fixed final wavevector kf (1/A) for --q-* queries
    #[arg(long, default_value_t = 1.4)]
    kf: f64,

    /// Override the sweep thread count
    #[arg(long)]
    threads: Option<usize>,

    /// Write region segments for the lines tool
    #[arg(long)]
    lines: Option<PathBuf>,

    /// Write region polygons as YAML
    #[arg(long)]
    regions: Option<PathBuf>,

    /// Write the path as `a4 a2` columns
    #[arg(long)]
    path: Option<PathBuf>,

    /// Write the path as Nomad commands
    #[arg(long)]
    nomad: Option<PathBuf>,

    /// Write an SVG rendering
    #[arg(long)]
    svg: Option<PathBuf>,
}

fn parse_pair(s: &str) -> std::result::Result<[f64; 2], String> {
    let mut parts = s.split(',').map(|p| p.trim().parse::<f64>());
    match (parts.next(), parts.next(), parts.next()) {
        (Some(Ok(a)), Some(Ok(b)), None) => Ok([a, b]),
        _ => Err(format!("expected `a2,a4` in degrees, got '{s}'")),
    }
}

fn to_radians(p: [f64; 2]) -> [f64; 2] {
    [p[0].to_radians(), p[1].to_radians()]
}

/// Query point from explicit angles or from |Q| and E.
fn query_point(
    angles: Option<[f64; 2]>,
    q: Option<f64>,
    e: Option<f64>,
    tas: &TasCalculator,
) -> Result<Option<[f64; 2]>> {
    if let Some(a) = angles {
        return Ok(Some(to_radians(a)));
    }
    match (q, e) {
        (Some(q), Some(e)) => Ok(Some(tas.angles(q, e)?.monochromator_point())),
        _ => Ok(None),
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            PlannerConfig::load(path)?
        }
        None => PlannerConfig::default(),
    };
    if let Some(threads) = args.threads {
        config.grid.max_threads = threads;
    }

    let space = ShapeSpace::from_file(&args.instrument)?;
    info!(
        "Instrument '{}' with {} obstacles",
        space.name,
        space.obstacles.len()
    );
    let tas = TasCalculator::default()
        .with_senses(space.senses)
        .with_fixed(FixedWavevector::Kf(args.kf));

    let planner = Planner::new(config).with_observer(Arc::new(LogProgress::default()));
    let prepared = planner.prepare(&space)?;

    if let Some(file) = &args.lines {
        save_lines_tool(&prepared.regions, file)?;
        info!("Wrote lines tool file {:?}", file);
    }
    if let Some(file) = &args.regions {
        save_regions(&prepared.regions, file)?;
        info!("Wrote regions {:?}", file);
    }

    let start = query_point(args.start, args.q_start, args.e_start, &tas)?;
    let target = query_point(args.target, args.q_target, args.e_target, &tas)?;

    let planned = match (start, target) {
        (Some(start), Some(target)) => {
            let planned = planner.plan(&prepared.graph, start, target);
            if planned.path.ok {
                info!(
                    "Path found: {} vertices, {:.2} deg",
                    planned.path.len(),
                    planned.path.length().to_degrees()
                );
            } else {
                warn!("No valid path: {:?}", planned.path.status);
            }
            Some(planned)
        }
        _ => {
            info!("No start/target given; configuration space only");
            None
        }
    };

    if let Some(planned) = &planned {
        let exports = [(&args.path, PathFormat::Raw), (&args.nomad, PathFormat::Nomad)];
        for (file, format) in exports {
            if let Some(file) = file {
                PathExporter::new(format)
                    .with_fixed_wavevector(tas.fixed)
                    .save(&planned.path, file)?;
                info!("Wrote {:?} path {:?}", format, file);
            }
        }
    }

    if let Some(file) = &args.svg {
        let mut visualizer = SvgVisualizer::new(
            prepared.graph.mapping(),
            prepared.graph.mask(),
            SvgConfig::default(),
        )
        .with_title(title(&args.instrument, &space))
        .with_regions(&prepared.regions)
        .with_graph(&prepared.graph);
        if let Some(planned) = &planned {
            visualizer = visualizer.with_path(&planned.path);
        }
        visualizer.save(file)?;
        info!("Wrote SVG {:?}", file);
    }
    Ok(())
}

fn title(file: &Path, space: &ShapeSpace) -> String {
    if space.name.is_empty() {
        file.display().to_string()
    } else {
        space.name.clone()
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
