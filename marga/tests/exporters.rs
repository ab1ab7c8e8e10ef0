//! Exporters writing real files.

mod common;

use common::*;
use marga::instrument::FixedWavevector;
use marga::io::{
    PathExporter, PathFormat, RegionDocument, SvgConfig, SvgVisualizer, save_lines_tool,
    save_regions,
};
use tempfile::TempDir;

fn scene() -> (marga::Planner, marga::PlannedSpace) {
    let planner = square_planner(0);
    let space = prepare(&planner, &mixed_scene());
    (planner, space)
}

#[test]
fn test_lines_tool_file() {
    init_logging();
    let (_, space) = scene();
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("regions.xml");
    save_lines_tool(&space.regions, &file).unwrap();

    let text = std::fs::read_to_string(&file).unwrap();
    assert!(text.starts_with("<lines2d>"));
    assert!(text.trim_end().ends_with("</lines2d>"));

    let groups = text.matches("<begin>").count();
    assert_eq!(groups, space.regions.len());

    let segments: usize = space.regions.regions.iter().map(|r| r.segments().count()).sum();
    let vertices = text.lines().filter(|l| l.contains(" x=\"")).count();
    assert_eq!(vertices, 2 * segments);

    // The last group ends at the vertex count
    let last = format!("<end>{}</end>", 2 * segments);
    assert!(text.contains(&last));
}

#[test]
fn test_region_yaml_reads_back() {
    init_logging();
    let (_, space) = scene();
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("regions.yaml");
    save_regions(&space.regions, &file).unwrap();

    let text = std::fs::read_to_string(&file).unwrap();
    let doc: RegionDocument = serde_yaml::from_str(&text).unwrap();
    assert_eq!(doc.region_count, space.regions.len());
    assert_eq!(doc.regions.len(), space.regions.len());

    // Corners are lattice points, so whole multiples of the 2 degree step
    for record in &doc.regions {
        assert!(record.vertices.len() >= 3);
        for v in &record.vertices {
            for a in v {
                assert!(((a / 2.0) - (a / 2.0).round()).abs() < 1e-9, "{a}");
                assert!((-1e-9..=100.0 + 1e-9).contains(a));
            }
        }
    }
}

#[test]
fn test_svg_rendering() {
    init_logging();
    let (planner, space) = scene();
    let path = planner.find_path(&space.graph, deg(4.0, 90.0), deg(96.0, 6.0));
    assert!(path.ok);

    let dir = TempDir::new().unwrap();
    let file = dir.path().join("plan.svg");
    SvgVisualizer::new(space.graph.mapping(), space.graph.mask(), SvgConfig::default())
        .with_title("mixed scene")
        .with_regions(&space.regions)
        .with_graph(&space.graph)
        .with_path(&path)
        .save(&file)
        .unwrap();

    let text = std::fs::read_to_string(&file).unwrap();
    assert!(text.contains("<svg"));
    assert!(text.contains("<polyline"));
    assert!(text.contains("mixed scene"));
}

#[test]
fn test_raw_path_file() {
    init_logging();
    let (planner, space) = scene();
    let planned = planner.plan(&space.graph, deg(4.0, 90.0), deg(96.0, 6.0));
    assert!(planned.path.ok);

    let dir = TempDir::new().unwrap();
    let file = dir.path().join("path.dat");
    PathExporter::new(PathFormat::Raw)
        .save(&planned.path, &file)
        .unwrap();

    let text = std::fs::read_to_string(&file).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), planned.path.len() + 1);
    assert!(lines[0].starts_with('#'));

    // First row is the start, a4 column first
    let first: Vec<f64> = lines[1]
        .split_whitespace()
        .map(|t| t.parse().unwrap())
        .collect();
    assert_eq!(first.len(), 2);
    assert!((first[0] - 90.0).abs() < 1e-4);
    assert!((first[1] - 4.0).abs() < 1e-4);
}

#[test]
fn test_nomad_path_file() {
    init_logging();
    let (planner, space) = scene();
    let path = planner.find_path(&space.graph, deg(4.0, 90.0), deg(96.0, 6.0));
    assert!(path.ok);

    let dir = TempDir::new().unwrap();
    let file = dir.path().join("path.cmd");
    PathExporter::new(PathFormat::Nomad)
        .with_fixed_wavevector(FixedWavevector::Kf(1.4))
        .save(&path, &file)
        .unwrap();

    let text = std::fs::read_to_string(&file).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("dr kf 1.4"));
    assert_eq!(lines.next(), Some(""));

    let commands: Vec<&str> = lines.collect();
    assert_eq!(commands.len(), path.len());
    for line in &commands {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        assert_eq!(tokens[0], "dr");
        assert_eq!(tokens[1], "a4");
        assert_eq!(tokens[3], "a2");
        assert!(tokens[2].parse::<f64>().is_ok());
        assert!(tokens[4].parse::<f64>().is_ok());
    }
}
