//! End-to-end planning scenarios.

mod common;

use approx::assert_relative_eq;
use common::*;
use marga::instrument::{Obstacle, ShapeSpace};
use marga::voronoi::NodeKind;
use marga::{PathStatus, Point2D, subdivide};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn test_free_space_has_no_contours_and_always_connects() {
    init_logging();
    let planner = square_planner(0);
    let space = prepare(&planner, &|_: f64, _: f64| false);

    assert_eq!(space.grid.blocked_count(), 0);
    assert!(space.contours.is_empty());
    assert!(space.regions.is_empty());

    let queries = [
        (deg(3.0, 3.0), deg(97.0, 97.0)),
        (deg(50.0, 1.0), deg(50.0, 99.0)),
        (deg(99.0, 10.0), deg(0.5, 80.0)),
    ];
    for (start, target) in queries {
        let path = planner.find_path(&space.graph, start, target);
        assert!(path.ok, "{start:?} -> {target:?}: {:?}", path.status);
        assert_eq!(path.vertices.first(), Some(&start));
        assert_eq!(path.vertices.last(), Some(&target));
    }
}

#[test]
fn test_fully_blocked_space_has_no_path() {
    init_logging();
    let planner = square_planner(0);
    let space = prepare(&planner, &|_: f64, _: f64| true);

    assert_eq!(space.grid.free_count(), 0);
    assert!(space.contours.is_empty());
    assert!(space.graph.is_empty());

    let path = planner.find_path(&space.graph, deg(10.0, 10.0), deg(90.0, 90.0));
    assert!(!path.ok);
}

#[test]
fn test_region_area_matches_blocked_cells() {
    init_logging();
    let planner = square_planner(0);
    // Ring with a free hole, a border wall and a separate disc
    let ring = |x: f64, y: f64| {
        let r = (x.to_degrees() - 30.0).hypot(y.to_degrees() - 30.0);
        (10.0..=20.0).contains(&r)
    };
    let wall = boxes(vec![[70.0, 100.0, 0.0, 16.0]]);
    let disc = circle(75.0, 70.0, 9.0);
    let oracle = move |x: f64, y: f64| ring(x, y) || wall(x, y) || disc(x, y);
    let space = prepare(&planner, &oracle);

    assert!(space.regions.inverted_regions().count() >= 1);
    let cell_area = space.grid.mapping().cell_area();
    assert_relative_eq!(
        space.regions.net_angle_area(),
        space.grid.blocked_count() as f64 * cell_area,
        max_relative = 1e-9
    );
}

#[test]
fn test_voronoi_edges_are_equidistant() {
    init_logging();
    let planner = square_planner(0);
    let space = prepare(&planner, &mixed_scene());
    let graph = &space.graph;
    assert!(graph.edge_count() > 0);

    // Sample spacing in cells with the default two samples per cell axis
    let h = 0.5;
    let exact = 1e-6;
    // Joins at vertices stay inside the extended sample square that placed them
    let slack = |kind: NodeKind| match kind {
        NodeKind::End => exact,
        NodeKind::Vertex | NodeKind::Fallback => 6.0 * std::f64::consts::SQRT_2 * h,
    };

    // Exact vertices: three or more sites at the clearance, none closer.
    // The solver accepts 1e-6 per site, so allow twice that plus rounding.
    let solved = 1e-5;
    let mut vertices = 0;
    for node in graph.nodes().iter().filter(|n| n.kind == NodeKind::Vertex) {
        let nearest = graph.site_index().nearest_distance(node.position);
        assert!((nearest - node.clearance).abs() <= solved);
        let touching = node
            .sites
            .iter()
            .filter(|&&id| {
                let d = graph.sites().get(id).unwrap().distance(node.position);
                (d - node.clearance).abs() <= solved
            })
            .count();
        assert!(touching >= 3, "vertex at {:?} touches {touching} sites", node.position);
        vertices += 1;
    }
    assert!(vertices > 0);

    let mut checked = 0;
    for edge in graph.edges() {
        if edge.connector {
            for w in edge.points.windows(2) {
                assert!(graph.mask().segment_is_free(w[0], w[1]));
            }
            continue;
        }
        let a = graph.sites().get(edge.sites.0).unwrap();
        let b = graph.sites().get(edge.sites.1).unwrap();
        let (from, to) = (graph.nodes()[edge.from].kind, graph.nodes()[edge.to].kind);

        let mut samples: Vec<(Point2D, f64)> = Vec::new();
        let last = edge.points.len() - 1;
        for (k, &p) in edge.points.iter().enumerate() {
            let allowed = match k {
                0 => slack(from),
                k if k == last => slack(to),
                _ => exact,
            };
            samples.push((p, allowed));
        }
        // Straight chords between two exact crossings lie on the bisector
        if !edge.curve.is_parabola() && from == NodeKind::End && to == NodeKind::End {
            samples.push((edge.points[0].lerp(edge.points[last], 0.5), exact));
        }

        for (p, allowed) in samples {
            let da = a.support_distance(p);
            let db = b.support_distance(p);
            assert!(
                (da - db).abs() <= allowed,
                "edge {}-{} at {p:?}: {da} vs {db} (allowed {allowed})",
                edge.from,
                edge.to
            );
            let nearest = graph.site_index().nearest_distance(p);
            assert!(nearest >= da.min(db) - allowed);
            checked += 1;
        }
    }
    assert!(checked > 0);
}

/// Random boxes and discs over the 0..100 degree square.
fn random_scene(rng: &mut StdRng) -> impl Fn(f64, f64) -> bool + Sync + use<> {
    let mut rects = Vec::new();
    let mut discs = Vec::new();
    for _ in 0..rng.random_range(3..=8) {
        if rng.random_bool(0.5) {
            let (a2, a4) = (rng.random_range(0.0..90.0), rng.random_range(0.0..90.0));
            let (w, h) = (rng.random_range(4.0..30.0), rng.random_range(4.0..30.0));
            rects.push([a2, a2 + w, a4, a4 + h]);
        } else {
            let centre = (rng.random_range(10.0..90.0), rng.random_range(10.0..90.0));
            discs.push((centre, rng.random_range(3.0..15.0)));
        }
    }
    let rects = boxes(rects);
    move |x: f64, y: f64| {
        rects(x, y)
            || discs
                .iter()
                .any(|&((a2, a4), r)| (x.to_degrees() - a2).hypot(y.to_degrees() - a4) <= r)
    }
}

#[test]
fn test_graph_connectivity_matches_free_space() {
    init_logging();
    let planner = square_planner(0);
    let mut rng = StdRng::seed_from_u64(0x6d61_7267);

    for scene in 0..16 {
        let oracle = random_scene(&mut rng);
        let space = prepare(&planner, &oracle);
        let graph = &space.graph;
        let mask = graph.mask();
        let mapping = graph.mapping();
        let (labels, count) = mask.free_components();
        assert_eq!(graph.component_count(), count, "scene {scene}");

        let free: Vec<usize> = (0..labels.len()).filter(|&k| labels[k].is_some()).collect();
        if free.is_empty() {
            continue;
        }
        let centre = |k: usize| {
            let (i, j) = (k % mask.width(), k / mask.width());
            mapping.to_angles(Point2D::new(i as f64 + 0.5, j as f64 + 0.5))
        };
        for _ in 0..12 {
            let a = free[rng.random_range(0..free.len())];
            let b = free[rng.random_range(0..free.len())];
            let path = planner.find_path(graph, centre(a), centre(b));
            if labels[a] == labels[b] {
                assert!(path.ok, "scene {scene}: cells {a} -> {b}: {:?}", path.status);
                for w in path.vertices.windows(2) {
                    let (p, q) = (mapping.to_lattice(w[0]), mapping.to_lattice(w[1]));
                    assert!(mask.segment_is_free(p, q), "scene {scene}: {p:?} -> {q:?}");
                }
            } else {
                assert!(!path.ok);
                assert_eq!(path.status, PathStatus::NoPath, "scene {scene}");
            }
        }
    }
}

#[test]
fn test_subdivide_preserves_vertices() {
    init_logging();
    let planner = square_planner(0);
    let space = prepare(&planner, &mixed_scene());
    let path = planner.find_path(&space.graph, deg(4.0, 90.0), deg(96.0, 6.0));
    assert!(path.ok);

    let max = 0.5_f64.to_radians();
    let sub = subdivide(&path, max);
    assert_eq!(sub.max_segment_length, max);

    // Original vertices appear in order, bit-for-bit
    let mut cursor = 0;
    for v in &path.vertices {
        let found = sub.path.vertices[cursor..].iter().position(|w| w == v);
        let offset = found.expect("original vertex missing");
        cursor += offset + 1;
    }

    for w in sub.path.vertices.windows(2) {
        let d = (w[1][0] - w[0][0]).hypot(w[1][1] - w[0][1]);
        assert!(d <= max * (1.0 + 1e-9));
    }

    let allowed: usize = path
        .vertices
        .windows(2)
        .map(|w| ((w[1][0] - w[0][0]).hypot(w[1][1] - w[0][1]) / max).ceil() as usize)
        .sum();
    assert!(sub.path.vertices.len() - path.vertices.len() <= allowed);
}

#[test]
fn test_pipeline_is_independent_of_thread_count() {
    init_logging();
    let oracle = mixed_scene();
    let single = prepare(&square_planner(1), &oracle);
    let parallel = prepare(&square_planner(4), &oracle);

    assert_eq!(single.grid, parallel.grid);
    assert_eq!(single.contours.contours, parallel.contours.contours);
    assert_eq!(single.regions.regions, parallel.regions.regions);
    assert_eq!(single.graph.nodes(), parallel.graph.nodes());
    assert_eq!(single.graph.edges(), parallel.graph.edges());
}

#[test]
fn test_centred_circle_gives_one_symmetric_detour() {
    init_logging();
    let planner = square_planner(0);
    let space = prepare(&planner, &circle(50.0, 50.0, 20.0));
    let start = deg(6.0, 6.0);
    let target = deg(94.0, 94.0);
    let path = planner.find_path(&space.graph, start, target);
    assert!(path.ok);

    let mask = space.graph.mask();
    let mapping = space.graph.mapping();
    for v in &path.vertices {
        assert!(!mask.state_at(mapping.to_lattice(*v)).is_blocked());
    }

    // Signed offsets from the start-target diagonal, in degrees
    let offsets: Vec<(f64, f64)> = path
        .vertices
        .iter()
        .map(|v| {
            let (x, y) = (v[0].to_degrees() - 6.0, v[1].to_degrees() - 6.0);
            let along = (x + y) / 2.0_f64.sqrt() / (88.0 * 2.0_f64.sqrt());
            ((x - y) / 2.0_f64.sqrt(), along)
        })
        .collect();
    let side = offsets
        .iter()
        .map(|o| o.0)
        .max_by(|a, b| a.abs().total_cmp(&b.abs()))
        .unwrap();
    assert!(side.abs() > 20.0, "path does not go around the disc");

    // One side only
    for (offset, _) in &offsets {
        assert!(offset * side.signum() > -3.0);
    }

    // The widest point of the detour lies near the middle
    let (_, along) = offsets
        .iter()
        .copied()
        .max_by(|a, b| a.0.abs().total_cmp(&b.0.abs()))
        .unwrap();
    assert!((0.3..=0.7).contains(&along), "detour peak at {along}");
}

#[test]
fn test_two_rectangles_cut_the_space() {
    init_logging();
    let planner = square_planner(0);
    let oracle = boxes(vec![[40.0, 60.0, 0.0, 60.0], [50.0, 70.0, 50.0, 100.0]]);
    let space = prepare(&planner, &oracle);

    let path = planner.find_path(&space.graph, deg(10.0, 50.0), deg(90.0, 50.0));
    assert!(!path.ok);
    assert_eq!(path.status, PathStatus::NoPath);

    // Same side stays reachable
    let path = planner.find_path(&space.graph, deg(10.0, 20.0), deg(20.0, 90.0));
    assert!(path.ok);
}

#[test]
fn test_diagonal_band_is_never_entered() {
    init_logging();
    let band = Obstacle::Band {
        from: [40.0, -120.0],
        to: [140.0, 120.0],
        half_width: 2.5,
    };
    let space = ShapeSpace::new(vec![band.clone()]);
    let planner = planner((-4.0, 184.0, 2.0), (-188.0, 188.0, 2.0), 0);
    let prepared = prepare(&planner, &space);
    assert_eq!(prepared.grid.mapping().width, 94);
    assert_eq!(prepared.grid.mapping().height, 188);

    let planned = planner.plan(&prepared.graph, deg(140.0, -100.0), deg(40.0, 100.0));
    assert!(planned.path.ok, "{:?}", planned.path.status);
    for v in &planned.path.vertices {
        let p = Point2D::new(v[0].to_degrees(), v[1].to_degrees());
        assert!(!band.contains(p), "vertex {p:?} inside the band");
    }

    // Segments, not only vertices, stay clear of the rasterised band
    let mask = prepared.graph.mask();
    let mapping = prepared.graph.mapping();
    for w in planned.path.vertices.windows(2) {
        let (a, b) = (mapping.to_lattice(w[0]), mapping.to_lattice(w[1]));
        assert!(mask.segment_is_free(a, b), "segment {a:?} -> {b:?} crosses the band");
    }
}

#[test]
fn test_blocked_target_is_flagged() {
    init_logging();
    let planner = square_planner(0);
    let space = prepare(&planner, &circle(50.0, 50.0, 20.0));
    let path = planner.find_path(&space.graph, deg(6.0, 6.0), deg(50.0, 50.0));
    assert!(!path.ok);
    assert_eq!(path.status, PathStatus::TargetBlocked);
    assert!(!path.vertices.is_empty());

    let path = planner.find_path(&space.graph, deg(6.0, 6.0), deg(150.0, 50.0));
    assert_eq!(path.status, PathStatus::OutOfRange);
}
