//! Shared scenario builders for the integration tests.

#![allow(dead_code)]

use marga::config::AxisSettings;
use marga::grid::CollisionOracle;
use marga::{PlannedSpace, Planner, PlannerConfig};

pub fn init_logging() {
    env_logger::try_init().ok();
}

/// `[a2, a4]` in degrees to radians.
pub fn deg(a2: f64, a4: f64) -> [f64; 2] {
    [a2.to_radians(), a4.to_radians()]
}

/// Planner over `axis1 x axis2` (degrees, `(begin, end, step)`).
pub fn planner(axis1: (f64, f64, f64), axis2: (f64, f64, f64), threads: usize) -> Planner {
    let mut config = PlannerConfig::default();
    config.grid.axis1 = AxisSettings {
        begin: axis1.0,
        end: axis1.1,
        step: axis1.2,
    };
    config.grid.axis2 = AxisSettings {
        begin: axis2.0,
        end: axis2.1,
        step: axis2.2,
    };
    config.grid.max_threads = threads;
    Planner::new(config)
}

/// Square 0..100 degree space with 2 degree cells.
pub fn square_planner(threads: usize) -> Planner {
    planner((0.0, 100.0, 2.0), (0.0, 100.0, 2.0), threads)
}

pub fn prepare<O: CollisionOracle + ?Sized>(planner: &Planner, oracle: &O) -> PlannedSpace {
    planner.prepare(oracle).expect("pipeline failed")
}

/// Disc of `radius` degrees around `(a2, a4)`.
pub fn circle(a2: f64, a4: f64, radius: f64) -> impl Fn(f64, f64) -> bool + Sync {
    move |x: f64, y: f64| (x.to_degrees() - a2).hypot(y.to_degrees() - a4) <= radius
}

/// Union of axis-aligned boxes `[a2_min, a2_max, a4_min, a4_max]` in degrees.
pub fn boxes(list: Vec<[f64; 4]>) -> impl Fn(f64, f64) -> bool + Sync {
    move |x: f64, y: f64| {
        let (x, y) = (x.to_degrees(), y.to_degrees());
        list.iter()
            .any(|b| x >= b[0] && x <= b[1] && y >= b[2] && y <= b[3])
    }
}

/// Several obstacles of different kinds, used where the exact layout is irrelevant.
pub fn mixed_scene() -> impl Fn(f64, f64) -> bool + Sync {
    let round = circle(30.0, 65.0, 12.0);
    let walls = boxes(vec![
        [55.0, 80.0, 20.0, 34.0],
        [60.0, 66.0, 34.0, 70.0],
        [0.0, 12.0, 0.0, 10.0],
    ]);
    move |x: f64, y: f64| round(x, y) || walls(x, y)
}
