//! SVG rendering of a planned configuration space.
//!
//! Layers, bottom to top: occupancy, regions, Voronoi edges and nodes, path.
//! Axis 1 runs to the right, axis 2 upwards.

use std::path::Path as FsPath;

use svg::Document;
use svg::node::element::{Circle, Group, Polygon, Polyline, Rectangle, Text};

use crate::core::{AngleMapping, CellState, OccupancyMask, Point2D};
use crate::error::Result;
use crate::path::Path;
use crate::region::RegionSet;
use crate::voronoi::{EdgeCurve, VoronoiGraph};

/// SVG color scheme (Okabe-Ito based)
#[derive(Clone, Debug)]
pub struct SvgColorScheme {
    pub blocked: &'static str,
    pub free: &'static str,
    pub region: &'static str,
    pub inverted_region: &'static str,
    pub line_edge: &'static str,
    pub parabola_edge: &'static str,
    pub connector_edge: &'static str,
    pub node: &'static str,
    pub path: &'static str,
    pub start: &'static str,
    pub target: &'static str,
}

impl Default for SvgColorScheme {
    fn default() -> Self {
        Self {
            blocked: "#BBBBBB",
            free: "#FFFFFF",
            region: "#333333",
            inverted_region: "#CC79A7",
            line_edge: "#0072B2",
            parabola_edge: "#56B4E9",
            connector_edge: "#F0E442",
            node: "#009E73",
            path: "#D55E00",
            start: "#E69F00",
            target: "#000000",
        }
    }
}

/// Configuration for SVG rendering
#[derive(Clone, Debug)]
pub struct SvgConfig {
    /// Pixels per cell
    pub scale: f64,
    /// Padding around the grid in pixels
    pub padding: f64,
    pub edge_width: f64,
    pub path_width: f64,
    pub node_radius: f64,
    pub colors: SvgColorScheme,
}

impl Default for SvgConfig {
    fn default() -> Self {
        Self {
            scale: 6.0,
            padding: 20.0,
            edge_width: 1.0,
            path_width: 2.5,
            node_radius: 1.5,
            colors: SvgColorScheme::default(),
        }
    }
}

/// SVG visualization builder
pub struct SvgVisualizer<'a> {
    config: SvgConfig,
    mapping: &'a AngleMapping,
    mask: &'a OccupancyMask,
    regions: Option<&'a RegionSet>,
    graph: Option<&'a VoronoiGraph>,
    path: Option<&'a Path>,
    title: Option<String>,
}

impl<'a> SvgVisualizer<'a> {
    pub fn new(mapping: &'a AngleMapping, mask: &'a OccupancyMask, config: SvgConfig) -> Self {
        Self {
            config,
            mapping,
            mask,
            regions: None,
            graph: None,
            path: None,
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_regions(mut self, regions: &'a RegionSet) -> Self {
        self.regions = Some(regions);
        self
    }

    pub fn with_graph(mut self, graph: &'a VoronoiGraph) -> Self {
        self.graph = Some(graph);
        self
    }

    pub fn with_path(mut self, path: &'a Path) -> Self {
        self.path = Some(path);
        self
    }

    fn size(&self) -> (f64, f64) {
        let pad = 2.0 * self.config.padding;
        (
            self.mask.width() as f64 * self.config.scale + pad,
            self.mask.height() as f64 * self.config.scale + pad,
        )
    }

    /// Lattice point to pixel coordinates (y flipped).
    fn transform(&self, p: Point2D) -> (f64, f64) {
        let (_, height) = self.size();
        (
            self.config.padding + p.x * self.config.scale,
            height - self.config.padding - p.y * self.config.scale,
        )
    }

    fn points_attr(&self, points: impl IntoIterator<Item = Point2D>) -> String {
        points
            .into_iter()
            .map(|p| {
                let (x, y) = self.transform(p);
                format!("{x:.2},{y:.2}")
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Blocked cells merged into horizontal runs.
    fn render_occupancy(&self) -> Group {
        let colors = &self.config.colors;
        let s = self.config.scale;
        let (width, height) = (self.mask.width(), self.mask.height());
        let (px, py) = self.transform(Point2D::new(0.0, height as f64));
        let mut group = Group::new().set("id", "occupancy").add(
            Rectangle::new()
                .set("x", px)
                .set("y", py)
                .set("width", width as f64 * s)
                .set("height", height as f64 * s)
                .set("fill", colors.free),
        );

        for j in 0..height {
            let mut i = 0;
            while i < width {
                if self.mask.get(i, j) != Some(CellState::Blocked) {
                    i += 1;
                    continue;
                }
                let begin = i;
                while i < width && self.mask.get(i, j) == Some(CellState::Blocked) {
                    i += 1;
                }
                let (x, y) = self.transform(Point2D::new(begin as f64, (j + 1) as f64));
                group = group.add(
                    Rectangle::new()
                        .set("x", x)
                        .set("y", y)
                        .set("width", (i - begin) as f64 * s)
                        .set("height", s)
                        .set("fill", colors.blocked),
                );
            }
        }
        group
    }

    fn render_regions(&self, regions: &RegionSet) -> Group {
        let colors = &self.config.colors;
        let mut group = Group::new().set("id", "regions").set("fill", "none");
        for region in &regions.regions {
            let mut polygon = Polygon::new()
                .set("points", self.points_attr(region.vertices().iter().copied()))
                .set("stroke-width", 1.0);
            polygon = if region.inverted() {
                polygon
                    .set("stroke", colors.inverted_region)
                    .set("stroke-dasharray", "4,2")
            } else {
                polygon.set("stroke", colors.region)
            };
            group = group.add(polygon);
        }
        group
    }

    fn render_graph(&self, graph: &VoronoiGraph) -> Group {
        let colors = &self.config.colors;
        let mut group = Group::new().set("id", "voronoi").set("fill", "none");
        for edge in graph.edges() {
            let color = match edge.curve {
                _ if edge.connector => colors.connector_edge,
                EdgeCurve::Parabola { .. } => colors.parabola_edge,
                EdgeCurve::Line { .. } => colors.line_edge,
            };
            group = group.add(
                Polyline::new()
                    .set("points", self.points_attr(edge.points.iter().copied()))
                    .set("stroke", color)
                    .set("stroke-width", self.config.edge_width),
            );
        }
        for node in graph.nodes() {
            let (x, y) = self.transform(node.position);
            group = group.add(
                Circle::new()
                    .set("cx", x)
                    .set("cy", y)
                    .set("r", self.config.node_radius)
                    .set("fill", colors.node),
            );
        }
        group
    }

    fn render_path(&self, path: &Path) -> Group {
        let colors = &self.config.colors;
        let points: Vec<Point2D> = path
            .vertices
            .iter()
            .map(|&v| self.mapping.to_lattice(v))
            .collect();
        let mut group = Group::new().set("id", "path").add(
            Polyline::new()
                .set("points", self.points_attr(points.iter().copied()))
                .set("fill", "none")
                .set("stroke", colors.path)
                .set("stroke-width", self.config.path_width)
                .set("stroke-linecap", "round")
                .set("stroke-linejoin", "round"),
        );
        let ends = [(points.first(), colors.start), (points.last(), colors.target)];
        for (point, color) in ends {
            if let Some(&p) = point {
                let (x, y) = self.transform(p);
                group = group.add(
                    Circle::new()
                        .set("cx", x)
                        .set("cy", y)
                        .set("r", 2.0 * self.config.path_width)
                        .set("fill", color),
                );
            }
        }
        group
    }

    /// Build the SVG document.
    pub fn document(&self) -> Document {
        let (width, height) = self.size();
        let mut doc = Document::new()
            .set("width", width)
            .set("height", height)
            .set("viewBox", (0.0, 0.0, width, height))
            .add(self.render_occupancy());

        if let Some(regions) = self.regions {
            doc = doc.add(self.render_regions(regions));
        }
        if let Some(graph) = self.graph {
            doc = doc.add(self.render_graph(graph));
        }
        if let Some(path) = self.path {
            doc = doc.add(self.render_path(path));
        }
        if let Some(title) = &self.title {
            doc = doc.add(
                Text::new(title.as_str())
                    .set("x", self.config.padding)
                    .set("y", self.config.padding * 0.7)
                    .set("font-size", 12)
                    .set("font-family", "sans-serif")
                    .set("fill", "black"),
            );
        }
        doc
    }

    /// Render to SVG text.
    pub fn render(&self) -> String {
        self.document().to_string()
    }

    pub fn save(&self, path: &FsPath) -> Result<()> {
        svg::save(path, &self.document())?;
        Ok(())
    }
}
