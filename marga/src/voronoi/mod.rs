//! Segment-site Voronoi diagram of the free configuration space.
//!
//! Sites are the obstacle boundary segments, their endpoints and the free
//! parts of the grid frame. Every point of the free space belongs to the cell
//! of its nearest site; graph edges are pieces of bisectors between two
//! neighbouring cells and stay as far from the obstacles as possible.
//!
//! ```text
//!   obstacle ┌────┐
//!            │    │   point/segment: parabola
//!            └────┘ .
//!        .  ·  ·       ·
//!   ─────────────────────────  segment/segment: straight
//!   frame
//! ```
//!
//! Construction samples the free cells on a fine lattice to discover which
//! sites meet where, then computes every crossing, vertex and curve from the
//! exact site geometry. Pieces of the diagram the sampling leaves apart
//! inside one free component are joined by free-space connectors, so graph
//! connectivity matches free-space connectivity. See [`VoronoiBuilder`].

mod builder;
mod config;
mod connect;
mod curve;
mod graph;
mod index;
mod site;
mod solve;

pub use builder::VoronoiBuilder;
pub use config::VoronoiConfig;
pub use curve::EdgeCurve;
pub use graph::{NodeKind, VoronoiEdge, VoronoiGraph, VoronoiNode};
pub use index::SiteIndex;
pub use site::{Site, SiteKind, SiteSet, SiteSource, frame_segments, line_distance};
