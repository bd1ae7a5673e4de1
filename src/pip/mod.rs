//! Point-in-polygon analyses between a newly loaded map and existing layers.
//!
//! Geometries are reduced to sparse sample points, which are tested against
//! polygon outer rings with a planar ray-casting test.

mod analysis;
mod extract;
mod ring;

pub use analysis::{check_coverage, check_intersections, AnalysisKind, AnalysisReport};
pub use extract::{collection_points, extract_points};
pub use ring::point_in_ring;
