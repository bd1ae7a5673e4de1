//! Representative points of a geometry.
//!
//! The sampling is deliberately sparse: a polygon contributes only the first
//! vertex of its outer ring and a line only its two end points. Analysis
//! results are defined against this sampling, so it must not be widened to
//! full boundaries.

use crate::models::{Coordinate, FeatureCollection, Geometry};

/// Sample points of one geometry, in order.
///
/// MultiPolygons contribute nothing; they only act as containers.
pub fn extract_points(geometry: &Geometry) -> Vec<Coordinate> {
    let mut points = Vec::new();
    collect_points(geometry, &mut points);
    points
}

fn collect_points(geometry: &Geometry, points: &mut Vec<Coordinate>) {
    match geometry {
        Geometry::Point(c) => points.push(*c),
        Geometry::Polygon(rings) => {
            if let Some(first) = rings.first().and_then(|ring| ring.first()) {
                points.push(*first);
            }
        }
        Geometry::LineString(coords) => {
            if let (Some(first), Some(last)) = (coords.first(), coords.last()) {
                points.push(*first);
                points.push(*last);
            }
        }
        Geometry::MultiPoint(coords) => points.extend(coords.iter().copied()),
        Geometry::GeometryCollection(children) => {
            for child in children {
                collect_points(child, points);
            }
        }
        Geometry::MultiPolygon(_) => {}
    }
}

/// Sample points of every feature in a collection
pub fn collection_points(collection: &FeatureCollection) -> Vec<Coordinate> {
    let mut points = Vec::new();
    for geometry in collection.geometries() {
        collect_points(geometry, &mut points);
    }
    points
}
