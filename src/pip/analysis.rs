//! Intersection and coverage analyses against loaded layers.
//!
//! Both are read-only scans over a frozen layer slice. Hidden layers are
//! never tested and each layer stops at its first match.

use hashbrown::HashSet;
use serde::Serialize;
use tracing::debug;

use crate::models::{FeatureCollection, Layer, Ring};

use super::extract::collection_points;
use super::ring::point_in_ring;

/// Which direction an analysis ran in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    /// New points against existing regions
    Intersection,
    /// New regions against existing points
    Coverage,
}

/// Matched layer names for one analysis run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    pub kind: AnalysisKind,
    pub file_name: String,
    pub matches: Vec<String>,
}

/// Distinct names in order of first insertion
#[derive(Debug, Default)]
struct LayerNames {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl LayerNames {
    fn insert(&mut self, name: &str) {
        if self.seen.insert(name.to_string()) {
            self.order.push(name.to_string());
        }
    }

    fn into_vec(self) -> Vec<String> {
        self.order
    }
}

/// Names of visible layers whose polygons contain any sample point of
/// `new_data`.
pub fn check_intersections(new_data: &FeatureCollection, layers: &[Layer]) -> Vec<String> {
    let points = collection_points(new_data);
    if points.is_empty() {
        debug!("Intersection check skipped: no sample points");
        return Vec::new();
    }

    let mut matched = LayerNames::default();
    for layer in layers.iter().filter(|l| l.visible) {
        let inside = layer.data.geometries().any(|geometry| {
            geometry
                .outer_rings()
                .into_iter()
                .any(|ring| points.iter().any(|p| point_in_ring(*p, ring)))
        });
        if inside {
            matched.insert(&layer.name);
        }
    }

    let matched = matched.into_vec();
    debug!(
        "Intersection check with {} points matched {} layers",
        points.len(),
        matched.len()
    );
    matched
}

/// Names of visible layers having a sample point inside any polygon of
/// `new_data`.
pub fn check_coverage(new_data: &FeatureCollection, layers: &[Layer]) -> Vec<String> {
    let rings: Vec<&Ring> = new_data
        .geometries()
        .flat_map(|geometry| geometry.outer_rings())
        .collect();
    if rings.is_empty() {
        debug!("Coverage check skipped: no polygons");
        return Vec::new();
    }

    let mut covered = LayerNames::default();
    for layer in layers.iter().filter(|l| l.visible) {
        let points = collection_points(&layer.data);
        if points
            .iter()
            .any(|p| rings.iter().any(|ring| point_in_ring(*p, ring)))
        {
            covered.insert(&layer.name);
        }
    }

    let covered = covered.into_vec();
    debug!(
        "Coverage check with {} rings matched {} layers",
        rings.len(),
        covered.len()
    );
    covered
}
