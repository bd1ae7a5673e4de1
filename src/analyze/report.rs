//! JSON-lines output of the analyze binary.

use std::collections::BTreeMap;

use serde::Serialize;

use geovisor::formats::Parsed;
use geovisor::models::LayerSummary;
use geovisor::{FeatureCollection, FileType, Loaded};

#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Output<'a> {
    /// A map or file became a layer
    Loaded {
        name: &'a str,
        #[serde(flatten)]
        loaded: &'a Loaded,
    },
    /// A map or file could not be loaded
    Failed { name: &'a str, error: String },
    Hidden { name: &'a str },
    Summary(Summary),
    /// Final state of a layer after a run
    Layer(LayerSummary),
}

/// Shape of a parsed file
#[derive(Debug, Serialize)]
pub struct Summary {
    pub file: String,
    pub detected: FileType,
    pub parsed_as: FileType,
    pub features: usize,
    pub without_geometry: usize,
    pub geometry_types: BTreeMap<&'static str, usize>,
    pub bbox: Option<(f64, f64, f64, f64)>,
}

impl Summary {
    pub fn new(file: &str, parsed: &Parsed) -> Self {
        Self {
            file: file.to_string(),
            detected: parsed.detected,
            parsed_as: parsed.parsed_as,
            features: parsed.collection.len(),
            without_geometry: parsed
                .collection
                .features
                .iter()
                .filter(|f| f.geometry.is_none())
                .count(),
            geometry_types: geometry_histogram(&parsed.collection),
            bbox: parsed.collection.bbox(),
        }
    }
}

fn geometry_histogram(collection: &FeatureCollection) -> BTreeMap<&'static str, usize> {
    let mut histogram = BTreeMap::new();
    for geometry in collection.geometries() {
        *histogram.entry(geometry.type_name()).or_insert(0) += 1;
    }
    histogram
}

pub fn emit(output: &Output) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geovisor::{Feature, Geometry, Layer};

    #[test]
    fn test_layer_line() {
        let data = FeatureCollection::new(vec![Feature::from_geometry(Geometry::Point(
            geo::Coord { x: 1.0, y: 2.0 },
        ))]);
        let layer = Layer::new("ova", "#ef4444", data);
        let line = serde_json::to_value(Output::Layer(layer.summary())).unwrap();
        assert_eq!(line["event"], "layer");
        assert_eq!(line["name"], "ova");
        assert_eq!(line["visible"], true);
        assert_eq!(line["feature_count"], 1);
    }

    #[test]
    fn test_failed_line() {
        let line = serde_json::to_value(Output::Failed {
            name: "bad.kml",
            error: "boom".to_string(),
        })
        .unwrap();
        assert_eq!(line["event"], "failed");
        assert_eq!(line["error"], "boom");
    }
}
