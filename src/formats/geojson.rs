//! GeoJSON parsing and normalization to a feature collection.

use geojson::GeoJson;
use tracing::debug;

use crate::error::ParseFailure;
use crate::models::{Feature, FeatureCollection, Geometry};

use super::text;

/// Parse GeoJSON bytes.
///
/// Invalid JSON is a [`ParseFailure::Syntax`]; valid JSON that is not a
/// supported GeoJSON object is a [`ParseFailure::Structure`].
pub fn parse(bytes: &[u8]) -> Result<FeatureCollection, ParseFailure> {
    let text = text::decode_text(bytes);
    let value: serde_json::Value = serde_json::from_str(text.trim_start_matches('\u{feff}'))?;
    let geojson =
        GeoJson::from_json_value(value).map_err(|e| ParseFailure::Structure(e.to_string()))?;
    normalize(&geojson)
}

/// Wrap any top-level GeoJSON object into a feature collection
pub fn normalize(geojson: &GeoJson) -> Result<FeatureCollection, ParseFailure> {
    let collection = match geojson {
        GeoJson::FeatureCollection(collection) => FeatureCollection::from_geojson(collection)?,
        GeoJson::Feature(feature) => FeatureCollection::new(vec![Feature::from_geojson(feature)?]),
        GeoJson::Geometry(geometry) => match &geometry.value {
            geojson::Value::GeometryCollection(children) => children
                .iter()
                .map(|child| Geometry::from_geojson(child).map(Feature::from_geometry))
                .collect::<Result<_, _>>()?,
            _ => FeatureCollection::new(vec![Feature::from_geometry(Geometry::from_geojson(
                geometry,
            )?)]),
        },
    };
    debug!("Normalized GeoJSON into {} features", collection.len());
    Ok(collection)
}
