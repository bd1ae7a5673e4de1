//! KML to feature collection conversion.

use std::collections::HashMap;
use std::sync::LazyLock;

use geo::Coord;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::ParseFailure;
use crate::models::{Coordinate, Feature, FeatureCollection, Geometry, Properties, Ring};

use super::markup::{self, Element};
use super::text;

/// Local file header signature of a zip archive
const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";

static COMMA_SPACING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*,\s*").expect("valid comma regex"));

/// Parse raw KML bytes
pub fn parse(bytes: &[u8]) -> Result<FeatureCollection, ParseFailure> {
    if bytes.starts_with(ZIP_SIGNATURE) {
        return Err(ParseFailure::Markup(
            "input is a zip archive, not markup".to_string(),
        ));
    }
    parse_text(&text::decode_text(bytes))
}

/// Parse already decoded KML text
pub fn parse_text(text: &str) -> Result<FeatureCollection, ParseFailure> {
    let clean = markup::normalize(text);
    let root = markup::parse_document(&clean)?;
    let collection = convert(&root);
    debug!("Converted KML document into {} features", collection.len());
    Ok(collection)
}

/// Convert a parsed KML tree. Every Placemark becomes one feature.
pub fn convert(root: &Element) -> FeatureCollection {
    let styles = StyleIndex::build(root);
    root.descendants_named("Placemark")
        .into_iter()
        .map(|placemark| convert_placemark(placemark, &styles))
        .collect()
}

fn convert_placemark(placemark: &Element, styles: &StyleIndex) -> Feature {
    let mut properties = Properties::new();

    for key in ["name", "address", "description", "styleUrl"] {
        if let Some(text) = placemark.child_text(key) {
            properties.insert(key.to_string(), Value::String(text));
        }
    }

    if let Some(when) = placemark
        .child("TimeStamp")
        .and_then(|ts| ts.child_text("when"))
    {
        properties.insert("timestamp".to_string(), Value::String(when));
    }

    if let Some(span) = placemark.child("TimeSpan") {
        let mut timespan = serde_json::Map::new();
        for key in ["begin", "end"] {
            if let Some(text) = span.child_text(key) {
                timespan.insert(key.to_string(), Value::String(text));
            }
        }
        properties.insert("timespan".to_string(), Value::Object(timespan));
    }

    if let Some(url) = placemark.child_text("styleUrl") {
        if let Some(style) = styles.resolve(&url) {
            apply_style(style, &mut properties);
        }
    }
    if let Some(inline) = placemark.child("Style") {
        apply_style(inline, &mut properties);
    }

    if let Some(extended) = placemark.child("ExtendedData") {
        for data in extended.descendants_named("Data") {
            if let Some(name) = data.attr("name") {
                let value = data.child_text("value").unwrap_or_default();
                properties.insert(name.to_string(), Value::String(value));
            }
        }
        for data in extended.descendants_named("SimpleData") {
            if let Some(name) = data.attr("name") {
                properties.insert(name.to_string(), Value::String(data.text().trim().to_string()));
            }
        }
    }

    let mut geometries: Vec<Geometry> = placemark.elements().filter_map(convert_geometry).collect();
    let geometry = match geometries.len() {
        0 => None,
        1 => geometries.pop(),
        _ => Some(Geometry::GeometryCollection(geometries)),
    };

    Feature::new(geometry, properties)
}

fn convert_geometry(element: &Element) -> Option<Geometry> {
    match element.name.as_str() {
        "Point" => coordinates_of(element)
            .into_iter()
            .next()
            .map(Geometry::Point),
        "LineString" | "LinearRing" => {
            let coords = coordinates_of(element);
            (!coords.is_empty()).then_some(Geometry::LineString(coords))
        }
        "Polygon" => {
            let outer = element
                .child("outerBoundaryIs")
                .and_then(|b| b.child("LinearRing"))
                .map(coordinates_of)
                .filter(|ring| !ring.is_empty())?;
            let mut rings: Vec<Ring> = vec![outer];
            for boundary in element.children_named("innerBoundaryIs") {
                rings.extend(
                    boundary
                        .children_named("LinearRing")
                        .map(coordinates_of)
                        .filter(|ring| !ring.is_empty()),
                );
            }
            Some(Geometry::Polygon(rings))
        }
        "Track" => {
            let coords: Vec<Coordinate> = element
                .children_named("coord")
                .filter_map(|c| {
                    let text = c.text();
                    let mut parts = text.split_whitespace();
                    let x = parts.next()?.parse::<f64>().ok()?;
                    let y = parts.next()?.parse::<f64>().ok()?;
                    Some(Coord { x, y })
                })
                .collect();
            (!coords.is_empty()).then_some(Geometry::LineString(coords))
        }
        "MultiGeometry" | "MultiTrack" => {
            let mut children: Vec<Geometry> =
                element.elements().filter_map(convert_geometry).collect();
            match children.len() {
                0 => None,
                1 => children.pop(),
                _ => Some(Geometry::GeometryCollection(children)),
            }
        }
        _ => None,
    }
}

fn coordinates_of(element: &Element) -> Vec<Coordinate> {
    element
        .child("coordinates")
        .map(|c| parse_coordinates(&c.text()))
        .unwrap_or_default()
}

/// Parse a whitespace separated list of `lon,lat[,alt]` tuples.
/// Unparseable tuples are dropped.
pub fn parse_coordinates(text: &str) -> Vec<Coordinate> {
    let text = COMMA_SPACING.replace_all(text.trim(), ",");
    text.split_whitespace()
        .filter_map(|tuple| {
            let mut parts = tuple.split(',');
            let x = parts.next()?.parse::<f64>().ok()?;
            let y = parts.next()?.parse::<f64>().ok()?;
            Some(Coord { x, y })
        })
        .collect()
}

/// Shared styles addressable by `styleUrl`
struct StyleIndex<'a> {
    styles: HashMap<&'a str, &'a Element>,
    /// StyleMap id -> styleUrl of its `normal` pair
    maps: HashMap<&'a str, String>,
}

impl<'a> StyleIndex<'a> {
    fn build(root: &'a Element) -> Self {
        let styles = root
            .descendants_named("Style")
            .into_iter()
            .filter_map(|style| style.attr("id").map(|id| (id, style)))
            .collect();

        let maps = root
            .descendants_named("StyleMap")
            .into_iter()
            .filter_map(|map| {
                let id = map.attr("id")?;
                let normal = map
                    .children_named("Pair")
                    .find(|pair| pair.child_text("key").as_deref() == Some("normal"))?;
                Some((id, normal.child_text("styleUrl")?))
            })
            .collect();

        Self { styles, maps }
    }

    fn resolve(&self, url: &str) -> Option<&'a Element> {
        // Only document-local references can be resolved
        let id = url.rsplit('#').next()?;
        if let Some(style) = self.styles.get(id) {
            return Some(*style);
        }
        let target = self.maps.get(id)?;
        let target_id = target.rsplit('#').next()?;
        self.styles.get(target_id).copied()
    }
}

fn apply_style(style: &Element, properties: &mut Properties) {
    if let Some(line) = style.child("LineStyle") {
        if let Some((color, opacity)) = line.child_text("color").and_then(|c| kml_color(&c)) {
            properties.insert("stroke".to_string(), Value::String(color));
            properties.insert("stroke-opacity".to_string(), Value::from(opacity));
        }
        if let Some(width) = line
            .child_text("width")
            .and_then(|w| w.parse::<f64>().ok())
        {
            properties.insert("stroke-width".to_string(), Value::from(width));
        }
    }

    if let Some(poly) = style.child("PolyStyle") {
        if let Some((color, opacity)) = poly.child_text("color").and_then(|c| kml_color(&c)) {
            properties.insert("fill".to_string(), Value::String(color));
            properties.insert("fill-opacity".to_string(), Value::from(opacity));
        }
    }

    if let Some(href) = style
        .child("IconStyle")
        .and_then(|icon| icon.child("Icon"))
        .and_then(|icon| icon.child_text("href"))
    {
        properties.insert("icon".to_string(), Value::String(href));
    }
}

/// KML `aabbggrr` to (`#rrggbb`, opacity)
fn kml_color(value: &str) -> Option<(String, f64)> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 8 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let alpha = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let (bb, gg, rr) = (&hex[2..4], &hex[4..6], &hex[6..8]);
    Some((
        format!("#{}{}{}", rr, gg, bb).to_lowercase(),
        f64::from(alpha) / 255.0,
    ))
}
