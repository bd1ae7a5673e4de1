//! Canonical geometry model every map format converges on.
//!
//! Coordinates are raw (longitude, latitude) pairs in geographic degrees.
//! Rings are kept exactly as the source wrote them, closed or not.

use geo::Coord;
use serde_json::{Map, Value};

use crate::error::ParseFailure;

/// A single (longitude, latitude) position.
pub type Coordinate = Coord<f64>;

/// Ordered ring of coordinates; the last point need not repeat the first.
pub type Ring = Vec<Coordinate>;

/// Free-form display metadata carried through unmodified.
pub type Properties = Map<String, Value>;

/// Geometry variants supported by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Coordinate),
    LineString(Vec<Coordinate>),
    /// Ring 0 is the outer boundary, any further rings are holes.
    Polygon(Vec<Ring>),
    MultiPoint(Vec<Coordinate>),
    MultiPolygon(Vec<Vec<Ring>>),
    GeometryCollection(Vec<Geometry>),
}

impl Geometry {
    /// GeoJSON type name of this variant
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::LineString(_) => "LineString",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPoint(_) => "MultiPoint",
            Geometry::MultiPolygon(_) => "MultiPolygon",
            Geometry::GeometryCollection(_) => "GeometryCollection",
        }
    }

    /// Outer rings of this geometry when it is region-shaped.
    ///
    /// Polygons yield their ring 0, multipolygons the ring 0 of every part.
    /// Every other variant, collections included, yields nothing.
    pub fn outer_rings(&self) -> Vec<&Ring> {
        match self {
            Geometry::Polygon(rings) => rings.first().into_iter().collect(),
            Geometry::MultiPolygon(polygons) => {
                polygons.iter().filter_map(|rings| rings.first()).collect()
            }
            Geometry::Point(_)
            | Geometry::LineString(_)
            | Geometry::MultiPoint(_)
            | Geometry::GeometryCollection(_) => Vec::new(),
        }
    }

    /// Convert from a parsed GeoJSON geometry.
    ///
    /// Recursion over collections is bounded by the nesting depth of the
    /// source document, which is acyclic by construction.
    pub fn from_geojson(geometry: &geojson::Geometry) -> Result<Self, ParseFailure> {
        use geojson::Value as Gj;

        let geometry = match &geometry.value {
            Gj::Point(position) => Geometry::Point(position_to_coord(position)?),
            Gj::MultiPoint(positions) => Geometry::MultiPoint(positions_to_coords(positions)?),
            Gj::LineString(positions) => Geometry::LineString(positions_to_coords(positions)?),
            Gj::Polygon(rings) => Geometry::Polygon(rings_to_coords(rings)?),
            Gj::MultiPolygon(polygons) => Geometry::MultiPolygon(
                polygons
                    .iter()
                    .map(|rings| rings_to_coords(rings))
                    .collect::<Result<_, _>>()?,
            ),
            Gj::GeometryCollection(children) => Geometry::GeometryCollection(
                children
                    .iter()
                    .map(Geometry::from_geojson)
                    .collect::<Result<_, _>>()?,
            ),
            Gj::MultiLineString(_) => {
                return Err(ParseFailure::Structure(
                    "unsupported geometry type MultiLineString".to_string(),
                ))
            }
        };
        Ok(geometry)
    }

    /// Convert into a GeoJSON geometry for serialization.
    pub fn to_geojson(&self) -> geojson::Geometry {
        use geojson::Value as Gj;

        let value = match self {
            Geometry::Point(c) => Gj::Point(coord_to_position(c)),
            Geometry::LineString(coords) => Gj::LineString(coords_to_positions(coords)),
            Geometry::Polygon(rings) => {
                Gj::Polygon(rings.iter().map(|r| coords_to_positions(r)).collect())
            }
            Geometry::MultiPoint(coords) => Gj::MultiPoint(coords_to_positions(coords)),
            Geometry::MultiPolygon(polygons) => Gj::MultiPolygon(
                polygons
                    .iter()
                    .map(|rings| rings.iter().map(|r| coords_to_positions(r)).collect())
                    .collect(),
            ),
            Geometry::GeometryCollection(children) => {
                Gj::GeometryCollection(children.iter().map(Geometry::to_geojson).collect())
            }
        };
        geojson::Geometry::new(value)
    }
}

impl From<&Geometry> for geo_types::Geometry<f64> {
    fn from(geometry: &Geometry) -> Self {
        use geo_types::{LineString, MultiPoint, MultiPolygon, Point, Polygon};

        fn polygon(rings: &[Ring]) -> Polygon<f64> {
            let mut rings = rings.iter().map(|r| LineString::new(r.clone()));
            let exterior = rings.next().unwrap_or_else(|| LineString::new(vec![]));
            Polygon::new(exterior, rings.collect())
        }

        match geometry {
            Geometry::Point(c) => Point::from(*c).into(),
            Geometry::LineString(coords) => LineString::new(coords.clone()).into(),
            Geometry::Polygon(rings) => polygon(rings).into(),
            Geometry::MultiPoint(coords) => {
                MultiPoint::new(coords.iter().map(|c| Point::from(*c)).collect()).into()
            }
            Geometry::MultiPolygon(polygons) => {
                MultiPolygon::new(polygons.iter().map(|rings| polygon(rings)).collect()).into()
            }
            Geometry::GeometryCollection(children) => {
                geo_types::Geometry::GeometryCollection(geo_types::GeometryCollection::new_from(
                    children.iter().map(geo_types::Geometry::from).collect(),
                ))
            }
        }
    }
}

fn position_to_coord(position: &[f64]) -> Result<Coordinate, ParseFailure> {
    match position {
        [x, y, ..] => Ok(Coord { x: *x, y: *y }),
        _ => Err(ParseFailure::Structure(format!(
            "position needs at least two numbers, got {}",
            position.len()
        ))),
    }
}

fn positions_to_coords(positions: &[Vec<f64>]) -> Result<Vec<Coordinate>, ParseFailure> {
    positions.iter().map(|p| position_to_coord(p)).collect()
}

fn rings_to_coords(rings: &[Vec<Vec<f64>>]) -> Result<Vec<Ring>, ParseFailure> {
    rings.iter().map(|r| positions_to_coords(r)).collect()
}

fn coord_to_position(c: &Coordinate) -> Vec<f64> {
    vec![c.x, c.y]
}

fn coords_to_positions(coords: &[Coordinate]) -> Vec<Vec<f64>> {
    coords.iter().map(coord_to_position).collect()
}

/// One geometry plus display properties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Feature {
    pub geometry: Option<Geometry>,
    pub properties: Properties,
}

impl Feature {
    pub fn new(geometry: Option<Geometry>, properties: Properties) -> Self {
        Self {
            geometry,
            properties,
        }
    }

    /// Wrap a bare geometry with empty properties
    pub fn from_geometry(geometry: Geometry) -> Self {
        Self::new(Some(geometry), Properties::new())
    }

    /// Value of the `name` property, when it is a string
    pub fn name(&self) -> Option<&str> {
        self.properties.get("name").and_then(Value::as_str)
    }

    pub fn from_geojson(feature: &geojson::Feature) -> Result<Self, ParseFailure> {
        let geometry = feature
            .geometry
            .as_ref()
            .map(Geometry::from_geojson)
            .transpose()?;
        Ok(Self::new(
            geometry,
            feature.properties.clone().unwrap_or_default(),
        ))
    }

    pub fn to_geojson(&self) -> geojson::Feature {
        geojson::Feature {
            bbox: None,
            geometry: self.geometry.as_ref().map(Geometry::to_geojson),
            id: None,
            properties: Some(self.properties.clone()),
            foreign_members: None,
        }
    }
}

/// Ordered features; the only shape the parsers hand back to callers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Geometries of all features that carry one
    pub fn geometries(&self) -> impl Iterator<Item = &Geometry> {
        self.features.iter().filter_map(|f| f.geometry.as_ref())
    }

    /// Bounding box over every coordinate, as (min_x, min_y, max_x, max_y)
    pub fn bbox(&self) -> Option<(f64, f64, f64, f64)> {
        use geo::BoundingRect;

        let collection = geo_types::GeometryCollection::new_from(
            self.geometries().map(geo_types::Geometry::from).collect(),
        );
        collection
            .bounding_rect()
            .map(|rect| (rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }

    pub fn from_geojson(collection: &geojson::FeatureCollection) -> Result<Self, ParseFailure> {
        let features = collection
            .features
            .iter()
            .map(Feature::from_geojson)
            .collect::<Result<_, _>>()?;
        Ok(Self::new(features))
    }

    pub fn to_geojson(&self) -> geojson::FeatureCollection {
        geojson::FeatureCollection {
            bbox: None,
            features: self.features.iter().map(Feature::to_geojson).collect(),
            foreign_members: None,
        }
    }

    /// Serialize as a GeoJSON FeatureCollection document
    pub fn to_geojson_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_geojson())
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
