//! Canonical map data model.

pub mod geometry;
pub mod layer;

pub use geometry::{Coordinate, Feature, FeatureCollection, Geometry, Properties, Ring};
pub use layer::{Layer, LayerSet, LayerSummary, LAYER_PALETTE};
