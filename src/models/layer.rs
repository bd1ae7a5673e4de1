//! Named, toggleable wrappers around parsed feature collections.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::geometry::FeatureCollection;

/// Display colors handed out to new layers, in order.
pub const LAYER_PALETTE: [&str; 10] = [
    "#ef4444", "#f97316", "#f59e0b", "#84cc16", "#10b981", "#06b6d4", "#3b82f6", "#8b5cf6",
    "#d946ef", "#f43f5e",
];

/// One loaded map
#[derive(Debug, Clone)]
pub struct Layer {
    pub id: Uuid,
    pub name: String,
    pub visible: bool,
    pub color: String,
    pub loaded_at: DateTime<Utc>,
    pub data: Arc<FeatureCollection>,
}

impl Layer {
    pub fn new(name: impl Into<String>, color: impl Into<String>, data: FeatureCollection) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            visible: true,
            color: color.into(),
            loaded_at: Utc::now(),
            data: Arc::new(data),
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn summary(&self) -> LayerSummary {
        LayerSummary {
            id: self.id,
            name: self.name.clone(),
            visible: self.visible,
            color: self.color.clone(),
            feature_count: self.data.len(),
            loaded_at: self.loaded_at,
        }
    }
}

/// Serializable view of a layer without its geometry
#[derive(Debug, Clone, Serialize)]
pub struct LayerSummary {
    pub id: Uuid,
    pub name: String,
    pub visible: bool,
    pub color: String,
    pub feature_count: usize,
    pub loaded_at: DateTime<Utc>,
}

/// Layers in load order
#[derive(Debug, Clone, Default)]
pub struct LayerSet {
    layers: Vec<Layer>,
    next_color: usize,
}

impl LayerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next palette color, cycling through `LAYER_PALETTE`
    pub fn next_color(&mut self) -> &'static str {
        let color = LAYER_PALETTE[self.next_color % LAYER_PALETTE.len()];
        self.next_color += 1;
        color
    }

    /// Append a layer built from `data`, returning its id
    pub fn add(&mut self, name: impl Into<String>, data: FeatureCollection) -> Uuid {
        let color = self.next_color();
        self.push(Layer::new(name, color, data))
    }

    pub fn push(&mut self, layer: Layer) -> Uuid {
        let id = layer.id;
        self.layers.push(layer);
        id
    }

    pub fn get(&self, id: Uuid) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.layers.iter().any(|l| l.name == name)
    }

    /// Flip visibility; returns the new state
    pub fn toggle(&mut self, id: Uuid) -> Option<bool> {
        let layer = self.layers.iter_mut().find(|l| l.id == id)?;
        layer.visible = !layer.visible;
        Some(layer.visible)
    }

    pub fn set_visible(&mut self, id: Uuid, visible: bool) -> Option<()> {
        let layer = self.layers.iter_mut().find(|l| l.id == id)?;
        layer.visible = visible;
        Some(())
    }

    pub fn remove(&mut self, id: Uuid) -> Option<Layer> {
        let idx = self.layers.iter().position(|l| l.id == id)?;
        Some(self.layers.remove(idx))
    }

    /// Make the layer visible and return the extent to zoom to.
    ///
    /// The outer `None` means no such layer, the inner one a layer without
    /// coordinates.
    pub fn focus(&mut self, id: Uuid) -> Option<Option<(f64, f64, f64, f64)>> {
        let layer = self.layers.iter_mut().find(|l| l.id == id)?;
        layer.visible = true;
        Some(layer.data.bbox())
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    pub fn as_slice(&self) -> &[Layer] {
        &self.layers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Feature, Geometry};
    use geo::Coord;

    fn point_collection(x: f64, y: f64) -> FeatureCollection {
        FeatureCollection::new(vec![Feature::from_geometry(Geometry::Point(Coord {
            x,
            y,
        }))])
    }

    #[test]
    fn test_colors_cycle() {
        let mut set = LayerSet::new();
        let colors: Vec<&str> = (0..11).map(|_| set.next_color()).collect();
        assert_eq!(colors[0], LAYER_PALETTE[0]);
        assert_eq!(colors[9], LAYER_PALETTE[9]);
        assert_eq!(colors[10], LAYER_PALETTE[0]);
    }

    #[test]
    fn test_toggle_and_remove() {
        let mut set = LayerSet::new();
        let a = set.add("a", point_collection(1.0, 1.0));
        let b = set.add("b", point_collection(2.0, 2.0));

        assert_eq!(set.toggle(a), Some(false));
        assert_eq!(set.toggle(a), Some(true));
        assert!(set.remove(a).is_some());
        assert!(set.toggle(a).is_none());
        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().next().map(|l| l.id), Some(b));
    }

    #[test]
    fn test_focus_makes_visible() {
        let mut set = LayerSet::new();
        let id = set.push(Layer::new("a", "#000000", point_collection(3.0, 4.0)).hidden());

        let bbox = set.focus(id).flatten();
        assert_eq!(bbox, Some((3.0, 4.0, 3.0, 4.0)));
        assert!(set.get(id).unwrap().visible);
    }

    #[test]
    fn test_focus_unknown() {
        let mut set = LayerSet::new();
        assert!(set.focus(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_contains_name() {
        let mut set = LayerSet::new();
        set.add("bursa ova", FeatureCollection::empty());
        assert!(set.contains_name("bursa ova"));
        assert!(!set.contains_name("BOKA"));
    }

    #[test]
    fn test_summary() {
        let layer = Layer::new("ova", LAYER_PALETTE[2], point_collection(1.0, 2.0)).hidden();
        let summary = layer.summary();
        assert_eq!(summary.id, layer.id);
        assert_eq!(summary.name, "ova");
        assert!(!summary.visible);
        assert_eq!(summary.color, LAYER_PALETTE[2]);
        assert_eq!(summary.feature_count, 1);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["feature_count"], 1);
        assert_eq!(json["name"], "ova");
    }
}
