//! Application-level workflows: uploading files and loading named maps.
//!
//! Uploads run an intersection check against the current layers, named maps
//! a coverage check. Either way the new collection becomes one new layer.

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::formats::{self, SourceFile};
use crate::models::{FeatureCollection, Layer, LayerSet};
use crate::pip::{check_coverage, check_intersections, AnalysisKind, AnalysisReport};

/// Outcome of adding a map
#[derive(Debug, Clone, Serialize)]
pub struct Loaded {
    pub layer_id: Uuid,
    pub feature_count: usize,
    pub report: AnalysisReport,
}

#[derive(Debug, Default)]
pub struct Workspace {
    layers: LayerSet,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layers(&self) -> &LayerSet {
        &self.layers
    }

    /// Parse an uploaded file, check it against existing regions and add it
    /// as a layer named after the file.
    pub fn upload(&mut self, file: &SourceFile) -> Result<Loaded> {
        let collection = formats::parse_file(file)?;
        self.upload_parsed(&file.name, collection)
    }

    /// Upload for a collection that was already parsed
    pub fn upload_parsed(&mut self, file_name: &str, collection: FeatureCollection) -> Result<Loaded> {
        if collection.is_empty() {
            warn!("Upload {} has no features", file_name);
            return Err(Error::Empty);
        }

        let matches = check_intersections(&collection, self.layers.as_slice());
        info!(
            "Upload {}: inside {} existing layers",
            file_name,
            matches.len()
        );
        Ok(self.add(file_name, file_name, collection, AnalysisKind::Intersection, matches))
    }

    /// Load a named map from its file. The name must not be loaded already.
    pub fn load_named(&mut self, name: &str, file: &SourceFile) -> Result<Loaded> {
        if self.layers.contains_name(name) {
            return Err(Error::AlreadyLoaded(name.to_string()));
        }
        let collection = formats::parse_file(file)?;
        if collection.is_empty() {
            warn!("Map {} ({}) has no features", name, file.name);
            return Err(Error::Empty);
        }
        Ok(self.add_covering(name, collection))
    }

    /// Load a named map whose data is already canonical
    pub fn load_embedded(&mut self, name: &str, collection: FeatureCollection) -> Result<Loaded> {
        if self.layers.contains_name(name) {
            return Err(Error::AlreadyLoaded(name.to_string()));
        }
        Ok(self.add_covering(name, collection))
    }

    fn add_covering(&mut self, name: &str, collection: FeatureCollection) -> Loaded {
        let matches = check_coverage(&collection, self.layers.as_slice());
        info!("Map {}: covers {} existing layers", name, matches.len());
        self.add(name, name, collection, AnalysisKind::Coverage, matches)
    }

    fn add(
        &mut self,
        layer_name: &str,
        file_name: &str,
        collection: FeatureCollection,
        kind: AnalysisKind,
        matches: Vec<String>,
    ) -> Loaded {
        let feature_count = collection.len();
        let color = self.layers.next_color();
        let layer_id = self.layers.push(Layer::new(layer_name, color, collection));
        Loaded {
            layer_id,
            feature_count,
            report: AnalysisReport {
                kind,
                file_name: file_name.to_string(),
                matches,
            },
        }
    }

    pub fn toggle(&mut self, id: Uuid) -> Result<bool> {
        self.layers.toggle(id).ok_or(Error::UnknownLayer(id))
    }

    pub fn set_visible(&mut self, id: Uuid, visible: bool) -> Result<()> {
        self.layers
            .set_visible(id, visible)
            .ok_or(Error::UnknownLayer(id))
    }

    pub fn remove(&mut self, id: Uuid) -> Result<Layer> {
        self.layers.remove(id).ok_or(Error::UnknownLayer(id))
    }

    /// Show the layer and return its extent as (min_x, min_y, max_x, max_y)
    pub fn focus(&mut self, id: Uuid) -> Result<Option<(f64, f64, f64, f64)>> {
        self.layers.focus(id).ok_or(Error::UnknownLayer(id))
    }

    /// Layer id for a name, first match in load order
    pub fn find(&self, name: &str) -> Option<Uuid> {
        self.layers.iter().find(|l| l.name == name).map(|l| l.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGION: &str = r#"{"type":"Polygon","coordinates":[[[0,0],[0,10],[10,10],[10,0]]]}"#;
    const INSIDE: &str = r#"{"type":"Point","coordinates":[5,5]}"#;
    const OUTSIDE: &str = r#"{"type":"Point","coordinates":[15,15]}"#;

    fn file(name: &str, content: &str) -> SourceFile {
        SourceFile::new(name, content.as_bytes().to_vec())
    }

    #[test]
    fn test_upload_reports_intersection() {
        let mut ws = Workspace::new();
        ws.load_named("ova", &file("ova.geojson", REGION)).unwrap();

        let loaded = ws.upload(&file("well.geojson", INSIDE)).unwrap();
        assert_eq!(loaded.report.kind, AnalysisKind::Intersection);
        assert_eq!(loaded.report.matches, vec!["ova".to_string()]);
        assert_eq!(loaded.report.file_name, "well.geojson");

        let loaded = ws.upload(&file("far.geojson", OUTSIDE)).unwrap();
        assert!(loaded.report.matches.is_empty());
        assert_eq!(ws.layers().len(), 3);
    }

    #[test]
    fn test_load_named_reports_coverage() {
        let mut ws = Workspace::new();
        ws.upload(&file("well.geojson", INSIDE)).unwrap();

        let loaded = ws.load_named("ova", &file("ova.geojson", REGION)).unwrap();
        assert_eq!(loaded.report.kind, AnalysisKind::Coverage);
        assert_eq!(loaded.report.matches, vec!["well.geojson".to_string()]);
    }

    #[test]
    fn test_hidden_layer_not_covered() {
        let mut ws = Workspace::new();
        let well = ws.upload(&file("well.geojson", INSIDE)).unwrap().layer_id;
        assert!(!ws.toggle(well).unwrap());

        let loaded = ws.load_named("ova", &file("ova.geojson", REGION)).unwrap();
        assert!(loaded.report.matches.is_empty());
    }

    #[test]
    fn test_load_named_twice_rejected() {
        let mut ws = Workspace::new();
        ws.load_named("ova", &file("ova.geojson", REGION)).unwrap();
        let err = ws.load_named("ova", &file("ova.geojson", REGION)).unwrap_err();
        assert!(matches!(err, Error::AlreadyLoaded(_)));
        assert_eq!(ws.layers().len(), 1);
    }

    #[test]
    fn test_empty_upload_rejected() {
        let mut ws = Workspace::new();
        let err = ws.upload(&file("empty.kml", "<kml><Document/></kml>")).unwrap_err();
        assert!(matches!(err, Error::Empty));
        assert!(ws.layers().is_empty());
    }

    #[test]
    fn test_unreadable_upload() {
        let mut ws = Workspace::new();
        let err = ws.upload(&file("bad.kml", "<kml>")).unwrap_err();
        assert!(matches!(err, Error::Unreadable));
    }

    #[test]
    fn test_load_embedded() {
        let mut ws = Workspace::new();
        ws.upload(&file("well.geojson", INSIDE)).unwrap();
        let region = formats::parse_file(&file("r.geojson", REGION)).unwrap();
        let loaded = ws.load_embedded("embedded", region.clone()).unwrap();
        assert_eq!(loaded.report.matches, vec!["well.geojson".to_string()]);
        assert!(ws.load_embedded("embedded", region).is_err());
    }

    #[test]
    fn test_layer_operations() {
        let mut ws = Workspace::new();
        let id = ws.load_named("ova", &file("ova.geojson", REGION)).unwrap().layer_id;
        assert_eq!(ws.find("ova"), Some(id));

        ws.set_visible(id, false).unwrap();
        let bbox = ws.focus(id).unwrap();
        assert_eq!(bbox, Some((0.0, 0.0, 10.0, 10.0)));
        assert!(ws.layers().get(id).unwrap().visible);

        ws.remove(id).unwrap();
        assert!(matches!(ws.remove(id), Err(Error::UnknownLayer(_))));
        assert!(ws.find("ova").is_none());
    }

    #[test]
    fn test_layer_colors_assigned_in_order() {
        let mut ws = Workspace::new();
        let a = ws.upload(&file("a.geojson", INSIDE)).unwrap().layer_id;
        let b = ws.upload(&file("b.geojson", INSIDE)).unwrap().layer_id;
        assert_eq!(ws.layers().get(a).unwrap().color, crate::models::LAYER_PALETTE[0]);
        assert_eq!(ws.layers().get(b).unwrap().color, crate::models::LAYER_PALETTE[1]);
    }
}
