//! Catalogue of named maps available for loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::formats::{FileType, SourceFile};
use crate::workspace::{Loaded, Workspace};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub name: String,
    pub path: PathBuf,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn source_file(&self) -> Result<SourceFile> {
        SourceFile::read(&self.path)
            .with_context(|| format!("Failed to read map file: {}", self.path.display()))
    }
}

/// Named maps in the order they were listed
#[derive(Debug, Clone, Default)]
pub struct MapCatalog {
    entries: Vec<CatalogEntry>,
}

impl MapCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Explicit `[[maps]]` first, then anything new found under `maps_dir`
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut catalog = Self::new(
            config
                .maps
                .iter()
                .map(|m| CatalogEntry::new(&m.name, &m.file))
                .collect(),
        );

        if let Some(dir) = &config.global.maps_dir {
            for entry in scan_dir(dir)? {
                if catalog.entries.iter().any(|e| e.path == entry.path) {
                    continue;
                }
                if catalog.get(&entry.name).is_some() {
                    warn!(
                        "Skipping {}: a map named '{}' is already listed",
                        entry.path.display(),
                        entry.name
                    );
                    continue;
                }
                catalog.entries.push(entry);
            }
        }

        info!("Map catalogue has {} entries", catalog.entries.len());
        Ok(catalog)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn is_loaded(&self, name: &str, workspace: &Workspace) -> bool {
        workspace.layers().contains_name(name)
    }

    /// Read a catalogue map from disk and load it into the workspace
    pub fn load_into(&self, name: &str, workspace: &mut Workspace) -> Result<Loaded> {
        let entry = self
            .get(name)
            .with_context(|| format!("No map named '{}' in the catalogue", name))?;
        let file = entry.source_file()?;
        let loaded = workspace.load_named(&entry.name, &file)?;
        Ok(loaded)
    }
}

/// Supported map files below `dir` in file name order, named by file stem
pub fn scan_dir(dir: &Path) -> Result<Vec<CatalogEntry>> {
    if !dir.exists() {
        warn!("Map directory not found: {}", dir.display());
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if file_name.starts_with('.') || FileType::detect(file_name) == FileType::Unknown {
            continue;
        }

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name)
            .to_string();
        entries.push(CatalogEntry::new(name, path));
    }

    info!("Found {} map files in {}", entries.len(), dir.display());
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GlobalConfig, MapConfig};
    use std::fs;

    const REGION: &str = r#"{"type":"Polygon","coordinates":[[[0,0],[0,10],[10,10],[10,0]]]}"#;

    #[test]
    fn test_scan_dir_filters_and_names() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("OVALAR.geojson"), REGION).unwrap();
        fs::write(dir.path().join("bursaova.kml"), "<kml/>").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        fs::write(dir.path().join(".hidden.kml"), "<kml/>").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("BOKA.kmz"), "x").unwrap();

        let entries = scan_dir(dir.path()).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["OVALAR", "bursaova", "BOKA"]);
    }

    #[test]
    fn test_scan_missing_dir() {
        assert!(scan_dir(Path::new("/nonexistent/maps")).unwrap().is_empty());
    }

    #[test]
    fn test_from_config_merges_listed_and_scanned() {
        let dir = tempfile::tempdir().unwrap();
        let listed = dir.path().join("ova.geojson");
        fs::write(&listed, REGION).unwrap();
        fs::write(dir.path().join("other.geojson"), REGION).unwrap();

        let config = Config {
            global: GlobalConfig {
                maps_dir: Some(dir.path().to_path_buf()),
            },
            maps: vec![MapConfig {
                name: "bursa ova".to_string(),
                file: listed.clone(),
            }],
        };
        let catalog = MapCatalog::from_config(&config).unwrap();
        let names: Vec<&str> = catalog.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["bursa ova", "other"]);
    }

    #[test]
    fn test_load_into_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ova.geojson");
        fs::write(&path, REGION).unwrap();
        let catalog = MapCatalog::new(vec![CatalogEntry::new("ova", &path)]);

        let mut ws = Workspace::new();
        assert!(!catalog.is_loaded("ova", &ws));
        catalog.load_into("ova", &mut ws).unwrap();
        assert!(catalog.is_loaded("ova", &ws));
        assert!(catalog.load_into("ova", &mut ws).is_err());
        assert!(catalog.load_into("missing", &mut ws).is_err());
    }
}
