use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub global: GlobalConfig,
    #[serde(default)]
    pub maps: Vec<MapConfig>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct GlobalConfig {
    /// Directory scanned for additional map files
    pub maps_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MapConfig {
    pub name: String,
    pub file: PathBuf,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.resolve_paths(base))
    }

    /// Make relative paths relative to `base`
    fn resolve_paths(mut self, base: &Path) -> Self {
        if let Some(dir) = self.global.maps_dir.take() {
            self.global.maps_dir = Some(base.join(dir));
        }
        for map in &mut self.maps {
            map.file = base.join(&map.file);
        }
        self
    }
}
