//! Format routing with a single cross-format fallback.

use std::path::Path;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::error::{Error, ParseFailure, Result};
use crate::models::FeatureCollection;

use super::attempt::Attempt;
use super::{geojson, kml, kmz, FileType};

/// Raw file contents plus the name its format is judged by
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a file from disk, naming it after its file name
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        Ok(Self::new(name, bytes))
    }
}

/// A successful parse and the format that produced it
#[derive(Debug, Clone)]
pub struct Parsed {
    pub detected: FileType,
    pub parsed_as: FileType,
    pub collection: FeatureCollection,
}

fn run(format: FileType, bytes: &[u8]) -> std::result::Result<FeatureCollection, ParseFailure> {
    match format {
        FileType::GeoJson => geojson::parse(bytes),
        FileType::Kmz => kmz::parse(bytes),
        FileType::Kml | FileType::Unknown => kml::parse(bytes),
    }
}

/// First parser to try, and the one to retry with if it fails
fn plan(detected: FileType) -> (FileType, Option<FileType>) {
    match detected {
        // Malformed JSON is final
        FileType::GeoJson => (FileType::GeoJson, None),
        // Often a plain KML saved under a .kmz name
        FileType::Kmz => (FileType::Kmz, Some(FileType::Kml)),
        // Misleading or missing extension may hide an archive
        FileType::Kml | FileType::Unknown => (FileType::Kml, Some(FileType::Kmz)),
    }
}

/// Collapse an internal failure into what the caller sees
fn surface(reason: ParseFailure) -> Error {
    match reason {
        ParseFailure::Structure(message) => Error::Structure(message),
        other => {
            warn!("Parse failed: {}", other);
            Error::Unreadable
        }
    }
}

/// Detect, parse and retry once with the fallback format.
pub fn route(name: &str, bytes: &[u8]) -> Result<Parsed> {
    let detected = FileType::detect(name);
    let (primary, fallback) = plan(detected);
    info!("Parsing {} (detected {}, trying {})", name, detected, primary);

    let (parsed_as, collection) = match Attempt::or_retry(run(primary, bytes), fallback) {
        Attempt::Success(collection) => (primary, collection),
        Attempt::Retry { with, reason } => {
            warn!(
                "Could not read {} as {}: {}; retrying as {}",
                name, primary, reason, with
            );
            match run(with, bytes) {
                Ok(collection) => (with, collection),
                Err(reason) => return Err(surface(reason)),
            }
        }
        Attempt::Failure(reason) => return Err(surface(reason)),
    };

    info!(
        "Parsed {} as {}: {} features",
        name,
        parsed_as,
        collection.len()
    );
    Ok(Parsed {
        detected,
        parsed_as,
        collection,
    })
}

/// Parse one file into its canonical feature collection
pub fn parse_file(file: &SourceFile) -> Result<FeatureCollection> {
    route(&file.name, &file.bytes).map(|parsed| parsed.collection)
}

/// Parse independent files in parallel. Results keep the input order.
pub fn parse_many(files: &[SourceFile]) -> Vec<Result<Parsed>> {
    files
        .par_iter()
        .map(|file| route(&file.name, &file.bytes))
        .collect()
}
