//! KMZ (zipped KML) parsing.

use std::io::{Cursor, Read};

use tracing::{debug, info, warn};

use crate::error::ParseFailure;
use crate::models::{Feature, FeatureCollection};

use super::kml;

/// Whether an archive entry may hold KML.
///
/// Accepts `.kml` and `.xml` entries plus extensionless `doc` entries, and
/// skips macOS resource forks and AppleDouble files.
pub fn is_markup_entry(name: &str) -> bool {
    let lower = name.to_lowercase();
    (lower.ends_with(".kml") || lower.ends_with(".xml") || name.ends_with("doc"))
        && !name.contains("__MACOSX")
        && !name.starts_with("._")
}

/// Parse a KMZ archive.
///
/// Only a failure to open the archive is an error. Each markup entry is
/// parsed on its own; an entry that fails is logged and skipped.
pub fn parse(bytes: &[u8]) -> Result<FeatureCollection, ParseFailure> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;

    // Selected by name only; opening an entry may fail on its own
    let candidates: Vec<usize> = (0..archive.len())
        .filter(|&i| {
            archive
                .name_for_index(i)
                .is_some_and(|name| !name.ends_with('/') && is_markup_entry(name))
        })
        .collect();

    info!(
        "KMZ archive has {} entries, {} candidate markup files",
        archive.len(),
        candidates.len()
    );

    let mut features: Vec<Feature> = Vec::new();
    for i in candidates {
        let mut entry = match archive.by_index(i) {
            Ok(e) => e,
            Err(e) => {
                warn!("Could not open KMZ entry #{}: {}", i, e);
                continue;
            }
        };
        let name = entry.name().to_string();

        let mut raw = Vec::new();
        if let Err(e) = entry.read_to_end(&mut raw) {
            warn!("Could not read KMZ entry {}: {}", name, e);
            continue;
        }

        match kml::parse(&raw) {
            Ok(collection) => {
                debug!("KMZ entry {}: {} features", name, collection.len());
                features.extend(collection.features);
            }
            Err(e) => warn!("Skipping unreadable KMZ entry {}: {}", name, e),
        }
    }

    Ok(FeatureCollection::new(features))
}
