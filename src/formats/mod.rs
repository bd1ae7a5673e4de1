//! Map file ingestion.
//!
//! Detects the format of an uploaded file, decodes and cleans its text, and
//! converts KML, KMZ or GeoJSON into the canonical feature collection.
//! The router retries a failed parse once with the sibling format.

mod attempt;
mod detect;
pub mod geojson;
pub mod kml;
pub mod kmz;
pub mod markup;
mod router;
pub mod text;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use attempt::Attempt;
pub use detect::FileType;
pub use router::{parse_file, parse_many, route, Parsed, SourceFile};
