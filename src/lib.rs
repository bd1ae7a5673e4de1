//! GeoVisor - load KML, KMZ and GeoJSON maps and compare them.
//!
//! Files are normalized into one feature collection model, then checked
//! against the already loaded layers: do new points fall inside existing
//! regions, and do new regions cover existing points.

pub mod catalog;
pub mod config;
pub mod error;
pub mod formats;
pub mod models;
pub mod pip;
pub mod workspace;

pub use error::{Error, Result};
pub use formats::{parse_file, FileType, SourceFile};
pub use models::{Feature, FeatureCollection, Geometry, Layer, LayerSet};
pub use workspace::{Loaded, Workspace};
