//! Error taxonomy for parsing and layer management.

use thiserror::Error;
use uuid::Uuid;

/// Why a single parse attempt failed.
///
/// These never reach the caller as-is: the router either retries with the
/// fallback format or collapses them into [`Error`].
#[derive(Debug, Error)]
pub enum ParseFailure {
    #[error("markup error: {0}")]
    Markup(String),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("invalid json: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("unexpected structure: {0}")]
    Structure(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<quick_xml::Error> for ParseFailure {
    fn from(err: quick_xml::Error) -> Self {
        ParseFailure::Markup(err.to_string())
    }
}

/// Caller-facing errors. `Display` is the message shown to the user.
#[derive(Debug, Error)]
pub enum Error {
    #[error("The file is corrupt or unreadable. Make sure it is a valid KML, KMZ or GeoJSON file.")]
    Unreadable,

    #[error("Unsupported GeoJSON structure: {0}")]
    Structure(String),

    #[error("The file is empty or contains no map features.")]
    Empty,

    #[error("A map named '{0}' is already loaded.")]
    AlreadyLoaded(String),

    #[error("No layer with id {0}.")]
    UnknownLayer(Uuid),
}

pub type Result<T> = std::result::Result<T, Error>;
