use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::view::Viewport;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, MapError>;

/// Error type for map import and world building.
#[derive(Debug, Error)]
pub enum MapError {
    /// The map description is malformed or incomplete.
    #[error("invalid map source: {0}")]
    InvalidMapSource(String),

    /// The map orientation has no projection.
    #[error("orientation of map '{0}' is not supported")]
    UnsupportedOrientation(String),

    /// Feature that exists in the API but is not implemented.
    #[error("not supported: {0}")]
    NotSupported(&'static str),

    /// Requested view does not fit inside a layer.
    #[error("viewport {viewport:?} is out of bounds for layer '{layer}'")]
    ViewportOutOfBounds {
        /// Layer the viewport was checked against.
        layer: String,
        /// The rejected viewport.
        viewport: Viewport,
    },

    /// A data index points past the end of a layer.
    #[error("index {index} is outside layer '{layer}'")]
    IndexOutOfBounds {
        /// Layer being read.
        layer: String,
        /// Offending linear index.
        index: usize,
    },

    /// An operation needs a map source but none was set.
    #[error("no map source set")]
    NoSource,

    /// The background indexing job failed.
    #[error("background computation failed: {0}")]
    Background(String),

    /// File I/O error while reading a map.
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// JSON parse error.
    #[error("JSON parse error in {}: {source}", path.display())]
    Json {
        /// File (or `<inline>`) being parsed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

impl MapError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        MapError::InvalidMapSource(reason.into())
    }
}
