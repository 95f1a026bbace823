use std::path::{Path, PathBuf};

use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::{MapError, Result};
use crate::map::MapSource;

const INLINE: &str = "<inline>";

/// Decode a Tiled JSON document. `null` counts as an absent source.
///
/// Missing fields and values of the wrong type are [`MapError::InvalidMapSource`];
/// [`MapError::Json`] is kept for text that is not JSON at all.
pub fn decode_map_value(value: JsonValue) -> Result<MapSource> {
    if value.is_null() {
        return Err(MapError::invalid("source is absent"));
    }
    serde_json::from_value(value).map_err(|err| MapError::invalid(err.to_string()))
}

/// Decode a Tiled JSON export held in memory.
pub fn decode_map_str(json: &str) -> Result<MapSource> {
    let value: JsonValue = serde_json::from_str(json).map_err(|source| MapError::Json {
        path: PathBuf::from(INLINE),
        source,
    })?;
    decode_map_value(value)
}

/// Read and decode a `.json` map file.
pub fn decode_map_file(path: &Path) -> Result<MapSource> {
    if path.extension().and_then(|e| e.to_str()) != Some("json") {
        return Err(MapError::invalid(format!(
            "map file must be a JSON file: {}",
            path.display()
        )));
    }

    let txt = std::fs::read_to_string(path).map_err(|source| MapError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: JsonValue = serde_json::from_str(&txt).map_err(|source| MapError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let source = decode_map_value(value).map_err(|err| match err {
        MapError::InvalidMapSource(reason) => {
            MapError::invalid(format!("{}: {reason}", path.display()))
        }
        other => other,
    })?;
    debug!(path = %path.display(), layers = source.layers.len(), "decoded map file");
    Ok(source)
}

impl MapSource {
    /// See [`decode_map_str`].
    pub fn from_json_str(json: &str) -> Result<Self> {
        decode_map_str(json)
    }

    /// See [`decode_map_file`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        decode_map_file(path.as_ref())
    }
}
