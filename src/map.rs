use std::collections::HashSet;
use std::fmt;

use serde::Deserialize;

use crate::error::{MapError, Result};
use crate::layer::Layer;
use crate::tileset::Tileset;

/// Map projection as written in the Tiled `orientation` field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum Orientation {
    /// Square grid.
    #[default]
    Orthogonal,
    /// Isometric diamond (`"isometric"`).
    Isometric,
    /// Isometric staggered (`"staggered"`).
    Staggered,
    /// Anything else. Kept so the failure surfaces at projection time.
    Other(String),
}

impl From<String> for Orientation {
    fn from(value: String) -> Self {
        match value.as_str() {
            "orthogonal" => Orientation::Orthogonal,
            "isometric" => Orientation::Isometric,
            "staggered" => Orientation::Staggered,
            _ => Orientation::Other(value),
        }
    }
}

impl Orientation {
    /// Tiled spelling of the orientation.
    pub fn as_str(&self) -> &str {
        match self {
            Orientation::Orthogonal => "orthogonal",
            Orientation::Isometric => "isometric",
            Orientation::Staggered => "staggered",
            Orientation::Other(s) => s,
        }
    }

    /// Diamond and staggered maps both go through the isometric placement helper.
    pub fn is_isometric(&self) -> bool {
        matches!(self, Orientation::Isometric | Orientation::Staggered)
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tiled map export. Read-only once handed to a builder.
#[derive(Debug, Clone, Deserialize)]
pub struct MapSource {
    /// Width in tiles.
    #[serde(default)]
    pub width: u32,
    /// Height in tiles.
    #[serde(default)]
    pub height: u32,
    /// Tile width in pixels.
    #[serde(rename = "tilewidth", default)]
    pub tile_width: u32,
    /// Tile height in pixels.
    #[serde(rename = "tileheight", default)]
    pub tile_height: u32,
    /// Projection.
    #[serde(default)]
    pub orientation: Orientation,
    /// Layers in draw order.
    #[serde(default)]
    pub layers: Vec<Layer>,
    /// Tilesets.
    #[serde(default)]
    pub tilesets: Vec<Tileset>,
}

impl MapSource {
    /// Check the map is complete enough to build a world from.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(MapError::invalid(format!(
                "map needs positive width and height, got {}x{}",
                self.width, self.height
            )));
        }
        if self.layers.is_empty() {
            return Err(MapError::invalid("map has no layers"));
        }
        if self.tilesets.is_empty() {
            return Err(MapError::invalid("map has no tilesets"));
        }
        for tileset in &self.tilesets {
            tileset.check()?;
        }

        let mut names = HashSet::new();
        for layer in self.tile_layers() {
            if !names.insert(layer.name.as_str()) {
                return Err(MapError::invalid(format!(
                    "duplicate layer name '{}'",
                    layer.name
                )));
            }
            if !layer.has_consistent_size() {
                return Err(MapError::invalid(format!(
                    "layer '{}' data length {} does not match {}x{}",
                    layer.name,
                    layer.data.len(),
                    layer.width,
                    layer.height
                )));
            }
        }
        Ok(())
    }

    /// Layers that carry a tile grid.
    pub fn tile_layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter().filter(|l| l.is_tile_layer())
    }

    /// Tile layer by name.
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.tile_layers().find(|l| l.name == name)
    }

    /// Whether the map goes through the isometric placement helper.
    pub fn is_isometric(&self) -> bool {
        self.orientation.is_isometric()
    }
}
