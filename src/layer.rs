use serde::Deserialize;

/// One tile layer as exported by Tiled.
///
/// `data` is row-major, `width * height` long. 0 means no tile, anything else
/// is a global tile id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Layer {
    /// Layer name, unique within a map.
    #[serde(default)]
    pub name: String,
    /// Width in tiles.
    #[serde(default)]
    pub width: u32,
    /// Height in tiles.
    #[serde(default)]
    pub height: u32,
    /// Global tile ids.
    #[serde(default)]
    pub data: Vec<u32>,
    /// Tiled layer type, `"tilelayer"` for tile grids.
    #[serde(rename = "type", default = "tile_layer")]
    pub kind: String,
}

fn tile_layer() -> String {
    "tilelayer".to_owned()
}

impl Layer {
    /// Tile layer with the given grid.
    pub fn new(name: impl Into<String>, width: u32, height: u32, data: Vec<u32>) -> Self {
        Layer {
            name: name.into(),
            width,
            height,
            data,
            kind: tile_layer(),
        }
    }

    /// Object groups and image layers carry no tile grid and are skipped.
    pub fn is_tile_layer(&self) -> bool {
        self.kind == "tilelayer"
    }

    /// Linear index of a cell, `row * width + column`.
    #[inline]
    pub fn tile_index(&self, row: u32, column: u32) -> usize {
        (self.width as usize) * (row as usize) + column as usize
    }

    /// Global tile id at a linear index, if the index is inside the data.
    #[inline]
    pub fn gid_at(&self, index: usize) -> Option<u32> {
        self.data.get(index).copied()
    }

    pub(crate) fn has_consistent_size(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.data.len() == (self.width as usize) * (self.height as usize)
    }
}
