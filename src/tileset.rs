use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{MapError, Result};

/// Largest number of tiles one sheet may name.
pub const MAX_TILESET_TILES: u64 = 1 << 20;

/// Tileset embedded in a Tiled JSON export.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Tileset {
    /// Path of the tileset image, relative to the map.
    pub image: String,
    /// Tile width in pixels.
    #[serde(rename = "tilewidth")]
    pub tile_width: u32,
    /// Tile height in pixels.
    #[serde(rename = "tileheight")]
    pub tile_height: u32,
    /// Border around each tile in pixels.
    #[serde(default)]
    pub margin: u32,
    /// Global id of the first tile in this set.
    #[serde(rename = "firstgid")]
    pub first_gid: u32,
    /// Image width in pixels.
    #[serde(rename = "imagewidth")]
    pub image_width: u32,
    /// Image height in pixels.
    #[serde(rename = "imageheight")]
    pub image_height: u32,
}

/// Grid cell of a tile inside its tileset image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AtlasCell {
    /// Column in the sheet.
    pub column: u32,
    /// Row in the sheet.
    pub row: u32,
}

/// Sprite name for a global tile id.
#[inline]
pub fn tile_name(gid: u32) -> String {
    format!("Tile{gid}")
}

impl Tileset {
    /// Tiles per row of the sheet, counting the margin as part of each tile.
    pub fn columns(&self) -> u32 {
        ratio(self.image_width, self.tile_width, self.margin)
    }

    /// Tile rows in the sheet.
    pub fn rows(&self) -> u32 {
        ratio(self.image_height, self.tile_height, self.margin)
    }

    /// Number of tiles the sheet names.
    pub fn tile_count(&self) -> u64 {
        u64::from(self.columns()) * u64::from(self.rows())
    }

    /// Reject sheets whose tiles cannot all get a global id.
    pub fn check(&self) -> Result<()> {
        let count = self.tile_count();
        if count > MAX_TILESET_TILES {
            return Err(MapError::invalid(format!(
                "tileset '{}' names {count} tiles, more than {MAX_TILESET_TILES}",
                self.image
            )));
        }
        let last_gid = u64::from(self.first_gid) + count.saturating_sub(1);
        if last_gid > u64::from(u32::MAX) {
            return Err(MapError::invalid(format!(
                "tileset '{}' gids run past {} starting at {}",
                self.image,
                u32::MAX,
                self.first_gid
            )));
        }
        Ok(())
    }
}

fn ratio(image: u32, tile: u32, margin: u32) -> u32 {
    let cell = u64::from(tile) + u64::from(margin);
    if cell == 0 {
        return 0;
    }
    (image as f64 / cell as f64).round() as u32
}

/// Name every tile of the sheet `Tile{gid}` and map it to its cell, row-major.
pub fn arrange_tileset(tileset: &Tileset) -> Result<IndexMap<String, AtlasCell>> {
    tileset.check()?;
    let columns = tileset.columns();
    let rows = tileset.rows();

    let mut cells = IndexMap::with_capacity(tileset.tile_count() as usize);
    for row in 0..rows {
        for column in 0..columns {
            // bounded by check()
            let gid = tileset.first_gid + column + columns * row;
            cells.insert(tile_name(gid), AtlasCell { column, row });
        }
    }
    Ok(cells)
}
