use indexmap::IndexMap;
use macroquad::prelude::*;

use crate::error::Result;
use crate::tileset::{arrange_tileset, AtlasCell, Tileset};

/// Named regions of one sprite sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteAtlas {
    /// Sheet image path.
    pub image: String,
    /// Cell width in pixels.
    pub tile_width: u32,
    /// Cell height in pixels.
    pub tile_height: u32,
    /// Gap after each cell, both axes.
    pub padding: u32,
    /// Sprite name to grid cell.
    pub cells: IndexMap<String, AtlasCell>,
}

impl SpriteAtlas {
    /// One `Tile{gid}` sprite per cell of the tileset, padded by its margin.
    pub fn from_tileset(tileset: &Tileset) -> Result<Self> {
        Ok(SpriteAtlas {
            image: tileset.image.clone(),
            tile_width: tileset.tile_width,
            tile_height: tileset.tile_height,
            padding: tileset.margin,
            cells: arrange_tileset(tileset)?,
        })
    }

    /// Pixel rectangle of `cell` in the sheet.
    pub fn source_rect(&self, cell: AtlasCell) -> Rect {
        let stride_x = self.tile_width as f32 + self.padding as f32;
        let stride_y = self.tile_height as f32 + self.padding as f32;
        Rect::new(
            cell.column as f32 * stride_x,
            cell.row as f32 * stride_y,
            self.tile_width as f32,
            self.tile_height as f32,
        )
    }
}
