use macroquad::prelude::*;

use super::world::{Entity, World};

/// Staggered isometric placement: grid position to pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Isometric {
    tile_width: f32,
    tile_height: f32,
}

impl Isometric {
    /// Helper for tiles of the given pixel size.
    pub fn size(tile_width: u32, tile_height: u32) -> Self {
        Isometric {
            tile_width: tile_width as f32,
            tile_height: tile_height as f32,
        }
    }

    /// Tile size in pixels.
    pub fn tile_size(&self) -> Vec2 {
        vec2(self.tile_width, self.tile_height)
    }

    /// Pixel position of grid cell `(x, y)`; odd rows shift right half a tile.
    pub fn pos2px(&self, x: f32, y: f32) -> Vec2 {
        // integer parity of the truncated row, negative rows included
        let odd = (y.trunc() as i64 & 1) as f32;
        vec2(
            x * self.tile_width + odd * (self.tile_width / 2.0),
            y * self.tile_height / 2.0,
        )
    }

    /// Move `entity` to grid cell `(x, y)` lifted by `z` levels, and raise its z by `z`.
    pub fn place(&self, x: f32, y: f32, z: i32, entity: Entity, world: &mut World) -> &Self {
        let mut px = self.pos2px(x, y);
        px.y -= z as f32 * (self.tile_height / 2.0);
        if let Some(rec) = world.get_mut(entity) {
            rec.x = px.x;
            rec.y = px.y;
            rec.z += z;
        }
        self
    }
}
