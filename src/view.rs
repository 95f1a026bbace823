use crate::error::{MapError, Result};
use crate::layer::Layer;
use crate::map::MapSource;

/// Rectangle of tiles to materialize, in tile units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Viewport {
    /// First row.
    pub start_row: u32,
    /// First column.
    pub start_column: u32,
    /// Width in tiles.
    pub view_width: u32,
    /// Height in tiles.
    pub view_height: u32,
}

impl Viewport {
    /// Viewport from origin and size.
    pub fn new(start_row: u32, start_column: u32, view_width: u32, view_height: u32) -> Self {
        Viewport {
            start_row,
            start_column,
            view_width,
            view_height,
        }
    }

    /// The whole map.
    pub fn full(source: &MapSource) -> Self {
        Viewport::new(0, 0, source.width, source.height)
    }

    /// Number of cells covered.
    pub fn area(&self) -> usize {
        self.view_width as usize * self.view_height as usize
    }

    /// Whether every cell of the viewport lies inside `layer`.
    pub fn fits(&self, layer: &Layer) -> bool {
        let end_row = self.start_row as u64 + self.view_height as u64;
        let end_column = self.start_column as u64 + self.view_width as u64;
        end_row <= layer.height as u64 && end_column <= layer.width as u64
    }

    /// Reject the viewport unless it fits every tile layer of `source`.
    pub fn check_bounds(&self, source: &MapSource) -> Result<()> {
        match source.tile_layers().find(|layer| !self.fits(layer)) {
            Some(layer) => Err(MapError::ViewportOutOfBounds {
                layer: layer.name.clone(),
                viewport: *self,
            }),
            None => Ok(()),
        }
    }
}
