//! Index and coordinate math for turning layer data into tile descriptors.
//!
//! Nothing here touches the entity store, so the whole module can run on a
//! background thread.

use indexmap::IndexMap;
use macroquad::prelude::*;

use crate::config::RenderMethod;
use crate::error::{MapError, Result};
use crate::layer::Layer;
use crate::map::{MapSource, Orientation};
use crate::tileset::tile_name;
use crate::view::Viewport;

/// A cell in scan order: either nothing, or one value for a non-empty tile.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot<T> {
    /// Layer data was 0 here.
    Empty,
    /// A tile.
    Tile(T),
}

impl<T> Slot<T> {
    /// The tile, if any.
    pub fn tile(&self) -> Option<&T> {
        match self {
            Slot::Tile(t) => Some(t),
            Slot::Empty => None,
        }
    }

    /// True for [`Slot::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }
}

/// Everything needed to spawn the entity for one tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TileDescriptor {
    /// Global tile id.
    pub gid: u32,
    /// Render method tag.
    pub render_method: RenderMethod,
    /// Name of the owning layer.
    pub layer: String,
    /// Grid column in the source layer.
    pub column: u32,
    /// Grid row in the source layer.
    pub row: u32,
    /// Projected position.
    pub position: Vec2,
}

impl TileDescriptor {
    /// Sprite name, `Tile{gid}`.
    pub fn tile_name(&self) -> String {
        tile_name(self.gid)
    }

    /// Capability head for the entity: `2D,{render},Tile{gid},{layer}`.
    pub fn head(&self) -> String {
        format!(
            "2D,{},{},{}",
            self.render_method.as_str(),
            self.tile_name(),
            self.layer
        )
    }
}

/// Descriptor sequences keyed by layer name, in source layer order.
pub type LayerDescriptors = IndexMap<String, Vec<Slot<TileDescriptor>>>;

/// Linear data indices covering `viewport`, row by row.
///
/// No bounds checks happen here; callers check the viewport first.
pub fn compute_indices(layer: &Layer, viewport: &Viewport) -> Vec<usize> {
    let mut indices = Vec::with_capacity(viewport.area());
    for row in viewport.start_row..viewport.start_row + viewport.view_height {
        let start = layer.tile_index(row, viewport.start_column);
        indices.extend(start..start + viewport.view_width as usize);
    }
    indices
}

/// Position of a grid cell under the map's projection.
pub fn project_position(column: u32, row: u32, source: &MapSource) -> Result<Vec2> {
    let tw = source.tile_width as f64;
    let th = source.tile_height as f64;
    match &source.orientation {
        Orientation::Orthogonal => Ok(vec2(
            (column as f64 * tw) as f32,
            (row as f64 * th) as f32,
        )),
        Orientation::Isometric => {
            let left = (column as f64 - row as f64) * (tw / 2.0);
            let top = (column as f64 + row as f64) * (th / 2.0);
            Ok(px2pos(left, top, tw, th))
        }
        // the isometric placement helper turns these into pixels later
        Orientation::Staggered => Ok(vec2(column as f32, row as f32)),
        Orientation::Other(name) => Err(MapError::UnsupportedOrientation(name.clone())),
    }
}

/// Pixel offset to staggered grid position.
///
/// `%` keeps the sign of `top`, same as a floating point remainder.
pub fn px2pos(left: f64, top: f64, tile_width: f64, tile_height: f64) -> Vec2 {
    let x = -(-left / tile_width - (top % 2.0) * 0.5).ceil();
    let y = top / tile_height * 2.0;
    vec2(x as f32, y as f32)
}

/// Describe the cell at `index`, or [`Slot::Empty`] when it holds no tile.
pub fn describe_tile(
    layer: &Layer,
    index: usize,
    source: &MapSource,
    render_method: RenderMethod,
) -> Result<Slot<TileDescriptor>> {
    let gid = layer
        .gid_at(index)
        .filter(|_| layer.width > 0)
        .ok_or_else(|| MapError::IndexOutOfBounds {
            layer: layer.name.clone(),
            index,
        })?;
    if gid == 0 {
        return Ok(Slot::Empty);
    }

    let width = layer.width as usize;
    let column = (index % width) as u32;
    let row = (index / width) as u32;
    let position = project_position(column, row, source)?;

    Ok(Slot::Tile(TileDescriptor {
        gid,
        render_method,
        layer: layer.name.clone(),
        column,
        row,
        position,
    }))
}

/// Per-call indexing context: one source, one viewport, one render method.
#[derive(Debug, Clone, Copy)]
pub struct MapIndexer<'a> {
    source: &'a MapSource,
    viewport: Viewport,
    render_method: RenderMethod,
}

impl<'a> MapIndexer<'a> {
    /// Indexer for `viewport` of `source`.
    pub fn new(source: &'a MapSource, viewport: Viewport, render_method: RenderMethod) -> Self {
        MapIndexer {
            source,
            viewport,
            render_method,
        }
    }

    /// Descriptors for one layer, in scan order.
    pub fn describe_layer(&self, layer: &Layer) -> Result<Vec<Slot<TileDescriptor>>> {
        compute_indices(layer, &self.viewport)
            .into_iter()
            .map(|index| describe_tile(layer, index, self.source, self.render_method))
            .collect()
    }

    /// Descriptors for every tile layer. Fails as a whole if any tile fails.
    pub fn describe_view(&self) -> Result<LayerDescriptors> {
        let mut layers = LayerDescriptors::with_capacity(self.source.layers.len());
        for layer in self.source.tile_layers() {
            layers.insert(layer.name.clone(), self.describe_layer(layer)?);
        }
        Ok(layers)
    }
}
