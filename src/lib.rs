#![warn(missing_docs)]

//! Tiled JSON map importer that builds one entity per visible tile.
//!
//! A [`WorldBuilder`] validates a [`MapSource`], works out which tiles a
//! [`Viewport`] covers and where each one goes under the map's projection,
//! then spawns the entities into its [`World`]. Indexing can run on a
//! background thread for large maps.

mod builder;
mod config;
pub mod engine;
mod error;
pub mod indexer;
mod layer;
mod loader {
    pub mod json_loader;
}
mod map;
mod tileset;
mod view;
mod worker;

pub use builder::{load_world, LayerMap, WorldBuilder};
pub use config::{BuilderConfig, GameConstants, RenderMethod};
pub use engine::{Entity, EntityRecord, Isometric, SpriteAtlas, World};
pub use error::{MapError, Result};
pub use indexer::{LayerDescriptors, MapIndexer, Slot, TileDescriptor};
pub use layer::Layer;
pub use loader::json_loader::{decode_map_file, decode_map_str, decode_map_value};
pub use map::{MapSource, Orientation};
pub use tileset::{arrange_tileset, tile_name, AtlasCell, Tileset};
pub use view::Viewport;
pub use worker::IndexingJob;
