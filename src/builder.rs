use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use indexmap::IndexMap;
use tracing::{debug, info};

use crate::config::{BuilderConfig, RenderMethod};
use crate::engine::{Entity, Isometric, SpriteAtlas, World};
use crate::error::{MapError, Result};
use crate::indexer::{LayerDescriptors, MapIndexer, Slot};
use crate::loader::json_loader::decode_map_str;
use crate::map::{MapSource, Orientation};
use crate::view::Viewport;
use crate::worker::IndexingJob;

/// Entities per layer in scan order, with [`Slot::Empty`] where the layer has no tile.
pub type LayerMap = IndexMap<String, Vec<Slot<Entity>>>;

type ViewCallback = Box<dyn FnMut(&mut WorldBuilder)>;

/// Turns a Tiled map into one entity per visible tile.
///
/// ```no_run
/// use tiled_world_builder::{BuilderConfig, WorldBuilder};
///
/// # fn main() -> tiled_world_builder::Result<()> {
/// let json = std::fs::read_to_string("assets/map.json").unwrap();
/// let mut builder = WorldBuilder::new(BuilderConfig::default());
/// builder.set_source_json(&json)?.create_world(|map| {
///     for platform in map.entities_in_layer("platforms").unwrap_or_default() {
///         map.world_mut().add_tag(platform, "solid");
///     }
/// })?;
/// # Ok(())
/// # }
/// ```
pub struct WorldBuilder {
    config: BuilderConfig,
    source: Option<Arc<MapSource>>,
    isometric: Option<Isometric>,
    layers: LayerMap,
    world: World,
    pending: Vec<IndexingJob>,
    callback: Option<ViewCallback>,
}

impl fmt::Debug for WorldBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorldBuilder")
            .field("config", &self.config)
            .field("orientation", &self.orientation())
            .field("layers", &self.layers.len())
            .field("entities", &self.world.len())
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl Default for WorldBuilder {
    fn default() -> Self {
        WorldBuilder::new(BuilderConfig::default())
    }
}

impl WorldBuilder {
    /// Builder with an empty entity store.
    pub fn new(config: BuilderConfig) -> Self {
        WorldBuilder {
            config,
            source: None,
            isometric: None,
            layers: LayerMap::new(),
            world: World::new(),
            pending: Vec::new(),
            callback: None,
        }
    }

    /// Validate and adopt a map. Registers one sprite atlas per tileset.
    ///
    /// Nothing changes when validation fails. Adopting a map tears down the
    /// current view, drops jobs still running against the previous map and
    /// replaces its sprite atlases.
    pub fn set_source(&mut self, source: MapSource) -> Result<&mut Self> {
        source.validate()?;
        let atlases = source
            .tilesets
            .iter()
            .map(SpriteAtlas::from_tileset)
            .collect::<Result<Vec<_>>>()?;

        info!(
            width = source.width,
            height = source.height,
            orientation = %source.orientation,
            layers = source.layers.len(),
            tilesets = source.tilesets.len(),
            "map source accepted"
        );

        if !self.pending.is_empty() {
            debug!(jobs = self.pending.len(), "dropping jobs of the previous map");
            self.pending.clear();
        }
        self.destroy_view();
        self.world.clear_sprites();
        for atlas in atlases {
            self.world.register_sprite(atlas);
        }
        self.isometric = source
            .is_isometric()
            .then(|| Isometric::size(source.tile_width, source.tile_height));
        self.source = Some(Arc::new(source));
        Ok(self)
    }

    /// Decode a Tiled JSON export and adopt it.
    pub fn set_source_json(&mut self, json: &str) -> Result<&mut Self> {
        let source = decode_map_str(json)?;
        self.set_source(source)
    }

    /// Materialize the whole map. See [`WorldBuilder::create_view`].
    pub fn create_world(
        &mut self,
        callback: impl FnMut(&mut WorldBuilder) + 'static,
    ) -> Result<&mut Self> {
        let source = self.source.as_ref().ok_or(MapError::NoSource)?;
        let (width, height) = (source.width, source.height);
        self.create_view(0, 0, width, height, callback)
    }

    /// Materialize a rectangle of tiles and then call `callback`.
    ///
    /// With background work enabled this only dispatches the indexing job;
    /// entities appear when [`WorldBuilder::poll`] sees the result. Views
    /// dispatched back to back are not deduplicated: each completion replaces
    /// the layer map and fires the most recently registered callback.
    pub fn create_view(
        &mut self,
        start_row: u32,
        start_column: u32,
        view_width: u32,
        view_height: u32,
        callback: impl FnMut(&mut WorldBuilder) + 'static,
    ) -> Result<&mut Self> {
        let source = self.source.clone().ok_or(MapError::NoSource)?;
        let viewport = Viewport::new(start_row, start_column, view_width, view_height);
        viewport.check_bounds(&source)?;

        if self.config.background_enabled() {
            let job = IndexingJob::spawn(source, viewport, self.config.render_method)?;
            self.callback = Some(Box::new(callback));
            self.pending.push(job);
            return Ok(self);
        }

        debug!(?viewport, "indexing view inline");
        let descriptors =
            MapIndexer::new(&source, viewport, self.config.render_method).describe_view()?;
        self.callback = Some(Box::new(callback));
        self.materialize(descriptors);
        self.fire_callback();
        Ok(self)
    }

    /// Pick up finished background jobs. Call once per frame; never blocks.
    ///
    /// Returns how many views were materialized. A failed job is fatal and
    /// reported as the error.
    pub fn poll(&mut self) -> Result<usize> {
        let mut done = 0;
        let mut i = 0;
        while i < self.pending.len() {
            match self.pending[i].try_take() {
                None => i += 1,
                Some(result) => {
                    self.pending.remove(i);
                    self.materialize(result?);
                    self.fire_callback();
                    done += 1;
                }
            }
        }
        Ok(done)
    }

    /// Block until every dispatched job has been materialized, in dispatch order.
    pub fn wait_pending(&mut self) -> Result<()> {
        while !self.pending.is_empty() {
            let job = self.pending.remove(0);
            self.materialize(job.wait()?);
            self.fire_callback();
        }
        Ok(())
    }

    /// Whether background jobs are still in flight.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    fn materialize(&mut self, descriptors: LayerDescriptors) {
        let mut layers = LayerMap::with_capacity(descriptors.len());
        let mut spawned = 0usize;

        for (name, slots) in descriptors {
            let mut entities = Vec::with_capacity(slots.len());
            for slot in slots {
                let tile = match slot {
                    Slot::Empty => {
                        entities.push(Slot::Empty);
                        continue;
                    }
                    Slot::Tile(tile) => tile,
                };
                let entity = self.world.spawn(&tile.head());
                self.world.set_pos(entity, tile.position);
                if let Some(iso) = &self.isometric {
                    iso.place(tile.position.x, tile.position.y, 0, entity, &mut self.world);
                }
                entities.push(Slot::Tile(entity));
                spawned += 1;
            }
            layers.insert(name, entities);
        }

        info!(layers = layers.len(), entities = spawned, "view materialized");
        self.layers = layers;
    }

    fn fire_callback(&mut self) {
        if let Some(mut callback) = self.callback.take() {
            callback(self);
            // keep it unless the callback registered a new one
            if self.callback.is_none() {
                self.callback = Some(callback);
            }
        }
    }

    /// Despawn every entity of the current view and forget the layer map.
    pub fn destroy_view(&mut self) {
        let layers = std::mem::take(&mut self.layers);
        for entity in layers.values().flatten().filter_map(Slot::tile) {
            self.world.despawn(*entity);
        }
    }

    /// Follow an entity and load views around it. Not implemented.
    pub fn lazy_loading_for_entity(&mut self, _entity: Entity) -> Result<()> {
        Err(MapError::NotSupported("lazy loading for entity"))
    }

    /// Tile entities of a layer in scan order, skipping empty cells.
    /// `None` for unknown layers.
    pub fn entities_in_layer(&self, layer_name: &str) -> Option<Vec<Entity>> {
        let slots = self.layers.get(layer_name)?;
        Some(slots.iter().filter_map(Slot::tile).copied().collect())
    }

    /// Entity at `(row, column)` of a layer.
    ///
    /// The index is computed against the full source layer, so the answer is
    /// only meaningful after [`WorldBuilder::create_world`]. Within a smaller
    /// view it addresses whatever slot sits at that position.
    pub fn tile(&self, row: u32, column: u32, layer_name: &str) -> Option<Entity> {
        let slots = self.layers.get(layer_name)?;
        let index = self.tile_index(row, column, layer_name)?;
        slots.get(index)?.tile().copied()
    }

    /// Linear index of `(row, column)` in a source layer.
    pub fn tile_index(&self, row: u32, column: u32, layer_name: &str) -> Option<usize> {
        let layer = self.source.as_deref()?.layer(layer_name)?;
        Some(layer.tile_index(row, column))
    }

    /// Whether the current view has a layer of that name.
    pub fn is_layer(&self, layer_name: &str) -> bool {
        self.layers.contains_key(layer_name)
    }

    /// The layer map of the current view.
    pub fn layers(&self) -> &LayerMap {
        &self.layers
    }

    /// Render method stamped on tile entities.
    pub fn render_method(&self) -> RenderMethod {
        self.config.render_method
    }

    /// The adopted map, if any.
    pub fn source(&self) -> Option<&MapSource> {
        self.source.as_deref()
    }

    /// Placement helper, present for isometric and staggered maps.
    pub fn isometric(&self) -> Option<&Isometric> {
        self.isometric.as_ref()
    }

    /// Orientation of the adopted map.
    pub fn orientation(&self) -> Option<&Orientation> {
        self.source().map(|s| &s.orientation)
    }

    /// Diamond or staggered map.
    pub fn is_isometric(&self) -> bool {
        self.source().is_some_and(MapSource::is_isometric)
    }

    /// The entity store.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The entity store, mutably, for game-level setup such as tagging tiles.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

/// Load a map file and materialize the whole world, waiting for background work.
pub fn load_world(path: impl AsRef<Path>, config: BuilderConfig) -> anyhow::Result<WorldBuilder> {
    let path = path.as_ref();
    let source = MapSource::load(path)
        .with_context(|| format!("Loading map {}", path.display()))?;

    let mut builder = WorldBuilder::new(config);
    builder
        .set_source(source)
        .with_context(|| format!("Validating map {}", path.display()))?
        .create_world(|_| {})
        .context("Creating world")?;
    builder.wait_pending().context("Waiting for background indexing")?;
    Ok(builder)
}
