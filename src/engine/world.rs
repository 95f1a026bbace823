use indexmap::{IndexMap, IndexSet};
use macroquad::prelude::*;
use tracing::debug;

use super::sprite::SpriteAtlas;
use crate::tileset::AtlasCell;

/// Stable handle to an entity. Stale handles stop resolving once despawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    id: u32,
    generation: u32,
}

impl Entity {
    /// Slot in the arena.
    #[inline]
    pub fn id(self) -> u32 {
        self.id
    }

    /// Bumped every time the slot is reused.
    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

/// Data attached to one entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityRecord {
    /// Capability tags in the order they were added.
    pub tags: IndexSet<String>,
    /// Horizontal position.
    pub x: f32,
    /// Vertical position.
    pub y: f32,
    /// Draw order.
    pub z: i32,
}

impl EntityRecord {
    /// Whether the capability tag is attached.
    pub fn has(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Position as a vector.
    pub fn pos(&self) -> Vec2 {
        vec2(self.x, self.y)
    }
}

/// Arena of entity records plus the sprite atlases they can draw from.
#[derive(Debug, Default)]
pub struct World {
    records: Vec<Option<EntityRecord>>,
    generations: Vec<u32>,
    free: Vec<u32>,
    sprites: IndexMap<String, usize>,
    atlases: Vec<SpriteAtlas>,
}

impl World {
    /// Empty world.
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, record: EntityRecord) -> Entity {
        if let Some(id) = self.free.pop() {
            self.records[id as usize] = Some(record);
            Entity {
                id,
                generation: self.generations[id as usize],
            }
        } else {
            let id = self.records.len() as u32;
            self.records.push(Some(record));
            self.generations.push(0);
            Entity { id, generation: 0 }
        }
    }

    /// Spawn an entity from a comma separated capability list, e.g. `"2D,DOM,Tile3,ground"`.
    pub fn spawn(&mut self, head: &str) -> Entity {
        let tags = head
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
            .collect();
        self.alloc(EntityRecord {
            tags,
            ..Default::default()
        })
    }

    /// Remove an entity. Returns false for stale handles.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        self.records[entity.id as usize] = None;
        self.generations[entity.id as usize] += 1;
        self.free.push(entity.id);
        true
    }

    /// Whether the handle still points at a live entity.
    pub fn is_alive(&self, entity: Entity) -> bool {
        let idx = entity.id as usize;
        idx < self.generations.len()
            && self.generations[idx] == entity.generation
            && self.records[idx].is_some()
    }

    /// Live entity count.
    pub fn len(&self) -> usize {
        self.records.len() - self.free.len()
    }

    /// True when no entity is alive.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record of a live entity.
    pub fn get(&self, entity: Entity) -> Option<&EntityRecord> {
        if !self.is_alive(entity) {
            return None;
        }
        self.records[entity.id as usize].as_ref()
    }

    /// Mutable record of a live entity.
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut EntityRecord> {
        if !self.is_alive(entity) {
            return None;
        }
        self.records[entity.id as usize].as_mut()
    }

    /// Set x and y. No-op on stale handles.
    pub fn set_pos(&mut self, entity: Entity, pos: Vec2) {
        if let Some(rec) = self.get_mut(entity) {
            rec.x = pos.x;
            rec.y = pos.y;
        }
    }

    /// Attach a capability tag. Returns false on stale handles.
    pub fn add_tag(&mut self, entity: Entity, tag: &str) -> bool {
        match self.get_mut(entity) {
            Some(rec) => {
                rec.tags.insert(tag.to_owned());
                true
            }
            None => false,
        }
    }

    /// Whether a live entity carries `tag`.
    pub fn has_tag(&self, entity: Entity, tag: &str) -> bool {
        self.get(entity).is_some_and(|rec| rec.has(tag))
    }

    /// Live entities carrying `tag`, in arena order.
    pub fn query_tag<'w>(&'w self, tag: &'w str) -> impl Iterator<Item = Entity> + 'w {
        self.records
            .iter()
            .enumerate()
            .filter_map(move |(id, rec)| match rec {
                Some(rec) if rec.has(tag) => Some(Entity {
                    id: id as u32,
                    generation: self.generations[id],
                }),
                _ => None,
            })
    }

    /// Register a sprite atlas. Later atlases win on name clashes.
    pub fn register_sprite(&mut self, atlas: SpriteAtlas) {
        let idx = self.atlases.len();
        for name in atlas.cells.keys() {
            self.sprites.insert(name.clone(), idx);
        }
        debug!(image = %atlas.image, tiles = atlas.cells.len(), "registered sprite atlas");
        self.atlases.push(atlas);
    }

    /// Forget every registered atlas.
    pub fn clear_sprites(&mut self) {
        self.sprites.clear();
        self.atlases.clear();
    }

    /// Atlas and cell a sprite name resolves to.
    pub fn sprite(&self, name: &str) -> Option<(&SpriteAtlas, AtlasCell)> {
        let atlas = &self.atlases[*self.sprites.get(name)?];
        let cell = *atlas.cells.get(name)?;
        Some((atlas, cell))
    }

    /// Pixel rectangle of a sprite inside its atlas image.
    pub fn sprite_rect(&self, name: &str) -> Option<Rect> {
        let (atlas, cell) = self.sprite(name)?;
        Some(atlas.source_rect(cell))
    }

    /// Registered atlases in registration order.
    pub fn atlases(&self) -> &[SpriteAtlas] {
        &self.atlases
    }
}
