//! Minimal entity store standing in for the host engine.
//!
//! Entities are plain records in an arena, addressed by generational ids.
//! Capabilities are string tags checked by set membership.

mod isometric;
mod sprite;
mod world;

pub use isometric::Isometric;
pub use sprite::SpriteAtlas;
pub use world::{Entity, EntityRecord, World};
