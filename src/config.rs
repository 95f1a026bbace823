use macroquad::prelude::*;
use serde::Deserialize;

/// How the host draws tile entities. Becomes part of each entity's capability head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum RenderMethod {
    /// Drawn onto a shared canvas.
    Canvas,
    /// One element per entity.
    #[default]
    #[serde(rename = "DOM")]
    Dom,
}

impl RenderMethod {
    /// Tag string used in entity heads.
    pub fn as_str(self) -> &'static str {
        match self {
            RenderMethod::Canvas => "Canvas",
            RenderMethod::Dom => "DOM",
        }
    }

    /// Canvas when the host entity carries a `Canvas` capability, DOM otherwise.
    pub fn from_host_tags<'a>(tags: impl IntoIterator<Item = &'a str>) -> Self {
        if tags.into_iter().any(|t| t.trim() == "Canvas") {
            RenderMethod::Canvas
        } else {
            RenderMethod::Dom
        }
    }
}

/// Settings for a [`crate::WorldBuilder`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuilderConfig {
    /// Offload indexing to a background thread where threads exist.
    #[serde(default)]
    pub use_background_worker: bool,
    /// Render method tag stamped on every tile entity.
    #[serde(default)]
    pub render_method: RenderMethod,
}

impl BuilderConfig {
    /// Background work is only dispatched when enabled and the target has threads.
    pub fn background_enabled(&self) -> bool {
        self.use_background_worker && !cfg!(target_arch = "wasm32")
    }
}

fn tile_width() -> u32 {
    32
}
fn map_side() -> u32 {
    15
}
fn char_width() -> u32 {
    32
}
fn char_height() -> u32 {
    48
}

/// Game dimensions handed to whoever needs them. Never mutated after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GameConstants {
    /// Tile edge in pixels.
    #[serde(default = "tile_width")]
    pub tile_width: u32,
    /// Map width in tiles.
    #[serde(default = "map_side")]
    pub map_width: u32,
    /// Map height in tiles.
    #[serde(default = "map_side")]
    pub map_height: u32,
    /// Character sprite width in pixels.
    #[serde(default = "char_width")]
    pub char_width: u32,
    /// Character sprite height in pixels.
    #[serde(default = "char_height")]
    pub char_height: u32,
}

impl Default for GameConstants {
    fn default() -> Self {
        GameConstants {
            tile_width: tile_width(),
            map_width: map_side(),
            map_height: map_side(),
            char_width: char_width(),
            char_height: char_height(),
        }
    }
}

impl GameConstants {
    /// Parse constants from JSON; missing keys keep their defaults.
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Window width in pixels.
    pub fn screen_width(&self) -> u32 {
        self.map_width * self.tile_width
    }

    /// Window height in pixels. Tiles are square, so this uses the tile width too.
    pub fn screen_height(&self) -> u32 {
        self.map_height * self.tile_width
    }

    /// Player start: column 1, eight rows above the bottom edge.
    pub fn player_spawn(&self) -> Vec2 {
        let row = self.map_height.saturating_sub(8);
        vec2(
            self.tile_width as f32,
            (row * self.tile_width) as f32,
        )
    }
}
