// tests/builder_tests.rs

use std::cell::Cell;
use std::rc::Rc;

use macroquad::prelude::vec2;
use tiled_world_builder::{BuilderConfig, MapError, Orientation, RenderMethod, WorldBuilder};

const ORTHO_MAP: &str = r#"
{
  "width": 4,
  "height": 2,
  "tilewidth": 32,
  "tileheight": 32,
  "orientation": "orthogonal",
  "layers": [
    { "name": "ground", "type": "tilelayer", "width": 4, "height": 2,
      "data": [0, 1, 2, 0, 3, 0, 0, 4] },
    { "name": "platforms", "type": "tilelayer", "width": 4, "height": 2,
      "data": [0, 0, 0, 0, 0, 5, 5, 0] }
  ],
  "tilesets": [
    { "image": "tiles.png", "tilewidth": 32, "tileheight": 32, "margin": 0,
      "firstgid": 1, "imagewidth": 128, "imageheight": 64 }
  ]
}
"#;

fn map_with_orientation(orientation: &str) -> String {
    ORTHO_MAP.replace("\"orthogonal\"", &format!("\"{orientation}\""))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn builder(config: BuilderConfig) -> WorldBuilder {
    init_tracing();
    let mut builder = WorldBuilder::new(config);
    builder.set_source_json(ORTHO_MAP).expect("valid map");
    builder
}

#[test]
fn create_world_spawns_one_entity_per_tile() {
    let mut map = builder(BuilderConfig::default());
    let fired = Rc::new(Cell::new(0));
    let seen = fired.clone();
    map.create_world(move |m| {
        seen.set(seen.get() + 1);
        assert_eq!(m.entities_in_layer("ground").map(|e| e.len()), Some(4));
    })
    .expect("world");

    assert_eq!(fired.get(), 1);
    assert_eq!(map.world().len(), 6);

    let ground = &map.layers()["ground"];
    assert_eq!(ground.len(), 8);
    assert!(ground[0].is_empty());
    assert!(ground[3].is_empty());

    let first = *ground[1].tile().expect("tile at index 1");
    let rec = map.world().get(first).expect("alive");
    assert_eq!(rec.pos(), vec2(32.0, 0.0));
    assert!(rec.has("2D"));
    assert!(rec.has("DOM"));
    assert!(rec.has("Tile1"));
    assert!(rec.has("ground"));
}

#[test]
fn layer_map_keeps_source_layer_order() {
    let mut map = builder(BuilderConfig::default());
    map.create_world(|_| {}).unwrap();
    let names: Vec<&str> = map.layers().keys().map(String::as_str).collect();
    assert_eq!(names, ["ground", "platforms"]);
}

#[test]
fn render_method_is_stamped_on_entities() {
    let mut map = builder(BuilderConfig {
        render_method: RenderMethod::Canvas,
        ..Default::default()
    });
    map.create_world(|_| {}).unwrap();
    assert_eq!(map.render_method(), RenderMethod::Canvas);
    for e in map.entities_in_layer("platforms").unwrap() {
        assert!(map.world().has_tag(e, "Canvas"));
        assert!(!map.world().has_tag(e, "DOM"));
    }
}

#[test]
fn unknown_layer_is_none() {
    let mut map = builder(BuilderConfig::default());
    map.create_world(|_| {}).unwrap();
    assert!(map.entities_in_layer("nonexistent").is_none());
    assert!(map.tile(0, 0, "nonexistent").is_none());
    assert!(!map.is_layer("nonexistent"));
}

#[test]
fn entities_in_layer_is_stable_between_calls() {
    let mut map = builder(BuilderConfig::default());
    map.create_world(|_| {}).unwrap();
    let a = map.entities_in_layer("ground").unwrap();
    let b = map.entities_in_layer("ground").unwrap();
    assert_eq!(a, b);
}

#[test]
fn get_tile_after_full_world() {
    let mut map = builder(BuilderConfig::default());
    map.create_world(|_| {}).unwrap();

    let tile = map.tile(1, 3, "ground").expect("tile at row 1 column 3");
    assert!(map.world().has_tag(tile, "Tile4"));
    assert_eq!(map.world().get(tile).unwrap().pos(), vec2(96.0, 32.0));
    assert!(map.tile(0, 0, "ground").is_none());
    assert_eq!(map.tile_index(1, 3, "ground"), Some(7));
}

#[test]
fn get_tile_indexes_source_width_even_inside_a_smaller_view() {
    let mut map = builder(BuilderConfig::default());
    // view covers columns 1..3 of both rows: ground slots = [1, 2, 0, 0]
    map.create_view(0, 1, 2, 2, |_| {}).unwrap();
    assert_eq!(map.layers()["ground"].len(), 4);

    // row 0 column 1 -> source index 1, which in the view is the Tile2 slot
    let tile = map.tile(0, 1, "ground").expect("slot 1 holds a tile");
    assert!(map.world().has_tag(tile, "Tile2"));
    // row 1 column 1 -> source index 5, past the 4 view slots
    assert!(map.tile(1, 1, "ground").is_none());
}

#[test]
fn partial_view_only_materializes_covered_cells() {
    let mut map = builder(BuilderConfig::default());
    map.create_view(1, 0, 4, 1, |_| {}).unwrap();
    let slots = &map.layers()["ground"];
    assert_eq!(slots.len(), 4);
    let gids: Vec<bool> = slots.iter().map(|s| !s.is_empty()).collect();
    assert_eq!(gids, [true, false, false, true]);
    assert_eq!(map.world().len(), 4);
}

#[test]
fn out_of_bounds_view_is_rejected_before_spawning() {
    let mut map = builder(BuilderConfig::default());
    let err = map.create_view(1, 2, 3, 1, |_| panic!("must not fire")).unwrap_err();
    assert!(matches!(err, MapError::ViewportOutOfBounds { .. }));
    assert!(map.world().is_empty());
    assert!(map.layers().is_empty());
}

#[test]
fn invalid_source_leaves_builder_untouched() {
    let mut map = WorldBuilder::default();
    let zero_width = ORTHO_MAP.replace(
        "\"width\": 4,\n  \"height\": 2,",
        "\"width\": 0,\n  \"height\": 2,",
    );
    let err = map.set_source_json(&zero_width).err().expect("zero width");
    assert!(matches!(err, MapError::InvalidMapSource(_)));
    assert!(map.source().is_none());
    assert!(map.world().atlases().is_empty());

    let err = map.set_source_json("null").err().expect("absent source");
    assert!(matches!(err, MapError::InvalidMapSource(_)));
}

#[test]
fn incomplete_tileset_is_an_invalid_source() {
    let mut map = WorldBuilder::default();
    let external = ORTHO_MAP.replace(
        "\"image\": \"tiles.png\", \"tilewidth\": 32, \"tileheight\": 32, \"margin\": 0,",
        "\"source\": \"tiles.tsx\",",
    );
    assert!(!external.contains("tiles.png"));
    let err = map.set_source_json(&external).err().expect("tileset without image");
    assert!(matches!(err, MapError::InvalidMapSource(_)));
    assert!(map.source().is_none());

    let negative = ORTHO_MAP.replace(
        "\"width\": 4,\n  \"height\": 2,",
        "\"width\": -3,\n  \"height\": 2,",
    );
    let err = map.set_source_json(&negative).err().expect("negative width");
    assert!(matches!(err, MapError::InvalidMapSource(_)));
}

#[test]
fn oversized_tileset_is_rejected_at_set_source() {
    let mut map = WorldBuilder::default();
    let huge = ORTHO_MAP
        .replace(
            "\"tilewidth\": 32, \"tileheight\": 32, \"margin\"",
            "\"tilewidth\": 1, \"tileheight\": 1, \"margin\"",
        )
        .replace(
            "\"imagewidth\": 128, \"imageheight\": 64",
            "\"imagewidth\": 70000, \"imageheight\": 70000",
        );
    let err = map.set_source_json(&huge).err().expect("huge tileset");
    assert!(matches!(err, MapError::InvalidMapSource(_)));
    assert!(map.world().atlases().is_empty());
}

#[test]
fn adopting_a_new_source_resets_the_view() {
    let mut map = builder(BuilderConfig::default());
    map.create_world(|_| {}).unwrap();
    assert_eq!(map.world().len(), 6);

    map.set_source_json(&map_with_orientation("staggered")).unwrap();
    assert!(map.layers().is_empty());
    assert!(map.world().is_empty());
    assert_eq!(map.world().atlases().len(), 1);
    assert!(map.tile(0, 1, "ground").is_none());

    map.create_world(|_| {}).unwrap();
    assert_eq!(map.world().len(), 6);
}

#[test]
fn adopting_a_new_source_drops_pending_jobs() {
    let mut map = builder(BuilderConfig {
        use_background_worker: true,
        ..Default::default()
    });
    map.create_world(|_| panic!("job of the old map must not land")).unwrap();
    assert!(map.has_pending());

    map.set_source_json(ORTHO_MAP).unwrap();
    assert!(!map.has_pending());
    map.wait_pending().unwrap();
    assert!(map.world().is_empty());
}

#[test]
fn create_world_without_source_fails() {
    let mut map = WorldBuilder::default();
    assert!(matches!(map.create_world(|_| {}).err(), Some(MapError::NoSource)));
}

#[test]
fn set_source_registers_sprites() {
    let map = builder(BuilderConfig::default());
    assert_eq!(map.world().atlases().len(), 1);
    assert!(map.world().sprite("Tile1").is_some());
    assert!(map.world().sprite("Tile8").is_some());
    assert!(map.world().sprite("Tile9").is_none());
    assert!(map.isometric().is_none());
    assert_eq!(map.orientation(), Some(&Orientation::Orthogonal));
}

#[test]
fn diamond_map_places_through_isometric_helper() {
    let mut map = WorldBuilder::default();
    map.set_source_json(&map_with_orientation("isometric")).unwrap();
    assert!(map.is_isometric());
    assert!(map.isometric().is_some());
    map.create_world(|_| {}).unwrap();

    // ground index 1: column 1 row 0, left 16, top 16 -> px2pos (-ceil(-0.5), 1) = (0, 1)
    // placed: x = 0*32 + 16 (odd row), y = 1*32/2 = 16
    let tile = map.tile(0, 1, "ground").unwrap();
    let rec = map.world().get(tile).unwrap();
    assert_eq!((rec.x, rec.y, rec.z), (16.0, 16.0, 0));
}

#[test]
fn staggered_map_places_grid_cells() {
    let mut map = WorldBuilder::default();
    map.set_source_json(&map_with_orientation("staggered")).unwrap();
    map.create_world(|_| {}).unwrap();

    // column 3 row 1 -> x = 3*32 + 16, y = 1*32/2
    let tile = map.tile(1, 3, "ground").unwrap();
    assert_eq!(map.world().get(tile).unwrap().pos(), vec2(112.0, 16.0));
}

#[test]
fn unsupported_orientation_aborts_the_whole_view() {
    let mut map = WorldBuilder::default();
    map.set_source_json(&map_with_orientation("hexagonal")).unwrap();
    match map.create_world(|_| panic!("must not fire")).err() {
        Some(MapError::UnsupportedOrientation(name)) => assert_eq!(name, "hexagonal"),
        other => panic!("expected UnsupportedOrientation, got {other:?}"),
    }
    assert!(map.world().is_empty());
}

#[test]
fn callback_can_tag_platforms_solid() {
    let mut map = builder(BuilderConfig::default());
    map.create_world(|m| {
        for e in m.entities_in_layer("platforms").unwrap_or_default() {
            m.world_mut().add_tag(e, "solid");
        }
    })
    .unwrap();
    assert_eq!(map.world().query_tag("solid").count(), 2);
}

#[test]
fn destroy_view_despawns_entities() {
    let mut map = builder(BuilderConfig::default());
    map.create_world(|_| {}).unwrap();
    let tile = map.tile(0, 1, "ground").unwrap();
    map.destroy_view();
    assert!(map.world().is_empty());
    assert!(!map.world().is_alive(tile));
    assert!(map.layers().is_empty());
}

#[test]
fn lazy_loading_is_not_supported() {
    let mut map = builder(BuilderConfig::default());
    let player = map.world_mut().spawn("2D,DOM,Ape,player");
    assert!(matches!(
        map.lazy_loading_for_entity(player),
        Err(MapError::NotSupported(_))
    ));
}

#[test]
fn background_view_materializes_on_poll() {
    let mut map = builder(BuilderConfig {
        use_background_worker: true,
        ..Default::default()
    });
    let fired = Rc::new(Cell::new(0));
    let seen = fired.clone();
    map.create_world(move |_| seen.set(seen.get() + 1)).unwrap();

    assert!(map.has_pending());
    assert!(map.layers().is_empty());

    let mut views = 0;
    while map.has_pending() {
        views += map.poll().expect("job succeeds");
        std::thread::yield_now();
    }
    assert_eq!(views, 1);
    assert_eq!(fired.get(), 1);
    assert_eq!(map.entities_in_layer("ground").unwrap().len(), 4);
    assert_eq!(map.world().len(), 6);
}

#[test]
fn background_failure_surfaces_from_poll() {
    let mut map = WorldBuilder::new(BuilderConfig {
        use_background_worker: true,
        ..Default::default()
    });
    map.set_source_json(&map_with_orientation("hexagonal")).unwrap();
    map.create_world(|_| panic!("must not fire")).unwrap();

    let err = map.wait_pending().unwrap_err();
    assert!(matches!(err, MapError::UnsupportedOrientation(_)));
    assert!(!map.has_pending());
    assert!(map.world().is_empty());
}

#[test]
fn overlapping_background_views_race_on_the_layer_map() {
    let mut map = builder(BuilderConfig {
        use_background_worker: true,
        ..Default::default()
    });
    let first = Rc::new(Cell::new(0));
    let second = Rc::new(Cell::new(0));

    let f = first.clone();
    map.create_view(0, 0, 4, 2, move |_| f.set(f.get() + 1)).unwrap();
    let s = second.clone();
    map.create_view(1, 0, 4, 1, move |_| s.set(s.get() + 1)).unwrap();

    map.wait_pending().unwrap();

    // both completions fire the latest callback; the first one is lost
    assert_eq!(first.get(), 0);
    assert_eq!(second.get(), 2);
    // the last materialization owns the layer map, the earlier entities leak
    assert_eq!(map.layers()["ground"].len(), 4);
    assert_eq!(map.world().len(), 6 + 4);
}
