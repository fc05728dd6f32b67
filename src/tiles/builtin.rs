//! # Built-in Catalog
//!
//! A small hand-authored catalog used when no catalog file is supplied.

use crate::{Direction, TileDatabase, TileDefinition, TileType, TilewrightResult};

use crate::Direction::{Down, Left, Right, Up};

fn entrance(name: &str, door: Direction) -> TileDefinition {
    let outside = door.opposite().delta();
    TileDefinition::builder(name, TileType::EntranceExit, 1, 1)
        .door(door, 0, 0)
        .exterior(outside.x, outside.y)
        .sprite(&format!("sprites/{}.png", name))
        .build()
}

fn single(name: &str, tile_type: TileType, doors: &[Direction], rarity: f32) -> TileDefinition {
    doors
        .iter()
        .fold(TileDefinition::builder(name, tile_type, 1, 1), |builder, door| {
            builder.door(*door, 0, 0)
        })
        .rarity(rarity)
        .sprite(&format!("sprites/{}.png", name))
        .build()
}

/// Every tile of the bundled catalog.
pub fn sample_tiles() -> Vec<TileDefinition> {
    vec![
        entrance("gate_north", Down),
        entrance("gate_south", Up),
        entrance("gate_west", Right),
        entrance("gate_east", Left),
        single("corridor_vertical", TileType::Path, &[Up, Down], 100.0),
        single("corridor_horizontal", TileType::Path, &[Left, Right], 100.0),
        single("bend_up_right", TileType::Path, &[Up, Right], 80.0),
        single("bend_up_left", TileType::Path, &[Up, Left], 80.0),
        single("bend_down_right", TileType::Path, &[Down, Right], 80.0),
        single("bend_down_left", TileType::Path, &[Down, Left], 80.0),
        single("tee_up", TileType::Path, &[Left, Right, Up], 40.0),
        single("tee_down", TileType::Path, &[Left, Right, Down], 40.0),
        single("tee_left", TileType::Path, &[Up, Down, Left], 40.0),
        single("tee_right", TileType::Path, &[Up, Down, Right], 40.0),
        single("crossroads", TileType::Path, &[Up, Down, Left, Right], 20.0),
        single("cell_up", TileType::Room, &[Up], 70.0),
        single("cell_down", TileType::Room, &[Down], 70.0),
        single("cell_left", TileType::Room, &[Left], 70.0),
        single("cell_right", TileType::Room, &[Right], 70.0),
        TileDefinition::builder("hall", TileType::Room, 2, 1)
            .door(Left, 0, 0)
            .door(Right, 1, 0)
            .rarity(50.0)
            .sprite("sprites/hall.png")
            .build(),
        TileDefinition::builder("gallery", TileType::Room, 1, 2)
            .door(Up, 0, 0)
            .door(Down, 0, -1)
            .rarity(50.0)
            .sprite("sprites/gallery.png")
            .build(),
        TileDefinition::builder("long_hall", TileType::Room, 3, 1)
            .door(Left, 0, 0)
            .door(Right, 2, 0)
            .rarity(35.0)
            .sprite("sprites/long_hall.png")
            .build(),
        TileDefinition::builder("chamber", TileType::Room, 2, 2)
            .door(Up, 0, 0)
            .door(Right, 1, 0)
            .door(Down, 1, -1)
            .door(Left, 0, -1)
            .rarity(30.0)
            .sprite("sprites/chamber.png")
            .build(),
        TileDefinition::builder("vault", TileType::Room, 2, 2)
            .door(Down, 0, -1)
            .rarity(40.0)
            .sprite("sprites/vault.png")
            .build(),
    ]
}

/// The bundled catalog.
pub fn sample_catalog() -> TilewrightResult<TileDatabase> {
    TileDatabase::from_tiles(sample_tiles())
}
