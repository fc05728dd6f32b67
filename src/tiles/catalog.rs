//! # Tile Catalog
//!
//! The query interface the generator uses to find candidate tiles, and an
//! in-memory implementation that can be loaded from JSON.

use crate::{Direction, TileDefinition, TileType, TilewrightError, TilewrightResult};
use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Source of candidate tiles for the generator.
///
/// Implementations only ever hand out active tiles. Randomised orderings draw
/// from the generator's random source so a fixed seed reproduces a run.
pub trait TileCatalog {
    /// One active entrance/exit tile chosen uniformly at random.
    fn entrance_exit_tile(&self, rng: &mut StdRng) -> Option<Arc<TileDefinition>>;

    /// Every active tile with a door facing `direction` whose type is not in
    /// `excluded`, shuffled.
    fn tiles_with_door_facing(
        &self,
        direction: Direction,
        excluded: &[TileType],
        rng: &mut StdRng,
    ) -> Vec<Arc<TileDefinition>>;

    /// Direction a door must face to connect with a door facing `direction`.
    fn opposite(&self, direction: Direction) -> Direction {
        direction.opposite()
    }
}

/// In-memory tile catalog.
///
/// # Examples
///
/// ```
/// use rand::{rngs::StdRng, SeedableRng};
/// use tilewright::{Direction, TileCatalog, TileDatabase, TileDefinition, TileType};
///
/// let entrance = TileDefinition::builder("gate", TileType::EntranceExit, 1, 1)
///     .door(Direction::Down, 0, 0)
///     .exterior(0, 1)
///     .build();
/// let catalog = TileDatabase::from_tiles(vec![entrance]).unwrap();
///
/// let mut rng = StdRng::seed_from_u64(1);
/// assert!(catalog.entrance_exit_tile(&mut rng).is_some());
/// assert!(catalog
///     .tiles_with_door_facing(Direction::Up, &[], &mut rng)
///     .is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TileDatabase {
    tiles: Vec<Arc<TileDefinition>>,
}

/// On-disk layout of a catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogFile {
    tiles: Vec<TileDefinition>,
}

impl TileDatabase {
    /// Builds a catalog after validating every tile.
    pub fn from_tiles(tiles: Vec<TileDefinition>) -> TilewrightResult<Self> {
        for tile in &tiles {
            tile.validate()?;
        }

        Ok(Self {
            tiles: tiles.into_iter().map(Arc::new).collect(),
        })
    }

    /// Parses a catalog from JSON of the form `{ "tiles": [ ... ] }`.
    ///
    /// Missing conditional offsets are derived from the doors' cell offsets.
    pub fn from_json_str(json: &str) -> TilewrightResult<Self> {
        let file: CatalogFile = serde_json::from_str(json)?;
        let tiles = file
            .tiles
            .into_iter()
            .map(|mut tile| {
                tile.derive_conditional_offsets();
                tile
            })
            .collect();
        Self::from_tiles(tiles)
    }

    /// Loads a catalog file from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> TilewrightResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&json)?;
        info!("Loaded {} tiles from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Serializes the catalog in the format [`TileDatabase::from_json_str`] reads.
    pub fn to_json_string(&self) -> TilewrightResult<String> {
        let file = CatalogFile {
            tiles: self.tiles.iter().map(|tile| (**tile).clone()).collect(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    pub fn tiles(&self) -> &[Arc<TileDefinition>] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Looks a tile up by name.
    pub fn get(&self, name: &str) -> Option<Arc<TileDefinition>> {
        self.tiles.iter().find(|tile| tile.name == name).cloned()
    }
}

impl TileCatalog for TileDatabase {
    fn entrance_exit_tile(&self, rng: &mut StdRng) -> Option<Arc<TileDefinition>> {
        let entrances: Vec<&Arc<TileDefinition>> = self
            .tiles
            .iter()
            .filter(|tile| tile.active && tile.tile_type == TileType::EntranceExit)
            .collect();

        entrances.choose(rng).map(|tile| Arc::clone(*tile))
    }

    fn tiles_with_door_facing(
        &self,
        direction: Direction,
        excluded: &[TileType],
        rng: &mut StdRng,
    ) -> Vec<Arc<TileDefinition>> {
        let mut candidates: Vec<Arc<TileDefinition>> = self
            .tiles
            .iter()
            .filter(|tile| tile.active)
            .filter(|tile| !excluded.contains(&tile.tile_type))
            .filter(|tile| tile.has_door_facing(direction))
            .cloned()
            .collect();

        candidates.shuffle(rng);
        candidates
    }
}

impl TryFrom<Vec<TileDefinition>> for TileDatabase {
    type Error = TilewrightError;

    fn try_from(tiles: Vec<TileDefinition>) -> TilewrightResult<Self> {
        Self::from_tiles(tiles)
    }
}
