//! # Tiles Module
//!
//! Catalog entries describing placeable tiles and the catalog interface the
//! generator queries.
//!
//! Tile definitions are immutable once they are in a catalog. Connection state
//! lives on the cells created for a placement, so the same definition can be
//! placed any number of times without resetting anything in between.

pub mod builtin;
pub mod catalog;
pub mod footprint;

pub use builtin::*;
pub use catalog::*;
pub use footprint::*;

use crate::{Direction, Door, GridIndex, TilewrightError, TilewrightResult};
use log::warn;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Highest rarity a tile can have; such a tile always passes the rarity gate.
pub const MAX_RARITY: f32 = 100.0;

/// Role a tile plays in the generated map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileType {
    /// Map entrance or exit; a finished map has exactly two.
    EntranceExit,
    /// Chamber tile.
    Room,
    /// Corridor tile.
    Path,
}

impl TileType {
    /// Single character used when drawing the map.
    pub fn glyph(self) -> char {
        match self {
            TileType::EntranceExit => 'E',
            TileType::Room => 'R',
            TileType::Path => 'P',
        }
    }
}

/// An entry in the tile catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileDefinition {
    pub name: String,
    /// Footprint in cells: `x` is the width, `y` the height.
    pub size: GridIndex,
    pub tile_type: TileType,
    pub doors: Vec<Door>,
    /// Chance in `[0, 100]` of surviving the rarity gate.
    #[serde(default = "default_rarity")]
    pub rarity: f32,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Cell outside the map an entrance must keep free, relative to the anchor
    /// index. Only used for [`TileType::EntranceExit`].
    #[serde(default)]
    pub exterior_anchor_offset: GridIndex,
    /// Opaque visual handle handed to placement observers.
    #[serde(default)]
    pub sprite: Option<String>,
}

fn default_rarity() -> f32 {
    MAX_RARITY
}

fn default_active() -> bool {
    true
}

impl TileDefinition {
    /// Starts building a tile of the given type and size.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilewright::{Direction, GridIndex, TileDefinition, TileType};
    ///
    /// let hall = TileDefinition::builder("hall", TileType::Room, 2, 1)
    ///     .door(Direction::Left, 0, 0)
    ///     .door(Direction::Right, 1, 0)
    ///     .build();
    ///
    /// assert_eq!(hall.doors.len(), 2);
    /// assert_eq!(hall.door_position(1, 0), GridIndex::new(1, 0));
    /// assert!(hall.validate().is_ok());
    /// ```
    pub fn builder(name: &str, tile_type: TileType, width: i32, height: i32) -> TileBuilder {
        TileBuilder {
            tile: TileDefinition {
                name: name.to_string(),
                size: GridIndex::new(width, height),
                tile_type,
                doors: Vec::new(),
                rarity: MAX_RARITY,
                active: true,
                exterior_anchor_offset: GridIndex::ZERO,
                sprite: None,
            },
        }
    }

    pub fn is_single_cell(&self) -> bool {
        self.size == GridIndex::new(1, 1)
    }

    pub fn has_door_facing(&self, direction: Direction) -> bool {
        self.doors.iter().any(|door| door.direction == direction)
    }

    /// Offsets of the cells this tile covers when anchored on door `anchor`.
    pub fn occupied_offsets(&self, anchor: usize) -> Vec<GridIndex> {
        let offset = self
            .doors
            .get(anchor)
            .map(|door| door.cell_offset)
            .unwrap_or_default();
        anchored_footprint(self.size, offset)
    }

    /// Where door `door` ends up, relative to the anchor index, when door
    /// `anchor` anchors the tile.
    ///
    /// Uses the authored conditional offset; a missing entry falls back to the
    /// value implied by the two doors' cell offsets.
    pub fn door_position(&self, door: usize, anchor: usize) -> GridIndex {
        if self.is_single_cell() || door == anchor {
            return GridIndex::ZERO;
        }

        let (Some(target), Some(anchor_door)) = (self.doors.get(door), self.doors.get(anchor))
        else {
            return GridIndex::ZERO;
        };

        target.offset_when_anchored_on(anchor).unwrap_or_else(|| {
            warn!(
                "Tile '{}' has no offset for door {} anchored on door {}, deriving it",
                self.name, door, anchor
            );
            anchor_door.cell_offset - target.cell_offset
        })
    }

    /// Picks one door facing `direction`, at random when there are several.
    pub fn random_door_facing<R: Rng + ?Sized>(
        &self,
        direction: Direction,
        rng: &mut R,
    ) -> Option<usize> {
        let matching: Vec<usize> = self
            .doors
            .iter()
            .enumerate()
            .filter(|(_, door)| door.direction == direction)
            .map(|(index, _)| index)
            .collect();
        matching.choose(rng).copied()
    }

    /// Picks any door at random.
    pub fn random_door<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        match self.doors.len() {
            0 => None,
            1 => Some(0),
            count => Some(rng.gen_range(0..count)),
        }
    }

    /// Fills in every missing conditional offset from the doors' cell offsets.
    pub fn derive_conditional_offsets(&mut self) {
        let offsets: Vec<GridIndex> = self.doors.iter().map(|door| door.cell_offset).collect();
        for (index, door) in self.doors.iter_mut().enumerate() {
            for (anchor, anchor_offset) in offsets.iter().enumerate() {
                if anchor != index {
                    door.conditional_offsets
                        .entry(anchor)
                        .or_insert(*anchor_offset - door.cell_offset);
                }
            }
        }
    }

    /// Checks that the definition is internally consistent.
    pub fn validate(&self) -> TilewrightResult<()> {
        let invalid = |reason: String| -> TilewrightResult<()> {
            Err(TilewrightError::InvalidTile(format!("{}: {}", self.name, reason)))
        };

        if self.size.x < 1 || self.size.y < 1 {
            return invalid(format!("size {} must be at least 1x1", self.size));
        }
        if !(0.0..=MAX_RARITY).contains(&self.rarity) {
            return invalid(format!("rarity {} is outside [0, 100]", self.rarity));
        }
        if self.doors.is_empty() {
            return invalid("tile has no doors".to_string());
        }

        let footprint: HashSet<GridIndex> = base_footprint(self.size).into_iter().collect();
        let mut sides = HashSet::new();
        for (index, door) in self.doors.iter().enumerate() {
            if !footprint.contains(&door.cell()) {
                return invalid(format!("door {} sits outside the footprint", index));
            }
            if !sides.insert((door.cell(), door.direction)) {
                return invalid(format!(
                    "door {} duplicates the {} side of cell {}",
                    index,
                    door.direction,
                    door.cell()
                ));
            }
            if let Some(anchor) = door
                .conditional_offsets
                .keys()
                .find(|anchor| **anchor >= self.doors.len())
            {
                return invalid(format!(
                    "door {} has an offset for missing door {}",
                    index, anchor
                ));
            }
        }

        for anchor in 0..self.doors.len() {
            let covered: HashSet<GridIndex> = self.occupied_offsets(anchor).into_iter().collect();
            for (index, door) in self.doors.iter().enumerate() {
                let Some(position) = door.offset_when_anchored_on(anchor) else {
                    continue;
                };
                if index != anchor && !covered.contains(&position) {
                    return invalid(format!(
                        "door {} anchored on door {} lands on {} outside the footprint",
                        index, anchor, position
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Builder for [`TileDefinition`]; derives conditional offsets on `build`.
#[derive(Debug, Clone)]
pub struct TileBuilder {
    tile: TileDefinition,
}

impl TileBuilder {
    /// Adds a door facing `direction` on cell `(x, y)` of the footprint.
    pub fn door(mut self, direction: Direction, x: i32, y: i32) -> Self {
        self.tile.doors.push(Door::new(direction, GridIndex::new(x, y)));
        self
    }

    pub fn rarity(mut self, rarity: f32) -> Self {
        self.tile.rarity = rarity;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.tile.active = false;
        self
    }

    /// Sets the reserved exterior cell relative to the anchor index.
    pub fn exterior(mut self, x: i32, y: i32) -> Self {
        self.tile.exterior_anchor_offset = GridIndex::new(x, y);
        self
    }

    pub fn sprite(mut self, sprite: &str) -> Self {
        self.tile.sprite = Some(sprite.to_string());
        self
    }

    pub fn build(mut self) -> TileDefinition {
        self.tile.derive_conditional_offsets();
        self.tile
    }
}
