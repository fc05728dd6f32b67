//! # Doors
//!
//! Door templates that belong to tile definitions and the door instances that
//! committed cells carry.

use super::{Direction, GridIndex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A door as authored on a tile definition.
///
/// `cell_offset` is the translation from the door's own cell to the tile's
/// top-left origin: anchoring the tile on this door at grid index `i` puts the
/// origin at `i + cell_offset`. A door on the origin cell has a zero offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Door {
    pub direction: Direction,
    #[serde(default)]
    pub cell_offset: GridIndex,
    /// Position of this door relative to the anchor index, keyed by the index
    /// of the door used as the anchor.
    #[serde(default)]
    pub conditional_offsets: BTreeMap<usize, GridIndex>,
}

impl Door {
    /// Creates a door facing `direction` on the cell `cell` of its tile.
    ///
    /// `cell` is measured from the tile origin (`x >= 0`, `y <= 0`).
    pub fn new(direction: Direction, cell: GridIndex) -> Self {
        Self {
            direction,
            cell_offset: -cell,
            conditional_offsets: BTreeMap::new(),
        }
    }

    /// The door's cell measured from the tile origin.
    pub fn cell(&self) -> GridIndex {
        -self.cell_offset
    }

    /// The authored offset of this door when door `anchor` anchors the tile.
    pub fn offset_when_anchored_on(&self, anchor: usize) -> Option<GridIndex> {
        self.conditional_offsets.get(&anchor).copied()
    }
}

/// A door copied onto a committed cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellDoor {
    pub direction: Direction,
    pub cell_offset: GridIndex,
    pub connected: bool,
}

impl CellDoor {
    /// Creates an unconnected door.
    pub fn new(direction: Direction, cell_offset: GridIndex) -> Self {
        Self {
            direction,
            cell_offset,
            connected: false,
        }
    }

    /// Instantiates a template door with the given connection state.
    pub fn from_template(door: &Door, connected: bool) -> Self {
        Self {
            direction: door.direction,
            cell_offset: door.cell_offset,
            connected,
        }
    }
}
