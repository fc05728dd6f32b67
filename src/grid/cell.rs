//! # Cells
//!
//! One cell per occupied grid index.

use super::{CellDoor, Direction, GridIndex};
use serde::{Deserialize, Serialize};

/// Addresses a door inside a [`Grid`](super::Grid): storage id of the cell plus
/// the door's position in that cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DoorRef {
    pub cell: usize,
    pub door: usize,
}

impl DoorRef {
    pub fn new(cell: usize, door: usize) -> Self {
        Self { cell, door }
    }
}

/// An occupied grid index.
///
/// Placeholder cells reserve space (footprint interiors, entrance exteriors)
/// and never carry doors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub index: GridIndex,
    pub doors: Vec<CellDoor>,
    placeholder: bool,
}

impl Cell {
    /// Creates a placeholder cell.
    pub fn empty(index: GridIndex) -> Self {
        Self {
            index,
            doors: Vec::new(),
            placeholder: true,
        }
    }

    /// Creates a cell holding the given doors.
    pub fn with_doors(index: GridIndex, doors: Vec<CellDoor>) -> Self {
        Self {
            index,
            doors,
            placeholder: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.placeholder
    }

    pub fn has_disconnected_door(&self) -> bool {
        self.doors.iter().any(|door| !door.connected)
    }

    pub fn disconnected_door_count(&self) -> usize {
        self.doors.iter().filter(|door| !door.connected).count()
    }

    /// Position of the first open door in this cell.
    pub fn first_disconnected_door(&self) -> Option<usize> {
        self.doors.iter().position(|door| !door.connected)
    }

    /// Position of the door facing `direction`, connected or not.
    pub fn door_facing(&self, direction: Direction) -> Option<usize> {
        self.doors.iter().position(|door| door.direction == direction)
    }

    /// Adds a door to a door-bearing cell.
    ///
    /// Returns `false` without changing anything if the cell is a placeholder
    /// or already has a door on that side.
    pub fn add_door(&mut self, door: CellDoor) -> bool {
        if self.placeholder || self.door_facing(door.direction).is_some() {
            return false;
        }
        self.doors.push(door);
        true
    }
}
