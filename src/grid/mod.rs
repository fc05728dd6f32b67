//! # Grid Module
//!
//! The occupancy model the placement engine works on.
//!
//! The grid is an unbounded integer lattice where `y` grows upwards. Every
//! occupied index holds exactly one [`Cell`]; cells carry the [`CellDoor`]s that
//! terminate there, or nothing at all when they only reserve space.

pub mod cell;
pub mod door;

pub use cell::*;
pub use door::*;

use crate::{TilewrightError, TilewrightResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A coordinate on the tile grid (not a world position).
///
/// # Examples
///
/// ```
/// use tilewright::{Direction, GridIndex};
///
/// let index = GridIndex::new(2, 3);
/// assert_eq!(index.neighbor(Direction::Up), GridIndex::new(2, 4));
/// assert_eq!(index.neighbor(Direction::Left), GridIndex::new(1, 3));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridIndex {
    pub x: i32,
    pub y: i32,
}

impl GridIndex {
    /// The grid origin.
    pub const ZERO: GridIndex = GridIndex { x: 0, y: 0 };

    /// Creates a new index with the given coordinates.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the index one step away in `direction`.
    pub fn neighbor(self, direction: Direction) -> Self {
        self + direction.delta()
    }

    /// Scales the index into world space.
    pub fn to_world(self, cell_size: f32) -> (f32, f32) {
        (self.x as f32 * cell_size, self.y as f32 * cell_size)
    }
}

impl std::ops::Add for GridIndex {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for GridIndex {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl std::ops::Neg for GridIndex {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl std::fmt::Display for GridIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The side of a tile or cell a door faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Returns the facing direction a door must have to connect with this one.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilewright::Direction;
    ///
    /// assert_eq!(Direction::Up.opposite(), Direction::Down);
    /// assert_eq!(Direction::Left.opposite().opposite(), Direction::Left);
    /// ```
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Converts a direction to an index delta.
    pub fn delta(self) -> GridIndex {
        match self {
            Direction::Up => GridIndex::new(0, 1),
            Direction::Down => GridIndex::new(0, -1),
            Direction::Left => GridIndex::new(-1, 0),
            Direction::Right => GridIndex::new(1, 0),
        }
    }

    /// Returns all four directions.
    pub fn all() -> [Direction; 4] {
        [Direction::Up, Direction::Down, Direction::Left, Direction::Right]
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        };
        f.write_str(name)
    }
}

/// Symmetric, inclusive limits on the grid around the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapBounds {
    pub half_extents: GridIndex,
}

impl MapBounds {
    pub fn new(half_extents: GridIndex) -> Self {
        Self { half_extents }
    }

    /// Checks whether `index` lies within `[-half, half]` on both axes.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilewright::{GridIndex, MapBounds};
    ///
    /// let bounds = MapBounds::new(GridIndex::new(1, 1));
    /// assert!(bounds.contains(GridIndex::new(-1, 1)));
    /// assert!(!bounds.contains(GridIndex::new(2, 0)));
    /// ```
    pub fn contains(&self, index: GridIndex) -> bool {
        index.x.abs() <= self.half_extents.x && index.y.abs() <= self.half_extents.y
    }
}

/// Every committed cell of a generation run.
///
/// Cells are kept in creation order because the driver's search for the next
/// open door walks them in that order. A side table maps grid indices to
/// storage positions so lookups stay cheap.
#[derive(Debug, Clone, Default)]
pub struct Grid {
    cells: Vec<Cell>,
    lookup: HashMap<GridIndex, usize>,
}

impl Grid {
    /// Creates an empty grid.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a cell and returns its storage id.
    ///
    /// Fails if another cell already occupies the same index.
    pub fn insert(&mut self, cell: Cell) -> TilewrightResult<usize> {
        if self.lookup.contains_key(&cell.index) {
            return Err(TilewrightError::InvalidState(format!(
                "cell {} is already occupied",
                cell.index
            )));
        }

        let id = self.cells.len();
        self.lookup.insert(cell.index, id);
        self.cells.push(cell);
        Ok(id)
    }

    /// Number of committed cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn is_occupied(&self, index: GridIndex) -> bool {
        self.lookup.contains_key(&index)
    }

    /// Storage id of the cell at `index`, if any.
    pub fn cell_id_at(&self, index: GridIndex) -> Option<usize> {
        self.lookup.get(&index).copied()
    }

    pub fn cell_at(&self, index: GridIndex) -> Option<&Cell> {
        self.cell_id_at(index).map(|id| &self.cells[id])
    }

    pub fn cell(&self, id: usize) -> Option<&Cell> {
        self.cells.get(id)
    }

    pub fn cell_mut(&mut self, id: usize) -> Option<&mut Cell> {
        self.cells.get_mut(id)
    }

    /// All cells in creation order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn door(&self, door: DoorRef) -> Option<&CellDoor> {
        self.cells.get(door.cell)?.doors.get(door.door)
    }

    pub fn door_mut(&mut self, door: DoorRef) -> Option<&mut CellDoor> {
        self.cells.get_mut(door.cell)?.doors.get_mut(door.door)
    }

    /// Marks a door as connected.
    pub fn connect(&mut self, door: DoorRef) -> TilewrightResult<()> {
        let target = self.door_mut(door).ok_or_else(|| {
            TilewrightError::InvalidState(format!("no door at {:?}", door))
        })?;
        target.connected = true;
        Ok(())
    }

    /// Total number of doors still waiting for a neighbor.
    pub fn disconnected_door_count(&self) -> usize {
        self.cells
            .iter()
            .map(Cell::disconnected_door_count)
            .sum()
    }

    /// First cell, in creation order, that still has an open door.
    pub fn first_cell_with_disconnected_door(&self) -> Option<usize> {
        self.cells
            .iter()
            .position(|cell| !cell.is_empty() && cell.has_disconnected_door())
    }

    /// Iterates over every door with its reference.
    pub fn doors(&self) -> impl Iterator<Item = (DoorRef, &Cell, &CellDoor)> {
        self.cells.iter().enumerate().flat_map(|(cell_id, cell)| {
            cell.doors
                .iter()
                .enumerate()
                .map(move |(door_id, door)| (DoorRef::new(cell_id, door_id), cell, door))
        })
    }
}
