//! # Generation Module
//!
//! The placement engine: configuration, the placement validator, the commit
//! step and the driver that grows a map door by door.
//!
//! A run starts from a single entrance tile and repeatedly resolves one open
//! door by placing a tile whose matching door faces it. Runs that leave the
//! configured bounds or cannot be completed are restarted from scratch until
//! the try budget is spent.

pub mod driver;
pub mod placement;
pub mod validator;

pub use driver::*;
pub use placement::*;
pub use validator::*;

use crate::{
    config, Cell, Direction, Grid, GridIndex, MapBounds, TileType, TilewrightError,
    TilewrightResult,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Configuration for a generation run.
///
/// Controls where the map starts, how many tiles it should hold, how far it
/// may spread and how often a failed run is retried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Grid index of the first entrance tile
    pub start_index: GridIndex,
    /// Fewest tiles a finished map may have
    pub min_rooms: u32,
    /// Tile count at which the generator starts closing open doors
    pub max_rooms: u32,
    /// Largest absolute x and y a cell may have when bounds are enforced
    pub map_half_extents: GridIndex,
    /// Whether `map_half_extents` is enforced
    pub use_map_bounds: bool,
    /// Restarts allowed before a run is aborted
    pub max_tries: u32,
    /// Seed used when `use_seed` is set
    pub seed: u64,
    /// Reproduce runs from `seed` instead of the wall clock
    pub use_seed: bool,
    /// Log per-step diagnostics
    pub verbose: bool,
    /// Logs a message whenever the generator tries to fill this index
    pub watch_index: Option<GridIndex>,
    /// World units per grid cell, used for placement notifications
    pub cell_size: f32,
    /// Pause between steps when the run is paced for observation
    pub step_delay_ms: u64,
}

impl GenerationConfig {
    /// Creates a default configuration with a fixed seed.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilewright::GenerationConfig;
    ///
    /// let config = GenerationConfig::new(42);
    /// assert!(config.use_seed);
    /// assert!(config.min_rooms < config.max_rooms);
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            start_index: GridIndex::ZERO,
            min_rooms: 8,
            max_rooms: 16,
            map_half_extents: GridIndex::new(config::DEFAULT_HALF_EXTENT, config::DEFAULT_HALF_EXTENT),
            use_map_bounds: false,
            max_tries: config::DEFAULT_MAX_TRIES,
            seed,
            use_seed: true,
            verbose: false,
            watch_index: None,
            cell_size: config::DEFAULT_CELL_SIZE,
            step_delay_ms: config::DEFAULT_STEP_DELAY_MS,
        }
    }

    /// Creates a configuration for testing with small, quick maps.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            min_rooms: 3,
            max_rooms: 6,
            max_tries: 50,
            step_delay_ms: 0,
            ..Self::new(seed)
        }
    }

    /// Applies the start-of-run sanity rules.
    ///
    /// A zero `max_rooms` is an error; `min_rooms` is pulled below `max_rooms`
    /// and non-positive half-extents fall back to a small default.
    pub fn normalized(mut self) -> TilewrightResult<Self> {
        if self.max_rooms == 0 {
            return Err(TilewrightError::InvalidConfig(
                "max_rooms must be greater than zero".to_string(),
            ));
        }

        if self.min_rooms >= self.max_rooms {
            self.min_rooms = self.max_rooms - 1;
        }

        if self.map_half_extents.x <= 0 {
            warn!("Map half-extent x {} is invalid", self.map_half_extents.x);
            self.map_half_extents.x = config::FALLBACK_HALF_EXTENT;
        }

        if self.map_half_extents.y <= 0 {
            warn!("Map half-extent y {} is invalid", self.map_half_extents.y);
            self.map_half_extents.y = config::FALLBACK_HALF_EXTENT;
        }

        Ok(self)
    }

    /// Bounds to enforce, if bounding is enabled.
    pub fn bounds(&self) -> Option<MapBounds> {
        self.use_map_bounds
            .then(|| MapBounds::new(self.map_half_extents))
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    /// Loads a configuration from a JSON file; missing fields take defaults.
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> TilewrightResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationOutcome {
    /// Every door is connected and the map meets its size and entrance rules.
    Succeeded,
    /// The try budget ran out; the map is partial.
    Aborted,
    /// The caller stopped the run.
    Cancelled,
}

/// Result of advancing the driver by one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// A door was resolved (or attempted); more work remains.
    Continue,
    /// The run failed and was restarted from scratch.
    Restarted { tries: u32 },
    /// The run is over.
    Finished(GenerationOutcome),
}

impl StepStatus {
    pub fn is_finished(self) -> bool {
        matches!(self, StepStatus::Finished(_))
    }
}

/// A committed tile placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedTile {
    pub name: String,
    pub tile_type: TileType,
    /// Grid index the anchor door was placed on
    pub anchor_index: GridIndex,
    /// Grid index of the tile's top-left cell
    pub origin: GridIndex,
    /// Every grid index the tile covers
    pub cells: Vec<GridIndex>,
    /// Reserved cell outside an entrance/exit
    pub exterior: Option<GridIndex>,
    pub sprite: Option<String>,
}

impl PlacedTile {
    /// World position of the tile's origin.
    pub fn world_position(&self, cell_size: f32) -> (f32, f32) {
        self.origin.to_world(cell_size)
    }
}

/// Receives notifications about committed tiles, e.g. to draw them.
pub trait PlacementObserver {
    /// A tile was committed to the map.
    fn on_tile_placed(&mut self, tile: &PlacedTile);

    /// Every previously placed tile was discarded because a run (re)started.
    fn on_map_cleared(&mut self) {}
}

/// Observer that logs every placement.
#[derive(Debug, Clone, Default)]
pub struct LoggingObserver {
    pub cell_size: f32,
}

impl PlacementObserver for LoggingObserver {
    fn on_tile_placed(&mut self, tile: &PlacedTile) {
        let (x, y) = tile.world_position(self.cell_size);
        info!(
            "Placed {:?} '{}' at {} (world {:.2}, {:.2})",
            tile.tile_type, tile.name, tile.origin, x, y
        );
    }

    fn on_map_cleared(&mut self) {
        info!("Map cleared");
    }
}

/// A snapshot of a run's map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedMap {
    pub cells: Vec<Cell>,
    pub tiles: Vec<PlacedTile>,
    /// Seed the run was derived from
    pub seed: u64,
    /// Restarts used
    pub tries: u32,
    /// `None` while the run is still in progress
    pub outcome: Option<GenerationOutcome>,
}

impl GeneratedMap {
    pub fn entrance_count(&self) -> usize {
        self.tiles
            .iter()
            .filter(|tile| tile.tile_type == TileType::EntranceExit)
            .count()
    }

    pub fn disconnected_door_count(&self) -> usize {
        self.cells
            .iter()
            .map(Cell::disconnected_door_count)
            .sum()
    }

    pub fn cell_at(&self, index: GridIndex) -> Option<&Cell> {
        self.cells.iter().find(|cell| cell.index == index)
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Some(GenerationOutcome::Succeeded)
    }

    /// Checks the structural guarantees every map keeps.
    ///
    /// Cell indices are unique, every connected door faces a connected door on
    /// the neighboring cell, and with `bounds` every cell, placeholders
    /// included, lies inside them.
    /// A successful map additionally has no open doors and exactly two
    /// entrances.
    pub fn validate(&self, bounds: Option<MapBounds>) -> TilewrightResult<()> {
        let mut seen = HashSet::new();
        for cell in &self.cells {
            if !seen.insert(cell.index) {
                return Err(TilewrightError::GenerationFailed(format!(
                    "cell {} appears twice",
                    cell.index
                )));
            }
        }

        let by_index: HashMap<GridIndex, &Cell> =
            self.cells.iter().map(|cell| (cell.index, cell)).collect();
        for cell in &self.cells {
            for door in cell.doors.iter().filter(|door| door.connected) {
                let partner = by_index
                    .get(&cell.index.neighbor(door.direction))
                    .and_then(|neighbor| {
                        neighbor
                            .doors
                            .iter()
                            .find(|other| other.direction == door.direction.opposite())
                    });
                if !partner.is_some_and(|other| other.connected) {
                    return Err(TilewrightError::GenerationFailed(format!(
                        "door {} of cell {} is connected to nothing",
                        door.direction, cell.index
                    )));
                }
            }
        }

        if let Some(bounds) = bounds {
            if let Some(outside) = self
                .cells
                .iter()
                .map(|cell| cell.index)
                .find(|index| !bounds.contains(*index))
            {
                return Err(TilewrightError::GenerationFailed(format!(
                    "cell {} lies outside the map bounds",
                    outside
                )));
            }
        }

        if self.is_success() {
            if self.disconnected_door_count() > 0 {
                return Err(TilewrightError::GenerationFailed(
                    "successful map has open doors".to_string(),
                ));
            }
            if self.entrance_count() != 2 {
                return Err(TilewrightError::GenerationFailed(format!(
                    "successful map has {} entrances",
                    self.entrance_count()
                )));
            }
        }

        Ok(())
    }
}

/// Utility functions for generation.
pub mod utils {
    use super::*;

    /// Seed derived from the wall clock.
    pub fn clock_seed() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or_default()
    }

    /// Seed for the attempt after `tries` restarts.
    pub fn attempt_seed(base: u64, tries: u32) -> u64 {
        base.wrapping_add(u64::from(tries))
    }

    /// Grid index on the far side of a door.
    pub fn target_index(cell: GridIndex, direction: Direction) -> GridIndex {
        cell.neighbor(direction)
    }

    /// Number of committed entrance/exit tiles.
    pub fn entrance_count(tiles: &[PlacedTile]) -> usize {
        tiles
            .iter()
            .filter(|tile| tile.tile_type == TileType::EntranceExit)
            .count()
    }

    /// Copies the grid's cells into a serialisable list.
    pub fn snapshot_cells(grid: &Grid) -> Vec<Cell> {
        grid.cells().to_vec()
    }
}
