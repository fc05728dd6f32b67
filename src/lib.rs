//! # Tilewright
//!
//! Procedural map assembly from door-connected tiles.
//!
//! ## Architecture Overview
//!
//! A map is grown on an integer grid starting from a single entrance tile.
//! Every step picks one open door and looks for a catalog tile with a door
//! facing back at it, validates the placement against everything already on
//! the grid and commits it. Runs that wander out of bounds or paint themselves
//! into a corner are thrown away and restarted until a try budget runs out.
//!
//! - **Grid**: cells, doors and the occupancy lookup
//! - **Tiles**: immutable tile definitions and the catalog the generator queries
//! - **Generation**: validation, commit and the stepwise driver
//! - **Rendering**: ASCII output for finished or in-progress maps

pub mod generation;
pub mod grid;
pub mod rendering;
pub mod tiles;

pub use generation::*;
pub use grid::*;
pub use rendering::*;
pub use tiles::*;

/// Core error type for Tilewright.
#[derive(thiserror::Error, Debug)]
pub enum TilewrightError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Configuration cannot be used to start a run
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A tile definition is inconsistent
    #[error("Invalid tile: {0}")]
    InvalidTile(String),

    /// The catalog has no active entrance/exit tile
    #[error("Catalog has no active entrance/exit tile")]
    NoEntranceTile,

    /// Internal state is invalid
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A map failed structural validation
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

/// Result type used throughout the Tilewright codebase.
pub type TilewrightResult<T> = Result<T, TilewrightError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Generation configuration constants.
pub mod config {
    /// Default map half-extent on both axes
    pub const DEFAULT_HALF_EXTENT: i32 = 8;

    /// Half-extent used when a configured one is not positive
    pub const FALLBACK_HALF_EXTENT: i32 = 2;

    /// Default number of restarts before a run is aborted
    pub const DEFAULT_MAX_TRIES: u32 = 10;

    /// Default world units per grid cell
    pub const DEFAULT_CELL_SIZE: f32 = 0.25;

    /// Default pause between paced steps in milliseconds
    pub const DEFAULT_STEP_DELAY_MS: u64 = 100;
}
