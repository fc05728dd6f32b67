//! # Footprint Calculation
//!
//! Pure helpers deriving which grid cells a tile covers.
//!
//! A tile's logical origin is its top-left cell. Because `y` grows upwards the
//! footprint of a `width x height` tile spans `x in [0, width - 1]` and
//! `y in [-(height - 1), 0]`. Anchoring the tile on a door shifts that set by
//! the door's cell offset so that the anchor door's cell lands on offset zero.
//! The result depends on the anchor door and is recomputed for every attempt.

use crate::GridIndex;

/// Offsets of every cell of a tile of the given size, relative to its origin.
///
/// Rows are produced bottom to top, cells left to right within a row.
///
/// # Examples
///
/// ```
/// use tilewright::{base_footprint, GridIndex};
///
/// let cells = base_footprint(GridIndex::new(2, 2));
/// assert_eq!(
///     cells,
///     vec![
///         GridIndex::new(0, -1),
///         GridIndex::new(1, -1),
///         GridIndex::new(0, 0),
///         GridIndex::new(1, 0),
///     ]
/// );
/// ```
pub fn base_footprint(size: GridIndex) -> Vec<GridIndex> {
    let width = size.x.max(1);
    let height = size.y.max(1);

    let mut cells = Vec::with_capacity((width * height) as usize);
    for y in -(height - 1)..=0 {
        for x in 0..width {
            cells.push(GridIndex::new(x, y));
        }
    }
    cells
}

/// Offsets of every cell of a tile relative to the grid index of its anchor door.
pub fn anchored_footprint(size: GridIndex, anchor_offset: GridIndex) -> Vec<GridIndex> {
    base_footprint(size)
        .into_iter()
        .map(|cell| cell + anchor_offset)
        .collect()
}
