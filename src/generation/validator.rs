//! # Placement Validation
//!
//! Decides whether a tile may occupy the grid with one of its doors on a given
//! index. Validation never touches the grid; an accepted candidate comes back
//! as a [`PlacementPlan`] that the commit step applies in one go.

use crate::{
    Direction, DoorRef, Grid, GridIndex, MapBounds, PlacementPlan, ProvisionalLink, TileDefinition,
    TileType,
};
use std::collections::HashSet;

/// Why a candidate placement was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementRejection {
    #[error("tile has no door {0}")]
    UnknownDoor(usize),

    #[error("cell {0} lies outside the map bounds")]
    OutOfBounds(GridIndex),

    #[error("cell {0} is already occupied")]
    Overlap(GridIndex),

    #[error("exterior cell {0} of the entrance is already occupied")]
    ExteriorBlocked(GridIndex),

    #[error("door facing {direction} would open onto cell {neighbor} which has no matching door")]
    DoorMismatch {
        neighbor: GridIndex,
        direction: Direction,
    },

    #[error("cell {blocked} is needed by the open door of cell {owner}")]
    BlocksOpenDoor { owner: GridIndex, blocked: GridIndex },
}

/// Checks whether `tile`, anchored on its door `anchor_door` at `anchor_index`,
/// can be placed.
///
/// `resolving` is the open door the candidate is meant to connect to; it is
/// allowed to point into the candidate's footprint. Checks run in order:
/// bounds, overlap, entrance exterior (which must also be in bounds), the
/// tile's other doors, and finally every other open door on the map.
pub fn can_place_tile(
    grid: &Grid,
    bounds: Option<&MapBounds>,
    resolving: Option<DoorRef>,
    tile: &TileDefinition,
    anchor_door: usize,
    anchor_index: GridIndex,
) -> Result<PlacementPlan, PlacementRejection> {
    if anchor_door >= tile.doors.len() {
        return Err(PlacementRejection::UnknownDoor(anchor_door));
    }

    let offsets = tile.occupied_offsets(anchor_door);
    let footprint: Vec<GridIndex> = offsets.iter().map(|offset| anchor_index + *offset).collect();

    if let Some(bounds) = bounds {
        if let Some(outside) = footprint.iter().find(|index| !bounds.contains(**index)) {
            return Err(PlacementRejection::OutOfBounds(*outside));
        }
    }

    if let Some(taken) = footprint.iter().find(|index| grid.is_occupied(**index)) {
        return Err(PlacementRejection::Overlap(*taken));
    }

    let exterior = (tile.tile_type == TileType::EntranceExit)
        .then(|| anchor_index + tile.exterior_anchor_offset);
    if let Some(exterior) = exterior {
        if bounds.is_some_and(|bounds| !bounds.contains(exterior)) {
            return Err(PlacementRejection::OutOfBounds(exterior));
        }
        if grid.is_occupied(exterior) {
            return Err(PlacementRejection::ExteriorBlocked(exterior));
        }
    }

    let provisional = match_secondary_doors(grid, tile, anchor_door, anchor_index)?;

    let covered: HashSet<GridIndex> = footprint.iter().copied().collect();
    for (door_ref, cell, door) in grid.doors() {
        if cell.is_empty() || door.connected || Some(door_ref) == resolving {
            continue;
        }
        if provisional.iter().any(|link| link.existing == door_ref) {
            continue;
        }

        let blocked = cell.index.neighbor(door.direction);
        if covered.contains(&blocked) {
            return Err(PlacementRejection::BlocksOpenDoor {
                owner: cell.index,
                blocked,
            });
        }
    }

    Ok(PlacementPlan {
        anchor_index,
        anchor_door,
        offsets,
        exterior,
        provisional,
        connect_anchor: resolving.is_some(),
    })
}

/// Looks at what every non-anchor door of the tile would open onto.
///
/// Nothing there, or a placeholder, is fine. A door-bearing cell must have a
/// door facing back, which becomes a provisional connection.
fn match_secondary_doors(
    grid: &Grid,
    tile: &TileDefinition,
    anchor_door: usize,
    anchor_index: GridIndex,
) -> Result<Vec<ProvisionalLink>, PlacementRejection> {
    let mut provisional = Vec::new();
    if tile.doors.len() < 2 {
        return Ok(provisional);
    }

    for (index, door) in tile.doors.iter().enumerate() {
        if index == anchor_door {
            continue;
        }

        let position = anchor_index + tile.door_position(index, anchor_door);
        let neighbor = position.neighbor(door.direction);
        let Some(cell_id) = grid.cell_id_at(neighbor) else {
            continue;
        };
        let Some(cell) = grid.cell(cell_id) else {
            continue;
        };
        if cell.is_empty() {
            continue;
        }

        match cell.door_facing(door.direction.opposite()) {
            Some(existing) => provisional.push(ProvisionalLink {
                tile_door: index,
                existing: DoorRef::new(cell_id, existing),
            }),
            None => {
                return Err(PlacementRejection::DoorMismatch {
                    neighbor,
                    direction: door.direction,
                })
            }
        }
    }

    Ok(provisional)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cell, CellDoor};

    fn open_cell(index: GridIndex, directions: &[Direction]) -> Cell {
        Cell::with_doors(
            index,
            directions
                .iter()
                .map(|direction| CellDoor::new(*direction, GridIndex::ZERO))
                .collect(),
        )
    }

    fn hall() -> TileDefinition {
        TileDefinition::builder("hall", TileType::Room, 2, 1)
            .door(Direction::Left, 0, 0)
            .door(Direction::Right, 1, 0)
            .build()
    }

    fn cap(direction: Direction) -> TileDefinition {
        TileDefinition::builder("cap", TileType::Room, 1, 1)
            .door(direction, 0, 0)
            .build()
    }

    #[test]
    fn test_accepts_free_space() {
        let mut grid = Grid::new();
        grid.insert(open_cell(GridIndex::ZERO, &[Direction::Right])).unwrap();

        let plan = can_place_tile(
            &grid,
            None,
            Some(DoorRef::new(0, 0)),
            &hall(),
            0,
            GridIndex::new(1, 0),
        )
        .unwrap();

        assert_eq!(plan.footprint(), vec![GridIndex::new(1, 0), GridIndex::new(2, 0)]);
        assert!(plan.provisional.is_empty());
        assert!(plan.connect_anchor);
    }

    #[test]
    fn test_rejects_out_of_bounds() {
        let grid = Grid::new();
        let bounds = MapBounds::new(GridIndex::new(1, 1));
        let result = can_place_tile(&grid, Some(&bounds), None, &hall(), 0, GridIndex::new(1, 0));
        assert_eq!(result.unwrap_err(), PlacementRejection::OutOfBounds(GridIndex::new(2, 0)));
    }

    #[test]
    fn test_rejects_overlap() {
        let mut grid = Grid::new();
        grid.insert(Cell::empty(GridIndex::new(2, 0))).unwrap();
        let result = can_place_tile(&grid, None, None, &hall(), 0, GridIndex::new(1, 0));
        assert_eq!(result.unwrap_err(), PlacementRejection::Overlap(GridIndex::new(2, 0)));
    }

    #[test]
    fn test_rejects_blocked_entrance_exterior() {
        let mut grid = Grid::new();
        grid.insert(Cell::empty(GridIndex::new(0, 1))).unwrap();
        let gate = TileDefinition::builder("gate", TileType::EntranceExit, 1, 1)
            .door(Direction::Down, 0, 0)
            .exterior(0, 1)
            .build();

        let result = can_place_tile(&grid, None, None, &gate, 0, GridIndex::ZERO);
        assert_eq!(
            result.unwrap_err(),
            PlacementRejection::ExteriorBlocked(GridIndex::new(0, 1))
        );
    }

    #[test]
    fn test_rejects_exterior_outside_bounds() {
        let grid = Grid::new();
        let bounds = MapBounds::new(GridIndex::new(2, 2));
        let gate = TileDefinition::builder("gate", TileType::EntranceExit, 1, 1)
            .door(Direction::Up, 0, 0)
            .exterior(0, -1)
            .build();

        // The gate itself fits on the bottom row, its exterior does not.
        let result = can_place_tile(&grid, Some(&bounds), None, &gate, 0, GridIndex::new(0, -2));
        assert_eq!(
            result.unwrap_err(),
            PlacementRejection::OutOfBounds(GridIndex::new(0, -3))
        );
        assert!(can_place_tile(&grid, Some(&bounds), None, &gate, 0, GridIndex::new(0, -1)).is_ok());
    }

    #[test]
    fn test_secondary_door_matches_existing_door() {
        let mut grid = Grid::new();
        // The cell being resolved, and a second cell the hall's right door meets.
        grid.insert(open_cell(GridIndex::ZERO, &[Direction::Right])).unwrap();
        grid.insert(open_cell(GridIndex::new(3, 0), &[Direction::Left])).unwrap();

        let plan = can_place_tile(
            &grid,
            None,
            Some(DoorRef::new(0, 0)),
            &hall(),
            0,
            GridIndex::new(1, 0),
        )
        .unwrap();

        assert_eq!(
            plan.provisional,
            vec![ProvisionalLink {
                tile_door: 1,
                existing: DoorRef::new(1, 0),
            }]
        );
    }

    #[test]
    fn test_secondary_door_into_placeholder_is_accepted() {
        let mut grid = Grid::new();
        grid.insert(open_cell(GridIndex::ZERO, &[Direction::Right])).unwrap();
        grid.insert(Cell::empty(GridIndex::new(3, 0))).unwrap();

        let plan = can_place_tile(
            &grid,
            None,
            Some(DoorRef::new(0, 0)),
            &hall(),
            0,
            GridIndex::new(1, 0),
        )
        .unwrap();
        assert!(plan.provisional.is_empty());
    }

    #[test]
    fn test_secondary_door_into_wall_is_rejected() {
        let mut grid = Grid::new();
        grid.insert(open_cell(GridIndex::ZERO, &[Direction::Right])).unwrap();
        grid.insert(open_cell(GridIndex::new(3, 0), &[Direction::Up])).unwrap();

        let result = can_place_tile(
            &grid,
            None,
            Some(DoorRef::new(0, 0)),
            &hall(),
            0,
            GridIndex::new(1, 0),
        );
        assert_eq!(
            result.unwrap_err(),
            PlacementRejection::DoorMismatch {
                neighbor: GridIndex::new(3, 0),
                direction: Direction::Right,
            }
        );
    }

    #[test]
    fn test_rejects_covering_another_open_door() {
        let mut grid = Grid::new();
        grid.insert(open_cell(GridIndex::ZERO, &[Direction::Right])).unwrap();
        // An unrelated open door that points into the hall's second cell.
        grid.insert(open_cell(GridIndex::new(2, 1), &[Direction::Down])).unwrap();

        let result = can_place_tile(
            &grid,
            None,
            Some(DoorRef::new(0, 0)),
            &hall(),
            0,
            GridIndex::new(1, 0),
        );
        assert_eq!(
            result.unwrap_err(),
            PlacementRejection::BlocksOpenDoor {
                owner: GridIndex::new(2, 1),
                blocked: GridIndex::new(2, 0),
            }
        );
    }

    #[test]
    fn test_resolving_door_may_point_into_footprint() {
        let mut grid = Grid::new();
        grid.insert(open_cell(GridIndex::ZERO, &[Direction::Up])).unwrap();

        let result = can_place_tile(
            &grid,
            None,
            Some(DoorRef::new(0, 0)),
            &cap(Direction::Down),
            0,
            GridIndex::new(0, 1),
        );
        assert!(result.is_ok());

        let result = can_place_tile(&grid, None, None, &cap(Direction::Down), 0, GridIndex::new(0, 1));
        assert!(matches!(result, Err(PlacementRejection::BlocksOpenDoor { .. })));
    }

    #[test]
    fn test_rejection_leaves_grid_untouched() {
        let mut grid = Grid::new();
        grid.insert(open_cell(GridIndex::ZERO, &[Direction::Right])).unwrap();
        grid.insert(open_cell(GridIndex::new(3, 0), &[Direction::Up])).unwrap();
        let before = grid.cells().to_vec();

        let _ = can_place_tile(
            &grid,
            None,
            Some(DoorRef::new(0, 0)),
            &hall(),
            0,
            GridIndex::new(1, 0),
        );
        assert_eq!(grid.cells(), before.as_slice());
    }

    #[test]
    fn test_unknown_anchor_door() {
        let grid = Grid::new();
        let result = can_place_tile(&grid, None, None, &hall(), 5, GridIndex::ZERO);
        assert_eq!(result.unwrap_err(), PlacementRejection::UnknownDoor(5));
    }
}
