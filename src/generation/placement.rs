//! # Placement Commit
//!
//! Turns an accepted placement into cells on the grid.

use crate::{
    Cell, CellDoor, DoorRef, Grid, GridIndex, PlacedTile, TileDefinition, TileType,
    TilewrightError, TilewrightResult,
};
use log::warn;

/// A connection between one of the candidate tile's doors and a door already
/// on the grid, made only if the placement is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisionalLink {
    /// Index of the door on the tile definition
    pub tile_door: usize,
    /// The existing door it meets
    pub existing: DoorRef,
}

/// Everything the commit step needs to apply an accepted placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementPlan {
    pub anchor_index: GridIndex,
    pub anchor_door: usize,
    /// Footprint offsets relative to `anchor_index`
    pub offsets: Vec<GridIndex>,
    /// Reserved exterior cell of an entrance/exit
    pub exterior: Option<GridIndex>,
    pub provisional: Vec<ProvisionalLink>,
    /// Whether the anchor door is being connected to the door it resolves
    pub connect_anchor: bool,
}

impl PlacementPlan {
    /// Plan for a placement that resolves no door, such as the first entrance.
    pub fn unresolved(tile: &TileDefinition, anchor_door: usize, anchor_index: GridIndex) -> Self {
        Self {
            anchor_index,
            anchor_door,
            offsets: tile.occupied_offsets(anchor_door),
            exterior: (tile.tile_type == TileType::EntranceExit)
                .then(|| anchor_index + tile.exterior_anchor_offset),
            provisional: Vec::new(),
            connect_anchor: false,
        }
    }

    /// Absolute grid indices the tile will cover.
    pub fn footprint(&self) -> Vec<GridIndex> {
        self.offsets
            .iter()
            .map(|offset| self.anchor_index + *offset)
            .collect()
    }
}

/// What a commit produced.
#[derive(Debug, Clone, PartialEq)]
pub struct CommittedPlacement {
    /// Storage id of the cell holding the anchor door
    pub anchor_cell: usize,
    pub placed: PlacedTile,
}

/// Applies `plan` to the grid.
///
/// Single-cell tiles get one cell with a copy of every door. Larger tiles get
/// a cell for the anchor door, a cell per other door position (doors sharing
/// a cell are grouped) and placeholders for the rest of the footprint.
/// Entrances also reserve their exterior cell. Provisional links are marked
/// connected on both sides.
///
/// The plan is checked against the grid before anything is written, so a
/// failed commit leaves the grid as it was.
pub fn commit_placement(
    grid: &mut Grid,
    tile: &TileDefinition,
    plan: &PlacementPlan,
) -> TilewrightResult<CommittedPlacement> {
    let Some(anchor) = tile.doors.get(plan.anchor_door) else {
        return Err(TilewrightError::InvalidState(format!(
            "tile '{}' has no door {}",
            tile.name, plan.anchor_door
        )));
    };

    let footprint = plan.footprint();
    if let Some(taken) = footprint.iter().find(|index| grid.is_occupied(**index)) {
        return Err(TilewrightError::InvalidState(format!(
            "cannot place '{}': cell {} is occupied",
            tile.name, taken
        )));
    }
    for link in &plan.provisional {
        if link.tile_door >= tile.doors.len() || grid.door(link.existing).is_none() {
            return Err(TilewrightError::InvalidState(format!(
                "provisional link {:?} of '{}' is dangling",
                link, tile.name
            )));
        }
    }

    let mut linked = vec![false; tile.doors.len()];
    linked[plan.anchor_door] = plan.connect_anchor;
    for link in &plan.provisional {
        linked[link.tile_door] = true;
        grid.connect(link.existing)?;
    }

    let anchor_cell = if tile.is_single_cell() {
        let doors = tile
            .doors
            .iter()
            .zip(&linked)
            .map(|(door, connected)| CellDoor::from_template(door, *connected))
            .collect();
        grid.insert(Cell::with_doors(plan.anchor_index, doors))?
    } else {
        let anchor_cell = grid.insert(Cell::with_doors(
            plan.anchor_index,
            vec![CellDoor::from_template(anchor, linked[plan.anchor_door])],
        ))?;

        let mut assigned = vec![false; tile.doors.len()];
        assigned[plan.anchor_door] = true;

        for offset in &plan.offsets {
            let index = plan.anchor_index + *offset;

            for (door_index, door) in tile.doors.iter().enumerate() {
                if assigned[door_index] || tile.door_position(door_index, plan.anchor_door) != *offset {
                    continue;
                }

                let instance = CellDoor::from_template(door, linked[door_index]);
                match grid.cell_id_at(index) {
                    Some(cell_id) => {
                        let added = grid
                            .cell_mut(cell_id)
                            .is_some_and(|cell| cell.add_door(instance));
                        if !added {
                            warn!(
                                "Tile '{}' puts two {} doors on cell {}",
                                tile.name, door.direction, index
                            );
                        }
                    }
                    None => {
                        grid.insert(Cell::with_doors(index, vec![instance]))?;
                    }
                }
                assigned[door_index] = true;
            }

            if !grid.is_occupied(index) {
                grid.insert(Cell::empty(index))?;
            }
        }

        anchor_cell
    };

    if let Some(exterior) = plan.exterior {
        if grid.is_occupied(exterior) {
            warn!("Exterior cell {} of '{}' is already taken", exterior, tile.name);
        } else {
            grid.insert(Cell::empty(exterior))?;
        }
    }

    Ok(CommittedPlacement {
        anchor_cell,
        placed: PlacedTile {
            name: tile.name.clone(),
            tile_type: tile.tile_type,
            anchor_index: plan.anchor_index,
            origin: plan.anchor_index + anchor.cell_offset,
            cells: footprint,
            exterior: plan.exterior,
            sprite: tile.sprite.clone(),
        },
    })
}
