//! # ASCII Rendering
//!
//! Draws a map as a block of characters, three by three per grid cell.

use crate::{Cell, Direction, GeneratedMap, GridIndex};
use std::collections::HashMap;

const WALL: char = '#';
const CONNECTED: char = '.';
const OPEN: char = '?';
const EXTERIOR: char = ':';

/// Renders [`GeneratedMap`]s for the terminal.
///
/// Each cell is drawn as a 3x3 block with the owning tile's type glyph in the
/// middle. Door sides show `.` when connected and `?` when still open; sides
/// shared by two cells of the same tile are left blank.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsciiRenderer {
    /// Append a key explaining the glyphs
    pub show_legend: bool,
}

impl AsciiRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_legend(mut self) -> Self {
        self.show_legend = true;
        self
    }

    pub fn render(&self, map: &GeneratedMap) -> String {
        let Some((min, max)) = extent(&map.cells) else {
            return String::new();
        };

        let owners: HashMap<GridIndex, usize> = map
            .tiles
            .iter()
            .enumerate()
            .flat_map(|(tile, placed)| placed.cells.iter().map(move |index| (*index, tile)))
            .collect();

        let width = ((max.x - min.x + 1) * 3) as usize;
        let height = ((max.y - min.y + 1) * 3) as usize;
        let mut canvas = vec![vec![' '; width]; height];

        for cell in &map.cells {
            let column = ((cell.index.x - min.x) * 3) as usize;
            let row = ((max.y - cell.index.y) * 3) as usize;
            let owner = owners.get(&cell.index);

            for (dr, dc) in [(0, 0), (0, 2), (2, 0), (2, 2)] {
                canvas[row + dr][column + dc] = WALL;
            }
            canvas[row + 1][column + 1] = owner
                .map(|tile| map.tiles[*tile].tile_type.glyph())
                .unwrap_or(EXTERIOR);

            for direction in Direction::all() {
                let (dr, dc) = match direction {
                    Direction::Up => (0, 1),
                    Direction::Down => (2, 1),
                    Direction::Left => (1, 0),
                    Direction::Right => (1, 2),
                };
                canvas[row + dr][column + dc] = side_glyph(cell, direction, owner, &owners);
            }
        }

        let mut output: Vec<String> = canvas
            .into_iter()
            .map(|line| line.into_iter().collect::<String>().trim_end().to_string())
            .collect();

        if self.show_legend {
            output.push(String::new());
            output.push(legend().to_string());
        }

        output.join("\n")
    }
}

/// Key for the glyphs used by [`AsciiRenderer`].
pub fn legend() -> &'static str {
    "E entrance/exit  R room  P path  : reserved exterior  . connected door  ? open door  # wall"
}

fn side_glyph(
    cell: &Cell,
    direction: Direction,
    owner: Option<&usize>,
    owners: &HashMap<GridIndex, usize>,
) -> char {
    match cell.door_facing(direction) {
        Some(door) if cell.doors[door].connected => CONNECTED,
        Some(_) => OPEN,
        None if owner.is_some() && owners.get(&cell.index.neighbor(direction)) == owner => ' ',
        None => WALL,
    }
}

fn extent(cells: &[Cell]) -> Option<(GridIndex, GridIndex)> {
    let first = cells.first()?.index;
    Some(cells.iter().fold((first, first), |(min, max), cell| {
        (
            GridIndex::new(min.x.min(cell.index.x), min.y.min(cell.index.y)),
            GridIndex::new(max.x.max(cell.index.x), max.y.max(cell.index.y)),
        )
    }))
}
