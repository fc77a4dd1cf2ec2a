//! Straight-line safety check
//!
//! Cheap pre-check before the planner: if every cell on the rasterized line
//! is safe for the unit, it can just walk there.

use crate::core::types::{MovementProfile, Vec2};
use crate::spatial::grid::{GridCoord, TerrainClass};
use crate::world::TerrainMap;

/// Cells on the Bresenham line from `from` to `to`, both ends included
pub fn line_cells(from: GridCoord, to: GridCoord) -> Vec<GridCoord> {
    let dx = (to.col - from.col).abs();
    let dy = -(to.row - from.row).abs();
    let sx = if from.col < to.col { 1 } else { -1 };
    let sy = if from.row < to.row { 1 } else { -1 };
    let mut err = dx + dy;

    let mut cells = Vec::with_capacity((dx.max(-dy) + 1) as usize);
    let (mut col, mut row) = (from.col, from.row);
    loop {
        cells.push(GridCoord::new(col, row));
        if col == to.col && row == to.row {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            col += sx;
        }
        if e2 <= dx {
            err += dx;
            row += sy;
        }
    }
    cells
}

/// True when the straight move from `start` to `end` touches nothing unsafe
///
/// Ground units only go direct over plain walkable cells; slow ground is
/// left to the planner so its extra cost gets weighed against a detour.
/// Flyers only need to stay on the map.
pub fn is_direct_path_safe(
    terrain: &dyn TerrainMap,
    start: Vec2,
    end: Vec2,
    movement: MovementProfile,
) -> bool {
    let from = terrain.world_to_cell(start);
    let to = terrain.world_to_cell(end);
    line_cells(from, to).into_iter().all(|cell| {
        terrain.in_bounds(cell)
            && match movement {
                MovementProfile::Flying => true,
                MovementProfile::Ground => terrain.classify(cell) == TerrainClass::Walkable,
            }
    })
}
