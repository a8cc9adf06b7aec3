use crate::game::config::SimConfig;
use crate::game::fixed_math::Coord;

use super::{Adjacency, ADJACENT_COUNT, ADJACENT_UNITS, CELL_COUNT, GRID_MASK, GRID_SHIFT, GRID_SIDE};

/// Where an object lands in both grids this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    pub near_cell: usize,
    /// Super coordinate in the near grid.
    pub collision_grid: Coord,
    pub far_cell: usize,
    /// Super coordinate in the far grid.
    pub distance_grid: Coord,
}

fn cell_index(col: i32, row: i32) -> usize {
    (((row & GRID_MASK) << GRID_SHIFT) + (col & GRID_MASK)) as usize
}

/// Map a world location to its near and far cells.
///
/// The far grid is derived from the near super coordinate, not from the
/// location, so the two resolutions always nest.
pub fn placement(location: Coord, config: &SimConfig) -> Placement {
    let axis = |value: i32| {
        let unit = value >> config.collision_unit_shift;
        let near_super = unit >> config.collision_super_extra_shift;
        let far_unit = near_super >> config.distance_unit_extra_shift;
        let far_super = far_unit >> config.distance_super_extra_shift;
        (unit, near_super, far_unit, far_super)
    };

    let (x_unit, x_super, x_far, x_far_super) = axis(location.x);
    let (y_unit, y_super, y_far, y_far_super) = axis(location.y);

    Placement {
        near_cell: cell_index(x_unit, y_unit),
        collision_grid: Coord::new(x_super, y_super),
        far_cell: cell_index(x_far, y_far),
        distance_grid: Coord::new(x_far_super, y_far_super),
    }
}

/// Precompute the adjacency table for every cell.
///
/// Deltas are stored relative to the previous entry, so summing the first
/// `k + 1` deltas onto a cell index yields its k-th neighbour.
pub fn build_adjacency() -> Vec<[Adjacency; ADJACENT_COUNT]> {
    let mut table = Vec::with_capacity(CELL_COUNT);
    for y in 0..GRID_SIDE {
        for x in 0..GRID_SIDE {
            let mut entries = [Adjacency::default(); ADJACENT_COUNT];
            let mut walked = 0;
            for (entry, &(dx, dy)) in entries.iter_mut().zip(ADJACENT_UNITS.iter()) {
                let (col, super_x) = wrap(x + dx);
                let (row, super_y) = wrap(y + dy);
                let absolute = (row << GRID_SHIFT) + col;
                entry.delta = absolute - walked;
                walked += entry.delta;
                entry.super_offset = Coord::new(super_x, super_y);
            }
            table.push(entries);
        }
    }
    table
}

fn wrap(value: i32) -> (i32, i32) {
    if value < 0 {
        (value + GRID_SIDE, -1)
    } else if value >= GRID_SIDE {
        (value - GRID_SIDE, 1)
    } else {
        (value, 0)
    }
}
