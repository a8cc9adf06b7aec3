//! Dual-resolution toroidal proximity grid.
//!
//! The grid is a fixed 16x16 table of cells that wraps in both directions.
//! Every cell carries two buckets:
//!
//! - **near**: fine resolution, used for contact detection
//! - **far**: coarse resolution built on the near super coordinate, used for
//!   long-range awareness
//!
//! Because the table wraps, two objects in adjacent cells may be thousands of
//! units apart. Each object therefore also records its *super coordinate*
//! (the location past the wrap), and each adjacency entry records the
//! super offset its neighbour is expected to have. Candidates whose super
//! coordinate does not match are skipped.
//!
//! The grid is cleared and rebuilt every tick. Only the adjacency table is
//! kept between ticks, and it is read-only after construction.
//!
//! # Bucket order
//!
//! Buckets are plain vectors in insertion order. Traversal walks them back to
//! front ([`ProximityGrid::bucket`] returns them reversed), so the most
//! recently inserted object is visited first.

use crate::game::fixed_math::Coord;
use crate::game::simulation::arena::ObjectId;
use crate::game::simulation::error::SimError;

mod grid;

pub use grid::{build_adjacency, placement, Placement};

pub const GRID_SHIFT: u32 = 4;
pub const GRID_SIDE: i32 = 1 << GRID_SHIFT;
pub const GRID_MASK: i32 = GRID_SIDE - 1;
pub const CELL_COUNT: usize = (GRID_SIDE * GRID_SIDE) as usize;

/// Self plus the four forward neighbours.
pub const ADJACENT_COUNT: usize = 5;

/// Neighbour offsets as `(col, row)`. Only same-or-forward cells are listed
/// so an unordered pair is reached from exactly one side.
pub const ADJACENT_UNITS: [(i32, i32); ADJACENT_COUNT] = [(0, 0), (1, 0), (-1, 1), (0, 1), (1, 1)];

/// One precomputed neighbour of a cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Adjacency {
    /// Cell index delta relative to the previous entry in the table.
    pub delta: i32,
    /// -1/0/+1 per axis when the neighbour wrapped around the grid edge.
    pub super_offset: Coord,
}

/// Which bucket set of the grid to address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layer {
    Near,
    Far,
}

#[derive(Clone, Debug, Default)]
struct ProximityCell {
    near: Vec<ObjectId>,
    far: Vec<ObjectId>,
    adjacent: [Adjacency; ADJACENT_COUNT],
}

impl ProximityCell {
    fn bucket(&self, layer: Layer) -> &Vec<ObjectId> {
        match layer {
            Layer::Near => &self.near,
            Layer::Far => &self.far,
        }
    }
}

/// A neighbour reached by walking the adjacency table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Neighbour {
    pub cell: usize,
    pub super_offset: Coord,
}

#[derive(Clone, Debug)]
pub struct ProximityGrid {
    cells: Vec<ProximityCell>,
}

impl Default for ProximityGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl ProximityGrid {
    pub fn new() -> Self {
        let cells = build_adjacency()
            .into_iter()
            .map(|adjacent| ProximityCell {
                near: Vec::new(),
                far: Vec::new(),
                adjacent,
            })
            .collect();
        Self { cells }
    }

    /// Empty every bucket, keeping allocations and the adjacency table.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.near.clear();
            cell.far.clear();
        }
    }

    /// Put `id` into the near and far buckets named by `placement`.
    pub fn insert(&mut self, id: ObjectId, placement: &Placement) {
        self.cells[placement.near_cell].near.push(id);
        self.cells[placement.far_cell].far.push(id);
    }

    /// The occupants of `cell`, in traversal order.
    pub fn bucket(&self, cell: usize, layer: Layer) -> impl Iterator<Item = ObjectId> + '_ {
        self.cells[cell].bucket(layer).iter().rev().copied()
    }

    /// Occupants of `cell` visited after the one at traversal `position`.
    pub fn bucket_after(&self, cell: usize, layer: Layer, position: usize) -> impl Iterator<Item = ObjectId> + '_ {
        let bucket = self.cells[cell].bucket(layer);
        let remaining = bucket.len().saturating_sub(position + 1);
        bucket[..remaining].iter().rev().copied()
    }

    /// Snapshot of a bucket in traversal order.
    ///
    /// The collision and awareness passes call back into collaborators
    /// while walking a bucket, so they iterate over an owned copy.
    pub fn bucket_ids(&self, cell: usize, layer: Layer) -> Vec<ObjectId> {
        self.bucket(cell, layer).collect()
    }

    /// Walk the adjacency table of `cell`, accumulating deltas.
    ///
    /// Entry 0 is the cell itself. A delta whose magnitude exceeds `bound`
    /// means the table has been corrupted and aborts the walk.
    pub fn neighbours(&self, cell: usize, bound: i32) -> Result<[Neighbour; ADJACENT_COUNT], SimError> {
        let table = &self.cells[cell].adjacent;
        let mut out = [Neighbour { cell, super_offset: Coord::default() }; ADJACENT_COUNT];
        let mut current = cell as i32;
        for (k, entry) in table.iter().enumerate().skip(1) {
            if entry.delta.abs() > bound {
                return Err(SimError::AdjacencyOutOfRange { cell, delta: entry.delta });
            }
            current += entry.delta;
            if !(0..CELL_COUNT as i32).contains(&current) {
                return Err(SimError::AdjacencyOutOfRange { cell, delta: entry.delta });
            }
            out[k] = Neighbour {
                cell: current as usize,
                super_offset: entry.super_offset,
            };
        }
        Ok(out)
    }

    pub fn total_entries(&self, layer: Layer) -> usize {
        self.cells.iter().map(|cell| cell.bucket(layer).len()).sum()
    }

    pub fn non_empty_cells(&self, layer: Layer) -> usize {
        self.cells.iter().filter(|cell| !cell.bucket(layer).is_empty()).count()
    }
}
