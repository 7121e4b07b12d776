//! KD-tree spatial index over grid cells for nearest-cell queries.
//!
//! Used to snap start coordinates onto graph nodes and to find the nearest
//! solved cell during gap imputation. Points are stored in lattice units
//! (`col`, `row`); distances returned are lattice distances, so callers
//! multiply by the cell size for map units.
//!
//! # Ties
//!
//! Equidistant candidates are resolved to the lowest cell index, which keeps
//! every query deterministic regardless of how the tree was balanced.
//!
//! # Axis-aligned lattices
//!
//! A bucketed KD-tree cannot split a bucket whose items all share one
//! coordinate on the split axis, and grid lattices are full of such runs.
//! Coordinates are therefore rotated by a fixed angle before insertion.
//! Rotation preserves distances, so queries rotate the probe the same way and
//! final distances are recomputed from the unrotated lattice coordinates.

use kiddo::float::kdtree::KdTree;
use kiddo::SquaredEuclidean;
use tracing::debug;

use crate::grid::{CellIndex, CostGrid};

/// KD-tree bucket size (kiddo default).
const BUCKET_SIZE: usize = 32;

/// Rotation applied to lattice coordinates (radians).
const ROTATION: f64 = 0.463_647_609;

/// Relative slack when re-querying for equidistant candidates.
const TIE_SLACK: f64 = 1e-9;

#[derive(Debug, Clone, Copy)]
struct IndexEntry {
    cell: CellIndex,
    col: f64,
    row: f64,
}

/// Nearest-cell spatial index.
pub struct SpatialIndex {
    tree: KdTree<f64, usize, 2, BUCKET_SIZE, u32>,
    entries: Vec<IndexEntry>,
}

impl SpatialIndex {
    /// Build an index over the given cells of `grid`.
    pub fn build(grid: &CostGrid, cells: impl IntoIterator<Item = CellIndex>) -> Self {
        let entries: Vec<IndexEntry> = cells
            .into_iter()
            .map(|cell| {
                let (row, col) = grid.row_col(cell);
                IndexEntry {
                    cell,
                    col: col as f64,
                    row: row as f64,
                }
            })
            .collect();

        let mut tree: KdTree<f64, usize, 2, BUCKET_SIZE, u32> = KdTree::new();
        for (index, entry) in entries.iter().enumerate() {
            tree.add(&rotate(entry.col, entry.row), index);
        }

        debug!(cells = entries.len(), "built spatial index");
        Self { tree, entries }
    }

    /// Number of indexed cells.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Nearest indexed cell to a fractional lattice position, with its
    /// lattice distance. Ties resolve to the lowest cell index.
    pub fn nearest(&self, col: f64, row: f64) -> Option<(CellIndex, f64)> {
        if self.entries.is_empty() {
            return None;
        }

        let probe = rotate(col, row);
        let first = self.tree.nearest_n::<SquaredEuclidean>(&probe, 1);
        let approx = first.first()?.distance;
        let radius = approx * (1.0 + TIE_SLACK) + TIE_SLACK;

        self.tree
            .within::<SquaredEuclidean>(&probe, radius)
            .into_iter()
            .map(|neighbour| {
                let entry = &self.entries[neighbour.item];
                let dc = entry.col - col;
                let dr = entry.row - row;
                (entry.cell, dc * dc + dr * dr)
            })
            .min_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)))
            .map(|(cell, squared)| (cell, squared.sqrt()))
    }
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("cell_count", &self.entries.len())
            .finish()
    }
}

fn rotate(col: f64, row: f64) -> [f64; 2] {
    let (sin, cos) = ROTATION.sin_cos();
    [col * cos - row * sin, col * sin + row * cos]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridHeader;

    fn grid(nrows: usize, ncols: usize) -> CostGrid {
        CostGrid::new(nrows, ncols, vec![1.0; nrows * ncols], GridHeader::default()).unwrap()
    }

    #[test]
    fn empty_index_returns_none() {
        let grid = grid(2, 2);
        let index = SpatialIndex::build(&grid, std::iter::empty());
        assert!(index.is_empty());
        assert_eq!(index.nearest(0.0, 0.0), None);
    }

    #[test]
    fn nearest_prefers_lowest_cell_on_ties() {
        let grid = grid(5, 5);
        // Cells (row 2, col 0) and (row 2, col 4) are equidistant from the centre.
        let index = SpatialIndex::build(&grid, [14, 10]);
        let (cell, distance) = index.nearest(2.0, 2.0).unwrap();
        assert_eq!(cell, 10);
        assert_eq!(distance, 2.0);
    }

    #[test]
    fn handles_long_axis_aligned_runs() {
        let grid = grid(500, 2);
        let cells: Vec<CellIndex> = (0..grid.nrows()).map(|row| grid.index(row, 0)).collect();
        let index = SpatialIndex::build(&grid, cells);
        assert_eq!(index.len(), 500);
        let (cell, distance) = index.nearest(1.0, 250.0).unwrap();
        assert_eq!(cell, grid.index(250, 0));
        assert!((distance - 1.0).abs() < 1e-12);
    }
}
