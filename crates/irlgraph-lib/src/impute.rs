use tracing::{info, warn};

use crate::error::Result;
use crate::graph::Graph;
use crate::grid::{CellIndex, CostGrid};
use crate::raster::Raster;
use crate::spatial::SpatialIndex;

/// Fill unset non-null cells from their nearest solved cell.
///
/// A solved cell is one holding a cost or a no-path marker, so gaps beside an
/// unreachable island inherit its no-path state. Equidistant candidates
/// resolve to the lowest cell index. Solved cells are copied unchanged and
/// null cells stay unset.
pub fn impute_gaps(partial: &Raster, grid: &CostGrid, graph: &Graph) -> Result<Raster> {
    partial.ensure_matches(grid)?;
    graph.ensure_matches(grid)?;

    let solved: Vec<CellIndex> = (0..partial.len())
        .filter(|&cell| partial.get(cell).is_solved())
        .collect();
    let mut filled = partial.clone();
    if solved.is_empty() {
        warn!("raster has no solved cells; nothing to impute from");
        return Ok(filled);
    }

    let index = SpatialIndex::build(grid, solved);
    let mut imputed = 0usize;
    for cell in grid.non_null_cells() {
        if partial.get(cell).is_solved() {
            continue;
        }
        let (row, col) = grid.row_col(cell);
        if let Some((source, _)) = index.nearest(col as f64, row as f64) {
            filled.set(cell, partial.get(source));
            imputed += 1;
        }
    }

    info!(
        sources = index.len(),
        imputed,
        "imputed gap cells"
    );
    Ok(filled)
}
