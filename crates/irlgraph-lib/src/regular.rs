//! Regular 8-neighbour baseline.
//!
//! Every non-null cell is a node connected to its (up to) eight non-null
//! neighbours. The graph is implicit: edges are generated on demand from the
//! cost grid, so nothing proportional to the edge count is allocated.

use std::f64::consts::SQRT_2;

use tracing::info;

use crate::error::{Error, Result};
use crate::grid::{CellIndex, CostGrid};
use crate::path::{accumulated_cost, CostGraph};
use crate::raster::{Raster, RasterCell};

/// Implicit 8-connected graph over the non-null cells of a grid. Node ids are
/// cell indices.
#[derive(Debug, Clone, Copy)]
pub struct RegularGrid<'a> {
    grid: &'a CostGrid,
    orthogonal: f64,
    diagonal: f64,
}

impl<'a> RegularGrid<'a> {
    /// With `geo_correct`, diagonal moves span `cellsize * sqrt(2)`; without
    /// it they are charged as orthogonal moves.
    pub fn new(grid: &'a CostGrid, geo_correct: bool) -> Self {
        let cellsize = grid.header().cellsize;
        Self {
            grid,
            orthogonal: cellsize,
            diagonal: if geo_correct { cellsize * SQRT_2 } else { cellsize },
        }
    }

    /// Weight of the move between two adjacent non-null cells.
    pub fn step_weight(&self, from: CellIndex, to: CellIndex, diagonal: bool) -> Option<f64> {
        let (a, b) = (self.grid.cost(from)?, self.grid.cost(to)?);
        let length = if diagonal { self.diagonal } else { self.orthogonal };
        Some(0.5 * (a + b) * length)
    }
}

impl CostGraph for RegularGrid<'_> {
    fn node_count(&self) -> usize {
        self.grid.len()
    }

    fn for_each_neighbour<F: FnMut(usize, f64)>(&self, node: usize, mut visit: F) {
        if self.grid.is_null(node) {
            return;
        }
        for (next, diagonal) in self.grid.neighbours8(node) {
            if let Some(weight) = self.step_weight(node, next, diagonal) {
                visit(next, weight);
            }
        }
    }
}

/// Solve accumulated cost on the regular 8-neighbour graph.
///
/// Starts are map coordinates; each must fall on a non-null cell.
pub fn solve_regular_baseline(
    grid: &CostGrid,
    starts: &[(f64, f64)],
    geo_correct: bool,
) -> Result<Raster> {
    if starts.is_empty() {
        return Err(Error::invalid_start("at least one start location is required"));
    }
    let sources = starts
        .iter()
        .map(|&(x, y)| {
            let cell = grid.cell_at(x, y).ok_or_else(|| {
                Error::invalid_start(format!("({}, {}) is outside the grid extent", x, y))
            })?;
            if grid.is_null(cell) {
                return Err(Error::invalid_start(format!(
                    "({}, {}) falls on null cell {}",
                    x, y, cell
                )));
            }
            Ok(cell)
        })
        .collect::<Result<Vec<_>>>()?;

    let graph = RegularGrid::new(grid, geo_correct);
    let result = accumulated_cost(&graph, &sources);

    let mut raster = Raster::unset_like(grid);
    for cell in grid.non_null_cells() {
        let value = match result.cost(cell) {
            Some(cost) => RasterCell::Cost(cost),
            None => RasterCell::NoPath,
        };
        raster.set(cell, value);
    }

    info!(
        starts = sources.len(),
        reached = result.reached_count(),
        geo_correct,
        "solved regular baseline"
    );
    Ok(raster)
}
