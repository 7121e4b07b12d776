//! Grid-shaped solver output.
//!
//! A [`Raster`] shares the shape and georeferencing of the [`CostGrid`] it was
//! derived from. Each cell is either still unset, known to be unreachable, or
//! holds an accumulated cost.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::grid::{CellIndex, CostGrid, GridHeader};

/// Value of a single raster cell.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RasterCell {
    /// Not yet computed (no graph node here, or a null cell).
    #[default]
    Unset,
    /// Computed, but no path connects it to any start.
    NoPath,
    /// Minimum accumulated cost from the start set.
    Cost(f64),
}

impl RasterCell {
    /// Accumulated cost, if any.
    pub fn cost(self) -> Option<f64> {
        match self {
            RasterCell::Cost(value) => Some(value),
            _ => None,
        }
    }

    /// Whether the cell carries a solver result (cost or no-path).
    pub fn is_solved(self) -> bool {
        !matches!(self, RasterCell::Unset)
    }
}

/// Accumulated-cost raster.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    nrows: usize,
    ncols: usize,
    header: GridHeader,
    cells: Vec<RasterCell>,
}

/// Summary statistics for a raster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RasterSummary {
    pub nrows: usize,
    pub ncols: usize,
    pub cost_cells: usize,
    pub no_path_cells: usize,
    pub unset_cells: usize,
    pub min_cost: Option<f64>,
    pub max_cost: Option<f64>,
    pub mean_cost: Option<f64>,
}

impl Raster {
    /// All-unset raster shaped like `grid`.
    pub fn unset_like(grid: &CostGrid) -> Self {
        Self {
            nrows: grid.nrows(),
            ncols: grid.ncols(),
            header: *grid.header(),
            cells: vec![RasterCell::Unset; grid.len()],
        }
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn header(&self) -> &GridHeader {
        &self.header
    }

    pub fn cells(&self) -> &[RasterCell] {
        &self.cells
    }

    pub fn get(&self, cell: CellIndex) -> RasterCell {
        self.cells[cell]
    }

    /// Accumulated cost of a cell, `None` when unset or unreachable.
    pub fn value(&self, cell: CellIndex) -> Option<f64> {
        self.cells[cell].cost()
    }

    pub(crate) fn set(&mut self, cell: CellIndex, value: RasterCell) {
        self.cells[cell] = value;
    }

    /// Cells holding a cost or a no-path marker.
    pub fn solved_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_solved()).count()
    }

    pub fn unset_count(&self) -> usize {
        self.len() - self.solved_count()
    }

    pub fn no_path_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| matches!(cell, RasterCell::NoPath))
            .count()
    }

    pub fn matches_grid(&self, grid: &CostGrid) -> bool {
        self.nrows == grid.nrows() && self.ncols == grid.ncols()
    }

    pub(crate) fn ensure_matches(&self, grid: &CostGrid) -> Result<()> {
        if self.matches_grid(grid) {
            return Ok(());
        }
        Err(Error::invalid_grid(format!(
            "raster is {}x{} but the cost grid is {}x{}",
            self.nrows,
            self.ncols,
            grid.nrows(),
            grid.ncols()
        )))
    }

    pub fn summary(&self) -> RasterSummary {
        let costs: Vec<f64> = self.cells.iter().filter_map(|cell| cell.cost()).collect();
        let mean_cost = if costs.is_empty() {
            None
        } else {
            Some(costs.iter().sum::<f64>() / costs.len() as f64)
        };
        RasterSummary {
            nrows: self.nrows,
            ncols: self.ncols,
            cost_cells: costs.len(),
            no_path_cells: self.no_path_count(),
            unset_cells: self.unset_count(),
            min_cost: costs.iter().copied().reduce(f64::min),
            max_cost: costs.iter().copied().reduce(f64::max),
            mean_cost,
        }
    }

    /// Write the raster as an ESRI ASCII grid. Unset and no-path cells are
    /// written as the nodata value.
    pub fn write_ascii_grid<W: Write>(&self, mut writer: W) -> Result<()> {
        writeln!(writer, "ncols {}", self.ncols)?;
        writeln!(writer, "nrows {}", self.nrows)?;
        writeln!(writer, "xllcorner {}", self.header.xllcorner)?;
        writeln!(writer, "yllcorner {}", self.header.yllcorner)?;
        writeln!(writer, "cellsize {}", self.header.cellsize)?;
        writeln!(writer, "NODATA_value {}", self.header.nodata)?;
        for row in self.cells.chunks(self.ncols.max(1)) {
            let line = row
                .iter()
                .map(|cell| cell.cost().unwrap_or(self.header.nodata).to_string())
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(writer, "{}", line)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Save the raster to `path` as an ESRI ASCII grid.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.write_ascii_grid(BufWriter::new(file))?;
        info!(
            path = %path.display(),
            solved = self.solved_count(),
            "wrote raster"
        );
        Ok(())
    }
}
