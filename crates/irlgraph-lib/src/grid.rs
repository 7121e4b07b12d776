//! Cost grid loading.
//!
//! A [`CostGrid`] is a rectangular, row-major raster of per-cell traversal
//! costs. Row 0 is the northern-most row, matching the ESRI ASCII grid layout
//! the loader reads. Cells whose value equals the nodata sentinel (or is not
//! finite) are null and take no part in any analysis.
//!
//! Two input layouts are accepted:
//!
//! - ESRI ASCII grids, whose `ncols`/`nrows`/`xllcorner`/`yllcorner`/
//!   `cellsize`/`NODATA_value` header is detected automatically.
//! - Bare whitespace- or tab-delimited matrices, optionally preceded by a
//!   fixed number of header lines to skip ([`GridOptions::header_lines`]).

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Row-major cell identifier (`row * ncols + col`).
pub type CellIndex = usize;

/// Default null sentinel used by ESRI ASCII grids.
pub const DEFAULT_NODATA: f64 = -9999.0;

/// Georeferencing shared by a cost grid and every raster derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridHeader {
    /// X coordinate of the lower-left corner of the grid.
    pub xllcorner: f64,
    /// Y coordinate of the lower-left corner of the grid.
    pub yllcorner: f64,
    /// Side length of a (square) cell in map units.
    pub cellsize: f64,
    /// Sentinel marking null cells.
    pub nodata: f64,
}

impl Default for GridHeader {
    fn default() -> Self {
        Self {
            xllcorner: 0.0,
            yllcorner: 0.0,
            cellsize: 1.0,
            nodata: DEFAULT_NODATA,
        }
    }
}

/// Options controlling how a grid file is read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridOptions {
    /// Number of leading lines to skip before reading data.
    pub header_lines: usize,
    /// Null sentinel; overridden by a `NODATA_value` header entry.
    pub nodata: f64,
    /// Cell size used when the file carries no `cellsize` header entry.
    pub cellsize: f64,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            header_lines: 0,
            nodata: DEFAULT_NODATA,
            cellsize: 1.0,
        }
    }
}

/// Rectangular raster of traversal costs with a derived null mask.
#[derive(Debug, Clone, PartialEq)]
pub struct CostGrid {
    nrows: usize,
    ncols: usize,
    values: Vec<f64>,
    null: Vec<bool>,
    header: GridHeader,
}

fn cell_count(nrows: usize, ncols: usize) -> Result<usize> {
    nrows.checked_mul(ncols).ok_or_else(|| {
        Error::invalid_grid(format!("{}x{} grid is too large to address", nrows, ncols))
    })
}

impl CostGrid {
    /// Build a grid from row-major values.
    ///
    /// Cells equal to `header.nodata` or holding a non-finite value are null.
    /// Non-null costs must be non-negative.
    pub fn new(nrows: usize, ncols: usize, values: Vec<f64>, header: GridHeader) -> Result<Self> {
        if nrows == 0 || ncols == 0 {
            return Err(Error::invalid_grid("grid must have at least one row and one column"));
        }
        let expected = cell_count(nrows, ncols)?;
        if values.len() != expected {
            return Err(Error::invalid_grid(format!(
                "expected {} values for a {}x{} grid, found {}",
                expected,
                nrows,
                ncols,
                values.len()
            )));
        }
        if !(header.cellsize.is_finite() && header.cellsize > 0.0) {
            return Err(Error::invalid_grid(format!(
                "cellsize must be positive, got {}",
                header.cellsize
            )));
        }

        let null: Vec<bool> = values
            .iter()
            .map(|&value| value == header.nodata || !value.is_finite())
            .collect();

        if let Some((cell, value)) = values
            .iter()
            .zip(&null)
            .enumerate()
            .find(|(_, (value, is_null))| !**is_null && **value < 0.0)
            .map(|(cell, (value, _))| (cell, *value))
        {
            return Err(Error::invalid_grid(format!(
                "cell {} (row {}, col {}) has negative cost {}",
                cell,
                cell / ncols,
                cell % ncols,
                value
            )));
        }

        Ok(Self {
            nrows,
            ncols,
            values,
            null,
            header,
        })
    }

    /// Parse a grid from any reader.
    pub fn from_reader<R: Read>(reader: R, options: &GridOptions) -> Result<Self> {
        let reader = BufReader::new(reader);
        let mut lines = reader.lines().enumerate().skip(options.header_lines);

        let mut ascii = AsciiHeader::default();
        let mut data_lines: Vec<(usize, String)> = Vec::new();

        for (number, line) in lines.by_ref() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if ascii.accept(trimmed, number + 1)? {
                continue;
            }
            data_lines.push((number + 1, line));
            break;
        }
        for (number, line) in lines {
            let line = line?;
            if !line.trim().is_empty() {
                data_lines.push((number + 1, line));
            }
        }

        let header = ascii.resolve(options)?;
        let (nrows, ncols, values) = match (ascii.nrows, ascii.ncols) {
            (Some(nrows), Some(ncols)) => {
                let expected = cell_count(nrows, ncols)?;
                let values = parse_flat(&data_lines)?;
                if values.len() != expected {
                    return Err(Error::invalid_grid(format!(
                        "header declares {}x{} cells but {} values were found",
                        nrows,
                        ncols,
                        values.len()
                    )));
                }
                (nrows, ncols, values)
            }
            (None, None) => parse_rows(&data_lines)?,
            _ => {
                return Err(Error::invalid_grid(
                    "grid header must declare both ncols and nrows",
                ))
            }
        };

        let grid = Self::new(nrows, ncols, values, header)?;
        debug!(
            nrows = grid.nrows,
            ncols = grid.ncols,
            null_cells = grid.null_count(),
            "parsed cost grid"
        );
        Ok(grid)
    }

    /// Number of rows.
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns.
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Total number of cells, null cells included.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Grids always hold at least one cell.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn header(&self) -> &GridHeader {
        &self.header
    }

    /// Raw value of a cell, sentinel included.
    pub fn value(&self, cell: CellIndex) -> f64 {
        self.values[cell]
    }

    /// Traversal cost of a cell, or `None` for null cells.
    pub fn cost(&self, cell: CellIndex) -> Option<f64> {
        if self.null[cell] {
            None
        } else {
            Some(self.values[cell])
        }
    }

    pub fn is_null(&self, cell: CellIndex) -> bool {
        self.null[cell]
    }

    pub fn null_count(&self) -> usize {
        self.null.iter().filter(|&&is_null| is_null).count()
    }

    pub fn non_null_count(&self) -> usize {
        self.len() - self.null_count()
    }

    /// Iterate over the indices of all non-null cells in row-major order.
    pub fn non_null_cells(&self) -> impl Iterator<Item = CellIndex> + '_ {
        self.null
            .iter()
            .enumerate()
            .filter(|(_, &is_null)| !is_null)
            .map(|(cell, _)| cell)
    }

    pub fn row_col(&self, cell: CellIndex) -> (usize, usize) {
        (cell / self.ncols, cell % self.ncols)
    }

    pub fn index(&self, row: usize, col: usize) -> CellIndex {
        row * self.ncols + col
    }

    /// Whether a cell touches the outer boundary of the grid.
    pub fn is_edge(&self, cell: CellIndex) -> bool {
        let (row, col) = self.row_col(cell);
        row == 0 || col == 0 || row + 1 == self.nrows || col + 1 == self.ncols
    }

    /// Lattice coordinates `(col, row)` used for exact geometry.
    pub fn lattice(&self, cell: CellIndex) -> (i64, i64) {
        let (row, col) = self.row_col(cell);
        (col as i64, row as i64)
    }

    /// Map coordinates of a cell centre.
    pub fn cell_centre(&self, cell: CellIndex) -> (f64, f64) {
        let (row, col) = self.row_col(cell);
        let size = self.header.cellsize;
        (
            self.header.xllcorner + (col as f64 + 0.5) * size,
            self.header.yllcorner + (self.nrows as f64 - row as f64 - 0.5) * size,
        )
    }

    /// Fractional lattice position `(col, row)` of a map coordinate.
    pub fn map_to_lattice(&self, x: f64, y: f64) -> (f64, f64) {
        let size = self.header.cellsize;
        let col = (x - self.header.xllcorner) / size - 0.5;
        let row = self.nrows as f64 - 0.5 - (y - self.header.yllcorner) / size;
        (col, row)
    }

    /// Cell containing a map coordinate, or `None` outside the grid extent.
    pub fn cell_at(&self, x: f64, y: f64) -> Option<CellIndex> {
        if !(x.is_finite() && y.is_finite()) {
            return None;
        }
        let size = self.header.cellsize;
        let col = ((x - self.header.xllcorner) / size).floor();
        let from_bottom = ((y - self.header.yllcorner) / size).floor();
        if col < 0.0 || from_bottom < 0.0 {
            return None;
        }
        let (col, from_bottom) = (col as usize, from_bottom as usize);
        if col >= self.ncols || from_bottom >= self.nrows {
            return None;
        }
        Some(self.index(self.nrows - 1 - from_bottom, col))
    }

    /// Neighbours of a cell in the 8-connected sense, flagged `true` for
    /// diagonal steps.
    pub fn neighbours8(&self, cell: CellIndex) -> impl Iterator<Item = (CellIndex, bool)> + '_ {
        let (row, col) = self.row_col(cell);
        let (row, col) = (row as isize, col as isize);
        NEIGHBOUR_OFFSETS.iter().filter_map(move |&(dr, dc)| {
            let (r, c) = (row + dr, col + dc);
            if r < 0 || c < 0 || r >= self.nrows as isize || c >= self.ncols as isize {
                return None;
            }
            Some((self.index(r as usize, c as usize), dr != 0 && dc != 0))
        })
    }
}

/// Offsets of the 8-neighbourhood, row-major order.
const NEIGHBOUR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Load a cost grid from a file path.
pub fn load_cost_grid(path: &Path, options: &GridOptions) -> Result<CostGrid> {
    let file = File::open(path)?;
    let grid = CostGrid::from_reader(file, options)?;
    info!(
        path = %path.display(),
        nrows = grid.nrows(),
        ncols = grid.ncols(),
        null_cells = grid.null_count(),
        "loaded cost grid"
    );
    Ok(grid)
}

#[derive(Debug, Default)]
struct AsciiHeader {
    ncols: Option<usize>,
    nrows: Option<usize>,
    xll: Option<(f64, bool)>,
    yll: Option<(f64, bool)>,
    cellsize: Option<f64>,
    nodata: Option<f64>,
}

impl AsciiHeader {
    /// Consume a header line, returning `false` when the line is data.
    fn accept(&mut self, line: &str, number: usize) -> Result<bool> {
        let mut tokens = line.split_whitespace();
        let Some(key) = tokens.next() else {
            return Ok(false);
        };
        if !key.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return Ok(false);
        }
        let key = key.to_ascii_lowercase();
        if !matches!(
            key.as_str(),
            "ncols"
                | "nrows"
                | "xllcorner"
                | "yllcorner"
                | "xllcenter"
                | "yllcenter"
                | "cellsize"
                | "nodata_value"
        ) {
            // Non-numeric data such as "nan" falls through to the data parser.
            return Ok(false);
        }

        let raw = tokens.next().ok_or_else(|| {
            Error::invalid_grid(format!("line {}: header key {} has no value", number, key))
        })?;
        let value: f64 = raw.parse().map_err(|_| {
            Error::invalid_grid(format!(
                "line {}: header value {:?} for {} is not numeric",
                number, raw, key
            ))
        })?;

        match key.as_str() {
            "ncols" => self.ncols = Some(parse_dimension(value, "ncols", number)?),
            "nrows" => self.nrows = Some(parse_dimension(value, "nrows", number)?),
            "xllcorner" => self.xll = Some((value, false)),
            "yllcorner" => self.yll = Some((value, false)),
            "xllcenter" => self.xll = Some((value, true)),
            "yllcenter" => self.yll = Some((value, true)),
            "cellsize" => self.cellsize = Some(value),
            _ => self.nodata = Some(value),
        }
        Ok(true)
    }

    fn resolve(&self, options: &GridOptions) -> Result<GridHeader> {
        let cellsize = self.cellsize.unwrap_or(options.cellsize);
        if !(cellsize.is_finite() && cellsize > 0.0) {
            return Err(Error::invalid_grid(format!(
                "cellsize must be positive, got {}",
                cellsize
            )));
        }
        let corner = |value: Option<(f64, bool)>| match value {
            Some((centre, true)) => centre - cellsize / 2.0,
            Some((corner, false)) => corner,
            None => 0.0,
        };
        Ok(GridHeader {
            xllcorner: corner(self.xll),
            yllcorner: corner(self.yll),
            cellsize,
            nodata: self.nodata.unwrap_or(options.nodata),
        })
    }
}

fn parse_dimension(value: f64, key: &str, number: usize) -> Result<usize> {
    if value.fract() != 0.0 || value < 1.0 {
        return Err(Error::invalid_grid(format!(
            "line {}: {} must be a positive integer, got {}",
            number, key, value
        )));
    }
    Ok(value as usize)
}

fn parse_token(token: &str, number: usize) -> Result<f64> {
    token.parse::<f64>().map_err(|_| {
        Error::invalid_grid(format!("line {}: {:?} is not a number", number, token))
    })
}

fn parse_flat(lines: &[(usize, String)]) -> Result<Vec<f64>> {
    let mut values = Vec::new();
    for (number, line) in lines {
        for token in line.split_whitespace() {
            values.push(parse_token(token, *number)?);
        }
    }
    Ok(values)
}

fn parse_rows(lines: &[(usize, String)]) -> Result<(usize, usize, Vec<f64>)> {
    let mut values = Vec::new();
    let mut ncols = None;
    for (number, line) in lines {
        let row = line
            .split_whitespace()
            .map(|token| parse_token(token, *number))
            .collect::<Result<Vec<_>>>()?;
        match ncols {
            None => ncols = Some(row.len()),
            Some(expected) if expected != row.len() => {
                return Err(Error::invalid_grid(format!(
                    "line {}: expected {} values, found {}",
                    number,
                    expected,
                    row.len()
                )));
            }
            Some(_) => {}
        }
        values.extend(row);
    }
    let ncols = ncols.ok_or_else(|| Error::invalid_grid("grid contains no data rows"))?;
    Ok((lines.len(), ncols, values))
}
