//! Landmark selection.
//!
//! The irregular graph is built over a handful of cell subsets rather than the
//! whole grid:
//!
//! - points of interest supplied by the caller (typically start locations),
//! - very important points (VIP): interior cells on a cost-category boundary,
//!   detected where the 3x3 standard deviation exceeds a cutoff,
//! - landscape-limit cells: the outer grid boundary and every cell touching a
//!   null cell,
//! - grain cells: a seeded uniform sample adding density,
//! - null cells, which take part in triangulation and are stripped afterwards.

use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::grid::{CellIndex, CostGrid};

/// Parameters driving landmark selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandmarkParams {
    /// Standard-deviation threshold above which a cell is a VIP.
    pub cutoff: f64,
    /// Fraction of non-null cells sampled as grain cells, in `[0, 1]`.
    pub grain_proportion: f64,
    /// Seed for grain sampling. A fresh seed is drawn and logged when absent.
    pub seed: Option<u64>,
    /// Map coordinates that must become graph nodes.
    pub points_of_interest: Vec<(f64, f64)>,
}

impl Default for LandmarkParams {
    fn default() -> Self {
        Self {
            cutoff: 0.0,
            grain_proportion: 0.05,
            seed: None,
            points_of_interest: Vec::new(),
        }
    }
}

impl LandmarkParams {
    fn validate(&self) -> Result<()> {
        if !self.cutoff.is_finite() || self.cutoff < 0.0 {
            return Err(Error::InvalidParameter {
                name: "cutoff",
                message: format!("must be a non-negative number, got {}", self.cutoff),
            });
        }
        if !(0.0..=1.0).contains(&self.grain_proportion) {
            return Err(Error::InvalidParameter {
                name: "grain_proportion",
                message: format!("must lie within [0, 1], got {}", self.grain_proportion),
            });
        }
        Ok(())
    }
}

/// Cell subsets selected from a grid. Each list is sorted and de-duplicated;
/// subsets may overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandmarkSet {
    pub points_of_interest: Vec<CellIndex>,
    pub very_important: Vec<CellIndex>,
    pub landscape_limit: Vec<CellIndex>,
    pub grain: Vec<CellIndex>,
    pub null: Vec<CellIndex>,
    /// Seed used for grain sampling, recorded so a build can be repeated.
    pub seed: u64,
}

impl LandmarkSet {
    /// Sorted union of every subset, null cells included.
    pub fn coordinate_cells(&self) -> Vec<CellIndex> {
        let mut cells: Vec<CellIndex> = self
            .points_of_interest
            .iter()
            .chain(&self.very_important)
            .chain(&self.landscape_limit)
            .chain(&self.grain)
            .chain(&self.null)
            .copied()
            .collect();
        cells.sort_unstable();
        cells.dedup();
        cells
    }

    pub fn summary(&self) -> LandmarkSummary {
        LandmarkSummary {
            points_of_interest: self.points_of_interest.len(),
            very_important: self.very_important.len(),
            landscape_limit: self.landscape_limit.len(),
            grain: self.grain.len(),
            null: self.null.len(),
            coordinate_cells: self.coordinate_cells().len(),
            seed: self.seed,
        }
    }
}

/// Subset sizes, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LandmarkSummary {
    pub points_of_interest: usize,
    pub very_important: usize,
    pub landscape_limit: usize,
    pub grain: usize,
    pub null: usize,
    pub coordinate_cells: usize,
    pub seed: u64,
}

/// Select every landmark subset from a grid.
pub fn select_landmarks(grid: &CostGrid, params: &LandmarkParams) -> Result<LandmarkSet> {
    params.validate()?;

    let points_of_interest = snap_points_of_interest(grid, &params.points_of_interest)?;
    let very_important = very_important_cells(grid, params.cutoff);
    let landscape_limit = landscape_limit_cells(grid);
    let seed = params.seed.unwrap_or_else(|| {
        let seed = rand::random::<u64>();
        info!(seed, "no grain seed supplied; drew one");
        seed
    });
    let grain = grain_cells(grid, params.grain_proportion, seed);
    let null: Vec<CellIndex> = (0..grid.len()).filter(|&cell| grid.is_null(cell)).collect();

    let set = LandmarkSet {
        points_of_interest,
        very_important,
        landscape_limit,
        grain,
        null,
        seed,
    };
    let summary = set.summary();
    debug!(
        poi = summary.points_of_interest,
        vip = summary.very_important,
        limit = summary.landscape_limit,
        grain = summary.grain,
        null = summary.null,
        "selected landmarks"
    );
    Ok(set)
}

fn snap_points_of_interest(grid: &CostGrid, points: &[(f64, f64)]) -> Result<Vec<CellIndex>> {
    let mut cells = Vec::with_capacity(points.len());
    for &(x, y) in points {
        let cell = grid.cell_at(x, y).ok_or_else(|| Error::InvalidParameter {
            name: "points_of_interest",
            message: format!("({}, {}) lies outside the grid extent", x, y),
        })?;
        if grid.is_null(cell) {
            warn!(x, y, cell, "point of interest falls on a null cell and will be dropped");
        }
        cells.push(cell);
    }
    cells.sort_unstable();
    cells.dedup();
    Ok(cells)
}

/// Interior non-null cells whose 3x3 sample standard deviation exceeds
/// `cutoff`. Null neighbours are left out of the window; edge cells are
/// never VIPs.
pub fn very_important_cells(grid: &CostGrid, cutoff: f64) -> Vec<CellIndex> {
    let mut cells = Vec::new();
    if grid.nrows() < 3 || grid.ncols() < 3 {
        return cells;
    }

    for cell in grid.non_null_cells() {
        if grid.is_edge(cell) {
            continue;
        }
        let mut window = [0.0f64; 9];
        let mut len = 0;
        for value in std::iter::once(cell)
            .chain(grid.neighbours8(cell).map(|(neighbour, _)| neighbour))
            .filter_map(|c| grid.cost(c))
        {
            window[len] = value;
            len += 1;
        }
        if let Some(sd) = sample_std_dev(&window[..len]) {
            if sd > cutoff {
                cells.push(cell);
            }
        }
    }
    cells
}

/// Non-null cells on the outer boundary or 8-adjacent to a null cell.
pub fn landscape_limit_cells(grid: &CostGrid) -> Vec<CellIndex> {
    grid.non_null_cells()
        .filter(|&cell| {
            grid.is_edge(cell)
                || grid
                    .neighbours8(cell)
                    .any(|(neighbour, _)| grid.is_null(neighbour))
        })
        .collect()
}

/// Seeded uniform sample (without replacement) of non-null cells.
pub fn grain_cells(grid: &CostGrid, proportion: f64, seed: u64) -> Vec<CellIndex> {
    let candidates: Vec<CellIndex> = grid.non_null_cells().collect();
    let amount = ((proportion * candidates.len() as f64).round() as usize).min(candidates.len());
    if amount == 0 {
        return Vec::new();
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut cells: Vec<CellIndex> = index::sample(&mut rng, candidates.len(), amount)
        .into_iter()
        .map(|i| candidates[i])
        .collect();
    cells.sort_unstable();
    cells
}

fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let squares: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    Some((squares / (n - 1.0)).sqrt())
}

/// Read points of interest from a CSV file with `x` and `y` columns.
pub fn read_points_of_interest(path: &Path) -> Result<Vec<(f64, f64)>> {
    let file = std::fs::File::open(path)?;
    points_of_interest_from_reader(file)
}

/// Read points of interest from CSV with `x` and `y` columns (any order,
/// case-insensitive).
pub fn points_of_interest_from_reader<R: Read>(reader: R) -> Result<Vec<(f64, f64)>> {
    let mut csv_reader = ReaderBuilder::new().trim(Trim::Fields).from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|header| header.eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::PointsOfInterest {
                message: format!("missing column {:?}", name),
            })
    };
    let (x_column, y_column) = (column("x")?, column("y")?);

    let mut points = Vec::new();
    for (row, record) in csv_reader.records().enumerate() {
        let record = record?;
        let field = |index: usize| -> Result<f64> {
            let raw = record.get(index).unwrap_or_default();
            raw.parse::<f64>().map_err(|_| Error::PointsOfInterest {
                message: format!("record {}: {:?} is not a number", row + 1, raw),
            })
        };
        points.push((field(x_column)?, field(y_column)?));
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridHeader;

    fn grid(nrows: usize, ncols: usize, values: Vec<f64>) -> CostGrid {
        CostGrid::new(nrows, ncols, values, GridHeader::default()).unwrap()
    }

    #[test]
    fn uniform_grid_has_no_vips() {
        let grid = grid(4, 4, vec![2.0; 16]);
        assert!(very_important_cells(&grid, 0.0).is_empty());
    }

    #[test]
    fn cost_step_flags_interior_cells_on_both_sides() {
        #[rustfmt::skip]
        let values = vec![
            1.0, 1.0, 9.0, 9.0,
            1.0, 1.0, 9.0, 9.0,
            1.0, 1.0, 9.0, 9.0,
            1.0, 1.0, 9.0, 9.0,
        ];
        let grid = grid(4, 4, values);
        assert_eq!(very_important_cells(&grid, 1.0), vec![5, 6, 9, 10]);
        assert!(very_important_cells(&grid, 100.0).is_empty());
    }

    #[test]
    fn landscape_limit_includes_border_and_null_neighbours() {
        let nodata = GridHeader::default().nodata;
        let mut values = vec![1.0; 25];
        values[12] = nodata;
        let grid = grid(5, 5, values);
        let limit = landscape_limit_cells(&grid);
        assert_eq!(limit.len(), 16 + 8);
        assert!(!limit.contains(&12));
    }

    #[test]
    fn zero_grain_proportion_yields_no_grain_cells() {
        let grid = grid(5, 5, vec![1.0; 25]);
        let params = LandmarkParams {
            grain_proportion: 0.0,
            seed: Some(7),
            ..LandmarkParams::default()
        };
        let set = select_landmarks(&grid, &params).unwrap();
        assert!(set.grain.is_empty());
        assert_eq!(set.seed, 7);
    }

    #[test]
    fn grain_sampling_is_seeded() {
        let grid = grid(10, 10, vec![1.0; 100]);
        let a = grain_cells(&grid, 0.2, 42);
        let b = grain_cells(&grid, 0.2, 42);
        assert_eq!(a.len(), 20);
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        let grid = grid(3, 3, vec![1.0; 9]);
        for params in [
            LandmarkParams {
                grain_proportion: 1.5,
                ..LandmarkParams::default()
            },
            LandmarkParams {
                grain_proportion: f64::NAN,
                ..LandmarkParams::default()
            },
            LandmarkParams {
                cutoff: -0.1,
                ..LandmarkParams::default()
            },
        ] {
            let err = select_landmarks(&grid, &params).expect_err("invalid params");
            assert!(matches!(err, Error::InvalidParameter { .. }));
        }
    }

    #[test]
    fn reads_points_of_interest_csv() {
        let csv = "y, x\n1.5, 2.5\n3,4\n";
        let points = points_of_interest_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(points, vec![(2.5, 1.5), (4.0, 3.0)]);
    }
}
