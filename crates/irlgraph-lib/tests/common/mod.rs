//! Common test utilities and fixture helpers.

use std::path::PathBuf;

use irlgraph_lib::{load_cost_grid, CostGrid, GridHeader, GridOptions, LandmarkParams};

/// Path to fixtures directory used by tests.
#[allow(dead_code)]
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures")
}

/// The 10x8 fixture grid: two cost regions, a ridge and a 2x2 null lake.
#[allow(dead_code)]
pub fn small_grid() -> CostGrid {
    load_cost_grid(&fixtures_dir().join("small_cost.asc"), &GridOptions::default())
        .expect("load fixture small_cost.asc")
}

/// A 5x3 unit grid whose null middle column splits it in two.
#[allow(dead_code)]
pub fn island_grid() -> CostGrid {
    load_cost_grid(&fixtures_dir().join("island_cost.asc"), &GridOptions::default())
        .expect("load fixture island_cost.asc")
}

#[allow(dead_code)]
pub fn grid_from(nrows: usize, ncols: usize, values: Vec<f64>) -> CostGrid {
    CostGrid::new(nrows, ncols, values, GridHeader::default()).expect("valid test grid")
}

#[allow(dead_code)]
pub fn uniform_grid(nrows: usize, ncols: usize, cost: f64) -> CostGrid {
    grid_from(nrows, ncols, vec![cost; nrows * ncols])
}

/// Parameters selecting every non-null cell.
#[allow(dead_code)]
pub fn full_selection() -> LandmarkParams {
    LandmarkParams {
        grain_proportion: 1.0,
        seed: Some(1),
        ..LandmarkParams::default()
    }
}

#[allow(dead_code)]
pub const NODATA: f64 = irlgraph_lib::grid::DEFAULT_NODATA;
