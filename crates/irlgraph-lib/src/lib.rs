//! irlgraph library entry points.
//!
//! This crate computes accumulated-cost surfaces over raster cost grids. It
//! loads a cost grid, selects landmark cells, triangulates them into an
//! irregular landscape graph, solves a multi-source least-cost problem on
//! that graph and fills the cells between nodes by nearest-neighbour
//! imputation. A regular 8-neighbour solver is provided as a baseline.
//! Higher-level consumers (the CLI) should only depend on the functions
//! exported here instead of reimplementing behavior.
//!

#![deny(warnings)]

pub mod compare;
pub mod error;
pub mod graph;
pub mod grid;
pub mod impute;
pub mod landmarks;
pub mod path;
pub mod raster;
pub mod regular;
pub mod solve;
pub mod spatial;
pub mod store;
pub mod triangulation;

pub use compare::{compare_rasters, Comparison};
pub use error::{Error, Result};
pub use graph::{
    build_irregular_graph, build_irregular_graph_with, Edge, Graph, GraphStats, Node, NodeId,
};
pub use grid::{load_cost_grid, CellIndex, CostGrid, GridHeader, GridOptions};
pub use impute::impute_gaps;
pub use landmarks::{
    read_points_of_interest, select_landmarks, LandmarkParams, LandmarkSet, LandmarkSummary,
};
pub use path::{accumulated_cost, AccumulatedCost, CostGraph};
pub use raster::{Raster, RasterCell, RasterSummary};
pub use regular::{solve_regular_baseline, RegularGrid};
pub use solve::{
    resolve_starts, solve_accumulated_cost, solve_accumulated_cost_with, solve_batch,
    SolveOptions, StartLocation,
};
pub use spatial::SpatialIndex;
