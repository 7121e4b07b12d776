use std::f64::consts::SQRT_2;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::graph::{Graph, NodeId};
use crate::grid::CostGrid;
use crate::path::accumulated_cost;
use crate::raster::{Raster, RasterCell};
use crate::spatial::SpatialIndex;

/// Where a solve starts from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StartLocation {
    /// An existing graph node.
    Node(NodeId),
    /// A map coordinate, snapped to the nearest graph node.
    Coordinate { x: f64, y: f64 },
}

impl From<(f64, f64)> for StartLocation {
    fn from((x, y): (f64, f64)) -> Self {
        StartLocation::Coordinate { x, y }
    }
}

/// Tuning for start snapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveOptions {
    /// Maximum distance (map units) between a start coordinate and the node it
    /// snaps to. Defaults to one cell diagonal.
    pub snap_tolerance: Option<f64>,
}

impl SolveOptions {
    fn tolerance(&self, grid: &CostGrid) -> Result<f64> {
        match self.snap_tolerance {
            None => Ok(grid.header().cellsize * SQRT_2),
            Some(value) if value.is_finite() && value >= 0.0 => Ok(value),
            Some(value) => Err(Error::InvalidParameter {
                name: "snap_tolerance",
                message: format!("must be a non-negative number, got {}", value),
            }),
        }
    }
}

/// Map start locations onto graph node ids.
///
/// Coordinates must lie inside the grid extent and within the snap tolerance
/// of a graph node. Duplicates are kept; the solver de-duplicates.
pub fn resolve_starts(
    graph: &Graph,
    grid: &CostGrid,
    starts: &[StartLocation],
    options: &SolveOptions,
) -> Result<Vec<NodeId>> {
    if starts.is_empty() {
        return Err(Error::invalid_start("at least one start location is required"));
    }
    graph.ensure_matches(grid)?;
    let tolerance = options.tolerance(grid)?;

    let needs_index = starts
        .iter()
        .any(|start| matches!(start, StartLocation::Coordinate { .. }));
    let index = needs_index
        .then(|| SpatialIndex::build(grid, graph.nodes().iter().map(|node| node.cell)));

    starts
        .iter()
        .map(|start| match *start {
            StartLocation::Node(id) => {
                if id < graph.node_count() {
                    Ok(id)
                } else {
                    Err(Error::invalid_start(format!(
                        "node {} does not exist (graph has {} nodes)",
                        id,
                        graph.node_count()
                    )))
                }
            }
            StartLocation::Coordinate { x, y } => {
                if grid.cell_at(x, y).is_none() {
                    return Err(Error::invalid_start(format!(
                        "({}, {}) is outside the grid extent",
                        x, y
                    )));
                }
                let (col, row) = grid.map_to_lattice(x, y);
                let snapped = index
                    .as_ref()
                    .and_then(|index| index.nearest(col, row))
                    .map(|(cell, lattice)| (cell, lattice * grid.header().cellsize))
                    .filter(|&(_, distance)| distance <= tolerance);
                let (cell, distance) = snapped.ok_or_else(|| {
                    Error::invalid_start(format!(
                        "no graph node within {} map units of ({}, {})",
                        tolerance, x, y
                    ))
                })?;
                let node = graph.node_for_cell(cell).ok_or_else(|| {
                    Error::invalid_start(format!("cell {} carries no graph node", cell))
                })?;
                debug!(x, y, node, distance, "snapped start coordinate");
                Ok(node)
            }
        })
        .collect()
}

/// Solve accumulated cost from `starts` with default options.
pub fn solve_accumulated_cost(
    graph: &Graph,
    grid: &CostGrid,
    starts: &[StartLocation],
) -> Result<Raster> {
    solve_accumulated_cost_with(graph, grid, starts, &SolveOptions::default())
}

/// Solve accumulated cost and rasterise the node results.
///
/// Node cells take their cost, or [`RasterCell::NoPath`] when no start
/// reaches them. Every other cell stays [`RasterCell::Unset`].
pub fn solve_accumulated_cost_with(
    graph: &Graph,
    grid: &CostGrid,
    starts: &[StartLocation],
    options: &SolveOptions,
) -> Result<Raster> {
    let sources = resolve_starts(graph, grid, starts, options)?;
    let result = accumulated_cost(graph, &sources);

    let mut raster = Raster::unset_like(grid);
    for (id, node) in graph.nodes().iter().enumerate() {
        let value = match result.cost(id) {
            Some(cost) => RasterCell::Cost(cost),
            None => RasterCell::NoPath,
        };
        raster.set(node.cell, value);
    }

    info!(
        starts = result.sources().len(),
        nodes = graph.node_count(),
        reached = result.reached_count(),
        max_cost = result.max_cost(),
        "solved accumulated cost"
    );
    Ok(raster)
}

/// Solve several independent start sets in parallel over one graph.
///
/// Results come back in input order. The first failing start set aborts the
/// batch.
pub fn solve_batch(
    graph: &Graph,
    grid: &CostGrid,
    start_sets: &[Vec<StartLocation>],
    options: &SolveOptions,
) -> Result<Vec<Raster>> {
    start_sets
        .par_iter()
        .map(|starts| solve_accumulated_cost_with(graph, grid, starts, options))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_irregular_graph_with;
    use crate::grid::GridHeader;
    use crate::landmarks::LandmarkParams;

    fn full_graph(grid: &CostGrid) -> Graph {
        build_irregular_graph_with(
            grid,
            &LandmarkParams {
                grain_proportion: 1.0,
                seed: Some(3),
                ..LandmarkParams::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn start_node_has_zero_cost() {
        let grid = CostGrid::new(3, 3, vec![2.0; 9], GridHeader::default()).unwrap();
        let graph = full_graph(&grid);
        let raster = solve_accumulated_cost(&graph, &grid, &[(1.5, 1.5).into()]).unwrap();
        assert_eq!(raster.value(4), Some(0.0));
        assert_eq!(raster.value(1), Some(2.0));
    }

    #[test]
    fn coordinate_snaps_within_tolerance() {
        let grid = CostGrid::new(3, 3, vec![1.0; 9], GridHeader::default()).unwrap();
        let graph = full_graph(&grid);
        let nodes = resolve_starts(
            &graph,
            &grid,
            &[StartLocation::Coordinate { x: 1.9, y: 1.1 }],
            &SolveOptions::default(),
        )
        .unwrap();
        assert_eq!(graph.nodes()[nodes[0]].cell, 4);
    }

    #[test]
    fn rejects_unknown_node_and_far_coordinates() {
        let grid = CostGrid::new(2, 2, vec![1.0; 4], GridHeader::default()).unwrap();
        let graph = full_graph(&grid);

        let err = solve_accumulated_cost(&graph, &grid, &[StartLocation::Node(99)])
            .expect_err("unknown node");
        assert!(matches!(err, Error::InvalidStart { .. }));

        let err = solve_accumulated_cost(&graph, &grid, &[(10.0, 10.0).into()])
            .expect_err("outside grid");
        assert!(matches!(err, Error::InvalidStart { .. }));

        let strict = SolveOptions {
            snap_tolerance: Some(0.1),
        };
        let err = solve_accumulated_cost_with(&graph, &grid, &[(1.0, 1.0).into()], &strict)
            .expect_err("nothing within tolerance");
        assert!(matches!(err, Error::InvalidStart { .. }));
    }

    #[test]
    fn batch_matches_individual_solves() {
        let grid = CostGrid::new(4, 4, vec![1.0; 16], GridHeader::default()).unwrap();
        let graph = full_graph(&grid);
        let sets = vec![
            vec![StartLocation::Node(0)],
            vec![StartLocation::Node(5), StartLocation::Node(15)],
        ];
        let batch = solve_batch(&graph, &grid, &sets, &SolveOptions::default()).unwrap();
        for (starts, raster) in sets.iter().zip(&batch) {
            assert_eq!(raster, &solve_accumulated_cost(&graph, &grid, starts).unwrap());
        }
    }
}
