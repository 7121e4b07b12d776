//! `solve` command: accumulated cost over an irregular graph.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

use irlgraph_lib::{impute_gaps, solve_accumulated_cost_with, Graph, StartLocation};

use super::{build_graph, elapsed_ms, CommandContext};
use crate::args::{BuildArgs, GridArgs, StartArgs};
use crate::output::{render, solve_text, SolveReport};

/// Arguments for the solve command.
#[derive(Debug, Clone, Default)]
pub struct SolveArgs {
    /// Previously built graph; built on the fly when absent.
    pub graph: Option<PathBuf>,
    pub build: BuildArgs,
    pub starts: StartArgs,
    /// Maximum snapping distance in map units.
    pub snap_tolerance: Option<f64>,
    /// Fill cells between graph nodes.
    pub impute: bool,
    /// Write the final raster as an ESRI ASCII grid.
    pub out: Option<PathBuf>,
}

pub fn handle_solve(ctx: &CommandContext, grid_args: &GridArgs, args: &SolveArgs) -> Result<String> {
    let grid = ctx.load_grid(grid_args)?;
    let started = Instant::now();

    let graph = match &args.graph {
        Some(path) => load_graph(path)?,
        None => {
            let mut params = ctx.config.landmark_params(&args.build)?;
            params
                .points_of_interest
                .extend(args.starts.starts.iter().copied());
            build_graph(&grid, &params)?.1
        }
    };

    let mut options = ctx.config.solve;
    if args.snap_tolerance.is_some() {
        options.snap_tolerance = args.snap_tolerance;
    }
    let starts: Vec<StartLocation> = args.starts.starts.iter().map(|&s| s.into()).collect();
    let raster = solve_accumulated_cost_with(&graph, &grid, &starts, &options)
        .context("accumulated-cost solve failed")?;
    let summary = raster.summary();

    let (raster, imputed) = if args.impute {
        let filled = impute_gaps(&raster, &grid, &graph).context("gap imputation failed")?;
        let summary = filled.summary();
        (filled, Some(summary))
    } else {
        (raster, None)
    };

    let output = match &args.out {
        Some(path) => {
            raster
                .save(path)
                .with_context(|| format!("failed to write raster to {}", path.display()))?;
            Some(path.display().to_string())
        }
        None => None,
    };

    let report = SolveReport {
        solver: "irregular",
        raster: summary,
        imputed,
        output,
        elapsed_ms: elapsed_ms(started),
    };
    render(ctx.format, &report, solve_text)
}

fn load_graph(path: &Path) -> Result<Graph> {
    let graph =
        Graph::load(path).with_context(|| format!("failed to load graph from {}", path.display()))?;
    info!(path = %path.display(), nodes = graph.node_count(), "using saved graph");
    Ok(graph)
}
