//! `compare` command: irregular solve plus imputation against the regular
//! baseline, with timings.

use std::time::Instant;

use anyhow::{Context, Result};

use irlgraph_lib::{
    compare_rasters, impute_gaps, solve_accumulated_cost_with, solve_regular_baseline,
    StartLocation,
};

use super::{build_graph, elapsed_ms, CommandContext};
use crate::args::{BuildArgs, GridArgs, StartArgs};
use crate::output::{compare_text, render, CompareReport};

pub fn handle_compare(
    ctx: &CommandContext,
    grid: &GridArgs,
    build: &BuildArgs,
    starts: &StartArgs,
    geo_correct: bool,
) -> Result<String> {
    let grid = ctx.load_grid(grid)?;
    let mut params = ctx.config.landmark_params(build)?;
    params.points_of_interest.extend(starts.starts.iter().copied());

    let started = Instant::now();
    let (_, graph) = build_graph(&grid, &params)?;
    let build_ms = elapsed_ms(started);

    let locations: Vec<StartLocation> = starts.starts.iter().map(|&s| s.into()).collect();
    let started = Instant::now();
    let partial = solve_accumulated_cost_with(&graph, &grid, &locations, &ctx.config.solve)
        .context("accumulated-cost solve failed")?;
    let solve_ms = elapsed_ms(started);

    let started = Instant::now();
    let irregular = impute_gaps(&partial, &grid, &graph).context("gap imputation failed")?;
    let impute_ms = elapsed_ms(started);

    let started = Instant::now();
    let regular = solve_regular_baseline(&grid, &starts.starts, geo_correct)
        .context("regular baseline solve failed")?;
    let regular_ms = elapsed_ms(started);

    let report = CompareReport {
        graph: graph.stats(),
        build_ms,
        solve_ms,
        impute_ms,
        regular_ms,
        comparison: compare_rasters(&irregular, &regular)?,
    };
    render(ctx.format, &report, compare_text)
}
