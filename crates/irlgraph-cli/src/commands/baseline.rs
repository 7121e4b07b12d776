//! `baseline` command: accumulated cost over the regular 8-neighbour graph.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};

use irlgraph_lib::solve_regular_baseline;

use super::{elapsed_ms, CommandContext};
use crate::args::{GridArgs, StartArgs};
use crate::output::{render, solve_text, SolveReport};

pub fn handle_baseline(
    ctx: &CommandContext,
    grid: &GridArgs,
    starts: &StartArgs,
    geo_correct: bool,
    out: Option<&Path>,
) -> Result<String> {
    let grid = ctx.load_grid(grid)?;
    let started = Instant::now();
    let raster = solve_regular_baseline(&grid, &starts.starts, geo_correct)
        .context("regular baseline solve failed")?;

    let output = match out {
        Some(path) => {
            raster
                .save(path)
                .with_context(|| format!("failed to write raster to {}", path.display()))?;
            Some(path.display().to_string())
        }
        None => None,
    };

    let report = SolveReport {
        solver: "regular",
        raster: raster.summary(),
        imputed: None,
        output,
        elapsed_ms: elapsed_ms(started),
    };
    render(ctx.format, &report, solve_text)
}
