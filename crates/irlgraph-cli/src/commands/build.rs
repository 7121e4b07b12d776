//! `build` command: build an irregular graph and save it for later solves.

use std::path::Path;

use anyhow::{Context, Result};

use super::{build_graph, CommandContext};
use crate::args::{BuildArgs, GridArgs};
use crate::output::{build_text, render, BuildReport};

pub fn handle_build(
    ctx: &CommandContext,
    grid: &GridArgs,
    build: &BuildArgs,
    out: &Path,
) -> Result<String> {
    let grid = ctx.load_grid(grid)?;
    let params = ctx.config.landmark_params(build)?;
    let (landmarks, graph) = build_graph(&grid, &params)?;

    let checksum = graph
        .save(out)
        .with_context(|| format!("failed to save graph to {}", out.display()))?;

    let report = BuildReport {
        landmarks: landmarks.summary(),
        graph: graph.stats(),
        path: out.display().to_string(),
        checksum: hex::encode(checksum),
    };
    render(ctx.format, &report, build_text)
}
