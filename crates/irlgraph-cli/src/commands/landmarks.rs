//! `landmarks` command: report landmark subset sizes without building a graph.

use anyhow::{Context, Result};

use irlgraph_lib::select_landmarks;

use super::CommandContext;
use crate::args::{BuildArgs, GridArgs};
use crate::output::{landmarks_text, render};

pub fn handle_landmarks(ctx: &CommandContext, grid: &GridArgs, build: &BuildArgs) -> Result<String> {
    let grid = ctx.load_grid(grid)?;
    let params = ctx.config.landmark_params(build)?;
    let landmarks = select_landmarks(&grid, &params).context("landmark selection failed")?;
    render(ctx.format, &landmarks.summary(), landmarks_text)
}
