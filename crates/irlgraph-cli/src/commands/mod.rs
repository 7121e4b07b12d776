//! Subcommand handlers.
//!
//! Each handler loads its inputs, calls the library and returns the rendered
//! report; `main` prints it. Library errors are wrapped with file context.

pub mod baseline;
pub mod build;
pub mod compare;
pub mod landmarks;
pub mod solve;

use std::time::Instant;

use anyhow::{Context, Result};

use irlgraph_lib::{
    build_irregular_graph, load_cost_grid, select_landmarks, CostGrid, Graph, LandmarkParams,
    LandmarkSet,
};

use crate::args::{GridArgs, OutputFormat};
use crate::config::CliConfig;

/// State shared by every handler.
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    pub format: OutputFormat,
    pub config: CliConfig,
}

impl CommandContext {
    pub fn load_grid(&self, args: &GridArgs) -> Result<CostGrid> {
        load_cost_grid(&args.grid, &self.config.grid)
            .with_context(|| format!("failed to load cost grid from {}", args.grid.display()))
    }
}

/// Select landmarks and build the irregular graph, returning both.
pub(crate) fn build_graph(grid: &CostGrid, params: &LandmarkParams) -> Result<(LandmarkSet, Graph)> {
    let landmarks = select_landmarks(grid, params).context("landmark selection failed")?;
    let graph = build_irregular_graph(grid, &landmarks).context("graph construction failed")?;
    Ok((landmarks, graph))
}

/// Milliseconds elapsed since `start`.
pub(crate) fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
