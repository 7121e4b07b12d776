//! Optional JSON configuration file.
//!
//! Resolution order: `--config <path>`, then the `IRLGRAPH_CONFIG`
//! environment variable, then built-in defaults. Explicit command-line flags
//! override whatever the file sets.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use irlgraph_lib::{read_points_of_interest, GridOptions, LandmarkParams, SolveOptions};

use crate::args::BuildArgs;

/// Environment variable naming a fallback config file.
pub const CONFIG_ENV: &str = "IRLGRAPH_CONFIG";

/// Parameters loaded from a config file.
///
/// ```json
/// {
///   "grid": { "nodata": -1, "cellsize": 30 },
///   "landmarks": { "cutoff": 0.5, "grain_proportion": 0.1, "seed": 42 },
///   "solve": { "snap_tolerance": 60 }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub grid: GridOptions,
    pub landmarks: LandmarkParams,
    pub solve: SolveOptions,
}

impl CliConfig {
    /// Parse a config from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("config file is not valid JSON for irlgraph")
    }

    /// Load the config from `explicit`, else from `IRLGRAPH_CONFIG`, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = Self::from_json(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Apply global grid flags on top of the file values.
    pub fn apply_grid_flags(
        &mut self,
        nodata: Option<f64>,
        header_lines: Option<usize>,
        cellsize: Option<f64>,
    ) {
        if let Some(nodata) = nodata {
            self.grid.nodata = nodata;
        }
        if let Some(header_lines) = header_lines {
            self.grid.header_lines = header_lines;
        }
        if let Some(cellsize) = cellsize {
            self.grid.cellsize = cellsize;
        }
    }

    /// Landmark parameters with build flags applied. Points of interest from
    /// `--poi` are appended to any listed in the file.
    pub fn landmark_params(&self, args: &BuildArgs) -> Result<LandmarkParams> {
        let mut params = self.landmarks.clone();
        if let Some(cutoff) = args.cutoff {
            params.cutoff = cutoff;
        }
        if let Some(grain) = args.grain_proportion {
            params.grain_proportion = grain;
        }
        if args.seed.is_some() {
            params.seed = args.seed;
        }
        if let Some(path) = &args.points_of_interest {
            let points = read_points_of_interest(path).with_context(|| {
                format!("failed to read points of interest from {}", path.display())
            })?;
            params.points_of_interest.extend(points);
        }
        Ok(params)
    }
}
