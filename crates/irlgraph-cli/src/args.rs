//! Shared clap argument groups and value parsers.

use std::path::PathBuf;

use clap::{Args, ValueEnum};

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON on stdout.
    Json,
}

/// Options for reading the cost grid, shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GridArgs {
    /// Cost grid file (ESRI ASCII grid or whitespace-delimited matrix).
    #[arg(long)]
    pub grid: PathBuf,
}

/// Landmark selection flags. Unset flags fall back to the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Standard-deviation cutoff for very important points.
    #[arg(long)]
    pub cutoff: Option<f64>,
    /// Proportion of non-null cells sampled as grain cells (0 to 1).
    #[arg(long = "grain")]
    pub grain_proportion: Option<f64>,
    /// Seed for grain sampling.
    #[arg(long)]
    pub seed: Option<u64>,
    /// CSV file of points of interest with `x` and `y` columns.
    #[arg(long = "poi")]
    pub points_of_interest: Option<PathBuf>,
}

/// Start coordinates for a solve.
#[derive(Args, Debug, Clone, Default)]
pub struct StartArgs {
    /// Start location as `x,y` in map units. Repeat for several starts.
    #[arg(
        long = "start",
        value_parser = parse_coordinate,
        required = true,
        allow_hyphen_values = true
    )]
    pub starts: Vec<(f64, f64)>,
}

/// Parse an `x,y` coordinate pair.
pub fn parse_coordinate(value: &str) -> Result<(f64, f64), String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got {:?}", value))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("{:?} is not a finite number", part.trim()))
    };
    Ok((parse(x)?, parse(y)?))
}
