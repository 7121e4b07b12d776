use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use irlgraph_cli::args::{BuildArgs, GridArgs, OutputFormat, StartArgs};
use irlgraph_cli::commands::baseline::handle_baseline;
use irlgraph_cli::commands::build::handle_build;
use irlgraph_cli::commands::compare::handle_compare;
use irlgraph_cli::commands::landmarks::handle_landmarks;
use irlgraph_cli::commands::solve::{handle_solve, SolveArgs};
use irlgraph_cli::commands::CommandContext;
use irlgraph_cli::config::CliConfig;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Accumulated-cost surfaces over irregular landscape graphs"
)]
struct Cli {
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    /// Null sentinel for grids without a NODATA_value header.
    #[arg(long, global = true, allow_negative_numbers = true)]
    nodata: Option<f64>,

    /// Leading lines to skip in bare matrix grids.
    #[arg(long, global = true)]
    header_lines: Option<usize>,

    /// Cell size for grids without a cellsize header.
    #[arg(long, global = true)]
    cellsize: Option<f64>,

    /// JSON config file (falls back to IRLGRAPH_CONFIG).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report landmark subset sizes for a grid.
    Landmarks {
        #[command(flatten)]
        grid: GridArgs,
        #[command(flatten)]
        build: BuildArgs,
    },
    /// Build an irregular graph and save it.
    Build {
        #[command(flatten)]
        grid: GridArgs,
        #[command(flatten)]
        build: BuildArgs,
        /// Graph file to write.
        #[arg(long)]
        out: PathBuf,
    },
    /// Solve accumulated cost over an irregular graph.
    Solve {
        #[command(flatten)]
        grid: GridArgs,
        /// Saved graph to solve on instead of building one.
        #[arg(long, conflicts_with_all = ["cutoff", "grain_proportion", "seed", "points_of_interest"])]
        graph: Option<PathBuf>,
        #[command(flatten)]
        build: BuildArgs,
        #[command(flatten)]
        starts: StartArgs,
        /// Maximum distance between a start and its snapped node (map units).
        #[arg(long)]
        snap_tolerance: Option<f64>,
        /// Fill cells between graph nodes from their nearest solved cell.
        #[arg(long)]
        impute: bool,
        /// Raster file to write (ESRI ASCII grid).
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Solve accumulated cost over the regular 8-neighbour graph.
    Baseline {
        #[command(flatten)]
        grid: GridArgs,
        #[command(flatten)]
        starts: StartArgs,
        /// Charge diagonal moves as orthogonal ones.
        #[arg(long)]
        no_geo_correct: bool,
        /// Raster file to write (ESRI ASCII grid).
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Compare the irregular solve against the regular baseline.
    Compare {
        #[command(flatten)]
        grid: GridArgs,
        #[command(flatten)]
        build: BuildArgs,
        #[command(flatten)]
        starts: StartArgs,
        /// Charge diagonal moves as orthogonal ones in the baseline.
        #[arg(long)]
        no_geo_correct: bool,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = CliConfig::load(cli.config.as_deref())?;
    config.apply_grid_flags(cli.nodata, cli.header_lines, cli.cellsize);
    let ctx = CommandContext {
        format: cli.format,
        config,
    };

    let rendered = match cli.command {
        Command::Landmarks { grid, build } => handle_landmarks(&ctx, &grid, &build)?,
        Command::Build { grid, build, out } => handle_build(&ctx, &grid, &build, &out)?,
        Command::Solve {
            grid,
            graph,
            build,
            starts,
            snap_tolerance,
            impute,
            out,
        } => handle_solve(
            &ctx,
            &grid,
            &SolveArgs {
                graph,
                build,
                starts,
                snap_tolerance,
                impute,
                out,
            },
        )?,
        Command::Baseline {
            grid,
            starts,
            no_geo_correct,
            out,
        } => handle_baseline(&ctx, &grid, &starts, !no_geo_correct, out.as_deref())?,
        Command::Compare {
            grid,
            build,
            starts,
            no_geo_correct,
        } => handle_compare(&ctx, &grid, &build, &starts, !no_geo_correct)?,
    };

    println!("{}", rendered.trim_end());
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
