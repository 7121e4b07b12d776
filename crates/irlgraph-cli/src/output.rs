//! Output formatting for command results.
//!
//! Every command produces a serialisable report. JSON output is the report
//! itself; text output is a short labelled listing.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use serde::Serialize;

use irlgraph_lib::{Comparison, GraphStats, LandmarkSummary, RasterSummary};

use crate::args::OutputFormat;
use crate::terminal::{format_with_separators, ColorPalette};

/// Result of the `build` command.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub landmarks: LandmarkSummary,
    pub graph: GraphStats,
    pub path: String,
    /// Hex SHA-256 of the graph file body.
    pub checksum: String,
}

/// Result of the `solve` and `baseline` commands.
#[derive(Debug, Clone, Serialize)]
pub struct SolveReport {
    pub solver: &'static str,
    pub raster: RasterSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imputed: Option<RasterSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    pub elapsed_ms: f64,
}

/// Result of the `compare` command.
#[derive(Debug, Clone, Serialize)]
pub struct CompareReport {
    pub graph: GraphStats,
    pub build_ms: f64,
    pub solve_ms: f64,
    pub impute_ms: f64,
    pub regular_ms: f64,
    pub comparison: Comparison,
}

/// Render a report in the requested format.
pub fn render<T: Serialize>(
    format: OutputFormat,
    report: &T,
    text: impl FnOnce(&T, &ColorPalette) -> String,
) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(report).context("failed to serialize report")
        }
        OutputFormat::Text => Ok(text(report, &ColorPalette::detect())),
    }
}

fn heading(out: &mut String, palette: &ColorPalette, title: &str) {
    let _ = writeln!(out, "{}{}{}", palette.heading, title, palette.reset);
}

fn count(out: &mut String, palette: &ColorPalette, label: &str, value: usize) {
    let _ = writeln!(
        out,
        "  {}{:<18}{} {}{}{}",
        palette.label,
        label,
        palette.reset,
        palette.count,
        format_with_separators(value as u64),
        palette.reset
    );
}

fn number(out: &mut String, palette: &ColorPalette, label: &str, value: Option<f64>) {
    let shown = value.map_or_else(|| "-".to_string(), |v| format!("{:.4}", v));
    let _ = writeln!(
        out,
        "  {}{:<18}{} {}{}{}",
        palette.label, label, palette.reset, palette.cost, shown, palette.reset
    );
}

fn text_line(out: &mut String, palette: &ColorPalette, label: &str, value: &str) {
    let _ = writeln!(out, "  {}{:<18}{} {}", palette.label, label, palette.reset, value);
}

pub fn landmarks_text(summary: &LandmarkSummary, palette: &ColorPalette) -> String {
    let mut out = String::new();
    heading(&mut out, palette, "Landmarks");
    count(&mut out, palette, "points of interest", summary.points_of_interest);
    count(&mut out, palette, "very important", summary.very_important);
    count(&mut out, palette, "landscape limit", summary.landscape_limit);
    count(&mut out, palette, "grain", summary.grain);
    count(&mut out, palette, "null", summary.null);
    count(&mut out, palette, "coordinate cells", summary.coordinate_cells);
    text_line(&mut out, palette, "seed", &summary.seed.to_string());
    out
}

pub fn graph_text(stats: &GraphStats, palette: &ColorPalette) -> String {
    let mut out = String::new();
    heading(&mut out, palette, "Graph");
    count(&mut out, palette, "nodes", stats.nodes);
    count(&mut out, palette, "edges", stats.edges);
    count(&mut out, palette, "components", stats.components);
    count(&mut out, palette, "isolated nodes", stats.isolated_nodes);
    number(&mut out, palette, "mean degree", Some(stats.mean_degree));
    number(&mut out, palette, "coverage", Some(stats.coverage));
    out
}

pub fn build_text(report: &BuildReport, palette: &ColorPalette) -> String {
    let mut out = landmarks_text(&report.landmarks, palette);
    out.push_str(&graph_text(&report.graph, palette));
    text_line(&mut out, palette, "saved to", &report.path);
    let short = report.checksum.get(..16).unwrap_or(&report.checksum);
    text_line(&mut out, palette, "checksum", &format!("{}...", short));
    out
}

fn raster_text(out: &mut String, palette: &ColorPalette, title: &str, summary: &RasterSummary) {
    heading(out, palette, title);
    count(out, palette, "cost cells", summary.cost_cells);
    count(out, palette, "no-path cells", summary.no_path_cells);
    count(out, palette, "unset cells", summary.unset_cells);
    number(out, palette, "min cost", summary.min_cost);
    number(out, palette, "max cost", summary.max_cost);
    number(out, palette, "mean cost", summary.mean_cost);
}

pub fn solve_text(report: &SolveReport, palette: &ColorPalette) -> String {
    let mut out = String::new();
    raster_text(
        &mut out,
        palette,
        &format!("Accumulated cost ({})", report.solver),
        &report.raster,
    );
    if let Some(imputed) = &report.imputed {
        raster_text(&mut out, palette, "After imputation", imputed);
    }
    if let Some(path) = &report.output {
        text_line(&mut out, palette, "saved to", path);
    }
    text_line(
        &mut out,
        palette,
        "elapsed",
        &format!("{:.1} ms", report.elapsed_ms),
    );
    out
}

pub fn compare_text(report: &CompareReport, palette: &ColorPalette) -> String {
    let mut out = graph_text(&report.graph, palette);
    heading(&mut out, palette, "Timings (ms)");
    number(&mut out, palette, "irregular build", Some(report.build_ms));
    number(&mut out, palette, "irregular solve", Some(report.solve_ms));
    number(&mut out, palette, "imputation", Some(report.impute_ms));
    number(&mut out, palette, "regular solve", Some(report.regular_ms));
    let stats = &report.comparison;
    heading(&mut out, palette, "Irregular vs regular");
    count(&mut out, palette, "compared cells", stats.compared_cells);
    count(&mut out, palette, "irregular only", stats.candidate_only);
    count(&mut out, palette, "regular only", stats.reference_only);
    number(&mut out, palette, "mean abs error", stats.mean_absolute_error);
    number(&mut out, palette, "rmse", stats.root_mean_square_error);
    number(&mut out, palette, "max abs error", stats.max_absolute_error);
    number(&mut out, palette, "correlation", stats.correlation);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> LandmarkSummary {
        LandmarkSummary {
            points_of_interest: 1,
            very_important: 2,
            landscape_limit: 1200,
            grain: 4,
            null: 0,
            coordinate_cells: 1205,
            seed: 9,
        }
    }

    #[test]
    fn landmarks_text_lists_every_subset() {
        let text = landmarks_text(&summary(), &ColorPalette::plain());
        assert!(text.starts_with("Landmarks\n"));
        assert!(text.contains("landscape limit    1,200"));
        assert!(text.contains("seed               9"));
    }

    #[test]
    fn json_render_is_the_report() {
        let json = render(OutputFormat::Json, &summary(), landmarks_text).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["coordinate_cells"], 1205);
    }

    #[test]
    fn missing_numbers_render_as_dash() {
        let mut out = String::new();
        number(&mut out, &ColorPalette::plain(), "max cost", None);
        assert_eq!(out, "  max cost           -\n");
    }
}
