//! Console summary of a run using the [`tabled`] crate

use crate::stats::ZonalStatistics;
use std::path::Path;
use tabled::{Table, Tabled};

/// One row per processed input
#[derive(Debug, Clone, Tabled)]
pub struct OutputSummary {
    #[tabled(rename = "Output")]
    pub output: String,
    #[tabled(rename = "Zones")]
    pub zones: usize,
    #[tabled(rename = "Min")]
    pub min: String,
    #[tabled(rename = "Mean")]
    pub mean: String,
    #[tabled(rename = "Max")]
    pub max: String,
    #[tabled(rename = "Plot")]
    pub plot: String,
}

impl OutputSummary {
    pub fn new(output: &str, stats: &ZonalStatistics, plot: &Path) -> Self {
        Self {
            output: output.to_string(),
            zones: stats.len(),
            min: format_value(stats.min()),
            mean: format_value(stats.mean()),
            max: format_value(stats.max()),
            plot: plot.display().to_string(),
        }
    }
}

fn format_value(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.4}", v))
}

/// Formats the summaries as an ASCII table under `title`.
pub fn format_summary_table(rows: &[OutputSummary], title: &str) -> String {
    if rows.is_empty() {
        return "No outputs produced".to_string();
    }

    let table = Table::new(rows).to_string();
    format!("{}\n{}\n{}", title, "=".repeat(title.len()), table)
}
