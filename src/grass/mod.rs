//! GRASS GIS driver.
//!
//! [`GisEngine`] names the handful of raster operations the pipeline needs.
//! [`GrassSession`] implements them by running GRASS modules against a
//! project's workspace; tests substitute a recording engine.

pub mod dialect;
pub mod module;
pub mod session;

pub use dialect::Dialect;
pub use session::GrassSession;

use clap::ValueEnum;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by GRASS operations
#[derive(Error, Debug)]
pub enum GrassError {
    #[error("Failed to run {module}: {source}")]
    Spawn {
        module: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{module} failed (exit code {}): {stderr}", exit_code(.code))]
    Failed {
        module: String,
        code: Option<i32>,
        stderr: String,
        stdout: String,
    },

    #[error("GISBASE {} is not a directory", .0.display())]
    GisbaseMissing(PathBuf),

    #[error("GRASS mapset {} does not exist", .0.display())]
    MapsetMissing(PathBuf),

    #[error("Failed to write GRASS session file: {0}")]
    SessionFile(#[source] std::io::Error),
}

fn exit_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "none".to_string(), |c| c.to_string())
}

/// Aggregate computed per zone by `r.statistics`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Statistic {
    Average,
    Mode,
    Median,
    Avedev,
    Stddev,
    Variance,
    Skewness,
    Kurtosis,
    Min,
    Max,
    Sum,
}

impl Statistic {
    /// Method name understood by `r.statistics`.
    pub fn as_str(self) -> &'static str {
        match self {
            Statistic::Average => "average",
            Statistic::Mode => "mode",
            Statistic::Median => "median",
            Statistic::Avedev => "avedev",
            Statistic::Stddev => "stddev",
            Statistic::Variance => "variance",
            Statistic::Skewness => "skewness",
            Statistic::Kurtosis => "kurtosis",
            Statistic::Min => "min",
            Statistic::Max => "max",
            Statistic::Sum => "sum",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raster operations used by the zonal statistics pipeline.
///
/// Every call blocks until the operation has finished.
pub trait GisEngine {
    /// Makes `raster` the computational mask.
    fn set_mask(&mut self, raster: &str) -> Result<(), GrassError>;

    /// Shrinks the region to the extent of the current mask.
    fn zoom_to_mask(&mut self) -> Result<(), GrassError>;

    /// Recodes `input` into `output` using the rule file at `rules`.
    fn recode(&mut self, input: &str, output: &str, rules: &Path) -> Result<(), GrassError>;

    /// Aggregates `cover` within each zone of `zones` into `output`.
    fn zonal_statistic(
        &mut self,
        zones: &str,
        cover: &str,
        statistic: Statistic,
        output: &str,
    ) -> Result<(), GrassError>;

    /// Writes `source / scale` as a floating-point raster named `target`.
    fn rescale_into(&mut self, source: &str, target: &str, scale: i64) -> Result<(), GrassError>;

    /// Applies the named colour ramp to `raster`.
    fn set_colors(&mut self, raster: &str, ramp: &str) -> Result<(), GrassError>;

    /// Returns the `zone value` lines of `raster`.
    fn export_labels(&mut self, raster: &str) -> Result<String, GrassError>;

    fn remove_raster(&mut self, raster: &str) -> Result<(), GrassError>;
}
