use crate::expression::ExpressionError;
use crate::grass::GrassError;
use crate::plot::PlotError;
use crate::project::ProjectError;
use crate::reclass::ReclassError;
use crate::stats::StatsError;
use crate::table::TableError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a zonal statistics run
#[derive(Error, Debug)]
pub enum ZonalStatsError {
    #[error("Number of data files {inputs} does not match number of output filenames {outputs}")]
    CardinalityMismatch { inputs: usize, outputs: usize },

    #[error("Unable to read RHESSys output file {}", .0.display())]
    UnreadableInput(PathBuf),

    #[error("Unable to write to output directory {}", .0.display())]
    UnwritableOutputDir(PathBuf),

    #[error("Bin count must be at least 1")]
    InvalidBins,

    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error("No output variables specified")]
    NoVariables,

    #[error("Invalid output variable expression: {0}")]
    Expression(#[from] ExpressionError),

    #[error("Failed to load RHESSys output file {}: {source}", .path.display())]
    Table {
        path: PathBuf,
        #[source]
        source: TableError,
    },

    #[error("No data found for variable in RHESSys output file '{}'", .0.display())]
    EmptyTable(PathBuf),

    #[error(transparent)]
    Reclass(#[from] ReclassError),

    #[error("Failed to {action}: {source}")]
    Gis {
        action: String,
        #[source]
        source: GrassError,
    },

    #[error("Failed to read zonal statistics for {output}: {source}")]
    Stats {
        output: String,
        #[source]
        source: StatsError,
    },

    #[error("Failed to create plot {}: {source}", .path.display())]
    Plot {
        path: PathBuf,
        #[source]
        source: PlotError,
    },

    #[error("Cleanup failed: {}", .0.join("; "))]
    Cleanup(Vec<String>),

    #[error("Failed to create temporary directory: {0}")]
    TempDir(#[source] std::io::Error),
}

pub type Result<T> = core::result::Result<T, ZonalStatsError>;

/// Attaches a description of the attempted step to GIS failures.
pub trait GisContext<T> {
    fn gis_context(self, action: impl FnOnce() -> String) -> Result<T>;
}

impl<T> GisContext<T> for core::result::Result<T, GrassError> {
    fn gis_context(self, action: impl FnOnce() -> String) -> Result<T> {
        self.map_err(|source| ZonalStatsError::Gis {
            action: action(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let err = ZonalStatsError::CardinalityMismatch {
            inputs: 2,
            outputs: 1,
        };
        assert_eq!(
            err.to_string(),
            "Number of data files 2 does not match number of output filenames 1"
        );
        assert_eq!(
            ZonalStatsError::NoVariables.to_string(),
            "No output variables specified"
        );
        assert_eq!(
            ZonalStatsError::EmptyTable(PathBuf::from("patch.daily")).to_string(),
            "No data found for variable in RHESSys output file 'patch.daily'"
        );
    }

    #[test]
    fn reclass_errors_keep_their_own_message() {
        let err = ZonalStatsError::from(ReclassError::NonFinite {
            patch: 11,
            value: f64::NAN,
        });
        assert_eq!(
            err.to_string(),
            "Value NaN for patch 11 cannot be stored in a raster"
        );

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ZonalStatsError::from(ReclassError::FileWrite(io));
        assert_eq!(err.to_string(), "Failed to write rule file: denied");
    }

    #[test]
    fn gis_context_wraps_failures() {
        let failed: core::result::Result<(), GrassError> = Err(GrassError::Failed {
            module: "r.recode".into(),
            code: Some(1),
            stderr: "boom".into(),
            stdout: String::new(),
        });

        let err = failed
            .gis_context(|| "create reclass map for output et_avg".to_string())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to create reclass map for output et_avg: r.recode failed (exit code 1): boom"
        );
    }
}
