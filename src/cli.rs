//! Command line arguments.

use crate::grass::Statistic;
use crate::pipeline::{CleanupPolicy, RunRequest};
use crate::plot::{PlotFormat, DEFAULT_BINS};
use clap::Parser;
use std::path::PathBuf;

/// Generate cumulative distribution plots of patch-scale RHESSys output
/// variables aggregated over zones.
#[derive(Parser, Debug)]
#[command(name = "patch-zonal-stats", version, about, long_about = None)]
pub struct Args {
    /// The configuration file (defaults to $ECOHYDROLIB_CFG)
    #[arg(short = 'i', long = "configfile")]
    pub config_file: Option<PathBuf>,

    /// Directory holding the project metadata
    #[arg(short = 'p', long = "projectDir")]
    pub project_dir: PathBuf,

    /// RHESSys patch output file(s)
    #[arg(short = 'd', long = "rhessysOutFile", num_args = 1.., required = true)]
    pub rhessys_out_file: Vec<PathBuf>,

    /// Raster to use as a mask
    #[arg(long)]
    pub mask: Option<String>,

    /// Raster defining the zones in which the statistic is calculated
    #[arg(short = 'z', long)]
    pub zones: String,

    /// Directory to write plots to
    #[arg(short = 'o', long = "outputDir")]
    pub output_dir: PathBuf,

    /// Name(s) of the plot file(s), one per input; ".pdf" (or the chosen
    /// format's extension) is appended and existing files are overwritten
    #[arg(short = 'f', long = "outputFile", num_args = 1.., required = true)]
    pub output_file: Vec<String>,

    /// Name of the patch raster
    #[arg(long = "patchMap", default_value = "patch")]
    pub patch_map: String,

    /// Only use output rows for this year
    #[arg(short = 'y', long)]
    pub year: Option<i32>,

    /// Variable to map; may be an expression such as "trans_sat + trans_unsat"
    #[arg(short = 'v', long = "outputVariable")]
    pub output_variable: String,

    /// Label for the variable (defaults to the expression)
    #[arg(short = 'n', long = "variableName")]
    pub variable_name: Option<String>,

    /// Statistic to calculate per zone
    #[arg(short = 's', long, value_enum)]
    pub statistic: Statistic,

    /// Keep the zonal statistics raster, named after the output file (default)
    #[arg(long, overrides_with = "discardmap")]
    pub keepmap: bool,

    /// Remove the zonal statistics raster when done
    #[arg(long, overrides_with = "keepmap")]
    pub discardmap: bool,

    /// Number of histogram bins
    #[arg(long, default_value_t = DEFAULT_BINS)]
    pub bins: usize,

    /// Plot file format
    #[arg(long, value_enum, default_value_t = PlotFormat::Pdf)]
    pub format: PlotFormat,

    /// Whether failing to remove temporary data fails the run
    #[arg(long, value_enum, default_value_t = CleanupPolicy::Strict)]
    pub cleanup: CleanupPolicy,

    /// Log GRASS commands and other details
    #[arg(long)]
    pub verbose: bool,
}

impl Args {
    /// Later of `--keepmap` and `--discardmap` wins; keeping is the default.
    pub fn keep_map(&self) -> bool {
        !self.discardmap
    }
}

impl From<Args> for RunRequest {
    fn from(args: Args) -> Self {
        let keep_map = args.keep_map();
        RunRequest {
            config_file: args.config_file,
            project_dir: args.project_dir,
            inputs: args.rhessys_out_file,
            outputs: args.output_file,
            mask: args.mask,
            zones: args.zones,
            output_dir: args.output_dir,
            patch_map: args.patch_map,
            year: args.year,
            formula: args.output_variable,
            variable_name: args.variable_name,
            statistic: args.statistic,
            keep_map,
            bins: args.bins,
            format: args.format,
            cleanup: args.cleanup,
        }
    }
}
