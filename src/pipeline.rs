//! Orchestration of a zonal statistics run
//!
//! A run happens in two phases. [`RunRequest::prepare`] validates every input
//! and evaluates the formula for each output file without touching GRASS, so
//! a bad argument never leaves half-written maps behind. [`PreparedRun::execute`]
//! then drives the GIS engine once per output, plots the statistics it reads
//! back and removes the temporary rasters.

use crate::error::{GisContext, Result, ZonalStatsError};
use crate::expression::{ExpressionError, Formula};
use crate::grass::{GisEngine, Statistic};
use crate::logging;
use crate::plot::{plot_path, CdfRenderer, CumulativeHistogram, PlotFormat};
use crate::project::{is_readable_file, is_writable_dir, GrassWorkspace, ProjectContext};
use crate::reclass::{ReclassRule, INT_RESCALE};
use crate::stats::ZonalStatistics;
use crate::summary::{format_summary_table, OutputSummary};
use crate::table::OutputTable;
use bytesize::ByteSize;
use clap::ValueEnum;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{info, warn};

/// File name of the reclass rule inside the scratch directory.
pub const RULE_FILENAME: &str = "reclass.rule";

/// Colour ramp applied to kept statistics maps.
pub const KEPT_MAP_COLORS: &str = "grey1.0";

/// Identifier scoping the temporary rasters of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunId(u64);

impl RunId {
    pub fn new() -> Self {
        Self(rand::random())
    }

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Names of the rasters that only live for the duration of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempRasters {
    /// Patch raster recoded to the per-patch values
    pub cover: String,
    /// Per-zone statistic of `cover`
    pub output: String,
}

impl TempRasters {
    pub fn for_run(run_id: RunId) -> Self {
        Self {
            cover: format!("patchzonalstats_cover_{}", run_id),
            output: format!("patchzonalstats_output_{}", run_id),
        }
    }
}

/// What to do when removing temporary files or rasters fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CleanupPolicy {
    /// Fail the run
    #[default]
    Strict,
    /// Log a warning and succeed
    Warn,
}

/// Everything a run needs, as given on the command line
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub config_file: Option<PathBuf>,
    pub project_dir: PathBuf,
    pub inputs: Vec<PathBuf>,
    pub outputs: Vec<String>,
    pub mask: Option<String>,
    pub zones: String,
    pub output_dir: PathBuf,
    pub patch_map: String,
    pub year: Option<i32>,
    pub formula: String,
    pub variable_name: Option<String>,
    pub statistic: Statistic,
    pub keep_map: bool,
    pub bins: usize,
    pub format: PlotFormat,
    pub cleanup: CleanupPolicy,
}

/// One input file ready to be mapped
#[derive(Debug, Clone)]
struct OutputJob {
    input: PathBuf,
    output: String,
    plot_path: PathBuf,
    rule: ReclassRule,
}

/// A validated request with all formula results computed
#[derive(Debug)]
pub struct PreparedRun {
    context: ProjectContext,
    workspace: GrassWorkspace,
    formula: Formula,
    variable_label: String,
    jobs: Vec<OutputJob>,
    mask: Option<String>,
    zones: String,
    patch_map: String,
    statistic: Statistic,
    keep_map: bool,
    bins: usize,
    cleanup: CleanupPolicy,
    run_id: RunId,
    rasters: TempRasters,
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: RunId,
    pub statistic: Statistic,
    pub outputs: Vec<OutputSummary>,
    /// Cleanup failures tolerated under [`CleanupPolicy::Warn`]
    pub cleanup_warnings: Vec<String>,
}

impl RunReport {
    pub fn summary_table(&self) -> String {
        format_summary_table(
            &self.outputs,
            &format!("Zonal statistics ({})", self.statistic),
        )
    }
}

impl RunRequest {
    /// Validates the request and evaluates the formula for every input.
    ///
    /// Checks run in a fixed order: output count, project context and
    /// metadata, input files, output directory, formula. Nothing here talks
    /// to GRASS.
    pub fn prepare(self) -> Result<PreparedRun> {
        if self.inputs.len() != self.outputs.len() {
            return Err(ZonalStatsError::CardinalityMismatch {
                inputs: self.inputs.len(),
                outputs: self.outputs.len(),
            });
        }

        let context = ProjectContext::open(&self.project_dir, self.config_file.as_deref())?;
        let workspace = context.grass_workspace()?;

        for input in &self.inputs {
            if !is_readable_file(input) {
                return Err(ZonalStatsError::UnreadableInput(input.clone()));
            }
        }

        if !is_writable_dir(&self.output_dir) {
            return Err(ZonalStatsError::UnwritableOutputDir(self.output_dir));
        }
        let output_dir = self
            .output_dir
            .canonicalize()
            .unwrap_or_else(|_| self.output_dir.clone());

        if self.bins == 0 {
            return Err(ZonalStatsError::InvalidBins);
        }

        let formula = match Formula::parse(&self.formula) {
            Err(ExpressionError::Empty) => return Err(ZonalStatsError::NoVariables),
            parsed => parsed?,
        };
        if formula.variables().is_empty() {
            return Err(ZonalStatsError::NoVariables);
        }

        let mut jobs = Vec::with_capacity(self.inputs.len());
        for (input, output) in self.inputs.iter().zip(&self.outputs) {
            let table = load_table(input, self.year)?;
            let patch_ids = table.patch_ids().map_err(|source| ZonalStatsError::Table {
                path: input.clone(),
                source,
            })?;
            let values = formula.evaluate(&table)?;

            jobs.push(OutputJob {
                input: input.clone(),
                output: output.clone(),
                plot_path: plot_path(&output_dir, output, self.format),
                rule: ReclassRule::from_values(&patch_ids, &values)?,
            });
        }

        let run_id = RunId::new();
        let variable_label = self
            .variable_name
            .unwrap_or_else(|| formula.source().to_string());

        Ok(PreparedRun {
            context,
            workspace,
            formula,
            variable_label,
            jobs,
            mask: self.mask,
            zones: self.zones,
            patch_map: self.patch_map,
            statistic: self.statistic,
            keep_map: self.keep_map,
            bins: self.bins,
            cleanup: self.cleanup,
            run_id,
            rasters: TempRasters::for_run(run_id),
        })
    }
}

/// Reads `path`, rejecting tables without rows, then applies the year filter.
fn load_table(path: &Path, year: Option<i32>) -> Result<OutputTable> {
    let size = fs::metadata(path).map(|m| m.len()).unwrap_or_default();
    let pb = logging::spinner(&format!(
        "Reading RHESSys output {} ({})...",
        path.display(),
        ByteSize::b(size)
    ));
    let loaded = OutputTable::read(path);
    pb.finish_and_clear();

    let table = loaded.map_err(|source| ZonalStatsError::Table {
        path: path.to_path_buf(),
        source,
    })?;
    if table.is_empty() {
        return Err(ZonalStatsError::EmptyTable(path.to_path_buf()));
    }
    info!("Read {} rows from {}", table.len(), path.display());

    let Some(year) = year else {
        return Ok(table);
    };
    let filtered = table
        .filter_year(year)
        .map_err(|source| ZonalStatsError::Table {
            path: path.to_path_buf(),
            source,
        })?;
    if filtered.is_empty() {
        warn!("No rows for year {} in {}", year, path.display());
    }
    Ok(filtered)
}

impl PreparedRun {
    pub fn context(&self) -> &ProjectContext {
        &self.context
    }

    pub fn workspace(&self) -> &GrassWorkspace {
        &self.workspace
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn rasters(&self) -> &TempRasters {
        &self.rasters
    }

    /// Plot files this run will write, in input order.
    pub fn plot_paths(&self) -> Vec<&Path> {
        self.jobs.iter().map(|job| job.plot_path.as_path()).collect()
    }

    /// Maps, aggregates and plots every output, then cleans up.
    ///
    /// For each output the reclass rule is written to `scratch`, the patch map
    /// is recoded into the cover raster, the statistic is aggregated per zone
    /// and the exported values are plotted. The first failing step aborts the
    /// run; rasters written up to that point are left in place.
    ///
    /// # Arguments
    /// * `engine` - GIS engine running the modules; its session may live in `scratch`
    /// * `renderer` - Destination for the distribution plots
    /// * `scratch` - Directory for the rule file, deleted after the temporary
    ///   rasters have been removed
    ///
    /// # Returns
    /// * `Ok(RunReport)` - One summary row per output, plus cleanup warnings
    ///   under [`CleanupPolicy::Warn`]
    /// * `Err(ZonalStatsError)` - The first failing step, or the cleanup
    ///   failures under [`CleanupPolicy::Strict`]
    pub fn execute<E, R>(self, engine: &mut E, renderer: &mut R, scratch: TempDir) -> Result<RunReport>
    where
        E: GisEngine,
        R: CdfRenderer,
    {
        info!("Run {} using scratch directory {}", self.run_id, scratch.path().display());
        let rule_path = scratch.path().join(RULE_FILENAME);

        if let Some(mask) = &self.mask {
            info!("Setting mask to {}", mask);
            engine
                .set_mask(mask)
                .gis_context(|| format!("set mask using layer {}", mask))?;
            engine
                .zoom_to_mask()
                .gis_context(|| format!("set region to layer {}", mask))?;
        }

        let mut outputs = Vec::with_capacity(self.jobs.len());
        for job in &self.jobs {
            outputs.push(self.map_output(engine, renderer, job, &rule_path)?);
        }

        let failures = self.clean_up(engine, scratch);
        let cleanup_warnings = match self.cleanup {
            CleanupPolicy::Strict if !failures.is_empty() => {
                return Err(ZonalStatsError::Cleanup(failures));
            }
            _ => failures,
        };
        for failure in &cleanup_warnings {
            warn!("Cleanup: {}", failure);
        }

        Ok(RunReport {
            run_id: self.run_id,
            statistic: self.statistic,
            outputs,
            cleanup_warnings,
        })
    }

    fn map_output<E, R>(
        &self,
        engine: &mut E,
        renderer: &mut R,
        job: &OutputJob,
        rule_path: &Path,
    ) -> Result<OutputSummary>
    where
        E: GisEngine,
        R: CdfRenderer,
    {
        let plot_path = job.plot_path.display();
        job.rule.write_to_file(rule_path)?;
        if job.rule.is_empty() {
            warn!("Reclass rule for {} is empty", job.input.display());
        }

        info!("Mapping variable: {} ...", self.formula.source());
        engine
            .recode(&self.patch_map, &self.rasters.cover, rule_path)
            .gis_context(|| format!("create reclass map for output: {}", plot_path))?;

        info!("Calculating zonal statistics...");
        engine
            .zonal_statistic(&self.zones, &self.rasters.cover, self.statistic, &self.rasters.output)
            .gis_context(|| format!("create zonal statistics for output: {}", plot_path))?;

        if self.keep_map {
            info!("Saving zonal stats to permanent map {}", job.output);
            engine
                .rescale_into(&self.rasters.output, &job.output, INT_RESCALE)
                .gis_context(|| format!("save zonal statistics to map {}", job.output))?;
            engine
                .set_colors(&job.output, KEPT_MAP_COLORS)
                .gis_context(|| "modify color map".to_string())?;
        }

        let exported = engine
            .export_labels(&self.rasters.output)
            .gis_context(|| format!("read zonal statistics for output: {}", plot_path))?;
        let stats = ZonalStatistics::parse(&exported).map_err(|source| ZonalStatsError::Stats {
            output: job.output.clone(),
            source,
        })?;

        CumulativeHistogram::compute(stats.values(), self.bins)
            .and_then(|histogram| renderer.render(&histogram, &self.variable_label, &job.plot_path))
            .map_err(|source| ZonalStatsError::Plot {
                path: job.plot_path.clone(),
                source,
            })?;
        info!("Wrote {} ({} zones)", plot_path, stats.len());

        Ok(OutputSummary::new(&job.output, &stats, &job.plot_path))
    }

    /// Deletes both temporary rasters and then the scratch directory, returning
    /// a description of each step that failed.
    ///
    /// The scratch directory may hold the session file the engine reads, so it
    /// goes last.
    fn clean_up<E: GisEngine>(&self, engine: &mut E, scratch: TempDir) -> Vec<String> {
        let mut failures = Vec::new();

        for raster in [&self.rasters.cover, &self.rasters.output] {
            if let Err(e) = engine.remove_raster(raster) {
                failures.push(format!("failed to remove temporary map {}: {}", raster, e));
            }
        }

        let scratch_path = scratch.path().to_path_buf();
        if let Err(e) = scratch.close() {
            failures.push(format!(
                "failed to remove temporary directory {}: {}",
                scratch_path.display(),
                e
            ));
        }

        failures
    }
}
