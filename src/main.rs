use clap::Parser;
use patch_zonal_stats::cli::Args;
use patch_zonal_stats::error::{GisContext, Result, ZonalStatsError};
use patch_zonal_stats::grass::{Dialect, GrassSession};
use patch_zonal_stats::logging;
use patch_zonal_stats::pipeline::RunRequest;
use patch_zonal_stats::plot::FileRenderer;
use std::process::ExitCode;
use tracing::{debug, info};

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!("{:?}", err);
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let mut renderer = FileRenderer {
        format: args.format,
    };
    let prepared = RunRequest::from(args).prepare()?;

    let config = &prepared.context().config;
    let dialect = Dialect::select(config.grass_version.as_deref(), &config.gisbase);
    info!("Using GRASS at {} ({:?})", config.gisbase.display(), dialect);

    let scratch = tempfile::Builder::new()
        .prefix("patchzonalstats")
        .tempdir()
        .map_err(ZonalStatsError::TempDir)?;
    info!("Temp dir: {}", scratch.path().display());

    let mut session = GrassSession::open(&config.gisbase, prepared.workspace(), dialect, scratch.path())
        .gis_context(|| "initialize GRASS".to_string())?;

    let report = prepared.execute(&mut session, &mut renderer, scratch)?;
    println!("{}", report.summary_table());
    Ok(())
}
