//! A GRASS session bound to one project workspace.
//!
//! Modules are run as child processes with the environment a GRASS shell would
//! provide: `GISBASE`, `GISRC` pointing at a session file naming the database,
//! location and mapset, and the installation's `bin`, `scripts` and `lib`
//! directories on the search paths.

use super::dialect::{rescale_expression, Dialect};
use super::module::ModuleCall;
use super::{GisEngine, GrassError, Statistic};
use crate::project::GrassWorkspace;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[cfg(target_os = "macos")]
const LIBRARY_PATH_VAR: &str = "DYLD_LIBRARY_PATH";
#[cfg(not(target_os = "macos"))]
const LIBRARY_PATH_VAR: &str = "LD_LIBRARY_PATH";

/// Name of the session file written to the scratch directory.
pub const GISRC_FILENAME: &str = "gisrc";

/// Runs GRASS modules against a workspace
#[derive(Debug)]
pub struct GrassSession {
    gisbase: PathBuf,
    dialect: Dialect,
    env: Vec<(String, OsString)>,
}

impl GrassSession {
    /// Prepares a session for `workspace` using the installation at `gisbase`.
    ///
    /// The session file is written into `scratch_dir`, which must outlive the
    /// session.
    pub fn open(
        gisbase: &Path,
        workspace: &GrassWorkspace,
        dialect: Dialect,
        scratch_dir: &Path,
    ) -> Result<Self, GrassError> {
        if !gisbase.is_dir() {
            return Err(GrassError::GisbaseMissing(gisbase.to_path_buf()));
        }

        let mapset_dir = workspace.mapset_dir();
        if !mapset_dir.is_dir() {
            return Err(GrassError::MapsetMissing(mapset_dir));
        }

        let gisrc = scratch_dir.join(GISRC_FILENAME);
        fs::write(
            &gisrc,
            format!(
                "GISDBASE: {}\nLOCATION_NAME: {}\nMAPSET: {}\n",
                workspace.dbase.display(),
                workspace.location,
                workspace.mapset
            ),
        )
        .map_err(GrassError::SessionFile)?;

        let env = session_env(gisbase, &gisrc)?;
        tracing::debug!(
            "GRASS session: {} ({:?}) on {}",
            gisbase.display(),
            dialect,
            mapset_dir.display()
        );

        Ok(Self {
            gisbase: gisbase.to_path_buf(),
            dialect,
            env,
        })
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Environment passed to every module.
    pub fn env(&self) -> &[(String, OsString)] {
        &self.env
    }

    /// Locates `module` in the installation, falling back to a `PATH` lookup.
    fn resolve(&self, module: &str) -> PathBuf {
        ["bin", "scripts"]
            .iter()
            .map(|dir| self.gisbase.join(dir).join(module))
            .find(|candidate| candidate.is_file())
            .unwrap_or_else(|| PathBuf::from(module))
    }

    fn run(&self, call: ModuleCall) -> Result<String, GrassError> {
        let program = self.resolve(call.module());
        call.run(&program, &self.env)
    }
}

fn session_env(gisbase: &Path, gisrc: &Path) -> Result<Vec<(String, OsString)>, GrassError> {
    let prepend = |var: &str, dirs: Vec<PathBuf>| -> Result<OsString, GrassError> {
        let existing = env::var_os(var).unwrap_or_default();
        let inherited = env::split_paths(&existing).filter(|p| !p.as_os_str().is_empty());
        let paths = dirs.into_iter().chain(inherited);
        env::join_paths(paths)
            .map_err(|e| GrassError::SessionFile(io::Error::new(io::ErrorKind::InvalidInput, e)))
    };

    Ok(vec![
        ("GISBASE".to_string(), gisbase.as_os_str().to_owned()),
        ("GISRC".to_string(), gisrc.as_os_str().to_owned()),
        ("GIS_LOCK".to_string(), OsString::from(std::process::id().to_string())),
        (
            "PATH".to_string(),
            prepend("PATH", vec![gisbase.join("bin"), gisbase.join("scripts")])?,
        ),
        (
            LIBRARY_PATH_VAR.to_string(),
            prepend(LIBRARY_PATH_VAR, vec![gisbase.join("lib")])?,
        ),
    ])
}

impl GisEngine for GrassSession {
    fn set_mask(&mut self, raster: &str) -> Result<(), GrassError> {
        self.run(self.dialect.set_mask(raster)).map(drop)
    }

    fn zoom_to_mask(&mut self) -> Result<(), GrassError> {
        self.run(self.dialect.zoom_to_mask()).map(drop)
    }

    fn recode(&mut self, input: &str, output: &str, rules: &Path) -> Result<(), GrassError> {
        self.run(self.dialect.recode(input, output, rules)).map(drop)
    }

    fn zonal_statistic(
        &mut self,
        zones: &str,
        cover: &str,
        statistic: Statistic,
        output: &str,
    ) -> Result<(), GrassError> {
        self.run(self.dialect.zonal_statistic(zones, cover, statistic, output))
            .map(drop)
    }

    fn rescale_into(&mut self, source: &str, target: &str, scale: i64) -> Result<(), GrassError> {
        let expression = rescale_expression(target, source, scale);
        self.run(self.dialect.mapcalc(&expression)).map(drop)
    }

    fn set_colors(&mut self, raster: &str, ramp: &str) -> Result<(), GrassError> {
        self.run(self.dialect.colors(raster, ramp)).map(drop)
    }

    fn export_labels(&mut self, raster: &str) -> Result<String, GrassError> {
        self.run(self.dialect.export_labels(raster))
    }

    fn remove_raster(&mut self, raster: &str) -> Result<(), GrassError> {
        self.run(self.dialect.remove_raster(raster)).map(drop)
    }
}
