//! Ecohydrology configuration file.
//!
//! The file is located either through `--configfile` or through the
//! `ECOHYDROLIB_CFG` environment variable and must define `GRASS/GISBASE`.

use super::ini::IniDocument;
use super::ProjectError;
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable consulted when no configuration file is given.
pub const CONFIG_ENV_VAR: &str = "ECOHYDROLIB_CFG";

/// Section holding the GRASS installation settings.
pub const GRASS_SECTION: &str = "GRASS";

/// Settings read from the configuration file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcohydroConfig {
    /// Where the configuration was read from
    pub path: PathBuf,
    /// Root of the GRASS installation
    pub gisbase: PathBuf,
    /// Optional `GRASS/GRASS_VERSION` override for the command dialect
    pub grass_version: Option<String>,
}

impl EcohydroConfig {
    /// Loads the configuration from `explicit` or, failing that, from the path
    /// named by [`CONFIG_ENV_VAR`].
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ProjectError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => env::var_os(CONFIG_ENV_VAR)
                .map(PathBuf::from)
                .ok_or(ProjectError::NoConfigFile)?,
        };
        Self::read(&path)
    }

    /// Reads the configuration file at `path`.
    pub fn read(path: &Path) -> Result<Self, ProjectError> {
        if !path.is_file() {
            return Err(ProjectError::ConfigNotFound(path.to_path_buf()));
        }

        let document = IniDocument::read(path)?;
        let gisbase = document
            .get(GRASS_SECTION, "GISBASE")
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ProjectError::MissingConfigValue {
                path: path.to_path_buf(),
                section: GRASS_SECTION,
                key: "GISBASE",
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            gisbase: PathBuf::from(gisbase),
            grass_version: document
                .get(GRASS_SECTION, "GRASS_VERSION")
                .map(str::to_string),
        })
    }
}
