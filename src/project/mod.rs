//! Project context: the project directory, its configuration and the GRASS
//! workspace recorded in its metadata.

pub mod config;
pub mod ini;
pub mod metadata;

pub use config::EcohydroConfig;
pub use metadata::GrassWorkspace;

use ini::IniError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while resolving the project context
#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("Project directory {} does not exist or is not a directory", .0.display())]
    ProjectDirMissing(PathBuf),

    #[error("Project directory {} is not writable", .0.display())]
    ProjectDirNotWritable(PathBuf),

    #[error("No configuration file given and {} is not set", config::CONFIG_ENV_VAR)]
    NoConfigFile,

    #[error("Configuration file {} does not exist", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Configuration file {} does not define {section}/{key}", .path.display())]
    MissingConfigValue {
        path: PathBuf,
        section: &'static str,
        key: &'static str,
    },

    #[error("Metadata in project directory {} does not contain {what}", .project_dir.display())]
    MissingMetadata {
        project_dir: PathBuf,
        what: &'static str,
    },

    #[error(transparent)]
    Ini(#[from] IniError),
}

/// A validated project directory together with its configuration
#[derive(Debug, Clone)]
pub struct ProjectContext {
    pub project_dir: PathBuf,
    pub config: EcohydroConfig,
}

impl ProjectContext {
    /// Opens the project at `project_dir`, loading the configuration from
    /// `config_file` or the environment.
    pub fn open(project_dir: &Path, config_file: Option<&Path>) -> Result<Self, ProjectError> {
        if !project_dir.is_dir() {
            return Err(ProjectError::ProjectDirMissing(project_dir.to_path_buf()));
        }
        if !is_writable_dir(project_dir) {
            return Err(ProjectError::ProjectDirNotWritable(project_dir.to_path_buf()));
        }

        let project_dir = project_dir
            .canonicalize()
            .unwrap_or_else(|_| project_dir.to_path_buf());
        let config = EcohydroConfig::resolve(config_file)?;

        Ok(Self {
            project_dir,
            config,
        })
    }

    /// Reads the GRASS workspace entries from the project metadata.
    pub fn grass_workspace(&self) -> Result<GrassWorkspace, ProjectError> {
        let entries = metadata::read_rhessys_entries(&self.project_dir)?;
        GrassWorkspace::from_entries(&self.project_dir, &entries)
    }
}

/// Whether a file can actually be created inside `dir`.
pub fn is_writable_dir(dir: &Path) -> bool {
    dir.is_dir() && tempfile::tempfile_in(dir).is_ok()
}

/// Whether `path` is a regular file that can be opened for reading.
pub fn is_readable_file(path: &Path) -> bool {
    path.is_file() && std::fs::File::open(path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn opens_project_with_explicit_config() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("eco.cfg");
        fs::write(&config, "[GRASS]\nGISBASE = /opt/grass\n").unwrap();
        fs::write(
            dir.path().join(metadata::METADATA_FILENAME),
            "[rhessys]\ngrass_dbase = GRASSData\ngrass_location = loc\ngrass_mapset = PERMANENT\n",
        )
        .unwrap();

        let context = ProjectContext::open(dir.path(), Some(&config)).unwrap();
        let workspace = context.grass_workspace().unwrap();

        assert_eq!(context.config.gisbase, PathBuf::from("/opt/grass"));
        assert_eq!(workspace.location, "loc");
        assert!(workspace.dbase.ends_with("GRASSData"));
    }

    #[test]
    fn missing_project_dir_is_rejected() {
        let dir = TempDir::new().unwrap();
        let err = ProjectContext::open(&dir.path().join("nope"), None).unwrap_err();
        assert!(matches!(err, ProjectError::ProjectDirMissing(_)));
    }

    #[test]
    fn access_helpers() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("data.txt");
        fs::write(&file, "x").unwrap();

        assert!(is_writable_dir(dir.path()));
        assert!(!is_writable_dir(&file));
        assert!(is_readable_file(&file));
        assert!(!is_readable_file(dir.path()));
    }
}
