//! RHESSys section of the project metadata store (`metadata.txt`).

use super::ini::IniDocument;
use super::ProjectError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Name of the metadata file inside a project directory.
pub const METADATA_FILENAME: &str = "metadata.txt";

/// Metadata section written by the RHESSys workflow tools.
pub const RHESSYS_SECTION: &str = "rhessys";

/// Reads every entry of the `rhessys` section.
///
/// A project without a metadata file, or without the section, yields an empty
/// map so that the caller reports the individual missing keys.
pub fn read_rhessys_entries(project_dir: &Path) -> Result<HashMap<String, String>, ProjectError> {
    let path = project_dir.join(METADATA_FILENAME);
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let document = IniDocument::read(&path)?;
    Ok(document.section(RHESSYS_SECTION).cloned().unwrap_or_default())
}

/// Location of the GRASS workspace a project's rasters live in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrassWorkspace {
    /// GRASS database directory, resolved against the project directory
    pub dbase: PathBuf,
    pub location: String,
    pub mapset: String,
}

impl GrassWorkspace {
    /// Builds the workspace from the `grass_dbase`, `grass_location` and
    /// `grass_mapset` metadata entries.
    pub fn from_entries(
        project_dir: &Path,
        entries: &HashMap<String, String>,
    ) -> Result<Self, ProjectError> {
        let require = |key: &'static str, what: &'static str| {
            entries
                .get(key)
                .cloned()
                .ok_or_else(|| ProjectError::MissingMetadata {
                    project_dir: project_dir.to_path_buf(),
                    what,
                })
        };

        let dbase = require("grass_dbase", "a GRASS Dbase")?;
        let location = require("grass_location", "a GRASS location")?;
        let mapset = require("grass_mapset", "a GRASS mapset")?;

        Ok(Self {
            dbase: project_dir.join(dbase),
            location,
            mapset,
        })
    }

    /// Directory of the mapset inside the GRASS database.
    pub fn mapset_dir(&self) -> PathBuf {
        self.dbase.join(&self.location).join(&self.mapset)
    }
}
