//! Reader for the INI dialect shared by the ecohydrology configuration file
//! and the project metadata store.
//!
//! Section names are case-sensitive, keys are not (they are stored lower-case).
//! Both `key = value` and `key: value` are accepted. Lines starting with `#` or
//! `;` are comments.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while reading an INI document
#[derive(Error, Debug)]
pub enum IniError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Line {line}: entry outside of any section")]
    NoSection { line: usize },

    #[error("Line {line}: expected 'key = value', found '{text}'")]
    Malformed { line: usize, text: String },
}

type Result<T> = core::result::Result<T, IniError>;

/// A parsed INI document
#[derive(Debug, Default, Clone)]
pub struct IniDocument {
    sections: HashMap<String, HashMap<String, String>>,
}

impl IniDocument {
    /// Reads and parses the document at `path`.
    pub fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| IniError::Read {
            path: path.display().to_string(),
            source,
        })?;
        text.parse()
    }

    /// Returns the value of `key` in `section`, if present.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|entries| entries.get(&key.to_ascii_lowercase()))
            .map(String::as_str)
    }

    /// Returns all entries of `section`, if the section exists.
    pub fn section(&self, section: &str) -> Option<&HashMap<String, String>> {
        self.sections.get(section)
    }
}

impl std::str::FromStr for IniDocument {
    type Err = IniError;

    fn from_str(text: &str) -> Result<Self> {
        let mut document = IniDocument::default();
        let mut current: Option<String> = None;

        for (index, raw) in text.lines().enumerate() {
            let line_number = index + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                let name = name.trim().to_string();
                document.sections.entry(name.clone()).or_default();
                current = Some(name);
                continue;
            }

            let Some(section) = current.as_ref() else {
                return Err(IniError::NoSection { line: line_number });
            };

            let split_at = line.find(|c: char| c == '=' || c == ':').ok_or_else(|| IniError::Malformed {
                line: line_number,
                text: line.to_string(),
            })?;
            let key = line[..split_at].trim();
            if key.is_empty() {
                return Err(IniError::Malformed {
                    line: line_number,
                    text: line.to_string(),
                });
            }
            let value = line[split_at + 1..].trim();

            document
                .sections
                .entry(section.clone())
                .or_default()
                .insert(key.to_ascii_lowercase(), value.to_string());
        }

        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sections_and_both_separators() {
        let doc: IniDocument = "\
# comment
[rhessys]
grass_dbase = GRASSData
GRASS_Location: default

[GRASS]
; another comment
GISBASE = /usr/lib/grass64
"
        .parse()
        .unwrap();

        assert_eq!(doc.get("rhessys", "grass_dbase"), Some("GRASSData"));
        assert_eq!(doc.get("rhessys", "grass_location"), Some("default"));
        assert_eq!(doc.get("GRASS", "gisbase"), Some("/usr/lib/grass64"));
        assert_eq!(doc.get("GRASS", "GISBASE"), Some("/usr/lib/grass64"));
        assert_eq!(doc.get("grass", "gisbase"), None);
    }

    #[test]
    fn value_keeps_separators_after_the_first() {
        let doc: IniDocument = "[a]\nurl = http://host:8080/x\n".parse().unwrap();
        assert_eq!(doc.get("a", "url"), Some("http://host:8080/x"));
    }

    #[test]
    fn rejects_entries_before_any_section() {
        let err = "key = value\n".parse::<IniDocument>().unwrap_err();
        assert!(matches!(err, IniError::NoSection { line: 1 }));
    }

    #[test]
    fn rejects_lines_without_separator() {
        let err = "[a]\njust text\n".parse::<IniDocument>().unwrap_err();
        assert!(matches!(err, IniError::Malformed { line: 2, .. }));
    }
}
