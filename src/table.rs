//! Loading of RHESSys output tables
//!
//! RHESSys writes its patch output as whitespace-delimited text with a header
//! row naming every column. This module reads such a file into column-major
//! storage and provides the year filter used before formula evaluation.

use std::fs;
use std::path::Path;
use thiserror::Error;

/// Column holding the spatial-unit identifier.
pub const PATCH_ID_COLUMN: &str = "patchID";

/// Column consulted by [`OutputTable::filter_year`].
pub const YEAR_COLUMN: &str = "year";

/// Errors that can occur while loading an output table
#[derive(Error, Debug)]
pub enum TableError {
    #[error("Failed to read input file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("File has no header row")]
    MissingHeader,

    #[error("Line {line}: expected {expected} values, found {found}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Line {line}: value '{value}' in column '{column}' is not a number")]
    InvalidNumber {
        line: usize,
        column: String,
        value: String,
    },

    #[error("Column '{0}' not found")]
    MissingColumn(String),
}

type Result<T> = core::result::Result<T, TableError>;

/// A table of numeric columns keyed by header name
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTable {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl OutputTable {
    /// Reads the table stored at `path`.
    pub fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parses table text.
    ///
    /// Everything after a `#` on a line is ignored; blank lines are skipped.
    /// The first remaining line is the header.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(index, line)| (index + 1, strip_comment(line)))
            .filter(|(_, line)| !line.trim().is_empty());

        let (_, header) = lines.next().ok_or(TableError::MissingHeader)?;
        let names: Vec<String> = header.split_whitespace().map(str::to_string).collect();
        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];

        for (line_number, line) in lines {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != names.len() {
                return Err(TableError::RaggedRow {
                    line: line_number,
                    expected: names.len(),
                    found: fields.len(),
                });
            }

            for ((field, name), column) in fields.iter().zip(&names).zip(columns.iter_mut()) {
                let value = field.parse::<f64>().map_err(|_| TableError::InvalidNumber {
                    line: line_number,
                    column: name.clone(),
                    value: field.to_string(),
                })?;
                column.push(value);
            }
        }

        Ok(Self { names, columns })
    }

    /// Column names in header order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Values of the column called `name`.
    pub fn column(&self, name: &str) -> Result<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|index| self.columns[index].as_slice())
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))
    }

    /// Keeps only rows whose `year` column equals `year` exactly.
    pub fn filter_year(&self, year: i32) -> Result<Self> {
        let target = f64::from(year);
        let keep: Vec<bool> = self
            .column(YEAR_COLUMN)?
            .iter()
            .map(|&value| value == target)
            .collect();

        let columns = self
            .columns
            .iter()
            .map(|column| {
                column
                    .iter()
                    .zip(&keep)
                    .filter_map(|(&value, &keep)| keep.then_some(value))
                    .collect()
            })
            .collect();

        Ok(Self {
            names: self.names.clone(),
            columns,
        })
    }

    /// Patch identifiers, truncated to integers.
    pub fn patch_ids(&self) -> Result<Vec<i64>> {
        Ok(self
            .column(PATCH_ID_COLUMN)?
            .iter()
            .map(|&id| id.trunc() as i64)
            .collect())
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(index) => &line[..index],
        None => line,
    }
}
