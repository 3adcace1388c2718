//! Reclassification rules for `r.recode`
//!
//! Raster cells hold integers, so per-patch values are multiplied by
//! [`INT_RESCALE`] and truncated before being mapped onto the patch raster. The
//! statistics read back from GRASS are divided by the same factor.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Factor between floating-point values and the integer codes stored in rasters.
pub const INT_RESCALE: i64 = 10 * 1000;

/// Errors that can occur while building or writing a reclass rule
#[derive(Error, Debug)]
pub enum ReclassError {
    #[error("{ids} patch identifiers but {values} values")]
    LengthMismatch { ids: usize, values: usize },

    #[error("Value {value} for patch {patch} cannot be stored in a raster")]
    NonFinite { patch: i64, value: f64 },

    #[error("Failed to write rule file: {0}")]
    FileWrite(#[from] std::io::Error),
}

type Result<T> = core::result::Result<T, ReclassError>;

/// Converts `value` to its integer raster code, truncating toward zero.
pub fn rescale(value: f64) -> i64 {
    (value * INT_RESCALE as f64).trunc() as i64
}

/// Converts a raster code (or a statistic over codes) back to the value scale.
pub fn unscale(code: f64) -> f64 {
    code / INT_RESCALE as f64
}

/// One singleton range of a reclass rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleLine {
    pub patch: i64,
    pub code: i64,
}

impl fmt::Display for RuleLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{0}:{0}:{1}:{1}", self.patch, self.code)
    }
}

/// Maps patch identifiers to rescaled values, in input order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReclassRule {
    lines: Vec<RuleLine>,
}

impl ReclassRule {
    /// Builds the rule mapping each patch to its rescaled value
    ///
    /// Order is preserved and duplicates are kept. An empty input yields an
    /// empty rule.
    ///
    /// # Arguments
    /// * `patch_ids` - Patch identifiers, one per output row
    /// * `values` - Formula results for the same rows
    ///
    /// # Returns
    /// * `Ok(ReclassRule)` - One line per row, values multiplied by [`INT_RESCALE`]
    ///   and truncated toward zero
    /// * `Err(ReclassError::LengthMismatch)` - If the slices differ in length
    /// * `Err(ReclassError::NonFinite)` - For the first NaN or infinite value
    pub fn from_values(patch_ids: &[i64], values: &[f64]) -> Result<Self> {
        if patch_ids.len() != values.len() {
            return Err(ReclassError::LengthMismatch {
                ids: patch_ids.len(),
                values: values.len(),
            });
        }

        let lines = patch_ids
            .iter()
            .zip(values)
            .map(|(&patch, &value)| {
                if value.is_finite() {
                    Ok(RuleLine {
                        patch,
                        code: rescale(value),
                    })
                } else {
                    Err(ReclassError::NonFinite { patch, value })
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { lines })
    }

    pub fn lines(&self) -> &[RuleLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Writes one `id:id:code:code` line per entry.
    pub fn write<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        for line in &self.lines {
            writeln!(out, "{}", line)?;
        }
        out.flush()
    }

    /// Writes the rule to `path`, replacing any previous content.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.write(BufWriter::new(file))?;
        Ok(())
    }
}
