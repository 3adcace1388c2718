//! Reading zonal statistics exported by `r.stats -ln`

use crate::reclass::unscale;
use thiserror::Error;

/// Errors that can occur while reading exported statistics
#[derive(Error, Debug, PartialEq)]
pub enum StatsError {
    #[error("Line {line}: expected '<zone> <value>', found '{text}'")]
    Malformed { line: usize, text: String },

    #[error("Line {line}: '{value}' is not a number")]
    InvalidNumber { line: usize, value: String },
}

type Result<T> = core::result::Result<T, StatsError>;

/// One aggregated value per zone, in export order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZonalStatistics {
    zones: Vec<i64>,
    values: Vec<f64>,
}

impl ZonalStatistics {
    /// Parses `r.stats -ln` output, dividing every value by the rescale factor.
    ///
    /// Blank lines are ignored. Every other line must hold exactly a zone and a
    /// value.
    ///
    /// # Arguments
    /// * `text` - Standard output of `r.stats -ln` on the statistics raster
    ///
    /// # Returns
    /// * `Ok(ZonalStatistics)` - Zones and unscaled values, in output order
    /// * `Err(StatsError)` - With the 1-based line number of the first bad line
    pub fn parse(text: &str) -> Result<Self> {
        let mut stats = Self::default();

        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let mut fields = trimmed.split_whitespace();
            let (Some(zone), Some(value), None) = (fields.next(), fields.next(), fields.next())
            else {
                return Err(StatsError::Malformed {
                    line: line_no,
                    text: trimmed.to_string(),
                });
            };

            let zone = parse_number(zone, line_no)?;
            let value = parse_number(value, line_no)?;
            stats.zones.push(zone.trunc() as i64);
            stats.values.push(unscale(value));
        }

        Ok(stats)
    }

    pub fn zones(&self) -> &[i64] {
        &self.zones
    }

    /// Values on the original scale.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn min(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }

    pub fn mean(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        Some(self.values.iter().sum::<f64>() / self.len() as f64)
    }
}

fn parse_number(text: &str, line: usize) -> Result<f64> {
    text.parse().map_err(|_| StatsError::InvalidNumber {
        line,
        value: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parses_and_unscales_pairs() {
        let stats = ZonalStatistics::parse("1 12500\n2 30000\n\n3 -5000\n").unwrap();

        assert_eq!(stats.zones(), [1, 2, 3]);
        assert_eq!(stats.values(), [1.25, 3.0, -0.5]);
        assert_eq!(stats.min(), Some(-0.5));
        assert_eq!(stats.max(), Some(3.0));
        assert_eq!(stats.mean(), Some(1.25));
    }

    #[test]
    fn accepts_fractional_statistics() {
        // averages of codes are not integral
        let stats = ZonalStatistics::parse("  7   12345.5  \r\n").unwrap();
        assert_eq!(stats.zones(), [7]);
        assert!((stats.values()[0] - 1.23455).abs() < 1e-12);
    }

    #[test]
    fn empty_export_has_no_values() {
        let stats = ZonalStatistics::parse("\n  \n").unwrap();
        assert!(stats.is_empty());
        assert_eq!(stats.mean(), None);
        assert_eq!(stats.min(), None);
    }

    #[rstest]
    #[case("1 2\n3\n", 2)]
    #[case("1 2 3\n", 1)]
    #[case("\n\n1 2\n4 5 6\n", 4)]
    fn wrong_field_count_names_the_line(#[case] text: &str, #[case] line: usize) {
        let err = ZonalStatistics::parse(text).unwrap_err();
        assert!(matches!(err, StatsError::Malformed { line: l, .. } if l == line));
    }

    #[test]
    fn non_numeric_value_is_rejected() {
        let err = ZonalStatistics::parse("1 2\n2 *\n").unwrap_err();
        assert_eq!(
            err,
            StatsError::InvalidNumber {
                line: 2,
                value: "*".into()
            }
        );
    }
}
