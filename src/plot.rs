//! Cumulative distribution plots of zonal statistics
//!
//! Values are binned into equal-width bins spanning their range and drawn as a
//! normalised cumulative step outline with the [`plotters`] crate. The outline
//! stops at the top of the last bin instead of dropping back to zero, and the
//! x-axis ends at the left edge of the last bin.
//!
//! PDF plots are drawn as SVG in memory and converted with [`svg2pdf`].

use clap::ValueEnum;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use svg2pdf::usvg;
use thiserror::Error;

/// Default number of histogram bins.
pub const DEFAULT_BINS: usize = 1000;

/// Figure size in pixels (4:3).
const FIGURE_SIZE: (u32, u32) = (640, 480);

/// Errors that can occur during plot generation
#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Failed to create drawing area: {0}")]
    DrawingArea(String),

    #[error("Failed to configure chart: {0}")]
    ChartConfig(String),

    #[error("Failed to draw chart elements: {0}")]
    Drawing(String),

    #[error("Failed to convert plot to PDF: {0}")]
    Conversion(String),

    #[error("Failed to save plot to file: {0}")]
    FileSave(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

type Result<T> = core::result::Result<T, PlotError>;

/// File format of the generated plots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PlotFormat {
    #[default]
    Pdf,
    Svg,
    Png,
}

impl PlotFormat {
    pub fn extension(self) -> &'static str {
        match self {
            PlotFormat::Pdf => "pdf",
            PlotFormat::Svg => "svg",
            PlotFormat::Png => "png",
        }
    }
}

/// Path of the plot named `name` in `output_dir`: the name with the format's
/// extension appended.
pub fn plot_path(output_dir: &Path, name: &str, format: PlotFormat) -> PathBuf {
    output_dir.join(format!("{}.{}", name, format.extension()))
}

/// Normalised cumulative histogram
#[derive(Debug, Clone, PartialEq)]
pub struct CumulativeHistogram {
    /// `bins + 1` ascending bin edges.
    edges: Vec<f64>,
    /// Fraction of values at or below each bin's right edge.
    cumulative: Vec<f64>,
}

impl CumulativeHistogram {
    /// Bins `values` into `bins` equal-width bins over their range.
    ///
    /// Every bin is half-open except the last, which also holds the maximum.
    /// When all values are equal the range is widened to `value ± 0.5`.
    ///
    /// # Arguments
    /// * `values` - Per-zone statistics, in any order
    /// * `bins` - Number of equal-width bins, at least 1
    ///
    /// # Returns
    /// * `Ok(CumulativeHistogram)` - `bins + 1` edges and the fraction of values
    ///   at or below each bin's right edge
    /// * `Err(PlotError::InvalidData)` - If `values` is empty, holds a
    ///   non-finite value, or `bins` is zero
    pub fn compute(values: &[f64], bins: usize) -> Result<Self> {
        if values.is_empty() {
            return Err(PlotError::InvalidData("Data cannot be empty".to_string()));
        }
        if bins == 0 {
            return Err(PlotError::InvalidData(
                "Bin count must be at least 1".to_string(),
            ));
        }
        if let Some(value) = values.iter().find(|v| !v.is_finite()) {
            return Err(PlotError::InvalidData(format!(
                "Value {} cannot be plotted",
                value
            )));
        }

        let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
        let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let width = (hi - lo) / bins as f64;
        let mut edges: Vec<f64> = (0..bins).map(|i| lo + i as f64 * width).collect();
        edges.push(hi);

        let mut counts = vec![0usize; bins];
        for &value in values {
            let bin = (((value - lo) / width) as usize).min(bins - 1);
            counts[bin] += 1;
        }

        let total = values.len() as f64;
        let mut running = 0;
        let cumulative = counts
            .iter()
            .map(|count| {
                running += count;
                running as f64 / total
            })
            .collect();

        Ok(Self { edges, cumulative })
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn cumulative(&self) -> &[f64] {
        &self.cumulative
    }

    /// Vertices of the step outline, starting at `(e0, 0)`.
    ///
    /// The final vertex of a closed outline, back down to zero at the right
    /// edge, is left out.
    pub fn step_outline(&self) -> Vec<(f64, f64)> {
        let mut points = Vec::with_capacity(1 + 2 * self.cumulative.len());
        points.push((self.edges[0], 0.0));
        for (i, &level) in self.cumulative.iter().enumerate() {
            points.push((self.edges[i], level));
            points.push((self.edges[i + 1], level));
        }
        points
    }

    /// Horizontal extent of the plot: the first edge to the second-to-last.
    ///
    /// Falls back to the full range when there is a single bin.
    pub fn x_range(&self) -> (f64, f64) {
        let n = self.edges.len();
        let start = self.edges[0];
        let end = self.edges[n - 2];
        if end > start {
            (start, end)
        } else {
            (start, self.edges[n - 1])
        }
    }
}

/// Creates a cumulative distribution plot and saves it to `output_path`
///
/// The step outline of `histogram` is drawn over `[0, 1]` on the Y-axis with
/// the left and bottom axes only.
///
/// # Arguments
/// * `histogram` - Binned values to draw
/// * `x_label` - Label for the X-axis
/// * `output_path` - Path where the plot should be saved; an existing file is
///   overwritten
/// * `format` - File format written to `output_path`
///
/// # Returns
/// * `Ok(())` - If the plot was successfully created and saved
/// * `Err(PlotError)` - If an error occurred during drawing, conversion or saving
///
/// # Chart Properties
/// * Size: 640x480
/// * Y-axis: 0-1 (cumulative fraction)
/// * No title and no grid
pub fn create_cdf_plot(
    histogram: &CumulativeHistogram,
    x_label: &str,
    output_path: &Path,
    format: PlotFormat,
) -> Result<()> {
    match format {
        PlotFormat::Pdf => {
            let mut svg = String::new();
            draw_cdf(
                SVGBackend::with_string(&mut svg, FIGURE_SIZE).into_drawing_area(),
                histogram,
                x_label,
            )?;
            fs::write(output_path, svg_to_pdf(&svg)?)?;
            Ok(())
        }
        PlotFormat::Svg => draw_cdf(
            SVGBackend::new(output_path, FIGURE_SIZE).into_drawing_area(),
            histogram,
            x_label,
        ),
        PlotFormat::Png => draw_cdf(
            BitMapBackend::new(output_path, FIGURE_SIZE).into_drawing_area(),
            histogram,
            x_label,
        ),
    }
}

/// Converts an SVG document to a single-page PDF of the same size.
///
/// Text is laid out with the system fonts.
fn svg_to_pdf(svg: &str) -> Result<Vec<u8>> {
    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();

    let tree =
        usvg::Tree::from_str(svg, &options).map_err(|e| PlotError::Conversion(e.to_string()))?;
    svg2pdf::to_pdf(
        &tree,
        svg2pdf::ConversionOptions::default(),
        svg2pdf::PageOptions::default(),
    )
    .map_err(|e| PlotError::Conversion(e.to_string()))
}

/// Destination for rendered distribution plots
pub trait CdfRenderer {
    fn render(
        &mut self,
        histogram: &CumulativeHistogram,
        x_label: &str,
        output_path: &Path,
    ) -> Result<()>;
}

/// Writes plots to disk with [`create_cdf_plot`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FileRenderer {
    pub format: PlotFormat,
}

impl CdfRenderer for FileRenderer {
    fn render(
        &mut self,
        histogram: &CumulativeHistogram,
        x_label: &str,
        output_path: &Path,
    ) -> Result<()> {
        create_cdf_plot(histogram, x_label, output_path, self.format)
    }
}

fn draw_cdf<DB: DrawingBackend>(
    drawing_area: DrawingArea<DB, Shift>,
    histogram: &CumulativeHistogram,
    x_label: &str,
) -> Result<()> {
    drawing_area
        .fill(&WHITE)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    let (x_min, x_max) = histogram.x_range();

    // Axes only on the left and bottom; no caption, no grid.
    let mut chart_context = ChartBuilder::on(&drawing_area)
        .margin(12)
        .x_label_area_size(44)
        .y_label_area_size(44)
        .build_cartesian_2d(x_min..x_max, 0.0..1.0)
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    chart_context
        .configure_mesh()
        .disable_mesh()
        .x_desc(x_label)
        .axis_desc_style(("sans-serif", 14))
        .label_style(("sans-serif", 11))
        .x_labels(6)
        .y_labels(6)
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    let outline = histogram
        .step_outline()
        .into_iter()
        .map(|(x, y)| (x.min(x_max), y));
    chart_context
        .draw_series(LineSeries::new(outline, &BLUE))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    drawing_area
        .present()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[test]
    fn cumulative_is_monotonic_and_ends_at_one() {
        let values = [0.3, 0.1, 0.9, 0.5, 0.5, 0.7, 0.2];
        let histogram = CumulativeHistogram::compute(&values, 10).unwrap();

        assert_eq!(histogram.edges().len(), 11);
        assert_eq!(histogram.edges()[0], 0.1);
        assert_eq!(histogram.edges()[10], 0.9);

        let cumulative = histogram.cumulative();
        assert!(cumulative.windows(2).all(|w| w[0] <= w[1]));
        assert!(cumulative.iter().all(|c| (0.0..=1.0).contains(c)));
        assert_eq!(*cumulative.last().unwrap(), 1.0);
    }

    #[test]
    fn maximum_falls_in_last_bin() {
        let histogram = CumulativeHistogram::compute(&[0.0, 1.0, 2.0, 3.0], 3).unwrap();
        assert_eq!(histogram.cumulative(), [0.25, 0.5, 1.0]);
    }

    #[test]
    fn step_outline_omits_trailing_drop() {
        let histogram = CumulativeHistogram::compute(&[0.0, 1.0, 2.0, 3.0], 3).unwrap();
        let outline = histogram.step_outline();

        assert_eq!(outline.len(), 7);
        assert_eq!(outline[0], (0.0, 0.0));
        assert_eq!(outline[1], (0.0, 0.25));
        assert_eq!(outline[2], (1.0, 0.25));
        assert_eq!(*outline.last().unwrap(), (3.0, 1.0));
        assert!(outline[1..].iter().all(|&(_, y)| y > 0.0));
    }

    #[test]
    fn x_range_ends_at_second_to_last_edge() {
        let histogram = CumulativeHistogram::compute(&[0.0, 4.0], 4).unwrap();
        assert_eq!(histogram.x_range(), (0.0, 3.0));

        let single = CumulativeHistogram::compute(&[0.0, 4.0], 1).unwrap();
        assert_eq!(single.x_range(), (0.0, 4.0));
    }

    #[test]
    fn equal_values_widen_the_range() {
        let histogram = CumulativeHistogram::compute(&[2.5, 2.5, 2.5], 2).unwrap();
        assert_eq!(histogram.edges(), [2.0, 2.5, 3.0]);
        assert_eq!(histogram.cumulative(), [0.0, 1.0]);
    }

    #[rstest]
    #[case(&[], 10)]
    #[case(&[1.0, 2.0], 0)]
    #[case(&[1.0, f64::NAN], 10)]
    #[case(&[f64::INFINITY], 10)]
    fn rejects_invalid_input(#[case] values: &[f64], #[case] bins: usize) {
        let result = CumulativeHistogram::compute(values, bins);
        assert!(matches!(result, Err(PlotError::InvalidData(_))));
    }

    #[rstest]
    #[case(PlotFormat::Pdf, "et_avg.pdf")]
    #[case(PlotFormat::Svg, "et_avg.svg")]
    #[case(PlotFormat::Png, "et_avg.png")]
    fn plot_path_appends_extension(#[case] format: PlotFormat, #[case] expected: &str) {
        let path = plot_path(Path::new("/out"), "et_avg", format);
        assert_eq!(path, Path::new("/out").join(expected));
    }

    #[test]
    fn plots_are_pdf_by_default() {
        let path = plot_path(Path::new("/out"), "et", PlotFormat::default());
        assert!(path.ends_with("et.pdf"));
    }

    #[test]
    fn converts_svg_to_pdf() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" width="640" height="480" viewBox="0 0 640 480">
<rect x="0" y="0" width="640" height="480" fill="#FFFFFF"/>
<polyline fill="none" stroke="#0000FF" points="44,436 44,300 320,300 320,40 628,40"/>
</svg>"##;

        let pdf = svg_to_pdf(svg).unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
    }

    #[test]
    fn rejects_malformed_svg() {
        let result = svg_to_pdf("<svg");
        assert!(matches!(result, Err(PlotError::Conversion(_))));
    }

    #[test]
    #[ignore = "Font rendering not available in test environment"]
    fn renders_pdf_file() {
        let dir = TempDir::new().unwrap();
        let output_path = plot_path(dir.path(), "cdf", PlotFormat::Pdf);
        let values: Vec<f64> = (0..200).map(|i| (i as f64 * 0.37).cos()).collect();
        let histogram = CumulativeHistogram::compute(&values, DEFAULT_BINS).unwrap();

        create_cdf_plot(&histogram, "evap", &output_path, PlotFormat::Pdf).unwrap();

        let pdf = std::fs::read(&output_path).unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
    }

    #[test]
    #[ignore = "Font rendering not available in test environment"]
    fn renders_svg_file() {
        let dir = TempDir::new().unwrap();
        let output_path = plot_path(dir.path(), "cdf", PlotFormat::Svg);
        let values: Vec<f64> = (0..200).map(|i| (i as f64 * 0.37).sin()).collect();
        let histogram = CumulativeHistogram::compute(&values, DEFAULT_BINS).unwrap();

        create_cdf_plot(&histogram, "trans_sat + trans_unsat", &output_path, PlotFormat::Svg)
            .unwrap();

        let svg = std::fs::read_to_string(&output_path).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("polyline"));
    }
}
