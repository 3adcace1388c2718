//! Module syntax differences between GRASS releases.
//!
//! GRASS 7 renamed the raster options of `r.mask` and `g.region`, replaced the
//! per-type options of `g.remove` with `type=`/`name=` and turned `r.mapcalc`
//! into a regular module taking `expression=`. Everything else used here is
//! the same in both.

use super::module::ModuleCall;
use super::Statistic;
use std::fs;
use std::path::Path;

/// Name GRASS gives to the active mask raster.
pub const MASK_RASTER: &str = "MASK";

/// Command syntax of a GRASS release family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// GRASS 6.x
    Grass6,
    /// GRASS 7.0 and later
    #[default]
    Grass7,
}

impl Dialect {
    /// Picks the dialect for a version string such as `6.4.3` or `8.3.1`.
    ///
    /// Returns `None` if the string does not start with a major version number.
    pub fn from_version(version: &str) -> Option<Self> {
        let major: u32 = version
            .trim()
            .split(|c: char| !c.is_ascii_digit())
            .next()
            .filter(|digits| !digits.is_empty())?
            .parse()
            .ok()?;

        Some(if major < 7 {
            Dialect::Grass6
        } else {
            Dialect::Grass7
        })
    }

    /// Reads `$GISBASE/etc/VERSIONNUMBER`, if present.
    pub fn detect(gisbase: &Path) -> Option<Self> {
        let text = fs::read_to_string(gisbase.join("etc").join("VERSIONNUMBER")).ok()?;
        Self::from_version(&text)
    }

    /// A configured version wins over the installation's version file; GRASS 7
    /// syntax is assumed when neither is usable.
    pub fn select(configured: Option<&str>, gisbase: &Path) -> Self {
        configured
            .and_then(Self::from_version)
            .or_else(|| Self::detect(gisbase))
            .unwrap_or_default()
    }

    /// Uses `raster` as the computational mask, replacing any existing mask.
    pub fn set_mask(self, raster: &str) -> ModuleCall {
        match self {
            Dialect::Grass6 => ModuleCall::new("r.mask")
                .option("input", raster)
                .option("maskcats", "1")
                .flags("o"),
            Dialect::Grass7 => ModuleCall::new("r.mask")
                .option("raster", raster)
                .option("maskcats", "1")
                .overwrite(),
        }
    }

    /// Sets the region to the mask's extent and zooms to its non-null cells.
    pub fn zoom_to_mask(self) -> ModuleCall {
        let key = match self {
            Dialect::Grass6 => "rast",
            Dialect::Grass7 => "raster",
        };
        ModuleCall::new("g.region")
            .option(key, MASK_RASTER)
            .option("zoom", MASK_RASTER)
    }

    pub fn recode(self, input: &str, output: &str, rules: &Path) -> ModuleCall {
        ModuleCall::new("r.recode")
            .option("input", input)
            .option("output", output)
            .option("rules", rules.to_string_lossy())
            .overwrite()
    }

    pub fn zonal_statistic(self, zones: &str, cover: &str, statistic: Statistic, output: &str) -> ModuleCall {
        ModuleCall::new("r.statistics")
            .option("base", zones)
            .option("cover", cover)
            .option("method", statistic.as_str())
            .option("output", output)
            .overwrite()
    }

    /// Raster algebra, overwriting the result map.
    pub fn mapcalc(self, expression: &str) -> ModuleCall {
        match self {
            // GRASS 6 r.mapcalc does not use the standard parser; overwrite is
            // requested through the environment instead.
            Dialect::Grass6 => ModuleCall::new("r.mapcalc")
                .arg(expression)
                .env("GRASS_OVERWRITE", "1"),
            Dialect::Grass7 => ModuleCall::new("r.mapcalc")
                .option("expression", expression)
                .overwrite(),
        }
    }

    pub fn colors(self, raster: &str, ramp: &str) -> ModuleCall {
        ModuleCall::new("r.colors")
            .option("map", raster)
            .option("color", ramp)
    }

    /// Lists `category label` pairs of `raster`, skipping null cells.
    pub fn export_labels(self, raster: &str) -> ModuleCall {
        ModuleCall::new("r.stats").flags("ln").option("input", raster)
    }

    pub fn remove_raster(self, raster: &str) -> ModuleCall {
        match self {
            Dialect::Grass6 => ModuleCall::new("g.remove").option("rast", raster),
            Dialect::Grass7 => ModuleCall::new("g.remove")
                .flags("f")
                .option("type", "raster")
                .option("name", raster),
        }
    }
}

/// `r.mapcalc` expression storing `source`'s category labels divided by
/// `scale` as floating point into `target`.
pub fn rescale_expression(target: &str, source: &str, scale: i64) -> String {
    format!("{} = @{} / float({})", target, source, scale)
}
