//! # patch-zonal-stats
//!
//! Per-zone statistics of RHESSys patch output variables, computed with GRASS GIS.
//!
//! A formula over output columns is evaluated for every patch, pushed into the
//! patch raster as an integer reclassification, aggregated per zone by
//! `r.statistics` and read back to draw a cumulative distribution plot.

pub mod cli;
/// Errors that abort a run.
pub mod error;
pub mod expression;
pub mod grass;
pub mod logging;
pub mod pipeline;
pub mod plot;
pub mod project;
pub mod reclass;
pub mod stats;
pub mod summary;
pub mod table;

pub use error::ZonalStatsError;
