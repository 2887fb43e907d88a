//! heatgrid library crate.
//!
//! Turns a 52x7 glyph grid and a year into a synthetic commit history whose
//! per-day density draws the grid on a contribution heatmap. The `heatgrid`
//! binary is a thin CLI over [`pipeline::run`]; the modules are public so
//! integration tests can drive each stage directly.

pub mod bootstrap;
pub mod builder;
pub mod calendar;
pub mod config;
pub mod error;
pub mod format;
pub mod grid;
pub mod marker;
pub mod pipeline;
pub mod plan;
pub mod sampler;
pub mod symbols;
pub mod telemetry;

pub use error::{GridLocation, HeatgridError, Result};
pub use grid::Grid;
pub use pipeline::{RunRequest, RunSummary};
pub use symbols::Glyph;
