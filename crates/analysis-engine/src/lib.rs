//! Synoptic field analysis engine.
//!
//! Turns validated point observations (surface SYNOP, upper-air soundings)
//! into continuous analysis fields for one vertical level and observation
//! time: a kriged and smoothed scalar grid per variable, iso-level contour
//! lines, and HIGH/LOW center markers. The [`AnalysisOrchestrator`] sequences
//! the pipeline and persists results through a
//! [`report_store::ReportStore`].

pub mod centers;
pub mod config;
pub mod contour;
pub mod diagnostics;
pub mod interpolate;
pub mod levels;
pub mod orchestrator;
pub mod spline;
pub mod validate;

pub use centers::detect_centers;
pub use contour::trace_iso_lines;
pub use diagnostics::{DiagnosticsEvent, DiagnosticsSink, EventLog, NullSink};
pub use interpolate::interpolate_field;
pub use levels::contour_levels;
pub use orchestrator::AnalysisOrchestrator;
pub use spline::smooth_path;
pub use validate::validate_observations;
