//! Engine tuning constants.
//!
//! The variogram parameters and detection thresholds are calibrated against
//! the operational charts; changing them changes output numerically, so they
//! live here as named defaults rather than being derived per run.

/// Accepted deviation of an observation from the run's target time, minutes.
pub const TIME_TOLERANCE_MINUTES: i64 = 30;

/// Width of the store fetch window on either side of the target, minutes.
pub const FETCH_WINDOW_MINUTES: i64 = 60;

/// Minimum validated samples per variable for interpolation to proceed.
pub const MIN_VALIDATED_SAMPLES: usize = 3;

/// Variogram range in degrees.
pub const VARIOGRAM_RANGE: f64 = 10.0;

/// Variogram nugget.
pub const VARIOGRAM_NUGGET: f64 = 0.1;

/// Standard deviation of the post-interpolation Gaussian blur, grid cells.
pub const GAUSSIAN_SIGMA: f64 = 2.0;

/// Neighborhood radius for center detection, degrees (planar lon/lat).
pub const NEIGHBOR_RADIUS_DEG: f64 = 4.0;

/// A station needs strictly more than this many neighbors to be considered.
pub const MIN_NEIGHBORS: usize = 3;

/// Relative part of the center prominence threshold (fraction of data range).
pub const RELATIVE_PROMINENCE: f64 = 0.015;

/// Vertex count every smoothed contour path is resampled to.
pub const SPLINE_POINTS: usize = 200;

/// Neighbor-blend weight of the path smoothing pass.
pub const SPLINE_SMOOTHING: f64 = 0.1;

/// Paths shorter than this pass through the smoother unchanged.
pub const SPLINE_MIN_POINTS: usize = 4;

/// Fetch attempts against the store before a transient error is terminal.
pub const FETCH_MAX_ATTEMPTS: u32 = 3;

/// Base delay of the exponential fetch backoff, milliseconds.
pub const FETCH_BACKOFF_BASE_MS: u64 = 200;
