//! Contour path smoothing and resampling.
//!
//! Traced polylines are jagged at grid-cell scale. Each path is lightly
//! blended, then refit with a cubic spline parameterized by normalized arc
//! length and resampled to a fixed vertex count so stored geometries have
//! uniform density.

use crate::config;
use chart_common::ContourPath;

/// Smooth one contour path and resample it to `target_points` vertices.
///
/// Paths with fewer than [`config::SPLINE_MIN_POINTS`] vertices are returned
/// unchanged; they are too short for a cubic fit. Numerical failure
/// (degenerate arc length, non-finite output) falls back to the original
/// path, logged, never fatal.
pub fn smooth_path(path: &ContourPath, target_points: usize, smoothing: f64) -> ContourPath {
    let n = path.len();
    if n < config::SPLINE_MIN_POINTS || target_points < 2 {
        return path.clone();
    }

    let blended = blend_pass(&path.points, smoothing);

    match resample_spline(&blended, target_points) {
        Some(points) => ContourPath::new(points),
        None => {
            tracing::warn!(points = n, "Spline smoothing failed, keeping original path");
            path.clone()
        }
    }
}

/// Smooth with the default target count and smoothing factor.
pub fn smooth_path_default(path: &ContourPath) -> ContourPath {
    smooth_path(path, config::SPLINE_POINTS, config::SPLINE_SMOOTHING)
}

/// One neighbor-blend pass; endpoints stay pinned so the resampled path
/// keeps its anchors.
fn blend_pass(points: &[(f64, f64)], weight: f64) -> Vec<(f64, f64)> {
    let n = points.len();
    let mut out = Vec::with_capacity(n);
    out.push(points[0]);
    for i in 1..(n - 1) {
        let (px, py) = points[i - 1];
        let (cx, cy) = points[i];
        let (nx, ny) = points[i + 1];
        let keep = 1.0 - 2.0 * weight;
        out.push((
            weight * px + keep * cx + weight * nx,
            weight * py + keep * cy + weight * ny,
        ));
    }
    out.push(points[n - 1]);
    out
}

/// Fit a Catmull-Rom spline over the path, parameterized by normalized arc
/// length, and sample it uniformly. Returns None on degenerate input.
fn resample_spline(points: &[(f64, f64)], target_points: usize) -> Option<Vec<(f64, f64)>> {
    let n = points.len();

    // cumulative chord length parameterization
    let mut params = Vec::with_capacity(n);
    params.push(0.0f64);
    for i in 1..n {
        let dx = points[i].0 - points[i - 1].0;
        let dy = points[i].1 - points[i - 1].1;
        let step = (dx * dx + dy * dy).sqrt();
        params.push(params[i - 1] + step);
    }
    let total = params[n - 1];
    if !total.is_finite() || total <= 0.0 {
        return None;
    }
    for p in &mut params {
        *p /= total;
    }

    let mut out = Vec::with_capacity(target_points);
    let mut segment = 0usize;
    for k in 0..target_points {
        let u = k as f64 / (target_points - 1) as f64;

        while segment + 2 < n && params[segment + 1] < u {
            segment += 1;
        }

        let u0 = params[segment];
        let u1 = params[segment + 1];
        let span = u1 - u0;
        let t = if span > 0.0 {
            ((u - u0) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let p0 = points[segment.saturating_sub(1)];
        let p1 = points[segment];
        let p2 = points[segment + 1];
        let p3 = points[(segment + 2).min(n - 1)];

        let x = catmull_rom(p0.0, p1.0, p2.0, p3.0, t);
        let y = catmull_rom(p0.1, p1.1, p2.1, p3.1, t);
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        out.push((x, y));
    }

    Some(out)
}

/// 1D Catmull-Rom cubic interpolation.
fn catmull_rom(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;

    let a = -0.5 * p0 + 1.5 * p1 - 1.5 * p2 + 0.5 * p3;
    let b = p0 - 2.5 * p1 + 2.0 * p2 - 0.5 * p3;
    let c = -0.5 * p0 + 0.5 * p2;
    let d = p1;

    a * t3 + b * t2 + c * t + d
}
