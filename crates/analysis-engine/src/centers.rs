//! HIGH/LOW center detection from station samples.
//!
//! Centers are identified directly from the validated point values, never
//! from the interpolated grid; the two can disagree and that is accepted
//! behavior. This is a local-extremum heuristic: adjacent stations can both
//! qualify independently and are not deduplicated further.

use crate::config;
use chart_common::{Center, CenterKind, ValidatedSample, VariableKind};

/// Detect local HIGH/LOW centers in a pressure or height sample set.
///
/// A sample qualifies only with strictly more than
/// [`config::MIN_NEIGHBORS`] neighbors within
/// [`config::NEIGHBOR_RADIUS_DEG`] (planar lon/lat distance). The prominence
/// threshold is the larger of the variable's fixed floor and
/// [`config::RELATIVE_PROMINENCE`] of the global data range. Output order
/// follows input order; temperature input yields no centers.
pub fn detect_centers(samples: &[ValidatedSample], variable: VariableKind) -> Vec<Center> {
    let Some(floor) = variable.extremum_floor() else {
        return Vec::new();
    };
    if samples.is_empty() {
        return Vec::new();
    }

    let global_min = samples.iter().map(|s| s.value).fold(f64::INFINITY, f64::min);
    let global_max = samples
        .iter()
        .map(|s| s.value)
        .fold(f64::NEG_INFINITY, f64::max);
    let threshold = floor.max(config::RELATIVE_PROMINENCE * (global_max - global_min));

    let mut centers = Vec::new();
    for (i, sample) in samples.iter().enumerate() {
        let mut neighbor_min = f64::INFINITY;
        let mut neighbor_max = f64::NEG_INFINITY;
        let mut neighbor_count = 0usize;
        for (j, other) in samples.iter().enumerate() {
            if i == j {
                continue;
            }
            let dx = sample.longitude - other.longitude;
            let dy = sample.latitude - other.latitude;
            if (dx * dx + dy * dy).sqrt() < config::NEIGHBOR_RADIUS_DEG {
                neighbor_min = neighbor_min.min(other.value);
                neighbor_max = neighbor_max.max(other.value);
                neighbor_count += 1;
            }
        }

        if neighbor_count <= config::MIN_NEIGHBORS {
            tracing::debug!(station = i, neighbors = neighbor_count, "Too few neighbors for center check");
            continue;
        }

        if sample.value > neighbor_max + threshold {
            centers.push(Center {
                kind: CenterKind::High,
                longitude: sample.longitude,
                latitude: sample.latitude,
                value: sample.value,
            });
        } else if sample.value < neighbor_min - threshold {
            centers.push(Center {
                kind: CenterKind::Low,
                longitude: sample.longitude,
                latitude: sample.latitude,
                value: sample.value,
            });
        }
    }

    tracing::info!(variable = %variable, centers = centers.len(), "Detected centers");
    centers
}
