//! Observation validation and deduplication.

use crate::config;
use chart_common::{AnalysisTime, StationObservation, ValidatedSample, VariableKind};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;

/// Clean a raw observation set for one variable.
///
/// Rules are applied in order; any failure drops the tuple silently (logged
/// at debug only): time window, coordinate range, value present and finite,
/// value within the variable's physical bounds, then deduplication by
/// `(station_id, observed_at)` with the first occurrence winning. Output
/// order follows input order. An empty input yields an empty output.
pub fn validate_observations(
    observations: &[StationObservation],
    variable: VariableKind,
    target_time: AnalysisTime,
    tolerance_minutes: i64,
) -> Vec<ValidatedSample> {
    if observations.is_empty() {
        tracing::warn!(variable = %variable, "No observation data provided");
        return Vec::new();
    }

    let (min_val, max_val) = variable.bounds();
    let target_utc = target_time.with_timezone(&Utc);
    let time_min = target_utc - Duration::minutes(tolerance_minutes);
    let time_max = target_utc + Duration::minutes(tolerance_minutes);

    let mut seen: HashSet<(&str, DateTime<Utc>)> = HashSet::new();
    let mut validated = Vec::new();

    for obs in observations {
        if obs.observed_at < time_min || obs.observed_at > time_max {
            tracing::debug!(station = %obs.station_id, observed_at = %obs.observed_at, "Dropped: outside time window");
            continue;
        }
        if !(-180.0..=180.0).contains(&obs.longitude) || !(-90.0..=90.0).contains(&obs.latitude) {
            tracing::debug!(station = %obs.station_id, "Dropped: coordinates out of range");
            continue;
        }
        let Some(value) = obs.value else {
            tracing::debug!(station = %obs.station_id, "Dropped: missing value");
            continue;
        };
        if !value.is_finite() {
            tracing::debug!(station = %obs.station_id, "Dropped: non-finite value");
            continue;
        }
        if value < min_val || value > max_val {
            tracing::debug!(station = %obs.station_id, value, "Dropped: outside physical bounds");
            continue;
        }
        if !seen.insert((obs.station_id.as_str(), obs.observed_at)) {
            tracing::debug!(station = %obs.station_id, "Dropped: duplicate station/time");
            continue;
        }
        validated.push(ValidatedSample {
            longitude: obs.longitude,
            latitude: obs.latitude,
            value,
        });
    }

    tracing::info!(
        variable = %variable,
        validated = validated.len(),
        input = observations.len(),
        "Validated observation data"
    );
    validated
}

/// Validate with the default ±30 minute tolerance.
pub fn validate_observations_default(
    observations: &[StationObservation],
    variable: VariableKind,
    target_time: AnalysisTime,
) -> Vec<ValidatedSample> {
    validate_observations(
        observations,
        variable,
        target_time,
        config::TIME_TOLERANCE_MINUTES,
    )
}
