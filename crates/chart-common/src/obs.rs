//! Observation records flowing from the store into the engine.

use crate::variable::VariableKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One station row returned by the report store for a level/time window.
///
/// `primary_value` is sea-level pressure (hPa) on surface rows and
/// geopotential height (gpm) on upper-air rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationReport {
    pub station_id: String,
    pub longitude: f64,
    pub latitude: f64,
    pub observed_at: DateTime<Utc>,
    pub primary_value: Option<f64>,
    pub temperature: Option<f64>,
}

impl StationReport {
    /// Extract the observation of one variable from this row.
    pub fn observation(&self, variable: VariableKind) -> StationObservation {
        let value = match variable {
            VariableKind::Pressure | VariableKind::Height => self.primary_value,
            VariableKind::Temperature => self.temperature,
        };
        StationObservation {
            longitude: self.longitude,
            latitude: self.latitude,
            value,
            station_id: self.station_id.clone(),
            observed_at: self.observed_at,
        }
    }
}

/// A single-variable observation tuple, input to validation.
#[derive(Debug, Clone, PartialEq)]
pub struct StationObservation {
    pub longitude: f64,
    pub latitude: f64,
    pub value: Option<f64>,
    pub station_id: String,
    pub observed_at: DateTime<Utc>,
}

/// An observation that passed validation; run-local.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatedSample {
    pub longitude: f64,
    pub latitude: f64,
    pub value: f64,
}
