//! Analyzed meteorological variables.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A variable the engine interpolates and contours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    /// Sea-level pressure, hPa (surface analyses)
    Pressure,
    /// Geopotential height, gpm (upper-air analyses)
    Height,
    /// Air temperature, °C
    Temperature,
}

impl VariableKind {
    /// Physically plausible value range; observations outside it are dropped.
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            VariableKind::Pressure => (965.0, 1050.0),
            VariableKind::Height => (700.0, 24000.0),
            VariableKind::Temperature => (-50.0, 50.0),
        }
    }

    /// Contour level spacing in the variable's unit.
    pub fn level_interval(&self) -> f64 {
        match self {
            VariableKind::Pressure => 2.0,
            VariableKind::Height => 60.0,
            VariableKind::Temperature => 1.0,
        }
    }

    /// Minimum prominence for HIGH/LOW center classification.
    ///
    /// Temperature fields are never scanned for centers.
    pub fn extremum_floor(&self) -> Option<f64> {
        match self {
            VariableKind::Pressure => Some(1.5),
            VariableKind::Height => Some(90.0),
            VariableKind::Temperature => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VariableKind::Pressure => "pressure",
            VariableKind::Height => "height",
            VariableKind::Temperature => "temperature",
        }
    }

    /// Unit label used in logs and feature properties.
    pub fn unit(&self) -> &'static str {
        match self {
            VariableKind::Pressure => "hPa",
            VariableKind::Height => "gpm",
            VariableKind::Temperature => "°C",
        }
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
