//! Analysis output records: contour lines and pressure centers.

use crate::level::LevelTag;
use crate::time::AnalysisTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a pressure/height center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CenterKind {
    #[serde(rename = "HIGH")]
    High,
    #[serde(rename = "LOW")]
    Low,
}

impl CenterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CenterKind::High => "HIGH",
            CenterKind::Low => "LOW",
        }
    }
}

impl fmt::Display for CenterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A local extremum identified directly from station samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Center {
    pub kind: CenterKind,
    pub longitude: f64,
    pub latitude: f64,
    pub value: f64,
}

/// Ordered vertices of one connected contour piece, as (lon, lat) pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourPath {
    pub points: Vec<(f64, f64)>,
}

impl ContourPath {
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// One contour line with its analysis attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourRecord {
    /// The iso-level value (hPa, gpm or °C depending on the collection)
    pub value: f64,
    pub level: LevelTag,
    pub observation_time: AnalysisTime,
    pub path: ContourPath,
}

/// One pressure/height center with its analysis attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CenterRecord {
    pub center: Center,
    pub level: LevelTag,
    pub observation_time: AnalysisTime,
}

/// The three output collections of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisProducts {
    pub observation_time: AnalysisTime,
    pub centers: Vec<CenterRecord>,
    /// Isobars (surface) or height contours (upper air)
    pub primary_contours: Vec<ContourRecord>,
    pub isotherms: Vec<ContourRecord>,
}

impl AnalysisProducts {
    pub fn is_empty(&self) -> bool {
        self.centers.is_empty() && self.primary_contours.is_empty() && self.isotherms.is_empty()
    }
}
