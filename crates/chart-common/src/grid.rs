//! Regular lat/lon analysis grids.

use crate::BoundingBox;
use serde::{Deserialize, Serialize};

/// Specification of a regular lat/lon grid over an analysis domain.
///
/// Node `(j, i)` sits at `(min_lat + j*resolution, min_lon + i*resolution)`;
/// rows run south to north, columns west to east.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Domain bounding box
    pub bbox: BoundingBox,
    /// Node spacing in degrees (same in both axes)
    pub resolution: f64,
    /// Number of points in the longitude direction
    pub nx: usize,
    /// Number of points in the latitude direction
    pub ny: usize,
}

impl GridSpec {
    /// Create a grid covering `bbox` at `resolution`, endpoints included.
    pub fn new(bbox: BoundingBox, resolution: f64) -> Self {
        let nx = (bbox.width() / resolution).round() as usize + 1;
        let ny = (bbox.height() / resolution).round() as usize + 1;
        Self {
            bbox,
            resolution,
            nx,
            ny,
        }
    }

    /// Longitude of column `i`.
    pub fn lon(&self, i: usize) -> f64 {
        self.bbox.min_lon + i as f64 * self.resolution
    }

    /// Latitude of row `j`.
    pub fn lat(&self, j: usize) -> f64 {
        self.bbox.min_lat + j as f64 * self.resolution
    }

    /// Flat row-major index of node `(j, i)`.
    pub fn flat_index(&self, j: usize, i: usize) -> usize {
        j * self.nx + i
    }

    /// Total number of grid nodes.
    pub fn len(&self) -> usize {
        self.nx * self.ny
    }

    /// Check if grid is empty.
    pub fn is_empty(&self) -> bool {
        self.nx == 0 || self.ny == 0
    }
}

/// A scalar field on a [`GridSpec`], row-major, rows south to north.
#[derive(Debug, Clone)]
pub struct ScalarGrid {
    pub spec: GridSpec,
    pub values: Vec<f64>,
}

impl ScalarGrid {
    /// Wrap values for a grid spec; lengths must agree.
    pub fn new(spec: GridSpec, values: Vec<f64>) -> Option<Self> {
        if values.len() != spec.len() {
            return None;
        }
        Some(Self { spec, values })
    }

    /// Allocate a grid filled with NaN.
    pub fn filled_nan(spec: GridSpec) -> Self {
        Self {
            values: vec![f64::NAN; spec.len()],
            spec,
        }
    }

    /// Value at node `(j, i)`.
    pub fn get(&self, j: usize, i: usize) -> f64 {
        self.values[self.spec.flat_index(j, i)]
    }
}

/// Analysis domains used by the synoptic charts.
pub mod domains {
    use super::*;

    /// Grid resolution shared by both domains, degrees.
    pub const RESOLUTION: f64 = 0.25;

    /// Surface analysis domain (South Asia region).
    pub fn surface() -> GridSpec {
        GridSpec::new(BoundingBox::new(50.0, 5.0, 100.0, 35.0), RESOLUTION)
    }

    /// Upper-air analysis domain (wider coverage for sounding stations).
    pub fn upper_air() -> GridSpec {
        GridSpec::new(BoundingBox::new(35.0, 0.0, 120.0, 45.0), RESOLUTION)
    }
}
