//! Field interpolation: kriging onto the analysis grid, gap filling and
//! smoothing.

pub mod kriging;
pub mod smooth;

use crate::config;
use chart_common::{ChartError, GridSpec, ScalarGrid, ValidatedSample, VariableKind};
use kriging::{sample_variance, OrdinaryKriging, SphericalVariogram};
use smooth::gaussian_smooth;

/// Interpolate one variable's samples onto `spec`.
///
/// Kriging failure (singular covariance, numerical error) is terminal for
/// the run. Non-finite nodes left by the solve are filled from the nearest
/// sample, then the field is blurred with
/// [`config::GAUSSIAN_SIGMA`] to suppress kriging artifacts before
/// contouring.
pub fn interpolate_field(
    samples: &[ValidatedSample],
    variable: VariableKind,
    spec: GridSpec,
) -> Result<ScalarGrid, ChartError> {
    let variogram = SphericalVariogram {
        sill: sample_variance(samples),
        range: config::VARIOGRAM_RANGE,
        nugget: config::VARIOGRAM_NUGGET,
    };

    let model = OrdinaryKriging::fit(samples, variogram).map_err(|e| {
        ChartError::InterpolationFailure(format!("{} kriging: {}", variable, e))
    })?;

    let mut values = model.predict_grid(&spec);
    if values.len() != spec.len() {
        return Err(ChartError::InterpolationFailure(format!(
            "{} grid shape mismatch: {} values for {}x{} nodes",
            variable,
            values.len(),
            spec.ny,
            spec.nx
        )));
    }

    let filled = fill_from_nearest(&mut values, &spec, samples);
    if filled > 0 {
        tracing::debug!(variable = %variable, filled, "Filled non-finite grid nodes");
    }

    gaussian_smooth(&mut values, spec.nx, spec.ny, config::GAUSSIAN_SIGMA);

    ScalarGrid::new(spec, values).ok_or_else(|| {
        ChartError::InterpolationFailure(format!("{} grid shape mismatch after smoothing", variable))
    })
}

/// Replace non-finite nodes with the value of the nearest sample.
///
/// Returns the number of nodes filled.
pub fn fill_from_nearest(
    values: &mut [f64],
    spec: &GridSpec,
    samples: &[ValidatedSample],
) -> usize {
    if samples.is_empty() {
        return 0;
    }

    let mut filled = 0;
    for j in 0..spec.ny {
        let lat = spec.lat(j);
        for i in 0..spec.nx {
            let idx = spec.flat_index(j, i);
            if values[idx].is_finite() {
                continue;
            }
            let lon = spec.lon(i);
            let mut best = samples[0].value;
            let mut best_dist = f64::INFINITY;
            for s in samples {
                let dx = lon - s.longitude;
                let dy = lat - s.latitude;
                let d = dx * dx + dy * dy;
                if d < best_dist {
                    best_dist = d;
                    best = s.value;
                }
            }
            values[idx] = best;
            filled += 1;
        }
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use chart_common::BoundingBox;

    fn samples() -> Vec<ValidatedSample> {
        vec![
            ValidatedSample { longitude: 80.0, latitude: 20.0, value: 1008.0 },
            ValidatedSample { longitude: 90.0, latitude: 20.0, value: 1012.0 },
            ValidatedSample { longitude: 85.0, latitude: 30.0, value: 1010.0 },
            ValidatedSample { longitude: 78.0, latitude: 26.0, value: 1006.0 },
        ]
    }

    #[test]
    fn test_interpolated_field_is_finite() {
        let spec = GridSpec::new(BoundingBox::new(75.0, 15.0, 95.0, 32.0), 0.5);
        let grid = interpolate_field(&samples(), VariableKind::Pressure, spec).unwrap();
        assert_eq!(grid.values.len(), spec.len());
        assert!(grid.values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_interpolation_deterministic() {
        let spec = GridSpec::new(BoundingBox::new(75.0, 15.0, 95.0, 32.0), 1.0);
        let a = interpolate_field(&samples(), VariableKind::Pressure, spec).unwrap();
        let b = interpolate_field(&samples(), VariableKind::Pressure, spec).unwrap();
        assert_eq!(a.values, b.values);
    }

    #[test]
    fn test_duplicate_sample_locations_fatal() {
        let dup = vec![
            ValidatedSample { longitude: 85.0, latitude: 27.0, value: 1008.0 },
            ValidatedSample { longitude: 85.0, latitude: 27.0, value: 1012.0 },
            ValidatedSample { longitude: 85.0, latitude: 27.0, value: 1010.0 },
        ];
        let spec = GridSpec::new(BoundingBox::new(80.0, 20.0, 90.0, 30.0), 1.0);
        let err = interpolate_field(&dup, VariableKind::Pressure, spec).unwrap_err();
        assert!(matches!(err, ChartError::InterpolationFailure(_)));
    }

    #[test]
    fn test_fill_from_nearest() {
        let spec = GridSpec::new(BoundingBox::new(80.0, 20.0, 82.0, 22.0), 1.0);
        let mut values = vec![f64::NAN; spec.len()];
        let samples = vec![
            ValidatedSample { longitude: 80.0, latitude: 20.0, value: 1.0 },
            ValidatedSample { longitude: 82.0, latitude: 22.0, value: 9.0 },
        ];
        let filled = fill_from_nearest(&mut values, &spec, &samples);
        assert_eq!(filled, spec.len());
        // south-west corner takes the first sample, north-east the second
        assert_eq!(values[spec.flat_index(0, 0)], 1.0);
        assert_eq!(values[spec.flat_index(2, 2)], 9.0);
    }
}
