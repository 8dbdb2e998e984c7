//! Ordinary kriging with a spherical variogram.
//!
//! Reproduces the operational configuration: the kriging system is the
//! semivariance matrix bordered by a Lagrange row/column, factorized once
//! per run and solved per grid node. The estimate at a node is the weighted
//! sum of sample values.

use chart_common::{GridSpec, ValidatedSample};
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

/// Spherical variogram model.
#[derive(Debug, Clone, Copy)]
pub struct SphericalVariogram {
    pub sill: f64,
    pub range: f64,
    pub nugget: f64,
}

impl SphericalVariogram {
    /// Semivariance at lag distance `h`. Zero at zero lag; the nugget
    /// applies from the first nonzero lag.
    pub fn semivariance(&self, h: f64) -> f64 {
        if h <= 0.0 {
            return 0.0;
        }
        let psill = self.sill - self.nugget;
        if h >= self.range {
            return psill + self.nugget;
        }
        let r = h / self.range;
        psill * (1.5 * r - 0.5 * r * r * r) + self.nugget
    }
}

/// A fitted ordinary-kriging model over one sample set.
pub struct OrdinaryKriging {
    samples: Vec<ValidatedSample>,
    variogram: SphericalVariogram,
    lu: nalgebra::LU<f64, nalgebra::Dyn, nalgebra::Dyn>,
}

impl OrdinaryKriging {
    /// Build and factorize the kriging system.
    ///
    /// Fails when the bordered semivariance matrix is singular (duplicate
    /// sample locations, degenerate geometry); that failure is terminal for
    /// the run.
    pub fn fit(
        samples: &[ValidatedSample],
        variogram: SphericalVariogram,
    ) -> Result<Self, String> {
        let n = samples.len();
        if n < 2 {
            return Err(format!("kriging requires at least 2 samples, got {}", n));
        }

        let mut a = DMatrix::<f64>::zeros(n + 1, n + 1);
        for i in 0..n {
            for j in (i + 1)..n {
                let dx = samples[i].longitude - samples[j].longitude;
                let dy = samples[i].latitude - samples[j].latitude;
                let gamma = variogram.semivariance((dx * dx + dy * dy).sqrt());
                a[(i, j)] = gamma;
                a[(j, i)] = gamma;
            }
        }
        for i in 0..n {
            a[(i, n)] = 1.0;
            a[(n, i)] = 1.0;
        }

        let lu = a.lu();
        if !lu.is_invertible() {
            return Err("singular kriging matrix".to_string());
        }

        Ok(Self {
            samples: samples.to_vec(),
            variogram,
            lu,
        })
    }

    /// Estimate the field value at one location.
    ///
    /// A node whose system solve fails yields NaN, which the gap-fill step
    /// replaces afterwards.
    pub fn predict(&self, lon: f64, lat: f64) -> f64 {
        let n = self.samples.len();
        let mut b = DVector::<f64>::zeros(n + 1);
        for (i, s) in self.samples.iter().enumerate() {
            let dx = lon - s.longitude;
            let dy = lat - s.latitude;
            b[i] = self.variogram.semivariance((dx * dx + dy * dy).sqrt());
        }
        b[n] = 1.0;

        match self.lu.solve(&b) {
            Some(weights) => self
                .samples
                .iter()
                .enumerate()
                .map(|(i, s)| weights[i] * s.value)
                .sum(),
            None => f64::NAN,
        }
    }

    /// Evaluate the model on every node of a grid, row-parallel.
    pub fn predict_grid(&self, spec: &GridSpec) -> Vec<f64> {
        let mut values = vec![0.0f64; spec.len()];
        values
            .par_chunks_mut(spec.nx)
            .enumerate()
            .for_each(|(j, row)| {
                let lat = spec.lat(j);
                for (i, v) in row.iter_mut().enumerate() {
                    *v = self.predict(spec.lon(i), lat);
                }
            });
        values
    }
}

/// Population variance of sample values, the variogram sill.
pub fn sample_variance(samples: &[ValidatedSample]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let n = samples.len() as f64;
    let mean = samples.iter().map(|s| s.value).sum::<f64>() / n;
    samples
        .iter()
        .map(|s| {
            let d = s.value - mean;
            d * d
        })
        .sum::<f64>()
        / n
}

#[cfg(test)]
mod tests {
    use super::*;
    use chart_common::{grid::domains, BoundingBox};

    fn samples() -> Vec<ValidatedSample> {
        vec![
            ValidatedSample { longitude: 80.0, latitude: 20.0, value: 1008.0 },
            ValidatedSample { longitude: 90.0, latitude: 20.0, value: 1012.0 },
            ValidatedSample { longitude: 85.0, latitude: 30.0, value: 1010.0 },
            ValidatedSample { longitude: 75.0, latitude: 28.0, value: 1006.0 },
            ValidatedSample { longitude: 95.0, latitude: 12.0, value: 1014.0 },
        ]
    }

    fn variogram(samples: &[ValidatedSample]) -> SphericalVariogram {
        SphericalVariogram {
            sill: sample_variance(samples),
            range: 10.0,
            nugget: 0.1,
        }
    }

    #[test]
    fn test_semivariance_shape() {
        let v = SphericalVariogram { sill: 4.0, range: 10.0, nugget: 0.1 };
        assert_eq!(v.semivariance(0.0), 0.0);
        assert!((v.semivariance(10.0) - 4.0).abs() < 1e-12);
        assert!((v.semivariance(50.0) - 4.0).abs() < 1e-12);
        // monotone up to the range
        assert!(v.semivariance(2.0) < v.semivariance(5.0));
        assert!(v.semivariance(5.0) < v.semivariance(9.9));
    }

    #[test]
    fn test_fit_and_predict_finite() {
        let s = samples();
        let model = OrdinaryKriging::fit(&s, variogram(&s)).unwrap();
        let v = model.predict(85.0, 22.0);
        assert!(v.is_finite());
        // estimate stays near the data range
        assert!(v > 1000.0 && v < 1020.0);
    }

    #[test]
    fn test_duplicate_locations_singular() {
        let s = vec![
            ValidatedSample { longitude: 85.0, latitude: 27.0, value: 1008.0 },
            ValidatedSample { longitude: 85.0, latitude: 27.0, value: 1012.0 },
            ValidatedSample { longitude: 85.0, latitude: 27.0, value: 1010.0 },
        ];
        assert!(OrdinaryKriging::fit(&s, variogram(&s)).is_err());
    }

    #[test]
    fn test_grid_prediction_deterministic() {
        let s = samples();
        let spec = GridSpec::new(BoundingBox::new(80.0, 15.0, 90.0, 25.0), 1.0);
        let model = OrdinaryKriging::fit(&s, variogram(&s)).unwrap();
        let first = model.predict_grid(&spec);
        let second = model.predict_grid(&spec);
        assert_eq!(first, second);
        assert_eq!(first.len(), spec.len());
    }

    #[test]
    fn test_full_domain_shape() {
        let s = samples();
        let model = OrdinaryKriging::fit(&s, variogram(&s)).unwrap();
        let spec = domains::surface();
        // spot check a small sub-evaluation rather than the full 201x121
        let sub = GridSpec::new(BoundingBox::new(84.0, 26.0, 86.0, 28.0), 0.25);
        assert_eq!(model.predict_grid(&sub).len(), sub.len());
        assert_eq!(spec.len(), 201 * 121);
    }
}
