//! Separable Gaussian smoothing of grid fields.
//!
//! Matches the filter the charts were tuned with: kernel truncated at four
//! standard deviations, reflected borders.

/// Apply an isotropic Gaussian blur to a row-major grid in place.
pub fn gaussian_smooth(values: &mut [f64], nx: usize, ny: usize, sigma: f64) {
    if sigma <= 0.0 || values.len() != nx * ny || nx == 0 || ny == 0 {
        return;
    }

    let kernel = gaussian_kernel(sigma);
    let radius = kernel.len() / 2;

    // rows
    let mut line = vec![0.0f64; nx.max(ny)];
    for j in 0..ny {
        let row = &values[j * nx..(j + 1) * nx];
        convolve_reflect(row, &kernel, radius, &mut line[..nx]);
        values[j * nx..(j + 1) * nx].copy_from_slice(&line[..nx]);
    }

    // columns
    let mut column = vec![0.0f64; ny];
    for i in 0..nx {
        for j in 0..ny {
            column[j] = values[j * nx + i];
        }
        convolve_reflect(&column, &kernel, radius, &mut line[..ny]);
        for j in 0..ny {
            values[j * nx + i] = line[j];
        }
    }
}

/// Normalized 1D Gaussian kernel, truncated at 4 sigma.
fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (4.0 * sigma + 0.5) as usize;
    let mut kernel = Vec::with_capacity(2 * radius + 1);
    for k in -(radius as isize)..=(radius as isize) {
        let x = k as f64 / sigma;
        kernel.push((-0.5 * x * x).exp());
    }
    let sum: f64 = kernel.iter().sum();
    for w in &mut kernel {
        *w /= sum;
    }
    kernel
}

/// Convolve one line with reflected boundary handling.
fn convolve_reflect(line: &[f64], kernel: &[f64], radius: usize, out: &mut [f64]) {
    let n = line.len() as isize;
    for (idx, slot) in out.iter_mut().enumerate() {
        let mut acc = 0.0;
        for (k, w) in kernel.iter().enumerate() {
            let offset = k as isize - radius as isize;
            acc += w * line[reflect_index(idx as isize + offset, n)];
        }
        *slot = acc;
    }
}

/// Mirror an index into `[0, n)` without repeating the edge sample.
fn reflect_index(mut idx: isize, n: isize) -> usize {
    if n == 1 {
        return 0;
    }
    loop {
        if idx < 0 {
            idx = -idx - 1;
        } else if idx >= n {
            idx = 2 * n - idx - 1;
        } else {
            return idx as usize;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_normalized() {
        let kernel = gaussian_kernel(2.0);
        assert_eq!(kernel.len(), 17);
        let sum: f64 = kernel.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_field_unchanged() {
        let mut values = vec![5.0; 20 * 20];
        gaussian_smooth(&mut values, 20, 20, 2.0);
        for v in values {
            assert!((v - 5.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_peak_is_spread() {
        let nx = 21;
        let ny = 21;
        let mut values = vec![0.0; nx * ny];
        values[10 * nx + 10] = 100.0;
        gaussian_smooth(&mut values, nx, ny, 2.0);

        let center = values[10 * nx + 10];
        let next = values[10 * nx + 11];
        assert!(center < 100.0);
        assert!(next > 0.0);
        assert!(center > next);
        // mass is conserved away from borders
        let total: f64 = values.iter().sum();
        assert!((total - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_reflect_index() {
        assert_eq!(reflect_index(-1, 5), 0);
        assert_eq!(reflect_index(-2, 5), 1);
        assert_eq!(reflect_index(5, 5), 4);
        assert_eq!(reflect_index(6, 5), 3);
        assert_eq!(reflect_index(2, 5), 2);
    }
}
