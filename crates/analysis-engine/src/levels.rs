//! Contour level derivation from observed extrema.

use chart_common::VariableKind;

/// Compute the ordered, evenly spaced contour levels for one variable.
///
/// The minimum is floored and the maximum ceiled to the variable's interval
/// (2 hPa for pressure, 60 gpm for height, 1 °C for temperature); the top
/// level is inclusive, so the sequence always brackets the data range.
pub fn contour_levels(values: &[f64], variable: VariableKind) -> Vec<f64> {
    let mut iter = values.iter().copied();
    let Some(first) = iter.next() else {
        return Vec::new();
    };
    let (min, max) = iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));

    let interval = variable.level_interval();
    let low = (min / interval).floor() * interval;
    let high = (max / interval).ceil() * interval;

    let steps = ((high - low) / interval).round() as usize;
    (0..=steps).map(|k| low + k as f64 * interval).collect()
}
