// src/services/calculations.rs
use std::collections::HashSet;

/// Arithmetic mean; `None` for an empty slice.
pub fn calculate_average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Quantile with linear interpolation between closest ranks, the same
/// definition pandas uses by default. `q` is clamped to `[0, 1]`.
pub fn calculate_quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    Some(sorted_quantile(&sorted, q))
}

/// Quantile of an already sorted, non-empty slice.
pub(crate) fn sorted_quantile(sorted: &[f64], q: f64) -> f64 {
    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

pub fn calculate_median(values: &[f64]) -> Option<f64> {
    calculate_quantile(values, 0.5)
}

/// Rounds half away from zero, so `round_to(-x, n) == -round_to(x, n)`.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn distinct_count<'a, I>(values: I) -> usize
where
    I: IntoIterator<Item = &'a str>,
{
    values.into_iter().collect::<HashSet<_>>().len()
}
