//! Summary statistics over a sample of numbers
//!
//! The variance here is the population variance: squared deviations are
//! divided by `n`, not `n - 1`.

/// Sum of all values, `None` for an empty sample
pub fn sum(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum())
}

/// Arithmetic mean
pub fn mean(values: &[f64]) -> Option<f64> {
    sum(values).map(|total| total / values.len() as f64)
}

/// Population variance: `(1/n) * sum((x - mean)^2)`
pub fn population_variance(values: &[f64]) -> Option<f64> {
    let avg = mean(values)?;
    let squared: f64 = values.iter().map(|x| (x - avg).powi(2)).sum();
    Some(squared / values.len() as f64)
}

/// Square root of [`population_variance`]
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    population_variance(values).map(f64::sqrt)
}
