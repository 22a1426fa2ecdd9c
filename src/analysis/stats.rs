//! Small descriptive-statistics helpers shared by the analyzer and run aggregation.
//!
//! All functions expect finite input; callers validate first.

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by N, not N - 1).
pub(crate) fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let avg = mean(values);
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Population coefficient of variation as a percentage; zero for a zero mean.
pub(crate) fn cv_percent(values: &[f64]) -> f64 {
    let avg = mean(values);
    if avg == 0.0 {
        return 0.0;
    }
    population_std_dev(values) / avg * 100.0
}

pub(crate) fn mean_absolute_deviation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let avg = mean(values);
    values.iter().map(|v| (v - avg).abs()).sum::<f64>() / values.len() as f64
}

/// Order-statistic median; even counts average the two middle values.
pub(crate) fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    median_of_sorted(&sorted)
}

pub(crate) fn median_of_sorted(sorted: &[f64]) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Mean of the lowest `1 / divisor` share of an ascending slice. The share is rounded
/// up and never below one sample.
///
/// Summed as offsets from the smallest value, so a share made of identical samples
/// returns that sample exactly.
pub(crate) fn lowest_share_mean(sorted: &[f64], divisor: usize) -> f64 {
    let Some(&lowest) = sorted.first() else {
        return 0.0;
    };
    let count = sorted.len().div_ceil(divisor.max(1)).clamp(1, sorted.len());
    let offsets: Vec<f64> = sorted[..count].iter().map(|v| v - lowest).collect();
    lowest + mean(&offsets)
}
