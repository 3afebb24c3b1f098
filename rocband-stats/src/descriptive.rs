//! Descriptive statistics for numeric samples.
//!
//! Provides the sample moments used by the band engine ([`mean`],
//! [`variance`], [`std_dev`]), the rank-based [`quantile`] and the
//! [`percentile_interval`] built on it.

use rocband_core::{Result, RocError};

/// Arithmetic mean.
pub fn mean(data: &[f64]) -> Result<f64> {
    if data.is_empty() {
        return Err(RocError::InvalidArgument(
            "mean: data must not be empty".into(),
        ));
    }
    Ok(data.iter().sum::<f64>() / data.len() as f64)
}

/// Variance with given degrees-of-freedom correction.
///
/// - `ddof = 0` → population variance
/// - `ddof = 1` → sample variance (Bessel's correction)
pub fn variance(data: &[f64], ddof: usize) -> Result<f64> {
    let n = data.len();
    if n <= ddof {
        return Err(RocError::InvalidArgument(format!(
            "variance: need more than {} observations (got {})",
            ddof, n,
        )));
    }
    let m = mean(data)?;
    let ss: f64 = data.iter().map(|&x| (x - m).powi(2)).sum();
    Ok(ss / (n - ddof) as f64)
}

/// Standard deviation with given degrees-of-freedom correction.
pub fn std_dev(data: &[f64], ddof: usize) -> Result<f64> {
    Ok(variance(data, ddof)?.sqrt())
}

/// Rank quantile: sorts the data and returns the element at `floor(q * n)`.
///
/// `q == 0` and `q == 1` return the exact minimum and maximum.
pub fn quantile(data: &[f64], q: f64) -> Result<f64> {
    if data.is_empty() {
        return Err(RocError::InvalidArgument(
            "quantile: data must not be empty".into(),
        ));
    }
    if !(0.0..=1.0).contains(&q) {
        return Err(RocError::InvalidArgument(format!(
            "quantile: q must be in [0, 1], got {}",
            q
        )));
    }
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    Ok(quantile_sorted(&sorted, q))
}

/// Two-sided percentile interval of `values` at `level` percent.
///
/// Returns `[quantile((1 - l) / 2), quantile(1 - (1 - l) / 2)]` with
/// `l = level / 100`. Used to turn a bootstrap distribution of a scalar
/// (typically AUC) into an interval.
///
/// # Errors
///
/// Returns an error if `values` is empty or `level` is outside `[0, 100]`.
///
/// # Example
///
/// ```
/// use rocband_stats::descriptive::percentile_interval;
///
/// let values: Vec<f64> = (1..=100).map(f64::from).collect();
/// let (lo, hi) = percentile_interval(&values, 95.0).unwrap();
/// assert_eq!((lo, hi), (3.0, 98.0));
/// ```
pub fn percentile_interval(values: &[f64], level: f64) -> Result<(f64, f64)> {
    if !(0.0..=100.0).contains(&level) {
        return Err(RocError::InvalidArgument(format!(
            "percentile_interval: level must be in [0, 100], got {}",
            level
        )));
    }
    if values.is_empty() {
        return Err(RocError::InvalidArgument(
            "percentile_interval: values must not be empty".into(),
        ));
    }
    let tail = (1.0 - level / 100.0) / 2.0;
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    Ok((quantile_sorted(&sorted, tail), quantile_sorted(&sorted, 1.0 - tail)))
}

// ── Internal ───────────────────────────────────────────────────────────────

fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if q <= 0.0 {
        return sorted[0];
    }
    if q >= 1.0 {
        return sorted[n - 1];
    }
    let index = ((q * n as f64).floor() as usize).min(n - 1);
    sorted[index]
}

// ── Tests ──────────────────────────────────────────────────────────────────
