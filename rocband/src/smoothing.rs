//! Curve smoothing: convex hull, kernel density composition and binormal
//! regression.
//!
//! Every smoother returns a new [`RocCurve`] carrying the raw scores and
//! instance counts of its source.

use rocband_core::{Result, RocError};
use rocband_stats::distribution::{phi, phi_inv};

use crate::curve::RocCurve;
use crate::kernel::Kernel;

/// Probit range kept by the binormal fit.
const BINORMAL_LOW: f64 = 0.01;
const BINORMAL_HIGH: f64 = 0.99;

/// Smoothing procedure.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Smoothing {
    /// Upper convex hull of the curve points.
    Convex,
    /// Kernel estimates of both class-conditional score distributions.
    Kernel { positive: Kernel, negative: Kernel },
    /// Straight-line fit in probit space.
    #[default]
    Binormal,
}

impl Smoothing {
    /// Kernel smoothing with the same kernel for both classes.
    pub fn kernel(kernel: Kernel) -> Self {
        Smoothing::Kernel {
            positive: kernel,
            negative: kernel,
        }
    }
}

/// Result of the binormal regression `Φ⁻¹(tpr) = a·Φ⁻¹(fpr) + b`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BinormalFit {
    /// `a`, the probit-space slope (ratio of class standard deviations).
    pub slope: f64,
    /// `b`, the probit-space intercept (standardized class separation).
    pub intercept: f64,
    /// Correlation of the probit-transformed points.
    pub r: f64,
    pub r_squared: f64,
    /// Mean signed error of the fitted curve over all points.
    pub average_error: f64,
    pub rmse: f64,
    /// Standard error of the RMSE, `rmse / √n`.
    pub rmse_std_error: f64,
}

impl RocCurve {
    /// Smoothed copy of the curve.
    pub fn smooth(&self, method: &Smoothing) -> Result<RocCurve> {
        match method {
            Smoothing::Convex => convexify(self),
            Smoothing::Kernel { positive, negative } => kernel_smooth(self, positive, negative),
            Smoothing::Binormal => binormal_smooth(self),
        }
    }
}

// ── Convex hull ────────────────────────────────────────────────────────────

/// Upper convex hull of the curve.
///
/// From the current vertex the later vertex with the strictly greatest
/// positive slope is selected (vertices sharing the current abscissa are
/// skipped) and the vertices in between are moved onto the hull edge. The
/// walk stops when no later vertex has a positive slope; if the hull does
/// not end at (1, 1) the remaining vertices are spread evenly toward the
/// last original vertex. The result may be shorter than the input.
pub fn convexify(curve: &RocCurve) -> Result<RocCurve> {
    let xs = curve.fpr();
    let ys = curve.tpr();
    let n = xs.len();

    let mut hull_x = vec![xs[0]];
    let mut hull_y = vec![ys[0]];
    let lerp = |a: usize, b: usize, t: f64| {
        (xs[b] * t + xs[a] * (1.0 - t), ys[b] * t + ys[a] * (1.0 - t))
    };

    let mut current = 0;
    loop {
        let mut best_slope = 0.0;
        let mut best = None;
        for i in current + 1..n {
            if xs[i] == xs[current] {
                continue;
            }
            let slope = (ys[i] - ys[current]) / (xs[i] - xs[current]);
            if slope > best_slope {
                best_slope = slope;
                best = Some(i);
            }
        }
        let Some(next) = best else { break };

        for i in current + 1..=next {
            let (x, y) = lerp(current, next, (i - current) as f64 / (next - current) as f64);
            hull_x.push(x);
            hull_y.push(y);
        }
        current = next;
    }

    let ends_at_corner = hull_x.last() == Some(&1.0) && hull_y.last() == Some(&1.0);
    if !ends_at_corner {
        let last = n - 1;
        for i in current + 1..n {
            let (x, y) = lerp(current, last, (i - current) as f64 / (last - current) as f64);
            hull_x.push(x);
            hull_y.push(y);
        }
    }

    derived(curve, hull_x, hull_y)
}

// ── Kernel smoothing ───────────────────────────────────────────────────────

/// Kernel estimate of the curve from the raw class scores.
///
/// On the grid `x_i = i / r` the class CDFs are estimated as
/// `G(x) = mean K_pos.cdf((x - p_j) / h_pos)` and
/// `F(x) = mean K_neg.cdf((x - n_j) / h_neg)`; then
/// `TPR(x_i) = 1 - G(F⁻(1 - x_i))` with `F⁻` the generalized inverse on the
/// same grid. Automatic kernels are resolved against their class samples.
/// The endpoints are pinned to (0, 0) and (1, 1).
pub fn kernel_smooth(curve: &RocCurve, positive: &Kernel, negative: &Kernel) -> Result<RocCurve> {
    if !curve.has_raw_scores() {
        return Err(RocError::InvalidArgument(
            "kernel smoothing needs a curve built from scores".into(),
        ));
    }
    let kernel_pos = positive.resolve(curve.positive_scores())?;
    let kernel_neg = negative.resolve(curve.negative_scores())?;
    tracing::debug!(
        pos_bandwidth = kernel_pos.bandwidth(),
        neg_bandwidth = kernel_neg.bandwidth(),
        "kernel smoothing"
    );

    let r = curve.resolution();
    let grid: Vec<f64> = (0..r).map(|i| i as f64 / r as f64).collect();
    let g = smoothed_cdf(&grid, curve.positive_scores(), &kernel_pos);
    let f = smoothed_cdf(&grid, curve.negative_scores(), &kernel_neg);

    let mut fpr = grid.clone();
    let mut tpr: Vec<f64> = grid
        .iter()
        .map(|&x| {
            let j = f.partition_point(|&v| v <= 1.0 - x);
            let j = if j == r { 0 } else { j };
            1.0 - g[j]
        })
        .collect();

    tpr[0] = 0.0;
    fpr[0] = 0.0;
    tpr[r - 1] = 1.0;
    fpr[r - 1] = 1.0;

    derived(curve, fpr, tpr)
}

fn smoothed_cdf(grid: &[f64], samples: &[f64], kernel: &Kernel) -> Vec<f64> {
    let h = kernel.bandwidth();
    let n = samples.len() as f64;
    grid.iter()
        .map(|&x| samples.iter().map(|&s| kernel.cdf((x - s) / h)).sum::<f64>() / n)
        .collect()
}

// ── Binormal regression ────────────────────────────────────────────────────

/// Binormal fit of the curve.
///
/// Points with FPR or TPR outside `[0.01, 0.99]` are dropped, the rest are
/// probit-transformed and fitted by `a = (σ_y / σ_x)·r`, `b = μ_y − a·μ_x`.
/// Every FPR is then reprojected through `Φ(a·Φ⁻¹(fpr) + b)`, with FPR above
/// 0.99 mapped to TPR 1 and FPR below 0.01 to TPR 0.
///
/// # Errors
///
/// Returns `DegenerateInput` when fewer than two points survive the filter
/// or the transformed points have no spread.
pub fn binormal_smooth(curve: &RocCurve) -> Result<RocCurve> {
    let in_range = |v: f64| (BINORMAL_LOW..=BINORMAL_HIGH).contains(&v);
    let mut px = Vec::new();
    let mut py = Vec::new();
    for (x, y) in curve.points() {
        if in_range(x) && in_range(y) {
            px.push(phi_inv(x)?);
            py.push(phi_inv(y)?);
        }
    }
    if px.len() < 2 {
        return Err(RocError::DegenerateInput(format!(
            "binormal fit needs at least 2 points inside [{}, {}], got {}",
            BINORMAL_LOW,
            BINORMAL_HIGH,
            px.len()
        )));
    }

    let (mx, sx) = population_moments(&px);
    let (my, sy) = population_moments(&py);
    if !(has_spread(&px) && has_spread(&py) && sx > 0.0 && sy > 0.0) {
        return Err(RocError::DegenerateInput(
            "binormal fit: probit-transformed points have zero spread".into(),
        ));
    }
    let r = px
        .iter()
        .zip(&py)
        .map(|(&x, &y)| (x - mx) / sx * (y - my) / sy)
        .sum::<f64>()
        / px.len() as f64;
    let a = sy / sx * r;
    let b = my - a * mx;

    let mut tpr = Vec::with_capacity(curve.resolution());
    let mut err_sum = 0.0;
    let mut sq_sum = 0.0;
    for (x, y) in curve.points() {
        let fitted = if x > BINORMAL_HIGH {
            1.0
        } else if x < BINORMAL_LOW {
            0.0
        } else {
            let v = phi(a * phi_inv(x)? + b);
            err_sum += v - y;
            sq_sum += (v - y).powi(2);
            v
        };
        tpr.push(fitted);
    }

    let len = curve.resolution() as f64;
    let rmse = (sq_sum / len).sqrt();
    let fit = BinormalFit {
        slope: a,
        intercept: b,
        r,
        r_squared: r * r,
        average_error: err_sum / len,
        rmse,
        rmse_std_error: rmse / len.sqrt(),
    };
    tracing::debug!(
        slope = fit.slope,
        intercept = fit.intercept,
        r = fit.r,
        rmse = fit.rmse,
        "binormal fit"
    );

    Ok(derived(curve, curve.fpr().to_vec(), tpr)?.with_binormal(fit))
}

fn population_moments(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|&v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

fn has_spread(values: &[f64]) -> bool {
    values.iter().any(|&v| v != values[0])
}

/// New curve from smoothed points, inheriting raw scores and counts.
fn derived(source: &RocCurve, fpr: Vec<f64>, tpr: Vec<f64>) -> Result<RocCurve> {
    Ok(RocCurve::from_points(fpr, tpr)?
        .with_counts(source.positive_count(), source.negative_count())
        .with_raw_scores(
            source.positive_scores().to_vec(),
            source.negative_scores().to_vec(),
        ))
}
