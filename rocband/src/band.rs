//! Confidence bands around averaged ROC curves.
//!
//! A [`BandEngine`] turns a set of curves sharing one resolution into a
//! [`ConfidenceBand`] by one of four procedures:
//!
//! - **Vertical averaging**: mean TPR at fixed FPR `i / resolution`
//! - **Threshold averaging**: mean (FPR, TPR) at each threshold index
//! - **Fixed width**: dichotomic search of the band half-width containing
//!   the requested share of the input curves
//! - **Kolmogorov-Smirnov**: distribution-free band of half-width `c / √n`
//!
//! Pointwise intervals use a normal or Student critical value, or the
//! continuity-corrected Wilson interval under the binomial assumption.

use std::fmt;

use rocband_core::{Result, RocError, Summarizable};
use rocband_stats::descriptive::{mean, std_dev};
use rocband_stats::distribution::{ks_critical, student_critical, z_value};
use rocband_stats::geometry::point_in_polygon;

use crate::config::BandConfig;
use crate::curve::{resample_points, RocCurve};

/// Points with `x(1-x) + y(1-y)` at or below this value are not tested by
/// the fixed-width inclusion check.
const CORNER_EXCLUSION: f64 = 0.02;

/// Per-class instance count at or below which the KS band is flagged.
const KS_MIN_INSTANCES: usize = 30;

/// Divisor of `√(P + N)` giving the upper end of the bandwidth search.
const FIXED_WIDTH_RANGE_DIVISOR: f64 = 15.0;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Band construction procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BandMethod {
    VerticalAveraging,
    ThresholdAveraging,
    FixedWidth,
    KolmogorovSmirnov,
}

impl fmt::Display for BandMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BandMethod::VerticalAveraging => "vertical averaging",
            BandMethod::ThresholdAveraging => "threshold averaging",
            BandMethod::FixedWidth => "fixed width",
            BandMethod::KolmogorovSmirnov => "Kolmogorov-Smirnov",
        };
        f.write_str(name)
    }
}

/// Distributional assumption behind the pointwise intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Assumption {
    #[default]
    Normal,
    Binormal,
    Binomial,
    Student,
}

impl fmt::Display for Assumption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Assumption::Normal => "normal",
            Assumption::Binormal => "binormal",
            Assumption::Binomial => "binomial",
            Assumption::Student => "Student",
        };
        f.write_str(name)
    }
}

/// Non-fatal condition attached to a band.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Advisory {
    /// The fixed-width search is distribution-free; the assumption was ignored.
    AssumptionIgnored(Assumption),
    /// Too few instances for the asymptotic KS critical value.
    SmallSample { positive: usize, negative: usize },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::AssumptionIgnored(a) => {
                write!(f, "fixed-width band search ignores the {} assumption", a)
            }
            Advisory::SmallSample { positive, negative } => write!(
                f,
                "Kolmogorov-Smirnov band expects more than {} instances per class \
                 (got {} positive, {} negative)",
                KS_MIN_INSTANCES, positive, negative
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Band value
// ---------------------------------------------------------------------------

/// Threshold-averaging error bars.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorBars {
    /// Vertical half-widths `H`.
    pub vertical: Vec<f64>,
    /// Horizontal half-widths `h`.
    pub horizontal: Vec<f64>,
}

/// Outcome of the fixed-width bandwidth search.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FixedWidthDiagnostics {
    /// Final half-width factor `b`.
    pub bandwidth: f64,
    /// Share of input curves inside the final trial band.
    pub inclusion_ratio: f64,
    /// Width of the final search bracket.
    pub resolution_step: f64,
    pub iterations: usize,
}

/// Confidence band around a central ROC curve.
///
/// At every index `upper_y >= central_y >= lower_y`. The upper band sits
/// toward the (0, 1) corner, so for threshold-indexed methods
/// `upper_x <= central_x <= lower_x`; for vertical averaging all three
/// abscissae coincide.
///
/// Every method closes the band at the curve extremes: the first and last
/// points are forced onto the (0, 0) and (1, 1) corners, and the orderings
/// above hold at the remaining indices.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfidenceBand {
    method: BandMethod,
    assumption: Assumption,
    confidence_level: f64,
    upper_x: Vec<f64>,
    upper_y: Vec<f64>,
    lower_x: Vec<f64>,
    lower_y: Vec<f64>,
    central: RocCurve,
    critical_value: f64,
    positive_count: usize,
    negative_count: usize,
    resampled_upper: Vec<f64>,
    resampled_lower: Vec<f64>,
    error_bars: Option<ErrorBars>,
    aucs: Vec<f64>,
    advisories: Vec<Advisory>,
    fixed_width: Option<FixedWidthDiagnostics>,
}

impl ConfidenceBand {
    pub fn method(&self) -> BandMethod {
        self.method
    }

    pub fn assumption(&self) -> Assumption {
        self.assumption
    }

    /// Confidence level in percent.
    pub fn confidence_level(&self) -> f64 {
        self.confidence_level
    }

    pub fn resolution(&self) -> usize {
        self.upper_x.len()
    }

    pub fn upper_x(&self) -> &[f64] {
        &self.upper_x
    }

    pub fn upper_y(&self) -> &[f64] {
        &self.upper_y
    }

    pub fn lower_x(&self) -> &[f64] {
        &self.lower_x
    }

    pub fn lower_y(&self) -> &[f64] {
        &self.lower_y
    }

    /// Averaged curve, carrying the aggregated instance counts.
    pub fn central(&self) -> &RocCurve {
        &self.central
    }

    /// z, t, KS critical value, or the fixed-width bandwidth.
    pub fn critical_value(&self) -> f64 {
        self.critical_value
    }

    pub fn positive_count(&self) -> usize {
        self.positive_count
    }

    pub fn negative_count(&self) -> usize {
        self.negative_count
    }

    /// Upper band TPR resampled at `j / resolution`.
    pub fn resampled_upper(&self) -> &[f64] {
        &self.resampled_upper
    }

    /// Lower band TPR resampled at `j / resolution`.
    pub fn resampled_lower(&self) -> &[f64] {
        &self.resampled_lower
    }

    /// Error bars, present for threshold averaging.
    pub fn error_bars(&self) -> Option<&ErrorBars> {
        self.error_bars.as_ref()
    }

    /// AUC of each input curve.
    pub fn aucs(&self) -> &[f64] {
        &self.aucs
    }

    pub fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }

    pub fn fixed_width(&self) -> Option<&FixedWidthDiagnostics> {
        self.fixed_width.as_ref()
    }

    /// Upper points.
    pub fn upper(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.upper_x.iter().copied().zip(self.upper_y.iter().copied())
    }

    /// Lower points.
    pub fn lower(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.lower_x.iter().copied().zip(self.lower_y.iter().copied())
    }

    /// Closed ring: upper band forward, lower band reversed, first point
    /// repeated.
    pub fn polygon(&self) -> Vec<(f64, f64)> {
        closed_ring(&self.upper_x, &self.upper_y, &self.lower_x, &self.lower_y)
    }

    /// Half-width of the confidence interval of the mean AUC,
    /// `crit · s(AUC) / √n` over the input curves.
    ///
    /// The Student critical value uses `n - 1` degrees of freedom, matching
    /// the sample standard deviation.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for fewer than two input curves, a level
    /// outside `(0, 100)`, or a binormal or binomial assumption.
    pub fn auc_confidence_interval(&self, level: f64, assumption: Assumption) -> Result<f64> {
        validate_level(level)?;
        let n = self.aucs.len();
        if n < 2 {
            return Err(RocError::InvalidArgument(format!(
                "AUC confidence interval needs at least 2 curves, got {}",
                n
            )));
        }
        let crit = match assumption {
            Assumption::Normal => z_value(level)?,
            Assumption::Student => student_critical((1.0 + level / 100.0) / 2.0, n - 1)?,
            Assumption::Binormal | Assumption::Binomial => {
                return Err(RocError::InvalidArgument(format!(
                    "{} assumption is not valid for an AUC confidence interval",
                    assumption
                )))
            }
        };
        Ok(crit * std_dev(&self.aucs, 1)? / (n as f64).sqrt())
    }
}

impl Summarizable for ConfidenceBand {
    fn summary(&self) -> String {
        format!(
            "{}% {} band ({} assumption): {} points, critical value {:.4}, {} curves",
            self.confidence_level,
            self.method,
            self.assumption,
            self.resolution(),
            self.critical_value,
            self.aucs.len()
        )
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Band arrays before assembly.
struct Arrays {
    upper_x: Vec<f64>,
    upper_y: Vec<f64>,
    lower_x: Vec<f64>,
    lower_y: Vec<f64>,
    central_x: Vec<f64>,
    central_y: Vec<f64>,
}

impl Arrays {
    fn with_capacity(n: usize) -> Self {
        Self {
            upper_x: Vec::with_capacity(n),
            upper_y: Vec::with_capacity(n),
            lower_x: Vec::with_capacity(n),
            lower_y: Vec::with_capacity(n),
            central_x: Vec::with_capacity(n),
            central_y: Vec::with_capacity(n),
        }
    }

    fn push(&mut self, central: (f64, f64), upper: (f64, f64), lower: (f64, f64)) {
        self.central_x.push(central.0);
        self.central_y.push(central.1);
        self.upper_x.push(clamp_unit(upper.0));
        self.upper_y.push(clamp_unit(upper.1));
        self.lower_x.push(clamp_unit(lower.0));
        self.lower_y.push(clamp_unit(lower.1));
    }

    /// Close the band at the curve extremes, oriented by the first upper
    /// ordinate.
    ///
    /// An upper band starting above 0.5 is taken to run from (1, 1) back to
    /// (0, 0); only its endpoints are swapped and the lower band is left
    /// open. The ordering against the central curve does not hold at those
    /// two points.
    fn correct_boundaries(&mut self) {
        let last = self.upper_x.len() - 1;
        if self.upper_y[0] > 0.5 {
            self.upper_x[0] = 1.0;
            self.upper_y[0] = 1.0;
            self.upper_x[last] = 0.0;
            self.upper_y[last] = 0.0;
        } else {
            self.upper_x[0] = 0.0;
            self.upper_y[0] = 0.0;
            self.lower_x[0] = 0.0;
            self.lower_y[0] = 0.0;
            self.upper_x[last] = 1.0;
            self.upper_y[last] = 1.0;
        }
    }
}

/// Builds [`ConfidenceBand`]s under a [`BandConfig`].
#[derive(Debug, Clone, Default)]
pub struct BandEngine {
    config: BandConfig,
}

impl BandEngine {
    pub fn new(config: BandConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BandConfig {
        &self.config
    }

    /// Compute a band from `curves` at `level` percent.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument`: level outside `(0, 100)`, no curves, curves of
    ///   different resolutions, fewer than two curves for a non-binomial
    ///   averaging method, a non-normal Kolmogorov-Smirnov request, or too
    ///   few curves for the Student degrees of freedom
    /// - `UndefinedStatistic`: a count-based procedure with zero aggregated
    ///   positive or negative instances
    ///
    /// # Example
    ///
    /// ```
    /// use rocband::{Assumption, BandEngine, BandMethod, RocCurve};
    ///
    /// let a = RocCurve::from_points(vec![0.0, 0.2, 1.0], vec![0.0, 0.7, 1.0]).unwrap();
    /// let b = RocCurve::from_points(vec![0.0, 0.3, 1.0], vec![0.0, 0.6, 1.0]).unwrap();
    /// let band = BandEngine::default()
    ///     .compute(&[a, b], BandMethod::ThresholdAveraging, 95.0, Assumption::Normal)
    ///     .unwrap();
    /// assert!(band.upper_y()[1] >= band.central().tpr()[1]);
    /// ```
    pub fn compute(
        &self,
        curves: &[RocCurve],
        method: BandMethod,
        level: f64,
        assumption: Assumption,
    ) -> Result<ConfidenceBand> {
        validate_level(level)?;
        let resolution = validate_curves(curves)?;
        let n_curves = curves.len();
        let binomial = assumption == Assumption::Binomial;

        let averaging = matches!(
            method,
            BandMethod::VerticalAveraging | BandMethod::ThresholdAveraging
        );
        if averaging && !binomial && n_curves < 2 {
            return Err(RocError::InvalidArgument(format!(
                "{} with the {} assumption needs at least 2 curves, got {}",
                method, assumption, n_curves
            )));
        }
        if method == BandMethod::KolmogorovSmirnov && assumption != Assumption::Normal {
            return Err(RocError::InvalidArgument(format!(
                "Kolmogorov-Smirnov band is distribution-free; {} assumption is not accepted",
                assumption
            )));
        }

        let (positive_count, negative_count) = self
            .config
            .count_policy
            .aggregate(curves.iter().map(|c| (c.positive_count(), c.negative_count())));
        let needs_counts = binomial
            || matches!(
                method,
                BandMethod::FixedWidth | BandMethod::KolmogorovSmirnov
            );
        if needs_counts && (positive_count == 0 || negative_count == 0) {
            return Err(RocError::UndefinedStatistic(format!(
                "{} band needs positive instance counts (got {} positive, {} negative)",
                method, positive_count, negative_count
            )));
        }
        if self.config.verbose {
            tracing::info!(
                method = %method,
                assumption = %assumption,
                level,
                curves = n_curves,
                positive_count,
                negative_count,
                "computing confidence band"
            );
        }

        let counts = Counts {
            positive: positive_count as f64,
            negative: negative_count as f64,
        };
        let mut advisories = Vec::new();
        let mut error_bars = None;
        let mut fixed_width = None;

        let (arrays, critical_value) = match method {
            BandMethod::VerticalAveraging => {
                let z = pointwise_critical(level, assumption, n_curves)?;
                let mut arrays = if binomial {
                    vertical_binomial(curves, resolution, z, counts)
                } else {
                    vertical_normal(curves, resolution, z)?
                };
                arrays.correct_boundaries();
                (arrays, z)
            }
            BandMethod::ThresholdAveraging => {
                let z = pointwise_critical(level, assumption, n_curves)?;
                let (mut arrays, bars) = if binomial {
                    threshold_binomial(curves, resolution, z, counts)?
                } else {
                    threshold_normal(curves, resolution, z)?
                };
                arrays.correct_boundaries();
                error_bars = Some(bars);
                (arrays, z)
            }
            BandMethod::FixedWidth => {
                if assumption != Assumption::Normal {
                    advisories.push(Advisory::AssumptionIgnored(assumption));
                }
                let (arrays, diagnostics) = self.fixed_width(curves, resolution, level, counts)?;
                fixed_width = Some(diagnostics);
                (arrays, diagnostics.bandwidth)
            }
            BandMethod::KolmogorovSmirnov => {
                if positive_count <= KS_MIN_INSTANCES || negative_count <= KS_MIN_INSTANCES {
                    advisories.push(Advisory::SmallSample {
                        positive: positive_count,
                        negative: negative_count,
                    });
                }
                let c = ks_critical(level / 100.0)?;
                let (mx, my) = threshold_means(curves, resolution)?;
                let mut arrays = shifted_band(&mx, &my, c, counts);
                arrays.correct_boundaries();
                (arrays, c)
            }
        };

        for advisory in &advisories {
            tracing::warn!("{}", advisory);
        }

        let (_, resampled_upper) = resample_points(&arrays.upper_x, &arrays.upper_y, resolution);
        let (_, resampled_lower) = resample_points(&arrays.lower_x, &arrays.lower_y, resolution);
        let central = RocCurve::from_points(arrays.central_x, arrays.central_y)?
            .with_counts(positive_count, negative_count);

        Ok(ConfidenceBand {
            method,
            assumption,
            confidence_level: level,
            upper_x: arrays.upper_x,
            upper_y: arrays.upper_y,
            lower_x: arrays.lower_x,
            lower_y: arrays.lower_y,
            central,
            critical_value,
            positive_count,
            negative_count,
            resampled_upper,
            resampled_lower,
            error_bars,
            aucs: curves.iter().map(RocCurve::auc).collect(),
            advisories,
            fixed_width,
        })
    }

    /// Dichotomic search of the band half-width factor `b` in
    /// `[0, √(P + N) / 15]` such that the share of curves lying entirely
    /// inside the trial band meets the confidence level.
    fn fixed_width(
        &self,
        curves: &[RocCurve],
        resolution: usize,
        level: f64,
        counts: Counts,
    ) -> Result<(Arrays, FixedWidthDiagnostics)> {
        let iterations = self.config.fixed_width_iterations;
        let (mx, my) = threshold_means(curves, resolution)?;
        let target = level / 100.0;
        let mut lo = 0.0;
        let mut hi = (counts.positive + counts.negative).sqrt() / FIXED_WIDTH_RANGE_DIVISOR;

        let mut last = None;
        for step in 0..iterations {
            let b = (lo + hi) / 2.0;
            let mut arrays = shifted_band(&mx, &my, b, counts);
            arrays.correct_boundaries();
            let ring = closed_ring(&arrays.upper_x, &arrays.upper_y, &arrays.lower_x, &arrays.lower_y);
            let outliers = curves.iter().filter(|c| !inside_band(c, &ring)).count();
            let ratio = 1.0 - outliers as f64 / curves.len() as f64;

            if self.config.verbose {
                tracing::info!(step, bandwidth = b, inclusion_ratio = ratio, "fixed-width search");
            }
            if ratio < target {
                lo = b;
            } else {
                hi = b;
            }
            last = Some((arrays, b, ratio));
        }

        let (arrays, bandwidth, inclusion_ratio) = last.ok_or_else(|| {
            RocError::InvalidArgument("fixed-width search needs at least one iteration".into())
        })?;
        Ok((
            arrays,
            FixedWidthDiagnostics {
                bandwidth,
                inclusion_ratio,
                resolution_step: hi - lo,
                iterations,
            },
        ))
    }
}

/// Band with the default configuration.
pub fn confidence_band(
    curves: &[RocCurve],
    method: BandMethod,
    level: f64,
    assumption: Assumption,
) -> Result<ConfidenceBand> {
    BandEngine::default().compute(curves, method, level, assumption)
}

// ---------------------------------------------------------------------------
// Procedures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Counts {
    positive: f64,
    negative: f64,
}

fn vertical_normal(curves: &[RocCurve], resolution: usize, z: f64) -> Result<Arrays> {
    let columns = vertical_columns(curves, resolution);
    let sqrt_n = (curves.len() as f64).sqrt();
    let mut arrays = Arrays::with_capacity(resolution);
    for (i, ys) in columns.iter().enumerate() {
        let x = i as f64 / resolution as f64;
        let y = mean(ys)?;
        let half = z * std_dev(ys, 1)? / sqrt_n;
        arrays.push((x, y), (x, y + half), (x, y - half));
    }
    Ok(arrays)
}

fn vertical_binomial(curves: &[RocCurve], resolution: usize, z: f64, counts: Counts) -> Arrays {
    let columns = vertical_columns(curves, resolution);
    let mut arrays = Arrays::with_capacity(resolution);
    for (i, ys) in columns.iter().enumerate() {
        let x = i as f64 / resolution as f64;
        let y = ys.iter().sum::<f64>() / ys.len() as f64;
        let (lo, hi) = wilson(y, counts.positive, z);
        arrays.push((x, y), (x, hi), (x, lo));
    }
    arrays
}

/// TPR of every curve at each fixed FPR `i / resolution`, grouped by index.
fn vertical_columns(curves: &[RocCurve], resolution: usize) -> Vec<Vec<f64>> {
    let resampled: Vec<Vec<f64>> = curves
        .iter()
        .map(|c| resample_points(c.fpr(), c.tpr(), resolution).1)
        .collect();
    (0..resolution)
        .map(|i| resampled.iter().map(|ys| ys[i]).collect())
        .collect()
}

fn threshold_normal(curves: &[RocCurve], resolution: usize, z: f64) -> Result<(Arrays, ErrorBars)> {
    let sqrt_n = (curves.len() as f64).sqrt();
    let mut arrays = Arrays::with_capacity(resolution);
    let mut bars = ErrorBars {
        vertical: Vec::with_capacity(resolution),
        horizontal: Vec::with_capacity(resolution),
    };
    for i in 0..resolution {
        let xs: Vec<f64> = curves.iter().map(|c| c.fpr()[i]).collect();
        let ys: Vec<f64> = curves.iter().map(|c| c.tpr()[i]).collect();
        let (x, y) = (mean(&xs)?, mean(&ys)?);
        let hx = z * std_dev(&xs, 1)? / sqrt_n;
        let hy = z * std_dev(&ys, 1)? / sqrt_n;
        arrays.push((x, y), (x - hx, y + hy), (x + hx, y - hy));
        bars.vertical.push(hy);
        bars.horizontal.push(hx);
    }
    Ok((arrays, bars))
}

fn threshold_binomial(
    curves: &[RocCurve],
    resolution: usize,
    z: f64,
    counts: Counts,
) -> Result<(Arrays, ErrorBars)> {
    let (mx, my) = threshold_means(curves, resolution)?;
    let mut arrays = Arrays::with_capacity(resolution);
    let mut bars = ErrorBars {
        vertical: Vec::with_capacity(resolution),
        horizontal: Vec::with_capacity(resolution),
    };
    for (&x, &y) in mx.iter().zip(&my) {
        let (y_lo, y_hi) = wilson(y, counts.positive, z);
        let (x_lo, x_hi) = wilson(x, counts.negative, z);
        arrays.push((x, y), (x_lo, y_hi), (x_hi, y_lo));
        bars.vertical.push(z * (y * (1.0 - y) / counts.positive).sqrt());
        bars.horizontal.push(z * (x * (1.0 - x) / counts.negative).sqrt());
    }
    Ok((arrays, bars))
}

/// Mean FPR and TPR at each threshold index.
fn threshold_means(curves: &[RocCurve], resolution: usize) -> Result<(Vec<f64>, Vec<f64>)> {
    let mut mx = Vec::with_capacity(resolution);
    let mut my = Vec::with_capacity(resolution);
    for i in 0..resolution {
        let xs: Vec<f64> = curves.iter().map(|c| c.fpr()[i]).collect();
        let ys: Vec<f64> = curves.iter().map(|c| c.tpr()[i]).collect();
        mx.push(mean(&xs)?);
        my.push(mean(&ys)?);
    }
    Ok((mx, my))
}

/// Band `(x ∓ w/√N, y ± w/√P)` around the mean curve, truncated to the unit
/// square.
fn shifted_band(mx: &[f64], my: &[f64], width: f64, counts: Counts) -> Arrays {
    let dx = width / counts.negative.sqrt();
    let dy = width / counts.positive.sqrt();
    let mut arrays = Arrays::with_capacity(mx.len());
    for (&x, &y) in mx.iter().zip(my) {
        arrays.push((x, y), (x - dx, y + dy), (x + dx, y - dy));
    }
    arrays
}

/// Continuity-corrected Wilson interval `(lower, upper)` of proportion `p`
/// observed over `n` trials.
fn wilson(p: f64, n: f64, z: f64) -> (f64, f64) {
    let z2 = z * z;
    let q = n + z2;
    let w1 = n / q;
    let w2 = z2 / q;
    let centre = w1 * p + w2 * 0.5;
    let se = (w1 * p * (1.0 - p) / q + w2 * 0.25 / q).sqrt();
    let half = z * se + 0.5 / q;
    (centre - half, centre + half)
}

/// Whether every non-corner point of `curve` lies inside `ring`.
fn inside_band(curve: &RocCurve, ring: &[(f64, f64)]) -> bool {
    curve
        .points()
        .filter(|&(x, y)| x * (1.0 - x) + y * (1.0 - y) > CORNER_EXCLUSION)
        .all(|(x, y)| point_in_polygon(x, y, ring))
}

pub(crate) fn closed_ring(
    upper_x: &[f64],
    upper_y: &[f64],
    lower_x: &[f64],
    lower_y: &[f64],
) -> Vec<(f64, f64)> {
    let mut ring: Vec<(f64, f64)> = upper_x.iter().copied().zip(upper_y.iter().copied()).collect();
    ring.extend(lower_x.iter().copied().zip(lower_y.iter().copied()).rev());
    if let Some(&first) = ring.first() {
        ring.push(first);
    }
    ring
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_level(level: f64) -> Result<()> {
    if !(level > 0.0 && level < 100.0) {
        return Err(RocError::InvalidArgument(format!(
            "confidence level must lie in (0, 100), got {}",
            level
        )));
    }
    Ok(())
}

/// Shared resolution of a non-empty curve set.
fn validate_curves(curves: &[RocCurve]) -> Result<usize> {
    let first = curves.first().ok_or_else(|| {
        RocError::InvalidArgument("confidence band needs at least one curve".into())
    })?;
    let resolution = first.resolution();
    if let Some(other) = curves.iter().find(|c| c.resolution() != resolution) {
        return Err(RocError::InvalidArgument(format!(
            "curves must share a resolution ({} vs {})",
            resolution,
            other.resolution()
        )));
    }
    Ok(resolution)
}

/// Pointwise two-sided critical value: Student with `n - 1` degrees of
/// freedom, otherwise normal.
fn pointwise_critical(level: f64, assumption: Assumption, n_curves: usize) -> Result<f64> {
    match assumption {
        Assumption::Student => {
            student_critical((1.0 + level / 100.0) / 2.0, n_curves.saturating_sub(1))
        }
        _ => z_value(level),
    }
}

fn clamp_unit(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::BootstrapSampler;
    use crate::config::InstanceCountPolicy;
    use crate::testutil::binormal_curve;

    const TOL: f64 = 1e-12;

    fn bootstrap_curves(n_per_class: usize, resolution: usize, replicates: usize) -> Vec<RocCurve> {
        let source = binormal_curve(n_per_class, resolution, 99);
        BootstrapSampler::new(replicates)
            .unwrap()
            .resample(&source, 1234)
            .unwrap()
            .into_curves()
    }

    fn assert_ordered(band: &ConfidenceBand, check_x: bool) {
        let central = band.central();
        let last = band.resolution() - 1;
        for i in [0, last] {
            let corner = (band.upper_x()[i], band.upper_y()[i]);
            assert!(corner == (0.0, 0.0) || corner == (1.0, 1.0), "index {}: {:?}", i, corner);
        }
        for i in 0..=last {
            for v in [band.upper_x()[i], band.upper_y()[i], band.lower_x()[i], band.lower_y()[i]] {
                assert!((0.0..=1.0).contains(&v), "index {}: {} out of range", i, v);
            }
        }
        for i in 1..last {
            let (ux, uy) = (band.upper_x()[i], band.upper_y()[i]);
            let (lx, ly) = (band.lower_x()[i], band.lower_y()[i]);
            let (cx, cy) = (central.fpr()[i], central.tpr()[i]);
            assert!(uy >= cy - TOL && cy >= ly - TOL, "index {}: y order {} {} {}", i, uy, cy, ly);
            if check_x {
                assert!(ux <= cx + TOL && cx <= lx + TOL, "index {}: x order {} {} {}", i, ux, cx, lx);
            }
        }
    }

    // ── Validation ──────────────────────────────────────────────

    #[test]
    fn level_must_be_open_interval() {
        let curves = bootstrap_curves(100, 20, 3);
        for level in [0.0, 100.0, 120.0, -5.0, f64::NAN] {
            let res = confidence_band(
                &curves,
                BandMethod::ThresholdAveraging,
                level,
                Assumption::Normal,
            );
            assert!(matches!(res, Err(RocError::InvalidArgument(_))), "level {}", level);
        }
    }

    #[test]
    fn empty_and_mismatched_curves() {
        assert!(matches!(
            confidence_band(&[], BandMethod::ThresholdAveraging, 95.0, Assumption::Normal),
            Err(RocError::InvalidArgument(_))
        ));
        let a = binormal_curve(50, 20, 1);
        let b = binormal_curve(50, 30, 2);
        assert!(matches!(
            confidence_band(&[a, b], BandMethod::ThresholdAveraging, 95.0, Assumption::Normal),
            Err(RocError::InvalidArgument(_))
        ));
    }

    #[test]
    fn averaging_needs_two_curves_unless_binomial() {
        let one = vec![binormal_curve(100, 20, 1)];
        for method in [BandMethod::VerticalAveraging, BandMethod::ThresholdAveraging] {
            assert!(matches!(
                confidence_band(&one, method, 95.0, Assumption::Normal),
                Err(RocError::InvalidArgument(_))
            ));
            assert!(confidence_band(&one, method, 95.0, Assumption::Binomial).is_ok());
        }
        assert!(confidence_band(&one, BandMethod::FixedWidth, 95.0, Assumption::Normal).is_ok());
        assert!(
            confidence_band(&one, BandMethod::KolmogorovSmirnov, 95.0, Assumption::Normal).is_ok()
        );
    }

    #[test]
    fn count_based_methods_need_counts() {
        let a = RocCurve::from_points(vec![0.0, 0.4, 1.0], vec![0.0, 0.8, 1.0]).unwrap();
        let b = RocCurve::from_points(vec![0.0, 0.3, 1.0], vec![0.0, 0.7, 1.0]).unwrap();
        let curves = [a, b];
        for (method, assumption) in [
            (BandMethod::VerticalAveraging, Assumption::Binomial),
            (BandMethod::ThresholdAveraging, Assumption::Binomial),
            (BandMethod::FixedWidth, Assumption::Normal),
            (BandMethod::KolmogorovSmirnov, Assumption::Normal),
        ] {
            assert!(
                matches!(
                    confidence_band(&curves, method, 95.0, assumption),
                    Err(RocError::UndefinedStatistic(_))
                ),
                "{} / {}",
                method,
                assumption
            );
        }
        // counts are not needed for the normal averaging bands
        assert!(confidence_band(&curves, BandMethod::ThresholdAveraging, 95.0, Assumption::Normal).is_ok());
    }

    #[test]
    fn ks_accepts_only_normal() {
        let curves = bootstrap_curves(100, 20, 3);
        for assumption in [Assumption::Binomial, Assumption::Binormal, Assumption::Student] {
            assert!(matches!(
                confidence_band(&curves, BandMethod::KolmogorovSmirnov, 95.0, assumption),
                Err(RocError::InvalidArgument(_))
            ));
        }
    }

    // ── Shape ───────────────────────────────────────────────────

    #[test]
    fn zero_spread_collapses_band() {
        let c = binormal_curve(200, 40, 8);
        let curves = vec![c.clone(), c.clone(), c.clone(), c];
        for method in [BandMethod::VerticalAveraging, BandMethod::ThresholdAveraging] {
            let band = confidence_band(&curves, method, 95.0, Assumption::Normal).unwrap();
            let central = band.central();
            for i in 1..band.resolution() - 1 {
                assert!((band.upper_y()[i] - central.tpr()[i]).abs() < 1e-9);
                assert!((band.lower_y()[i] - central.tpr()[i]).abs() < 1e-9);
                assert!((band.upper_x()[i] - central.fpr()[i]).abs() < 1e-9);
                assert!((band.lower_x()[i] - central.fpr()[i]).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn bands_are_ordered_and_bounded() {
        let curves = bootstrap_curves(300, 30, 12);
        let cases = [
            (BandMethod::VerticalAveraging, Assumption::Normal, false),
            (BandMethod::VerticalAveraging, Assumption::Binomial, false),
            (BandMethod::VerticalAveraging, Assumption::Student, false),
            (BandMethod::ThresholdAveraging, Assumption::Normal, true),
            (BandMethod::ThresholdAveraging, Assumption::Binomial, true),
            (BandMethod::ThresholdAveraging, Assumption::Student, true),
            (BandMethod::FixedWidth, Assumption::Normal, true),
            (BandMethod::KolmogorovSmirnov, Assumption::Normal, true),
        ];
        for (method, assumption, check_x) in cases {
            let band = confidence_band(&curves, method, 90.0, assumption).unwrap();
            assert_ordered(&band, check_x);
            assert_eq!(band.resolution(), 30);
            assert_eq!(band.resampled_upper().len(), 30);
            assert_eq!(band.aucs().len(), 12);
        }
    }

    #[test]
    fn vertical_abscissae_coincide() {
        let curves = bootstrap_curves(200, 25, 6);
        let band =
            confidence_band(&curves, BandMethod::VerticalAveraging, 95.0, Assumption::Normal).unwrap();
        for i in 0..25 {
            let x = i as f64 / 25.0;
            if i > 0 && i < 24 {
                assert_eq!(band.upper_x()[i], x);
            }
            assert_eq!(band.lower_x()[i], x);
            assert_eq!(band.central().fpr()[i], x);
        }
    }

    #[test]
    fn vertical_band_closes_at_corners() {
        let a = RocCurve::from_points(vec![0.0, 0.2, 0.5, 1.0], vec![0.0, 0.7, 0.9, 1.0])
            .unwrap()
            .with_counts(40, 60);
        let b = RocCurve::from_points(vec![0.0, 0.3, 0.6, 1.0], vec![0.0, 0.6, 0.9, 1.0])
            .unwrap()
            .with_counts(40, 60);
        for assumption in [Assumption::Normal, Assumption::Binomial] {
            let band = confidence_band(
                &[a.clone(), b.clone()],
                BandMethod::VerticalAveraging,
                95.0,
                assumption,
            )
            .unwrap();
            assert_eq!((band.upper_x()[0], band.upper_y()[0]), (0.0, 0.0));
            assert_eq!((band.lower_x()[0], band.lower_y()[0]), (0.0, 0.0));
            assert_eq!((band.upper_x()[3], band.upper_y()[3]), (1.0, 1.0));
            let ring = band.polygon();
            assert_eq!(ring.first(), Some(&(0.0, 0.0)));
            assert_eq!(ring.first(), ring.last());
        }
    }

    #[test]
    fn wilson_interval_values() {
        let curve = RocCurve::from_points(vec![0.0, 0.5, 1.0], vec![0.0, 0.6, 1.0])
            .unwrap()
            .with_counts(50, 80);
        let band = confidence_band(
            &[curve],
            BandMethod::ThresholdAveraging,
            95.0,
            Assumption::Binomial,
        )
        .unwrap();
        let z = z_value(95.0).unwrap();
        let q = 50.0 + z * z;
        let (w1, w2) = (50.0 / q, z * z / q);
        let centre = w1 * 0.6 + w2 * 0.5;
        let se = (w1 * 0.6 * 0.4 / q + w2 * 0.25 / q).sqrt();
        assert!((band.upper_y()[1] - (centre + z * se + 0.5 / q)).abs() < TOL);
        assert!((band.lower_y()[1] - (centre - z * se - 0.5 / q)).abs() < TOL);
        let bars = band.error_bars().unwrap();
        assert!((bars.vertical[1] - z * (0.6_f64 * 0.4 / 50.0).sqrt()).abs() < TOL);
        assert!((bars.horizontal[1] - z * (0.25_f64 / 80.0).sqrt()).abs() < TOL);
        assert_eq!(band.central().positive_count(), 50);
    }

    #[test]
    fn threshold_error_bars_follow_spread() {
        let curves = bootstrap_curves(200, 20, 8);
        let band =
            confidence_band(&curves, BandMethod::ThresholdAveraging, 95.0, Assumption::Normal).unwrap();
        let bars = band.error_bars().unwrap();
        let z = band.critical_value();
        let ys: Vec<f64> = curves.iter().map(|c| c.tpr()[10]).collect();
        let expected = z * std_dev(&ys, 1).unwrap() / (8.0_f64).sqrt();
        assert!((bars.vertical[10] - expected).abs() < TOL);
    }

    #[test]
    fn student_uses_n_minus_one() {
        let curves = bootstrap_curves(200, 20, 5);
        let band =
            confidence_band(&curves, BandMethod::ThresholdAveraging, 95.0, Assumption::Student).unwrap();
        assert_eq!(band.critical_value(), student_critical(0.975, 4).unwrap());
    }

    #[test]
    fn boundary_correction_closes_threshold_bands() {
        let curves = bootstrap_curves(200, 20, 5);
        let band =
            confidence_band(&curves, BandMethod::ThresholdAveraging, 95.0, Assumption::Normal).unwrap();
        assert_eq!((band.upper_x()[0], band.upper_y()[0]), (0.0, 0.0));
        assert_eq!((band.lower_x()[0], band.lower_y()[0]), (0.0, 0.0));
        assert_eq!((band.upper_x()[19], band.upper_y()[19]), (1.0, 1.0));
        let ring = band.polygon();
        assert_eq!(ring.len(), 41);
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn high_upper_start_swaps_endpoints() {
        let mut arrays = Arrays::with_capacity(3);
        arrays.push((0.1, 0.6), (0.05, 0.7), (0.15, 0.5));
        arrays.push((0.5, 0.9), (0.45, 0.95), (0.55, 0.85));
        arrays.push((0.9, 0.95), (0.85, 1.0), (0.95, 0.9));
        arrays.correct_boundaries();
        assert_eq!((arrays.upper_x[0], arrays.upper_y[0]), (1.0, 1.0));
        assert_eq!((arrays.upper_x[2], arrays.upper_y[2]), (0.0, 0.0));
        assert_eq!((arrays.lower_x[0], arrays.lower_y[0]), (0.15, 0.5));
        assert_eq!((arrays.upper_x[1], arrays.upper_y[1]), (0.45, 0.95));
    }

    #[test]
    fn resampled_bands_on_regular_grid() {
        let curves = bootstrap_curves(200, 20, 5);
        let band =
            confidence_band(&curves, BandMethod::ThresholdAveraging, 95.0, Assumption::Normal).unwrap();
        let expected = crate::curve::interpolate(band.upper_x(), band.upper_y(), 0.35);
        assert!((band.resampled_upper()[7] - expected).abs() < TOL);
    }

    // ── Kolmogorov-Smirnov ──────────────────────────────────────

    #[test]
    fn ks_band_width() {
        let curves = bootstrap_curves(200, 20, 4);
        let engine = BandEngine::new(BandConfig::default().with_count_policy(InstanceCountPolicy::First));
        let band = engine
            .compute(&curves, BandMethod::KolmogorovSmirnov, 95.0, Assumption::Normal)
            .unwrap();
        assert!((band.critical_value() - 1.36).abs() < 1e-9);
        assert!(band.advisories().is_empty());
        let p = curves[0].positive_count() as f64;
        let i = 10;
        let cy = band.central().tpr()[i];
        let expected = (cy + 1.36 / p.sqrt()).min(1.0);
        assert!((band.upper_y()[i] - expected).abs() < 1e-9);
    }

    #[test]
    fn ks_small_sample_advisory() {
        let curve = RocCurve::from_points(vec![0.0, 0.4, 1.0], vec![0.0, 0.8, 1.0])
            .unwrap()
            .with_counts(20, 100);
        let band = confidence_band(&[curve], BandMethod::KolmogorovSmirnov, 95.0, Assumption::Normal)
            .unwrap();
        assert_eq!(
            band.advisories(),
            &[Advisory::SmallSample {
                positive: 20,
                negative: 100
            }]
        );
        assert!(band.advisories()[0].to_string().contains("30"));
    }

    // ── Fixed width ─────────────────────────────────────────────

    #[test]
    fn fixed_width_converges_to_level() {
        let curves = bootstrap_curves(1000, 50, 40);
        let n = curves.len() as f64;
        for level in [50.0, 90.0, 95.0] {
            let band = confidence_band(&curves, BandMethod::FixedWidth, level, Assumption::Normal)
                .unwrap();
            let diag = band.fixed_width().unwrap();
            assert!(
                (diag.inclusion_ratio - level / 100.0).abs() <= 1.0 / n + 1e-9,
                "level {}: ratio {}",
                level,
                diag.inclusion_ratio
            );
            assert_eq!(diag.iterations, 20);
            assert_eq!(band.critical_value(), diag.bandwidth);
            assert!(diag.bandwidth > 0.0);
        }
    }

    #[test]
    fn fixed_width_is_wider_at_higher_level() {
        let curves = bootstrap_curves(500, 30, 20);
        let narrow = confidence_band(&curves, BandMethod::FixedWidth, 50.0, Assumption::Normal).unwrap();
        let wide = confidence_band(&curves, BandMethod::FixedWidth, 95.0, Assumption::Normal).unwrap();
        assert!(wide.critical_value() > narrow.critical_value());
    }

    #[test]
    fn fixed_width_non_normal_advisory() {
        let curves = bootstrap_curves(200, 20, 5);
        let band =
            confidence_band(&curves, BandMethod::FixedWidth, 90.0, Assumption::Binomial).unwrap();
        assert_eq!(band.advisories(), &[Advisory::AssumptionIgnored(Assumption::Binomial)]);
    }

    #[test]
    fn fixed_width_iterations_from_config() {
        let curves = bootstrap_curves(200, 20, 5);
        let engine = BandEngine::new(BandConfig::default().with_fixed_width_iterations(4));
        let band = engine
            .compute(&curves, BandMethod::FixedWidth, 90.0, Assumption::Normal)
            .unwrap();
        assert_eq!(band.fixed_width().unwrap().iterations, 4);

        let engine = BandEngine::new(BandConfig::default().with_fixed_width_iterations(0));
        assert!(engine
            .compute(&curves, BandMethod::FixedWidth, 90.0, Assumption::Normal)
            .is_err());
    }

    // ── AUC interval ────────────────────────────────────────────

    #[test]
    fn auc_interval_normal_and_student() {
        let curves = bootstrap_curves(200, 20, 10);
        let band =
            confidence_band(&curves, BandMethod::ThresholdAveraging, 95.0, Assumption::Normal).unwrap();
        let aucs: Vec<f64> = curves.iter().map(RocCurve::auc).collect();
        let sd = std_dev(&aucs, 1).unwrap();
        let normal = band.auc_confidence_interval(95.0, Assumption::Normal).unwrap();
        assert!((normal - z_value(95.0).unwrap() * sd / 10f64.sqrt()).abs() < TOL);
        let student = band.auc_confidence_interval(95.0, Assumption::Student).unwrap();
        assert!((student - student_critical(0.975, 9).unwrap() * sd / 10f64.sqrt()).abs() < TOL);
        assert!(student > normal);
    }

    #[test]
    fn auc_interval_errors() {
        let curves = bootstrap_curves(200, 20, 4);
        let band =
            confidence_band(&curves, BandMethod::ThresholdAveraging, 95.0, Assumption::Normal).unwrap();
        for assumption in [Assumption::Binomial, Assumption::Binormal] {
            assert!(matches!(
                band.auc_confidence_interval(95.0, assumption),
                Err(RocError::InvalidArgument(_))
            ));
        }
        let single = confidence_band(
            &curves[..1],
            BandMethod::ThresholdAveraging,
            95.0,
            Assumption::Binomial,
        )
        .unwrap();
        assert!(single.auc_confidence_interval(95.0, Assumption::Normal).is_err());
    }

    #[test]
    fn summary_names_method() {
        let curves = bootstrap_curves(100, 20, 3);
        let band =
            confidence_band(&curves, BandMethod::VerticalAveraging, 95.0, Assumption::Normal).unwrap();
        assert!(band.summary().contains("vertical averaging"));
    }
}
