//! ROC curve construction, resampling and lookups.
//!
//! A [`RocCurve`] is built at fixed, equally spaced score thresholds from
//! labeled scores, or directly from `(fpr, tpr)` sequences. Every component
//! of the crate shares a single linear interpolation rule, [`interpolate`].

use rocband_core::{Result, RocError, Scored, Summarizable};

use crate::smoothing::BinormalFit;

/// Default number of thresholds for score-built curves.
pub const DEFAULT_RESOLUTION: usize = 1000;

/// Number of FPR grid points in the lookup table.
const LOOKUP_POINTS: usize = 1000;

/// Largest FPR accepted by the threshold lookup.
const MAX_LOOKUP_FPR: f64 = 0.99999;

// ---------------------------------------------------------------------------
// Interpolation
// ---------------------------------------------------------------------------

/// Position of an abscissa on a polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Bracket {
    /// Between vertices `k - 1` and `k`, weighted `w1` and `w2`.
    Between { k: usize, w1: f64, w2: f64 },
    /// Outside the breakpoints: the value of vertex `i` is held.
    Hold(usize),
}

impl Bracket {
    fn locate(xs: &[f64], x: f64) -> Self {
        if x < xs[0] {
            return Bracket::Hold(0);
        }
        match (1..xs.len()).find(|&k| xs[k] > x) {
            Some(k) => {
                let d1 = x - xs[k - 1];
                let d2 = xs[k] - x;
                Bracket::Between {
                    k,
                    w1: d2 / (d1 + d2),
                    w2: d1 / (d1 + d2),
                }
            }
            None => Bracket::Hold(xs.len() - 1),
        }
    }

    fn value(self, ys: &[f64]) -> f64 {
        match self {
            Bracket::Between { k, w1, w2 } => w1 * ys[k - 1] + w2 * ys[k],
            Bracket::Hold(i) => ys[i],
        }
    }

    /// Fractional vertex index of the bracket.
    fn position(self) -> f64 {
        match self {
            Bracket::Between { k, w1, w2 } => w1 * (k - 1) as f64 + w2 * k as f64,
            Bracket::Hold(i) => i as f64,
        }
    }
}

/// Linear interpolation of the polyline `(xs, ys)` at `x`.
///
/// The bracket is the first vertex `k >= 1` with `xs[k] > x`, and the value
/// is the inverse-distance weighting of vertices `k - 1` and `k`. When no
/// vertex lies beyond `x` the last value is held; when `x` precedes `xs[0]`
/// the first value is held.
///
/// `xs` and `ys` must have the same non-zero length.
pub fn interpolate(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    Bracket::locate(xs, x).value(ys)
}

/// Resample the polyline `(xs, ys)` at `x_j = j / n` for `j` in `0..n`.
pub(crate) fn resample_points(xs: &[f64], ys: &[f64], n: usize) -> (Vec<f64>, Vec<f64>) {
    let grid: Vec<f64> = (0..n).map(|j| j as f64 / n as f64).collect();
    let values = grid.iter().map(|&x| interpolate(xs, ys, x)).collect();
    (grid, values)
}

// ---------------------------------------------------------------------------
// Lookup table
// ---------------------------------------------------------------------------

/// TPR and threshold tabulated on the FPR grid `j / 1000`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct LookupTable {
    tpr: Vec<f64>,
    threshold: Vec<f64>,
}

impl LookupTable {
    fn build(fpr: &[f64], tpr: &[f64]) -> Self {
        let span = fpr.len().saturating_sub(1).max(1) as f64;
        let mut table_tpr = Vec::with_capacity(LOOKUP_POINTS);
        let mut threshold = Vec::with_capacity(LOOKUP_POINTS);
        for j in 0..LOOKUP_POINTS {
            let bracket = Bracket::locate(fpr, j as f64 / LOOKUP_POINTS as f64);
            table_tpr.push(bracket.value(tpr));
            threshold.push(1.0 - bracket.position() / span);
        }
        Self {
            tpr: table_tpr,
            threshold,
        }
    }

    fn fpr_index(fpr: f64) -> usize {
        let index = (fpr * LOOKUP_POINTS as f64).floor();
        if index <= 0.0 {
            0
        } else {
            (index as usize).min(LOOKUP_POINTS - 1)
        }
    }

    /// First grid index whose TPR reaches `tpr`, bounded by the table.
    fn tpr_index(&self, tpr: f64) -> usize {
        self.tpr
            .iter()
            .position(|&y| y >= tpr)
            .unwrap_or(LOOKUP_POINTS - 1)
    }
}

// ---------------------------------------------------------------------------
// ROC curve
// ---------------------------------------------------------------------------

/// Receiver operating characteristic curve.
///
/// Values are immutable once built: resampling, smoothing and averaging
/// return new curves.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RocCurve {
    fpr: Vec<f64>,
    tpr: Vec<f64>,
    positive_scores: Vec<f64>,
    negative_scores: Vec<f64>,
    positive_count: usize,
    negative_count: usize,
    binormal: Option<BinormalFit>,
    lookup: LookupTable,
}

impl RocCurve {
    /// Build a curve from binary labels and scores.
    ///
    /// For `k` in `0..resolution` the threshold is `t_k = 1 - k / (resolution - 1)`.
    /// A sample is predicted positive when `score >= t_k`; then
    /// `fpr[k] = 1 - TN / N` and `tpr[k] = TP / P`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for empty or mismatched inputs, NaN scores or
    /// `resolution < 2`, and `DegenerateInput` when only one class is present.
    ///
    /// # Example
    ///
    /// ```
    /// use rocband::RocCurve;
    ///
    /// let curve = RocCurve::from_scores(&[true, true, false, false], &[0.9, 0.8, 0.3, 0.1], 100).unwrap();
    /// assert!((curve.auc() - 1.0).abs() < 1e-12);
    /// ```
    pub fn from_scores(labels: &[bool], scores: &[f64], resolution: usize) -> Result<Self> {
        if labels.is_empty() {
            return Err(RocError::InvalidArgument(
                "from_scores: empty input".into(),
            ));
        }
        if labels.len() != scores.len() {
            return Err(RocError::InvalidArgument(format!(
                "from_scores: labels length {} != scores length {}",
                labels.len(),
                scores.len()
            )));
        }
        if resolution < 2 {
            return Err(RocError::InvalidArgument(format!(
                "from_scores: resolution must be at least 2, got {}",
                resolution
            )));
        }
        if scores.iter().any(|s| s.is_nan()) {
            return Err(RocError::InvalidArgument(
                "from_scores: scores must not contain NaN".into(),
            ));
        }

        let mut positive_scores = Vec::new();
        let mut negative_scores = Vec::new();
        for (&label, &score) in labels.iter().zip(scores) {
            if label {
                positive_scores.push(score);
            } else {
                negative_scores.push(score);
            }
        }
        if positive_scores.is_empty() || negative_scores.is_empty() {
            return Err(RocError::DegenerateInput(format!(
                "from_scores: need both classes (got {} positive, {} negative)",
                positive_scores.len(),
                negative_scores.len()
            )));
        }

        let (fpr, tpr) = threshold_sweep(&positive_scores, &negative_scores, resolution);
        let positive_count = positive_scores.len();
        let negative_count = negative_scores.len();
        let lookup = LookupTable::build(&fpr, &tpr);

        Ok(Self {
            fpr,
            tpr,
            positive_scores,
            negative_scores,
            positive_count,
            negative_count,
            binormal: None,
            lookup,
        })
    }

    /// Build a curve from `0/1` labels; any other label value is rejected.
    pub fn from_binary_labels(labels: &[u8], scores: &[f64], resolution: usize) -> Result<Self> {
        if let Some(bad) = labels.iter().find(|&&l| l > 1) {
            return Err(RocError::InvalidArgument(format!(
                "from_binary_labels: labels must be 0 or 1, got {}",
                bad
            )));
        }
        let labels: Vec<bool> = labels.iter().map(|&l| l == 1).collect();
        Self::from_scores(&labels, scores, resolution)
    }

    /// Build a curve directly from `(fpr, tpr)` sequences.
    ///
    /// The curve carries no raw scores and zero instance counts; attach
    /// counts with [`with_counts`](Self::with_counts) to use it with the
    /// count-based band methods.
    pub fn from_points(fpr: Vec<f64>, tpr: Vec<f64>) -> Result<Self> {
        if fpr.len() != tpr.len() {
            return Err(RocError::InvalidArgument(format!(
                "from_points: fpr length {} != tpr length {}",
                fpr.len(),
                tpr.len()
            )));
        }
        if fpr.is_empty() {
            return Err(RocError::InvalidArgument(
                "from_points: need at least one point".into(),
            ));
        }
        let lookup = LookupTable::build(&fpr, &tpr);
        Ok(Self {
            fpr,
            tpr,
            positive_scores: Vec::new(),
            negative_scores: Vec::new(),
            positive_count: 0,
            negative_count: 0,
            binormal: None,
            lookup,
        })
    }

    /// Attach per-class instance counts.
    pub fn with_counts(mut self, positive: usize, negative: usize) -> Self {
        self.positive_count = positive;
        self.negative_count = negative;
        self
    }

    pub(crate) fn with_binormal(mut self, fit: BinormalFit) -> Self {
        self.binormal = Some(fit);
        self
    }

    pub(crate) fn with_raw_scores(mut self, positive: Vec<f64>, negative: Vec<f64>) -> Self {
        self.positive_scores = positive;
        self.negative_scores = negative;
        self
    }

    // -- accessors ----------------------------------------------------------

    /// Number of points.
    pub fn resolution(&self) -> usize {
        self.fpr.len()
    }

    pub fn fpr(&self) -> &[f64] {
        &self.fpr
    }

    pub fn tpr(&self) -> &[f64] {
        &self.tpr
    }

    /// Iterator over `(fpr, tpr)` points.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.fpr.iter().copied().zip(self.tpr.iter().copied())
    }

    pub fn positive_scores(&self) -> &[f64] {
        &self.positive_scores
    }

    pub fn negative_scores(&self) -> &[f64] {
        &self.negative_scores
    }

    /// Whether raw per-class scores are available.
    pub fn has_raw_scores(&self) -> bool {
        !self.positive_scores.is_empty() && !self.negative_scores.is_empty()
    }

    pub fn positive_count(&self) -> usize {
        self.positive_count
    }

    pub fn negative_count(&self) -> usize {
        self.negative_count
    }

    /// Binormal fit, present only on curves returned by binormal smoothing.
    pub fn binormal(&self) -> Option<&BinormalFit> {
        self.binormal.as_ref()
    }

    // -- metrics ------------------------------------------------------------

    /// Area under the curve by the trapezoidal rule, `Σ |Δfpr|·(tpr_i + tpr_{i+1})/2`.
    pub fn auc(&self) -> f64 {
        self.fpr
            .windows(2)
            .zip(self.tpr.windows(2))
            .map(|(x, y)| (x[1] - x[0]).abs() * (y[0] + y[1]) / 2.0)
            .sum()
    }

    /// Resample at `x_j = j / n` for `j` in `0..n`, keeping instance counts.
    pub fn resample(&self, n: usize) -> Result<RocCurve> {
        if n == 0 {
            return Err(RocError::InvalidArgument(
                "resample: resolution must be positive".into(),
            ));
        }
        let (fpr, tpr) = resample_points(&self.fpr, &self.tpr, n);
        Ok(RocCurve::from_points(fpr, tpr)?.with_counts(self.positive_count, self.negative_count))
    }

    // -- lookups ------------------------------------------------------------

    /// TPR at the given FPR, read from the lookup table.
    pub fn tpr_at(&self, fpr: f64) -> f64 {
        self.lookup.tpr[LookupTable::fpr_index(fpr)]
    }

    /// Smallest tabulated FPR whose TPR reaches `tpr`.
    pub fn fpr_at(&self, tpr: f64) -> f64 {
        self.lookup.tpr_index(tpr) as f64 / LOOKUP_POINTS as f64
    }

    /// Score threshold producing the given FPR.
    pub fn threshold_at_fpr(&self, fpr: f64) -> f64 {
        let fpr = fpr.clamp(0.0, MAX_LOOKUP_FPR);
        self.lookup.threshold[LookupTable::fpr_index(fpr)]
    }

    /// Score threshold at which TPR first reaches `tpr`.
    pub fn threshold_at_tpr(&self, tpr: f64) -> f64 {
        self.lookup.threshold[self.lookup.tpr_index(tpr)]
    }

    /// Score threshold of point `index`, `1 - index / (resolution - 1)`.
    pub fn threshold_of_index(&self, index: usize) -> f64 {
        let span = self.resolution().saturating_sub(1).max(1) as f64;
        1.0 - index as f64 / span
    }

    // -- averaging ----------------------------------------------------------

    /// Threshold-averaged central curve of at least two curves.
    pub fn average(curves: &[RocCurve]) -> Result<RocCurve> {
        if curves.len() < 2 {
            return Err(RocError::InvalidArgument(format!(
                "average: need at least 2 curves, got {}",
                curves.len()
            )));
        }
        let band = crate::band::BandEngine::default().compute(
            curves,
            crate::band::BandMethod::ThresholdAveraging,
            95.0,
            crate::band::Assumption::Normal,
        )?;
        Ok(band.central().clone())
    }

    /// Pointwise weighted mean `weight·self + (1 - weight)·other`.
    ///
    /// Both curves must share a resolution. Instance counts are averaged
    /// with the same weights and rounded.
    pub fn average_with(&self, other: &RocCurve, weight: f64) -> Result<RocCurve> {
        if !(0.0..=1.0).contains(&weight) {
            return Err(RocError::InvalidArgument(format!(
                "average_with: weight must be in [0, 1], got {}",
                weight
            )));
        }
        if self.resolution() != other.resolution() {
            return Err(RocError::InvalidArgument(format!(
                "average_with: resolutions differ ({} vs {})",
                self.resolution(),
                other.resolution()
            )));
        }
        let mix = |a: &[f64], b: &[f64]| -> Vec<f64> {
            a.iter()
                .zip(b)
                .map(|(&u, &v)| weight * u + (1.0 - weight) * v)
                .collect()
        };
        let count = |a: usize, b: usize| (weight * a as f64 + (1.0 - weight) * b as f64).round() as usize;

        Ok(RocCurve::from_points(mix(&self.fpr, &other.fpr), mix(&self.tpr, &other.tpr))?
            .with_counts(
                count(self.positive_count, other.positive_count),
                count(self.negative_count, other.negative_count),
            ))
    }
}

impl Summarizable for RocCurve {
    fn summary(&self) -> String {
        format!(
            "ROC curve: {} points, AUC {:.4}, {} positive / {} negative",
            self.resolution(),
            self.auc(),
            self.positive_count,
            self.negative_count
        )
    }
}

impl Scored for RocCurve {
    fn score(&self) -> f64 {
        self.auc()
    }
}

/// Confusion-count sweep over the fixed threshold grid.
///
/// Counts of scores at or above each threshold come from a binary search on
/// the sorted class samples.
fn threshold_sweep(positives: &[f64], negatives: &[f64], resolution: usize) -> (Vec<f64>, Vec<f64>) {
    let mut pos = positives.to_vec();
    let mut neg = negatives.to_vec();
    pos.sort_by(|a, b| a.total_cmp(b));
    neg.sort_by(|a, b| a.total_cmp(b));
    let p = pos.len() as f64;
    let n = neg.len() as f64;

    let mut fpr = Vec::with_capacity(resolution);
    let mut tpr = Vec::with_capacity(resolution);
    for k in 0..resolution {
        let t = 1.0 - k as f64 / (resolution - 1) as f64;
        let true_negatives = neg.partition_point(|&s| s < t) as f64;
        let false_negatives = pos.partition_point(|&s| s < t) as f64;
        fpr.push(1.0 - true_negatives / n);
        tpr.push((p - false_negatives) / p);
    }
    (fpr, tpr)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
