//! ROC curve analysis for binary classifiers.
//!
//! Builds ROC curves from labeled scores, smooths them (convex hull, kernel
//! density, binormal fit), resamples them by bootstrap and derives confidence
//! bands by vertical averaging, threshold averaging, fixed-width search or the
//! Kolmogorov-Smirnov bound. Nested bands at graded levels form confidence
//! contours, and a cost context picks the optimal operating point.
//!
//! # Quick start
//!
//! ```
//! use rocband::{Assumption, BandMethod, BootstrapSampler, RocCurve};
//!
//! let labels: Vec<bool> = (0..200).map(|i| i % 2 == 0).collect();
//! let scores: Vec<f64> = (0..200)
//!     .map(|i| ((i * 37) % 100) as f64 / 200.0 + if i % 2 == 0 { 0.4 } else { 0.0 })
//!     .collect();
//! let curve = RocCurve::from_scores(&labels, &scores, 50).unwrap();
//!
//! let replicates = BootstrapSampler::new(20).unwrap().resample(&curve, 7).unwrap();
//! let band = replicates
//!     .band(&Default::default(), BandMethod::ThresholdAveraging, 95.0, Assumption::Normal)
//!     .unwrap();
//! assert_eq!(band.resolution(), 50);
//! ```

pub mod band;
pub mod bootstrap;
pub mod collection;
pub mod config;
pub mod contour;
pub mod curve;
pub mod io;
pub mod kernel;
pub mod operating;
pub mod smoothing;

pub use band::{
    confidence_band, Advisory, Assumption, BandEngine, BandMethod, ConfidenceBand, ErrorBars,
    FixedWidthDiagnostics,
};
pub use bootstrap::BootstrapSampler;
pub use collection::CurveCollection;
pub use config::{BandConfig, InstanceCountPolicy};
pub use contour::{ConfidenceRing, Isolines, LevelRange, RasterRings, RingKind};
pub use curve::{interpolate, RocCurve, DEFAULT_RESOLUTION};
pub use io::{read_curve, read_curve_file};
pub use kernel::{Kernel, KernelShape};
pub use operating::{CostContext, OperatingPoint};
pub use smoothing::{BinormalFit, Smoothing};

pub use rocband_core::{Result, RocError, Scored, Summarizable};

#[cfg(test)]
pub(crate) mod testutil {
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};
    use rand_xoshiro::Xoshiro256PlusPlus;

    use crate::curve::RocCurve;

    /// Interleaved labels and scores, negatives `N(0.4, 0.1)` and positives
    /// `N(0.6, 0.1)`, clamped to `[0, 0.999]`.
    pub fn binormal_scores(n_per_class: usize, seed: u64) -> (Vec<bool>, Vec<f64>) {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let neg = Normal::<f64>::new(0.4, 0.1).unwrap();
        let pos = Normal::<f64>::new(0.6, 0.1).unwrap();
        let mut labels = Vec::with_capacity(2 * n_per_class);
        let mut scores = Vec::with_capacity(2 * n_per_class);
        for _ in 0..n_per_class {
            labels.push(false);
            scores.push(neg.sample(&mut rng).clamp(0.0, 0.999));
            labels.push(true);
            scores.push(pos.sample(&mut rng).clamp(0.0, 0.999));
        }
        (labels, scores)
    }

    pub fn binormal_curve(n_per_class: usize, resolution: usize, seed: u64) -> RocCurve {
        let (labels, scores) = binormal_scores(n_per_class, seed);
        RocCurve::from_scores(&labels, &scores, resolution).unwrap()
    }
}
