//! Bootstrap resampling of score-built ROC curves.

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use rocband_core::{Result, RocError};

use crate::collection::CurveCollection;
use crate::curve::RocCurve;

/// Draws bootstrap replicates of a curve from its raw scores.
///
/// Each replicate samples `P + N` instances with replacement from the pooled
/// sample set, keeping each drawn instance's label, and rebuilds a curve at
/// the source resolution. Replicates are statistically dependent, so the
/// returned collection is flagged accordingly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapSampler {
    replicates: usize,
}

impl BootstrapSampler {
    /// Sampler drawing `replicates` curves per call.
    pub fn new(replicates: usize) -> Result<Self> {
        if replicates == 0 {
            return Err(RocError::InvalidArgument(
                "bootstrap: replicate count must be at least 1".into(),
            ));
        }
        Ok(Self { replicates })
    }

    pub fn replicates(&self) -> usize {
        self.replicates
    }

    /// Replicates of `curve` from a Xoshiro256++ stream seeded with `seed`.
    ///
    /// # Errors
    ///
    /// As [`resample_with_rng`](Self::resample_with_rng).
    pub fn resample(&self, curve: &RocCurve, seed: u64) -> Result<CurveCollection> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        self.resample_with_rng(curve, &mut rng)
    }

    /// Replicates of `curve` drawn from `rng`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when `curve` carries no raw scores.
    /// Returns `DegenerateInput` when any replicate draws instances of only
    /// one class; no partial collection is returned. Small pools make this
    /// likely: with `P + N = 4` a replicate is single-class with
    /// probability 1/8.
    pub fn resample_with_rng<R: Rng + ?Sized>(
        &self,
        curve: &RocCurve,
        rng: &mut R,
    ) -> Result<CurveCollection> {
        if !curve.has_raw_scores() {
            return Err(RocError::InvalidArgument(
                "bootstrap: curve carries no raw scores".into(),
            ));
        }
        let n_neg = curve.negative_scores().len();
        let pool: Vec<f64> = curve
            .negative_scores()
            .iter()
            .chain(curve.positive_scores())
            .copied()
            .collect();
        let n = pool.len();
        let resolution = curve.resolution();

        let mut labels = vec![false; n];
        let mut scores = vec![0.0; n];
        let mut curves = Vec::with_capacity(self.replicates);
        for _ in 0..self.replicates {
            for (label, score) in labels.iter_mut().zip(scores.iter_mut()) {
                let idx = rng.gen_range(0..n);
                *label = idx >= n_neg;
                *score = pool[idx];
            }
            curves.push(RocCurve::from_scores(&labels, &scores, resolution)?);
        }
        tracing::debug!(
            replicates = self.replicates,
            instances = n,
            resolution,
            "bootstrap resampling done"
        );
        Ok(CurveCollection::dependent(curves))
    }
}
