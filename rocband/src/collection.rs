//! Ordered sets of ROC curves.

use rocband_core::Result;

use crate::band::{Assumption, BandEngine, BandMethod, ConfidenceBand};
use crate::curve::RocCurve;
use crate::operating::{CostContext, OperatingPoint};
use crate::smoothing::Smoothing;

/// An ordered set of curves with an independence flag.
///
/// Curves built from distinct test sets are independent; bootstrap
/// replicates of one curve are not.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CurveCollection {
    curves: Vec<RocCurve>,
    independent: bool,
}

impl CurveCollection {
    /// Collection of independent curves.
    pub fn new(curves: Vec<RocCurve>) -> Self {
        Self {
            curves,
            independent: true,
        }
    }

    /// Collection of statistically dependent curves.
    pub fn dependent(curves: Vec<RocCurve>) -> Self {
        Self {
            curves,
            independent: false,
        }
    }

    pub fn is_independent(&self) -> bool {
        self.independent
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    pub fn curves(&self) -> &[RocCurve] {
        &self.curves
    }

    pub fn push(&mut self, curve: RocCurve) {
        self.curves.push(curve);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RocCurve> {
        self.curves.iter()
    }

    pub fn into_curves(self) -> Vec<RocCurve> {
        self.curves
    }

    /// AUC of each curve, in order.
    pub fn aucs(&self) -> Vec<f64> {
        self.curves.iter().map(RocCurve::auc).collect()
    }

    /// Least-cost operating point of each curve under `context`, in order.
    pub fn optimal_points(&self, context: &CostContext) -> Vec<OperatingPoint> {
        self.curves
            .iter()
            .map(|c| c.optimal_operating_point(context))
            .collect()
    }

    /// Smooth every curve with `method`, keeping order and the independence
    /// flag.
    pub fn smoothed(&self, method: &Smoothing) -> Result<CurveCollection> {
        #[cfg(feature = "parallel")]
        let curves = {
            use rayon::prelude::*;
            self.curves
                .par_iter()
                .map(|c| c.smooth(method))
                .collect::<Result<Vec<_>>>()?
        };
        #[cfg(not(feature = "parallel"))]
        let curves = self
            .curves
            .iter()
            .map(|c| c.smooth(method))
            .collect::<Result<Vec<_>>>()?;

        Ok(CurveCollection {
            curves,
            independent: self.independent,
        })
    }

    /// Threshold-averaged central curve.
    pub fn average(&self) -> Result<RocCurve> {
        RocCurve::average(&self.curves)
    }

    /// Confidence band of the collection.
    pub fn band(
        &self,
        engine: &BandEngine,
        method: BandMethod,
        level: f64,
        assumption: Assumption,
    ) -> Result<ConfidenceBand> {
        engine.compute(&self.curves, method, level, assumption)
    }
}

impl FromIterator<RocCurve> for CurveCollection {
    fn from_iter<I: IntoIterator<Item = RocCurve>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a CurveCollection {
    type Item = &'a RocCurve;
    type IntoIter = std::slice::Iter<'a, RocCurve>;

    fn into_iter(self) -> Self::IntoIter {
        self.curves.iter()
    }
}

impl IntoIterator for CurveCollection {
    type Item = RocCurve;
    type IntoIter = std::vec::IntoIter<RocCurve>;

    fn into_iter(self) -> Self::IntoIter {
        self.curves.into_iter()
    }
}
