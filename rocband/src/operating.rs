//! Cost-sensitive operating point selection.

use rocband_core::{Result, RocError, Scored};

use crate::curve::RocCurve;

/// Tolerance on the sum of class priors.
const PRIOR_SUM_TOL: f64 = 1e-5;

/// Misclassification costs and class priors.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CostContext {
    cost_fp: f64,
    cost_fn: f64,
    prior_positive: f64,
    prior_negative: f64,
}

impl CostContext {
    /// Costs must be positive; priors must be positive and sum to one.
    pub fn new(cost_fp: f64, cost_fn: f64, prior_positive: f64, prior_negative: f64) -> Result<Self> {
        if !(cost_fp > 0.0 && cost_fn > 0.0) {
            return Err(RocError::InvalidArgument(format!(
                "cost context: costs must be positive, got fp {} fn {}",
                cost_fp, cost_fn
            )));
        }
        if !(prior_positive > 0.0 && prior_negative > 0.0) {
            return Err(RocError::InvalidArgument(format!(
                "cost context: priors must be positive, got {} and {}",
                prior_positive, prior_negative
            )));
        }
        if (prior_positive + prior_negative - 1.0).abs() > PRIOR_SUM_TOL {
            return Err(RocError::InvalidArgument(format!(
                "cost context: priors must sum to 1, got {}",
                prior_positive + prior_negative
            )));
        }
        Ok(Self {
            cost_fp,
            cost_fn,
            prior_positive,
            prior_negative,
        })
    }

    /// Unit costs with the given positive prior.
    pub fn balanced(prior_positive: f64) -> Result<Self> {
        Self::new(1.0, 1.0, prior_positive, 1.0 - prior_positive)
    }

    /// Cost of one false positive.
    pub fn cost_fp(&self) -> f64 {
        self.cost_fp
    }

    /// Cost of one false negative.
    pub fn cost_fn(&self) -> f64 {
        self.cost_fn
    }

    /// Prior probability of the positive class.
    pub fn prior_positive(&self) -> f64 {
        self.prior_positive
    }

    /// Prior probability of the negative class.
    pub fn prior_negative(&self) -> f64 {
        self.prior_negative
    }

    /// Slope of the iso-performance lines, `C_fp·π_neg / (C_fn·π_pos)`.
    pub fn slope(&self) -> f64 {
        self.cost_fp * self.prior_negative / (self.cost_fn * self.prior_positive)
    }

    /// Orientation of the iso-performance lines in degrees, `-atan(slope)`.
    pub fn angle_degrees(&self) -> f64 {
        -self.slope().atan().to_degrees()
    }

    /// Expected misclassification cost at `(fpr, tpr)`.
    pub fn expected_cost(&self, fpr: f64, tpr: f64) -> f64 {
        self.cost_fn * self.prior_positive * (1.0 - tpr) + self.cost_fp * self.prior_negative * fpr
    }

    /// Curve vertex of least expected cost; the first one on ties.
    pub fn optimal_point(&self, curve: &RocCurve) -> OperatingPoint {
        let (index, expected_cost) = curve
            .points()
            .map(|(x, y)| self.expected_cost(x, y))
            .enumerate()
            .fold((0, f64::INFINITY), |best, (i, cost)| {
                if cost < best.1 {
                    (i, cost)
                } else {
                    best
                }
            });
        OperatingPoint {
            fpr: curve.fpr()[index],
            tpr: curve.tpr()[index],
            index,
            threshold: curve.threshold_of_index(index),
            expected_cost,
        }
    }
}

/// Selected point of a curve.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OperatingPoint {
    pub fpr: f64,
    pub tpr: f64,
    /// Vertex index on the curve.
    pub index: usize,
    /// Score threshold of the vertex.
    pub threshold: f64,
    pub expected_cost: f64,
}

impl Scored for OperatingPoint {
    fn score(&self) -> f64 {
        self.expected_cost
    }
}

impl RocCurve {
    /// Operating point minimising the expected cost under `context`.
    pub fn optimal_operating_point(&self, context: &CostContext) -> OperatingPoint {
        context.optimal_point(self)
    }
}
