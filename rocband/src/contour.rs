//! Families of nested confidence bands over graded levels.
//!
//! [`Isolines`] computes one band per level. [`RasterRings`] turns bands at
//! consecutive levels into closed polygons filling the space between them,
//! plus a central ring for the innermost level.

use rocband_core::{Result, RocError};

use crate::band::{closed_ring, Assumption, BandEngine, BandMethod, ConfidenceBand};
use crate::curve::RocCurve;

/// Slack on level comparisons when stepping in floating point.
const LEVEL_EPS: f64 = 1e-9;

/// Confidence levels `min, min + step, ..., <= max`, in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LevelRange {
    min: f64,
    max: f64,
    step: f64,
}

impl Default for LevelRange {
    fn default() -> Self {
        Self {
            min: 1.0,
            max: 99.0,
            step: 1.0,
        }
    }
}

impl LevelRange {
    pub fn new(min: f64, max: f64, step: f64) -> Result<Self> {
        if !(step > 0.0 && step.is_finite()) {
            return Err(RocError::InvalidArgument(format!(
                "level range: step must be positive, got {}",
                step
            )));
        }
        if !(min <= max) {
            return Err(RocError::InvalidArgument(format!(
                "level range: min {} exceeds max {}",
                min, max
            )));
        }
        Ok(Self { min, max, step })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Levels in increasing order.
    pub fn levels(&self) -> Vec<f64> {
        let count = ((self.max - self.min) / self.step + LEVEL_EPS).floor() as usize + 1;
        (0..count).map(|k| self.min + k as f64 * self.step).collect()
    }
}

/// One band per level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Isolines {
    pub range: LevelRange,
    pub method: BandMethod,
    pub assumption: Assumption,
}

impl Default for Isolines {
    fn default() -> Self {
        Self {
            range: LevelRange::default(),
            method: BandMethod::ThresholdAveraging,
            assumption: Assumption::Binomial,
        }
    }
}

impl Isolines {
    pub fn with_range(mut self, range: LevelRange) -> Self {
        self.range = range;
        self
    }

    /// Bands in increasing level order.
    pub fn compute(&self, engine: &BandEngine, curves: &[RocCurve]) -> Result<Vec<ConfidenceBand>> {
        bands_at(engine, curves, &self.range.levels(), self.method, self.assumption)
    }
}

/// Which side of the central curve a ring covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RingKind {
    /// Between the upper bands of two consecutive levels.
    Upper,
    /// Between the lower bands of two consecutive levels.
    Lower,
    /// Between the upper and lower band of the innermost level.
    Central,
}

/// Closed polygon of a raster family.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfidenceRing {
    /// Inner level of the ring, in percent.
    pub level: f64,
    pub kind: RingKind,
    /// Vertices, first point repeated at the end.
    pub points: Vec<(f64, f64)>,
}

/// Filled rings between bands at consecutive levels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterRings {
    pub range: LevelRange,
    pub method: BandMethod,
    pub assumption: Assumption,
}

impl Default for RasterRings {
    fn default() -> Self {
        Self {
            range: LevelRange::default(),
            method: BandMethod::ThresholdAveraging,
            assumption: Assumption::Binormal,
        }
    }
}

impl RasterRings {
    pub fn with_range(mut self, range: LevelRange) -> Self {
        self.range = range;
        self
    }

    /// Rings from the outermost level inward.
    ///
    /// For `conf = max - i·step` down to `min + step`, an upper ring joins
    /// the upper band at `conf` (forward) to the upper band at `conf + step`
    /// (reversed), and a lower ring does the same with the lower bands. The
    /// last entry is the central ring at the innermost `conf`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when the range holds fewer than two steps,
    /// and propagates band errors.
    pub fn compute(&self, engine: &BandEngine, curves: &[RocCurve]) -> Result<Vec<ConfidenceRing>> {
        let LevelRange { min, max, step } = self.range;
        let levels: Vec<f64> = (0..)
            .map(|i| max - i as f64 * step)
            .take_while(|&conf| conf >= min + step - LEVEL_EPS)
            .collect();
        if levels.len() < 2 {
            return Err(RocError::InvalidArgument(format!(
                "raster rings need at least two steps between {} and {}",
                min, max
            )));
        }
        let bands = bands_at(engine, curves, &levels, self.method, self.assumption)?;

        let mut rings = Vec::with_capacity(2 * bands.len() - 1);
        for pair in bands.windows(2) {
            let (outer, inner) = (&pair[0], &pair[1]);
            let level = inner.confidence_level();
            rings.push(ConfidenceRing {
                level,
                kind: RingKind::Upper,
                points: closed_ring(inner.upper_x(), inner.upper_y(), outer.upper_x(), outer.upper_y()),
            });
            rings.push(ConfidenceRing {
                level,
                kind: RingKind::Lower,
                points: closed_ring(inner.lower_x(), inner.lower_y(), outer.lower_x(), outer.lower_y()),
            });
        }
        if let Some(innermost) = bands.last() {
            rings.push(ConfidenceRing {
                level: innermost.confidence_level(),
                kind: RingKind::Central,
                points: innermost.polygon(),
            });
        }
        Ok(rings)
    }
}

fn bands_at(
    engine: &BandEngine,
    curves: &[RocCurve],
    levels: &[f64],
    method: BandMethod,
    assumption: Assumption,
) -> Result<Vec<ConfidenceBand>> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        levels
            .par_iter()
            .map(|&level| engine.compute(curves, method, level, assumption))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        levels
            .iter()
            .map(|&level| engine.compute(curves, method, level, assumption))
            .collect()
    }
}
