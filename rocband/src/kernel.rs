//! Smoothing kernels for class-conditional score distributions.

use std::f64::consts::PI;

use rocband_core::{Result, RocError};
use rocband_stats::descriptive::std_dev;
use rocband_stats::distribution::{normal_pdf, phi};

/// Bandwidth used when none is given.
pub const DEFAULT_BANDWIDTH: f64 = 0.01;

/// Kernel shape.
///
/// `Automatic` evaluates as Epanechnikov; its bandwidth is chosen from the
/// samples by Silverman's rule when the kernel is [resolved](Kernel::resolve).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KernelShape {
    Uniform,
    Triangular,
    Epanechnikov,
    Quartic,
    Triweight,
    Gaussian,
    Cosine,
    Automatic,
}

impl KernelShape {
    /// Efficiency relative to the Epanechnikov kernel.
    pub fn efficiency(self) -> f64 {
        match self {
            KernelShape::Uniform => 0.929,
            KernelShape::Triangular => 0.986,
            KernelShape::Epanechnikov | KernelShape::Automatic => 1.0,
            KernelShape::Quartic => 0.994,
            KernelShape::Triweight => 0.987,
            KernelShape::Gaussian => 0.951,
            KernelShape::Cosine => 0.999,
        }
    }

    /// Support interval, `None` for the unbounded Gaussian.
    pub fn support(self) -> Option<(f64, f64)> {
        match self {
            KernelShape::Gaussian => None,
            _ => Some((-1.0, 1.0)),
        }
    }
}

/// A kernel shape with its bandwidth.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Kernel {
    shape: KernelShape,
    bandwidth: f64,
}

impl Default for Kernel {
    fn default() -> Self {
        Self {
            shape: KernelShape::Gaussian,
            bandwidth: DEFAULT_BANDWIDTH,
        }
    }
}

impl Kernel {
    /// Create a kernel. `bandwidth` must be positive and finite.
    pub fn new(shape: KernelShape, bandwidth: f64) -> Result<Self> {
        if !(bandwidth > 0.0 && bandwidth.is_finite()) {
            return Err(RocError::InvalidArgument(format!(
                "kernel bandwidth must be positive, got {}",
                bandwidth
            )));
        }
        Ok(Self { shape, bandwidth })
    }

    /// Kernel with the default bandwidth.
    pub fn with_shape(shape: KernelShape) -> Self {
        Self {
            shape,
            bandwidth: DEFAULT_BANDWIDTH,
        }
    }

    /// Epanechnikov kernel with data-driven bandwidth.
    pub fn automatic() -> Self {
        Self::with_shape(KernelShape::Automatic)
    }

    pub fn shape(&self) -> KernelShape {
        self.shape
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn efficiency(&self) -> f64 {
        self.shape.efficiency()
    }

    pub fn support(&self) -> Option<(f64, f64)> {
        self.shape.support()
    }

    /// Concrete kernel for `samples`.
    ///
    /// An `Automatic` kernel becomes an Epanechnikov kernel with bandwidth
    /// `1.06 · σ · n^(-1/5)`, σ being the sample standard deviation. Any
    /// other kernel is returned unchanged. `self` is never modified.
    ///
    /// # Errors
    ///
    /// Returns `DegenerateInput` for an automatic kernel given fewer than two
    /// samples or samples without spread.
    pub fn resolve(&self, samples: &[f64]) -> Result<Kernel> {
        if self.shape != KernelShape::Automatic {
            return Ok(*self);
        }
        if samples.len() < 2 {
            return Err(RocError::DegenerateInput(format!(
                "automatic bandwidth needs at least 2 samples, got {}",
                samples.len()
            )));
        }
        let (lo, hi) = samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &s| (lo.min(s), hi.max(s)));
        let sigma = std_dev(samples, 1)?;
        let bandwidth = 1.06 * sigma * (samples.len() as f64).powf(-0.2);
        if hi <= lo || !(bandwidth > 0.0) {
            return Err(RocError::DegenerateInput(
                "automatic bandwidth: samples have zero spread".into(),
            ));
        }
        Ok(Kernel {
            shape: KernelShape::Epanechnikov,
            bandwidth,
        })
    }

    /// Density at standardized offset `u`.
    pub fn pdf(&self, u: f64) -> f64 {
        if let Some((lo, hi)) = self.support() {
            if u < lo || u > hi {
                return 0.0;
            }
        }
        match self.shape {
            KernelShape::Uniform => 0.5,
            KernelShape::Triangular => 1.0 - u.abs(),
            KernelShape::Epanechnikov | KernelShape::Automatic => 0.75 * (1.0 - u * u),
            KernelShape::Quartic => 15.0 / 16.0 * (1.0 - u * u).powi(2),
            KernelShape::Triweight => 35.0 / 32.0 * (1.0 - u * u).powi(3),
            KernelShape::Gaussian => normal_pdf(u),
            KernelShape::Cosine => PI / 4.0 * (PI / 2.0 * u).cos(),
        }
    }

    /// Cumulative distribution at standardized offset `u`.
    pub fn cdf(&self, u: f64) -> f64 {
        if let Some((lo, hi)) = self.support() {
            if u < lo {
                return 0.0;
            }
            if u > hi {
                return 1.0;
            }
        }
        match self.shape {
            KernelShape::Uniform => 0.5 * (u + 1.0),
            KernelShape::Triangular => {
                if u < 0.0 {
                    0.5 * (1.0 + u).powi(2)
                } else {
                    1.0 - 0.5 * (1.0 - u).powi(2)
                }
            }
            KernelShape::Epanechnikov | KernelShape::Automatic => {
                0.75 * (u - u.powi(3) / 3.0) + 0.5
            }
            KernelShape::Quartic => {
                15.0 / 16.0 * (u - 2.0 / 3.0 * u.powi(3) + u.powi(5) / 5.0) + 0.5
            }
            KernelShape::Triweight => {
                35.0 / 32.0 * (u - u.powi(3) + 3.0 / 5.0 * u.powi(5) - u.powi(7) / 7.0) + 0.5
            }
            KernelShape::Gaussian => phi(u),
            KernelShape::Cosine => 0.5 * ((PI / 2.0 * u).sin() + 1.0),
        }
    }
}
