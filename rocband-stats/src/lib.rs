//! Numeric primitives for ROC confidence estimation.
//!
//! - [`descriptive`]: sample moments, rank quantile, percentile interval
//! - [`distribution`]: normal CDF and inverse approximations, Student's t,
//!   Student and Kolmogorov-Smirnov critical-value searches
//! - [`geometry`]: three-ray point-in-polygon test

pub mod descriptive;
pub mod distribution;
pub mod geometry;

pub use descriptive::{mean, percentile_interval, quantile, std_dev, variance};
pub use distribution::{
    ks_critical, ks_survival, normal_pdf, phi, phi_inv, student_critical, z_value, Distribution,
    StandardNormal, StudentT,
};
pub use geometry::point_in_polygon;
