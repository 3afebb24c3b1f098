//! Shared primitives and traits for the rocband ROC analysis crates.
//!
//! - **Error types**: [`RocError`] and [`Result`]
//! - **Traits**: [`Summarizable`] and [`Scored`]

pub mod error;
pub mod traits;

pub use error::{RocError, Result};
pub use traits::*;
