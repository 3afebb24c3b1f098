//! Core trait definitions for the rocband crates.

/// A type that carries a headline numeric score (AUC, interval half-width, etc.).
pub trait Scored {
    /// The score value.
    fn score(&self) -> f64;
}

/// A type that can produce a summary of its contents.
pub trait Summarizable {
    /// A one-line summary suitable for display.
    fn summary(&self) -> String;
}
