//! Structured error types for the rocband crates.

use thiserror::Error;

/// Unified error type for all rocband operations.
///
/// Every variant is a fatal precondition failure: the operation that returns
/// it produced no result.
#[derive(Debug, Error)]
pub enum RocError {
    /// I/O error while reading a curve file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error (malformed curve file row)
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid argument (mismatched lengths, out-of-range levels, illegal
    /// method/assumption combinations, too few curves)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A statistic required by the procedure is undefined, typically a zero
    /// positive or negative instance count.
    #[error("undefined statistic: {0}")]
    UndefinedStatistic(String),

    /// Input that cannot produce a ROC curve, such as scores from a single class.
    #[error("degenerate input: {0}")]
    DegenerateInput(String),
}

/// Convenience alias used throughout the rocband crates.
pub type Result<T> = std::result::Result<T, RocError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_class() {
        let e = RocError::InvalidArgument("confidence level must lie in (0, 100), got 120".into());
        assert_eq!(
            e.to_string(),
            "invalid argument: confidence level must lie in (0, 100), got 120"
        );
        let e = RocError::UndefinedStatistic("no negative instances".into());
        assert!(e.to_string().starts_with("undefined statistic"));
    }

    #[test]
    fn io_converts() {
        fn open() -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"))?
        }
        assert!(matches!(open(), Err(RocError::Io(_))));
    }
}
