//! Error taxonomy for the back-test engine and its collaborators.

use thiserror::Error;

/// Errors produced by table construction, allocation algorithms, the
/// optimizer, and the back-test engine itself.
#[derive(Debug, Error)]
pub enum Error {
    /// A back-test was requested against a table with zero columns.
    #[error("no assets provided")]
    NoAssets,

    /// Either no policy could be bootstrapped from the available history, or
    /// a requested date range falls outside the table's envelope, or a
    /// statistic was computed from fewer than two observations.
    #[error("not enough data")]
    NotEnoughData,

    /// An algorithm returned a weight vector of the wrong length, or a
    /// constant-weights policy carries a weight count that disagrees with
    /// the number of assets.
    #[error("size mismatch: expected {expected} weights, got {actual}")]
    SizeMismatch {
        /// Number of weights required.
        expected: usize,
        /// Number of weights actually produced.
        actual: usize,
    },

    /// A policy names an algorithm that is not present in the registry.
    #[error("unknown algorithm {0:?}")]
    UnknownAlgorithm(String),

    /// One or more validation checks failed; all failures are collected.
    #[error("validation failed: {}", .0.join("; "))]
    ValidationFailure(Vec<String>),

    /// The optimizer exhausted its iteration budget without converging.
    #[error("optimizer exhausted its iteration budget")]
    OptimizerExhausted,

    /// The operation was cancelled via an external cancellation handle.
    #[error("operation cancelled")]
    Cancelled,

    /// A YAML or JSON payload did not match the expected schema.
    #[error("decode failure: {0}")]
    DecodeFailure(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::DecodeFailure(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::DecodeFailure(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_human_readable() {
        let err = Error::SizeMismatch {
            expected: 3,
            actual: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains('3'));
        assert!(msg.contains('2'));
        assert!(!msg.to_lowercase().contains("panic"));
    }

    #[test]
    fn validation_failure_joins_messages() {
        let err = Error::ValidationFailure(vec!["a is bad".into(), "b is bad".into()]);
        assert_eq!(err.to_string(), "validation failed: a is bad; b is bad");
    }
}
