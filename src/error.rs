//! The single error kind raised by the optimizer.

use crate::imaging::BackendError;
use thiserror::Error;

/// Cause text used when a failure carries no usable message (e.g. a panic
/// in the worker thread).
pub const UNKNOWN_CAUSE: &str = "Unknown error";

/// Every failure of `optimize_image`, whatever the step: missing source,
/// directory creation, decode, encode, thumbnail write or final stat.
///
/// Displays as `Image optimization failed: <cause>`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Image optimization failed: {cause}")]
pub struct ImageOptimizationError {
    cause: String,
}

impl ImageOptimizationError {
    pub fn new(cause: impl std::fmt::Display) -> Self {
        Self {
            cause: cause.to_string(),
        }
    }

    pub fn unknown() -> Self {
        Self::new(UNKNOWN_CAUSE)
    }

    /// The wrapped cause message, without the prefix.
    pub fn cause(&self) -> &str {
        &self.cause
    }
}

impl From<std::io::Error> for ImageOptimizationError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err)
    }
}

impl From<BackendError> for ImageOptimizationError {
    fn from(err: BackendError) -> Self {
        Self::new(err)
    }
}

impl From<tokio::task::JoinError> for ImageOptimizationError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_panic() {
            return Self::unknown();
        }
        Self::new(err)
    }
}
