//! Error types for tutor-core.

use thiserror::Error;

/// Result type alias using CoreError.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised by core domain rules.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("difficulty {value} is outside the supported range [0, 11)")]
    DifficultyOutOfRange { value: f64 },
}
