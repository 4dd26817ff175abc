//! Error types for allocation, simulation and statistics.

use thiserror::Error;

/// Errors surfaced by the allocation and simulation engines.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AllocatorError {
    /// Non-positive amounts, malformed snapshot ordering, out-of-range inputs.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Unknown strategy name or an invalid strategy profile.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A statistic was requested on a series that is too short.
    #[error("Insufficient data for {statistic}: need at least {required} points, got {available}")]
    InsufficientData {
        statistic: &'static str,
        required: usize,
        available: usize,
    },
}

impl AllocatorError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn insufficient_data(statistic: &'static str, required: usize, available: usize) -> Self {
        Self::InsufficientData {
            statistic,
            required,
            available,
        }
    }
}

pub type Result<T> = std::result::Result<T, AllocatorError>;
