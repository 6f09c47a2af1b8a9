//! Error types for constant derivation and the range-statistics cache

use thiserror::Error;

/// Errors raised while building or evaluating a constant set
///
/// `Clone` so a memoized failure can be handed back on every read of the
/// field that produced it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConstantError {
    /// A construction argument is outside its domain (n < 2, z <= 0, bad tolerance)
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Numerical integration produced a non-physical value
    #[error("Computation of {statistic} lost precision: {detail}")]
    ComputationPrecision {
        statistic: &'static str,
        detail: String,
    },
}

impl ConstantError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        ConstantError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    pub(crate) fn precision(statistic: &'static str, detail: impl Into<String>) -> Self {
        ConstantError::ComputationPrecision {
            statistic,
            detail: detail.into(),
        }
    }

    /// True for construction-time argument errors
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, ConstantError::InvalidParameter { .. })
    }

    /// True for integration failures surfaced lazily on first access
    pub fn is_precision(&self) -> bool {
        matches!(self, ConstantError::ComputationPrecision { .. })
    }
}

/// Errors from a range-statistics cache backend
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt cache entry for {key}: {value:?}")]
    Corrupt { key: String, value: String },

    #[error("Cache lock poisoned")]
    Poisoned,
}
