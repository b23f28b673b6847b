//! Error types for the Lenia engine.

use thiserror::Error;

/// Errors raised by construction, reconfiguration and accessors.
///
/// `step()` never returns one of these: a state that was valid when built
/// stays valid across steps.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LeniaError {
    /// A parameter is outside its allowed range. Nothing was mutated.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name (`R`, `T`, `Mu`, `Sigma`, `Beta`, `height`, `width`).
        name: &'static str,
        /// Human readable constraint that failed.
        reason: String,
    },

    /// The ring-weighted kernel sums to zero and cannot be normalized.
    #[error("degenerate kernel: ring sum is zero for R={radius} with {rings} ring(s)")]
    DegenerateKernel {
        /// Kernel radius.
        radius: usize,
        /// Number of beta rings.
        rings: usize,
    },

    /// A cell or kernel coordinate is outside the matrix.
    #[error("coordinate ({row}, {col}) out of bounds for {rows}x{cols} matrix")]
    OutOfBounds {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
        /// Matrix height.
        rows: usize,
        /// Matrix width.
        cols: usize,
    },
}

impl LeniaError {
    /// Shorthand for an [`LeniaError::InvalidParameter`].
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, LeniaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = LeniaError::invalid("Sigma", "must be > 0, got 0");
        assert_eq!(err.to_string(), "invalid parameter Sigma: must be > 0, got 0");

        let err = LeniaError::DegenerateKernel { radius: 1, rings: 3 };
        assert!(err.to_string().contains("R=1"));

        let err = LeniaError::OutOfBounds { row: 9, col: 2, rows: 4, cols: 4 };
        assert_eq!(err.to_string(), "coordinate (9, 2) out of bounds for 4x4 matrix");
    }
}
