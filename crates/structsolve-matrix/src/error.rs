//! Error types for structsolve

use thiserror::Error;

use crate::structure::Structure;

/// Errors that can occur while building matrices, factorizing or solving
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    /// Operand dimensions are incompatible with the requested operation
    #[error("Shape mismatch in {operation}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        operation: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// Cholesky hit a non-positive diagonal pivot
    #[error("Matrix is not positive definite: non-positive pivot at index {pivot}")]
    NotPositiveDefinite { pivot: usize },

    /// Singular matrix encountered
    #[error("Singular matrix encountered")]
    SingularMatrix,

    /// Iterative solver ran out of iterations before reaching the tolerance
    #[error("No convergence after {iterations} iterations (relative residual {residual_norm:e})")]
    ConvergenceFailure {
        iterations: usize,
        residual_norm: f64,
    },

    /// Operation not available for this structural kind
    #[error("{operation} is not supported for {structure} matrices")]
    UnsupportedStructure {
        operation: &'static str,
        structure: Structure,
    },

    /// Index out of bounds
    #[error("Index out of bounds: ({row}, {col}) is out of bounds for a ({nrows}, {ncols}) matrix")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        nrows: usize,
        ncols: usize,
    },

    /// Two sparse entries share the same key
    #[error("Duplicate sparse entry at ({row}, {col})")]
    DuplicateEntry { row: usize, col: usize },

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// NaN or infinite values encountered
    #[error("Non-finite values encountered in {stage}")]
    NaNEncountered { stage: &'static str },
}

impl SolveError {
    /// Shorthand for a square-matrix requirement violated by an `nrows x ncols` operand.
    pub fn not_square(operation: &'static str, nrows: usize, ncols: usize) -> Self {
        SolveError::ShapeMismatch {
            operation,
            expected: (nrows, nrows),
            actual: (nrows, ncols),
        }
    }

    /// True for failures caused by the numbers rather than by the shapes.
    pub fn is_numerical(&self) -> bool {
        matches!(
            self,
            SolveError::NotPositiveDefinite { .. }
                | SolveError::SingularMatrix
                | SolveError::ConvergenceFailure { .. }
                | SolveError::NaNEncountered { .. }
        )
    }
}

/// Result type for structsolve operations
pub type Result<T> = std::result::Result<T, SolveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_shape_mismatch() {
        let err = SolveError::not_square("lu", 2, 3);
        assert_eq!(
            err.to_string(),
            "Shape mismatch in lu: expected (2, 2), got (2, 3)"
        );
        assert!(!err.is_numerical());
    }

    #[test]
    fn test_numerical_classification() {
        assert!(SolveError::SingularMatrix.is_numerical());
        assert!(SolveError::NotPositiveDefinite { pivot: 0 }.is_numerical());
        assert!(!SolveError::UnsupportedStructure {
            operation: "cholesky",
            structure: Structure::Sparse,
        }
        .is_numerical());
    }
}
