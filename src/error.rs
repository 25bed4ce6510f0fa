use thiserror::Error;

pub type Result<T, E = MatrixError> = std::result::Result<T, E>;

/// Everything that can go wrong in matrix arithmetic and eigen-decomposition.
///
/// Errors are returned to the immediate caller and never retried internally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatrixError {
    #[error("cannot {operation} a {}x{} matrix with a {}x{} matrix", .left.0, .left.1, .right.0, .right.1)]
    DimensionMismatch {
        operation: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("index ({row}, {col}) is out of range for a {rows}x{cols} matrix")]
    IndexOutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("cannot compute the {operation} of a non-square {rows}x{cols} matrix")]
    NonSquareOperand {
        operation: &'static str,
        rows: usize,
        cols: usize,
    },

    #[error("matrix is singular")]
    SingularMatrix,

    #[error("QR iteration did not converge after {iterations} iterations (eigenvalue index {index})")]
    NonConvergence { iterations: usize, index: usize },

    #[error("invalid shape {rows}x{cols} for {operation}")]
    InvalidShape {
        operation: &'static str,
        rows: usize,
        cols: usize,
    },

    #[error("invalid filter: {0}")]
    InvalidFilter(String),
}

impl MatrixError {
    pub(crate) fn mismatch(
        operation: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    ) -> Self {
        Self::DimensionMismatch {
            operation,
            left,
            right,
        }
    }

    pub(crate) fn non_square(operation: &'static str, shape: (usize, usize)) -> Self {
        Self::NonSquareOperand {
            operation,
            rows: shape.0,
            cols: shape.1,
        }
    }

    pub(crate) fn invalid_shape(operation: &'static str, shape: (usize, usize)) -> Self {
        Self::InvalidShape {
            operation,
            rows: shape.0,
            cols: shape.1,
        }
    }
}
