//! Structural kinds and the `StructuredMatrix` tagged union

use std::fmt;

use crate::dense::Matrix;
use crate::error::{Result, SolveError};
use crate::scalar::Scalar;
use crate::sparse::SparseMatrix;
use crate::symmetric::SymmetricMatrix;
use crate::triangular::TriangularMatrix;

/// Which triangle of a matrix is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Uplo {
    Upper,
    Lower,
}

impl fmt::Display for Uplo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Uplo::Upper => write!(f, "upper"),
            Uplo::Lower => write!(f, "lower"),
        }
    }
}

/// Whether a triangular matrix has an implicit unit diagonal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Diag {
    #[default]
    NonUnit,
    Unit,
}

/// Payload-free tag of a [`StructuredMatrix`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Structure {
    General,
    Symmetric,
    Triangular { uplo: Uplo, diag: Diag },
    Sparse,
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Structure::General => write!(f, "general"),
            Structure::Symmetric => write!(f, "symmetric"),
            Structure::Triangular { uplo, diag } => match diag {
                Diag::NonUnit => write!(f, "{uplo} triangular"),
                Diag::Unit => write!(f, "unit {uplo} triangular"),
            },
            Structure::Sparse => write!(f, "sparse"),
        }
    }
}

/// A matrix tagged with its structural kind.
///
/// Solvers `match` on the variant to pick an algorithm.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredMatrix<T> {
    General(Matrix<T>),
    Symmetric(SymmetricMatrix<T>),
    Triangular(TriangularMatrix<T>),
    Sparse(SparseMatrix<T>),
}

impl<T: Scalar> StructuredMatrix<T> {
    /// The structural tag
    pub fn structure(&self) -> Structure {
        match self {
            StructuredMatrix::General(_) => Structure::General,
            StructuredMatrix::Symmetric(_) => Structure::Symmetric,
            StructuredMatrix::Triangular(t) => Structure::Triangular {
                uplo: t.uplo(),
                diag: t.diag(),
            },
            StructuredMatrix::Sparse(_) => Structure::Sparse,
        }
    }

    /// Number of rows
    pub fn nrows(&self) -> usize {
        match self {
            StructuredMatrix::General(m) => m.nrows(),
            StructuredMatrix::Symmetric(s) => s.nrows(),
            StructuredMatrix::Triangular(t) => t.nrows(),
            StructuredMatrix::Sparse(s) => s.nrows(),
        }
    }

    /// Number of columns
    pub fn ncols(&self) -> usize {
        match self {
            StructuredMatrix::General(m) => m.ncols(),
            StructuredMatrix::Symmetric(s) => s.ncols(),
            StructuredMatrix::Triangular(t) => t.ncols(),
            StructuredMatrix::Sparse(s) => s.ncols(),
        }
    }

    /// `(nrows, ncols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }

    /// Element `(i, j)` with the structural half synthesized
    pub fn get(&self, i: usize, j: usize) -> Result<T> {
        match self {
            StructuredMatrix::General(m) => m.get(i, j).copied().ok_or(SolveError::IndexOutOfBounds {
                row: i,
                col: j,
                nrows: m.nrows(),
                ncols: m.ncols(),
            }),
            StructuredMatrix::Symmetric(s) => s.get(i, j),
            StructuredMatrix::Triangular(t) => t.get(i, j),
            StructuredMatrix::Sparse(s) => s.get(i, j),
        }
    }

    /// Expand to a dense general matrix
    pub fn to_dense(&self) -> Matrix<T> {
        match self {
            StructuredMatrix::General(m) => m.clone(),
            StructuredMatrix::Symmetric(s) => s.to_dense(),
            StructuredMatrix::Triangular(t) => t.to_dense(),
            StructuredMatrix::Sparse(s) => s.to_dense(),
        }
    }

    /// Consume into a dense general matrix, reusing general storage
    pub fn into_dense(self) -> Matrix<T> {
        match self {
            StructuredMatrix::General(m) => m,
            other => other.to_dense(),
        }
    }

    /// Matrix-vector product written into `y`
    pub fn matvec_into(&self, x: &[T], y: &mut [T]) -> Result<()> {
        match self {
            StructuredMatrix::General(m) => m.matvec_into(x, y),
            StructuredMatrix::Symmetric(s) => s.matvec_into(x, y),
            StructuredMatrix::Triangular(t) => t.matvec_into(x, y),
            StructuredMatrix::Sparse(s) => s.matvec_into(x, y),
        }
    }

    /// Transposed matrix-vector product written into `y`
    pub fn matvec_transpose_into(&self, x: &[T], y: &mut [T]) -> Result<()> {
        match self {
            StructuredMatrix::General(m) => m.matvec_transpose_into(x, y),
            StructuredMatrix::Symmetric(s) => s.matvec_into(x, y),
            StructuredMatrix::Triangular(t) => t.matvec_transpose_into(x, y),
            StructuredMatrix::Sparse(s) => s.matvec_transpose_into(x, y),
        }
    }

    /// Matrix-vector product
    pub fn matvec(&self, x: &[T]) -> Result<Vec<T>> {
        let mut y = vec![T::zero(); self.nrows()];
        self.matvec_into(x, &mut y)?;
        Ok(y)
    }

    /// Maximum absolute column sum
    pub fn norm_one(&self) -> T {
        match self {
            StructuredMatrix::General(m) => m.norm_one(),
            StructuredMatrix::Symmetric(s) => s.norm_one(),
            StructuredMatrix::Triangular(t) => t.norm_one(),
            StructuredMatrix::Sparse(s) => s.norm_one(),
        }
    }
}

impl<T> From<Matrix<T>> for StructuredMatrix<T> {
    fn from(m: Matrix<T>) -> Self {
        StructuredMatrix::General(m)
    }
}

impl<T> From<SymmetricMatrix<T>> for StructuredMatrix<T> {
    fn from(s: SymmetricMatrix<T>) -> Self {
        StructuredMatrix::Symmetric(s)
    }
}

impl<T> From<TriangularMatrix<T>> for StructuredMatrix<T> {
    fn from(t: TriangularMatrix<T>) -> Self {
        StructuredMatrix::Triangular(t)
    }
}

impl<T> From<SparseMatrix<T>> for StructuredMatrix<T> {
    fn from(s: SparseMatrix<T>) -> Self {
        StructuredMatrix::Sparse(s)
    }
}
