//! Symmetric matrix with packed lower-triangle storage

use crate::dense::{check_vec_len, Matrix};
use crate::error::{Result, SolveError};
use crate::scalar::Scalar;
use crate::structure::Uplo;

/// Symmetric `n x n` matrix.
///
/// Only the lower triangle is stored (`n (n + 1) / 2` entries, row by row);
/// reads above the diagonal are mirrored from below.
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetricMatrix<T> {
    data: Vec<T>,
    n: usize,
}

#[inline]
fn packed_index(i: usize, j: usize) -> usize {
    let (r, c) = if i >= j { (i, j) } else { (j, i) };
    r * (r + 1) / 2 + c
}

impl<T: Scalar> SymmetricMatrix<T> {
    /// Create an `n x n` zero matrix
    pub fn zeros(n: usize) -> Self {
        Self {
            data: vec![T::zero(); n * (n + 1) / 2],
            n,
        }
    }

    /// Take ownership of packed lower-triangle storage (row by row)
    pub fn from_packed_lower(n: usize, data: Vec<T>) -> Result<Self> {
        let expected = n * (n + 1) / 2;
        if data.len() != expected {
            return Err(SolveError::ShapeMismatch {
                operation: "SymmetricMatrix::from_packed_lower",
                expected: (expected, 1),
                actual: (data.len(), 1),
            });
        }
        Ok(Self { data, n })
    }

    /// Extract a symmetric matrix from one triangle of a square dense matrix.
    ///
    /// The other triangle of `m` is ignored.
    pub fn from_dense(m: &Matrix<T>, uplo: Uplo) -> Result<Self> {
        if !m.is_square() {
            return Err(SolveError::not_square(
                "SymmetricMatrix::from_dense",
                m.nrows(),
                m.ncols(),
            ));
        }
        let n = m.nrows();
        let mut data = Vec::with_capacity(n * (n + 1) / 2);
        for i in 0..n {
            for j in 0..=i {
                data.push(match uplo {
                    Uplo::Lower => m[[i, j]],
                    Uplo::Upper => m[[j, i]],
                });
            }
        }
        Ok(Self { data, n })
    }

    /// Dimension of the matrix
    pub fn n(&self) -> usize {
        self.n
    }

    /// Number of rows
    pub fn nrows(&self) -> usize {
        self.n
    }

    /// Number of columns
    pub fn ncols(&self) -> usize {
        self.n
    }

    /// Element `(i, j)`; `(i, j)` and `(j, i)` read the same stored value
    pub fn get(&self, i: usize, j: usize) -> Result<T> {
        self.check_bounds(i, j)?;
        Ok(self.data[packed_index(i, j)])
    }

    /// Set element `(i, j)` and, implicitly, its mirror `(j, i)`
    pub fn set(&mut self, i: usize, j: usize, value: T) -> Result<()> {
        self.check_bounds(i, j)?;
        self.data[packed_index(i, j)] = value;
        Ok(())
    }

    /// Unchecked element read for inner loops
    #[inline]
    pub fn at(&self, i: usize, j: usize) -> T {
        self.data[packed_index(i, j)]
    }

    /// Packed lower-triangle storage
    pub fn as_packed(&self) -> &[T] {
        &self.data
    }

    /// Release the packed lower-triangle storage
    pub fn into_packed(self) -> Vec<T> {
        self.data
    }

    /// Diagonal entries
    pub fn diagonal(&self) -> Vec<T> {
        (0..self.n).map(|i| self.at(i, i)).collect()
    }

    /// Expand to a full dense matrix
    pub fn to_dense(&self) -> Matrix<T> {
        Matrix::from_fn(self.n, self.n, |i, j| self.at(i, j))
    }

    /// Matrix-vector product written into `y`
    pub fn matvec_into(&self, x: &[T], y: &mut [T]) -> Result<()> {
        check_vec_len("SymmetricMatrix::matvec", self.n, x.len())?;
        check_vec_len("SymmetricMatrix::matvec", self.n, y.len())?;
        y.fill(T::zero());
        for i in 0..self.n {
            let row = i * (i + 1) / 2;
            for j in 0..i {
                let a = self.data[row + j];
                y[i] += a * x[j];
                y[j] += a * x[i];
            }
            y[i] += self.data[row + i] * x[i];
        }
        Ok(())
    }

    /// Matrix-vector product
    pub fn matvec(&self, x: &[T]) -> Result<Vec<T>> {
        let mut y = vec![T::zero(); self.n];
        self.matvec_into(x, &mut y)?;
        Ok(y)
    }

    /// Maximum absolute column sum (equal to the row-sum norm for symmetric matrices)
    pub fn norm_one(&self) -> T {
        (0..self.n)
            .map(|j| (0..self.n).map(|i| self.at(i, j).abs()).sum::<T>())
            .fold(T::zero(), T::max)
    }

    /// Largest absolute entry
    pub fn max_abs(&self) -> T {
        self.data.iter().map(|x| x.abs()).fold(T::zero(), T::max)
    }

    fn check_bounds(&self, i: usize, j: usize) -> Result<()> {
        if i >= self.n || j >= self.n {
            return Err(SolveError::IndexOutOfBounds {
                row: i,
                col: j,
                nrows: self.n,
                ncols: self.n,
            });
        }
        Ok(())
    }
}
