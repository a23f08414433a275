//! Triangular matrix with packed storage of the canonical half

use crate::dense::{check_vec_len, Matrix};
use crate::error::{Result, SolveError};
use crate::scalar::Scalar;
use crate::structure::{Diag, Uplo};

/// Square triangular matrix.
///
/// Only the canonical triangle is stored, row by row. Reads of the other
/// triangle return zero; with [`Diag::Unit`] the diagonal reads as one no
/// matter what is stored there.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangularMatrix<T> {
    data: Vec<T>,
    n: usize,
    uplo: Uplo,
    diag: Diag,
}

impl<T: Scalar> TriangularMatrix<T> {
    /// Create an `n x n` zero matrix of the given shape
    pub fn zeros(n: usize, uplo: Uplo, diag: Diag) -> Self {
        Self {
            data: vec![T::zero(); n * (n + 1) / 2],
            n,
            uplo,
            diag,
        }
    }

    /// Take ownership of packed storage of the `uplo` triangle (row by row)
    pub fn from_packed(n: usize, uplo: Uplo, diag: Diag, data: Vec<T>) -> Result<Self> {
        let expected = n * (n + 1) / 2;
        if data.len() != expected {
            return Err(SolveError::ShapeMismatch {
                operation: "TriangularMatrix::from_packed",
                expected: (expected, 1),
                actual: (data.len(), 1),
            });
        }
        Ok(Self {
            data,
            n,
            uplo,
            diag,
        })
    }

    /// Extract the `uplo` triangle of a square dense matrix
    pub fn from_dense(m: &Matrix<T>, uplo: Uplo, diag: Diag) -> Result<Self> {
        if !m.is_square() {
            return Err(SolveError::not_square(
                "TriangularMatrix::from_dense",
                m.nrows(),
                m.ncols(),
            ));
        }
        let n = m.nrows();
        let mut t = Self::zeros(n, uplo, diag);
        for i in 0..n {
            let (lo, hi) = row_span(uplo, n, i);
            for j in lo..hi {
                let k = t.offset(i, j);
                t.data[k] = m[[i, j]];
            }
        }
        Ok(t)
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

    /// Which triangle is stored
    pub fn uplo(&self) -> Uplo {
        self.uplo
    }

    /// Whether the diagonal is implicitly one
    pub fn diag(&self) -> Diag {
        self.diag
    }

    /// Whether `(i, j)` lies in the stored triangle
    #[inline]
    pub fn in_triangle(&self, i: usize, j: usize) -> bool {
        match self.uplo {
            Uplo::Lower => j <= i,
            Uplo::Upper => j >= i,
        }
    }

    /// Unchecked element read for inner loops
    #[inline]
    pub fn at(&self, i: usize, j: usize) -> T {
        if i == j && self.diag == Diag::Unit {
            T::one()
        } else if self.in_triangle(i, j) {
            self.data[self.offset(i, j)]
        } else {
            T::zero()
        }
    }

    /// Element `(i, j)`, synthesizing zeros and the unit diagonal
    pub fn get(&self, i: usize, j: usize) -> Result<T> {
        self.check_bounds(i, j)?;
        Ok(self.at(i, j))
    }

    /// Set an element of the stored triangle.
    ///
    /// Writing outside the triangle, or onto a unit diagonal, is rejected.
    pub fn set(&mut self, i: usize, j: usize, value: T) -> Result<()> {
        self.check_bounds(i, j)?;
        if !self.in_triangle(i, j) {
            return Err(SolveError::InvalidArgument {
                message: format!("({i}, {j}) lies outside the stored {} triangle", self.uplo),
            });
        }
        if i == j && self.diag == Diag::Unit {
            return Err(SolveError::InvalidArgument {
                message: format!("diagonal entry ({i}, {i}) of a unit triangular matrix is fixed"),
            });
        }
        let k = self.offset(i, j);
        self.data[k] = value;
        Ok(())
    }

    /// Packed storage of the stored triangle
    pub fn as_packed(&self) -> &[T] {
        &self.data
    }

    /// Diagonal entries as read (ones for a unit diagonal)
    pub fn diagonal(&self) -> Vec<T> {
        (0..self.n).map(|i| self.at(i, i)).collect()
    }

    /// Expand to a full dense matrix
    pub fn to_dense(&self) -> Matrix<T> {
        Matrix::from_fn(self.n, self.n, |i, j| self.at(i, j))
    }

    /// The transpose, which swaps upper and lower storage
    pub fn transpose(&self) -> Self {
        let uplo = match self.uplo {
            Uplo::Lower => Uplo::Upper,
            Uplo::Upper => Uplo::Lower,
        };
        let mut t = Self::zeros(self.n, uplo, self.diag);
        for i in 0..self.n {
            let (lo, hi) = row_span(uplo, self.n, i);
            for j in lo..hi {
                let k = t.offset(i, j);
                t.data[k] = self.data[self.offset(j, i)];
            }
        }
        t
    }

    /// Matrix-vector product written into `y`
    pub fn matvec_into(&self, x: &[T], y: &mut [T]) -> Result<()> {
        check_vec_len("TriangularMatrix::matvec", self.n, x.len())?;
        check_vec_len("TriangularMatrix::matvec", self.n, y.len())?;
        for (i, yi) in y.iter_mut().enumerate() {
            let (lo, hi) = row_span(self.uplo, self.n, i);
            *yi = (lo..hi).fold(T::zero(), |acc, j| acc + self.at(i, j) * x[j]);
        }
        Ok(())
    }

    /// Transposed matrix-vector product written into `y`
    pub fn matvec_transpose_into(&self, x: &[T], y: &mut [T]) -> Result<()> {
        check_vec_len("TriangularMatrix::matvec_transpose", self.n, x.len())?;
        check_vec_len("TriangularMatrix::matvec_transpose", self.n, y.len())?;
        y.fill(T::zero());
        for (i, &xi) in x.iter().enumerate() {
            let (lo, hi) = row_span(self.uplo, self.n, i);
            for j in lo..hi {
                y[j] += self.at(i, j) * xi;
            }
        }
        Ok(())
    }

    /// Matrix-vector product
    pub fn matvec(&self, x: &[T]) -> Result<Vec<T>> {
        let mut y = vec![T::zero(); self.n];
        self.matvec_into(x, &mut y)?;
        Ok(y)
    }

    /// Maximum absolute column sum
    pub fn norm_one(&self) -> T {
        let mut sums = vec![T::zero(); self.n];
        for i in 0..self.n {
            let (lo, hi) = row_span(self.uplo, self.n, i);
            for (j, s) in sums.iter_mut().enumerate().take(hi).skip(lo) {
                *s += self.at(i, j).abs();
            }
        }
        sums.into_iter().fold(T::zero(), T::max)
    }

    /// Position of `(i, j)` (inside the stored triangle) in the packed storage
    #[inline]
    fn offset(&self, i: usize, j: usize) -> usize {
        match self.uplo {
            Uplo::Lower => i * (i + 1) / 2 + j,
            // rows k < i hold n - k entries each
            Uplo::Upper => i * self.n - i * i.saturating_sub(1) / 2 - i + j,
        }
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

/// Column range `lo..hi` of row `i` inside the `uplo` triangle
#[inline]
pub fn row_span(uplo: Uplo, n: usize, i: usize) -> (usize, usize) {
    match uplo {
        Uplo::Lower => (0, i + 1),
        Uplo::Upper => (i, n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dense::from_vec2d;

    fn dense3() -> Matrix<f64> {
        from_vec2d(vec![
            vec![1.0, 2.0, 3.0],
            vec![4.0, 5.0, 6.0],
            vec![7.0, 8.0, 9.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_upper_extraction() {
        let t = TriangularMatrix::from_dense(&dense3(), Uplo::Upper, Diag::NonUnit).unwrap();
        assert_eq!(t.to_dense(), dense3().upper_triangle());
        assert_eq!(t.get(2, 0).unwrap(), 0.0);
        assert_eq!(t.get(1, 2).unwrap(), 6.0);
        assert_eq!(t.diagonal(), vec![1.0, 5.0, 9.0]);
    }

    #[test]
    fn test_lower_unit_extraction() {
        let t = TriangularMatrix::from_dense(&dense3(), Uplo::Lower, Diag::Unit).unwrap();
        assert_eq!(t.get(1, 1).unwrap(), 1.0);
        assert_eq!(t.get(2, 1).unwrap(), 8.0);
        assert_eq!(t.get(0, 1).unwrap(), 0.0);
    }

    #[test]
    fn test_packed_lower_matches_symmetric_layout() {
        let packed = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let t = TriangularMatrix::from_packed(3, Uplo::Lower, Diag::NonUnit, packed).unwrap();
        assert_eq!(t.get(2, 1).unwrap(), 5.0);
        assert_eq!(t.get(1, 1).unwrap(), 3.0);
        assert!(TriangularMatrix::from_packed(3, Uplo::Lower, Diag::NonUnit, vec![1.0]).is_err());
    }

    #[test]
    fn test_set_outside_triangle_rejected() {
        let mut t = TriangularMatrix::<f64>::zeros(3, Uplo::Upper, Diag::NonUnit);
        assert!(t.set(0, 2, 1.0).is_ok());
        assert!(matches!(
            t.set(2, 0, 1.0),
            Err(SolveError::InvalidArgument { .. })
        ));

        let mut u = TriangularMatrix::<f64>::zeros(2, Uplo::Lower, Diag::Unit);
        assert!(u.set(1, 1, 3.0).is_err());
    }

    #[test]
    fn test_transpose_and_products() {
        let m = dense3();
        let t = TriangularMatrix::from_dense(&m, Uplo::Upper, Diag::NonUnit).unwrap();
        let tt = t.transpose();
        assert_eq!(tt.uplo(), Uplo::Lower);
        assert_eq!(tt.to_dense(), t.to_dense().transpose());

        let x = [1.0, 2.0, 3.0];
        assert_eq!(t.matvec(&x).unwrap(), t.to_dense().matvec(&x).unwrap());

        let mut y = [0.0; 3];
        t.matvec_transpose_into(&x, &mut y).unwrap();
        assert_eq!(y.to_vec(), tt.matvec(&x).unwrap());
        assert_eq!(t.norm_one(), t.to_dense().norm_one());
    }
}
