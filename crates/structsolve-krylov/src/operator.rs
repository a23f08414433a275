//! Linear operators applied by the Krylov solvers

use structsolve_matrix::{Matrix, Result, Scalar, SparseMatrix, StructuredMatrix};

/// A square or rectangular linear map known only through its action.
///
/// Solvers never inspect entries; they only call `apply` and, for the
/// Lanczos-based methods, `apply_transpose`.
pub trait LinearOperator<T: Scalar> {
    /// Number of rows
    fn nrows(&self) -> usize;

    /// Number of columns
    fn ncols(&self) -> usize;

    /// `y = A x`
    fn apply(&self, x: &[T], y: &mut [T]) -> Result<()>;

    /// `y = Aᵗ x`
    fn apply_transpose(&self, x: &[T], y: &mut [T]) -> Result<()>;
}

impl<T: Scalar> LinearOperator<T> for SparseMatrix<T> {
    fn nrows(&self) -> usize {
        SparseMatrix::nrows(self)
    }

    fn ncols(&self) -> usize {
        SparseMatrix::ncols(self)
    }

    fn apply(&self, x: &[T], y: &mut [T]) -> Result<()> {
        self.matvec_into(x, y)
    }

    fn apply_transpose(&self, x: &[T], y: &mut [T]) -> Result<()> {
        self.matvec_transpose_into(x, y)
    }
}

impl<T: Scalar> LinearOperator<T> for Matrix<T> {
    fn nrows(&self) -> usize {
        Matrix::nrows(self)
    }

    fn ncols(&self) -> usize {
        Matrix::ncols(self)
    }

    fn apply(&self, x: &[T], y: &mut [T]) -> Result<()> {
        self.matvec_into(x, y)
    }

    fn apply_transpose(&self, x: &[T], y: &mut [T]) -> Result<()> {
        self.matvec_transpose_into(x, y)
    }
}

impl<T: Scalar> LinearOperator<T> for StructuredMatrix<T> {
    fn nrows(&self) -> usize {
        StructuredMatrix::nrows(self)
    }

    fn ncols(&self) -> usize {
        StructuredMatrix::ncols(self)
    }

    fn apply(&self, x: &[T], y: &mut [T]) -> Result<()> {
        self.matvec_into(x, y)
    }

    fn apply_transpose(&self, x: &[T], y: &mut [T]) -> Result<()> {
        self.matvec_transpose_into(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use structsolve_matrix::{from_vec2d, SymmetricMatrix, Uplo};

    fn check_operator<A: LinearOperator<f64>>(a: &A, dense: &Matrix<f64>) {
        let x = [1.0, -2.0, 0.5];
        let mut y = [0.0; 3];
        a.apply(&x, &mut y).unwrap();
        assert_eq!(y.to_vec(), dense.matvec(&x).unwrap());
        a.apply_transpose(&x, &mut y).unwrap();
        assert_eq!(y.to_vec(), dense.transpose().matvec(&x).unwrap());
        assert_eq!((a.nrows(), a.ncols()), dense.shape());
    }

    #[test]
    fn test_operators_agree_with_dense() {
        let dense = from_vec2d(vec![
            vec![4.0, -1.0, 0.0],
            vec![2.0, 4.0, -1.0],
            vec![0.0, 3.0, 4.0],
        ])
        .unwrap();
        check_operator(&dense, &dense);
        check_operator(&SparseMatrix::from_dense(&dense, 0.0), &dense);
        check_operator(&StructuredMatrix::General(dense.clone()), &dense);

        let sym_dense = dense.lower_triangle().matmul(&dense.lower_triangle().transpose()).unwrap();
        let sym = SymmetricMatrix::from_dense(&sym_dense, Uplo::Lower).unwrap();
        check_operator(&StructuredMatrix::Symmetric(sym), &sym_dense);
    }

    #[test]
    fn test_length_mismatch_is_error() {
        let a = SparseMatrix::<f64>::new(3, 3);
        let mut y = [0.0; 3];
        assert!(a.apply(&[1.0, 2.0], &mut y).is_err());
    }
}
