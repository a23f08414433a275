//! Cholesky decomposition of symmetric positive-definite matrices

use structsolve_matrix::{
    check_vec_len, Diag, Matrix, Result, Scalar, SolveError, SymmetricMatrix, TriangularMatrix,
    Uplo,
};

use crate::substitution::substitute;

/// Cholesky factor `A = G Gᵗ` with `G` lower triangular.
#[derive(Debug, Clone, PartialEq)]
pub struct CholeskyFactor<T> {
    g: TriangularMatrix<T>,
    norm_one: T,
}

impl<T: Scalar> CholeskyFactor<T> {
    /// Factorize a copy of `a`
    pub fn new(a: &SymmetricMatrix<T>) -> Result<Self> {
        Self::from_owned(a.clone())
    }

    /// Factorize `a`, overwriting its packed storage with `G`
    pub fn from_owned(a: SymmetricMatrix<T>) -> Result<Self> {
        let n = a.n();
        let norm_one = a.norm_one();
        let mut data = a.into_packed();
        if data.iter().any(|x| !x.is_finite()) {
            return Err(SolveError::NaNEncountered { stage: "cholesky" });
        }
        log::debug!("cholesky: factorizing {n}x{n} matrix");

        let row = |i: usize| i * (i + 1) / 2;
        for i in 0..n {
            for j in 0..=i {
                let (ri, rj) = (row(i), row(j));
                let mut s = data[ri + j];
                for k in 0..j {
                    s -= data[ri + k] * data[rj + k];
                }
                if i == j {
                    // also rejects NaN
                    if !(s > T::zero()) {
                        return Err(SolveError::NotPositiveDefinite { pivot: i });
                    }
                    data[ri + i] = s.sqrt();
                } else {
                    data[ri + j] = s / data[rj + j];
                }
            }
        }
        let g = TriangularMatrix::from_packed(n, Uplo::Lower, Diag::NonUnit, data)?;
        Ok(Self { g, norm_one })
    }

    /// Dimension of the factorized matrix
    pub fn n(&self) -> usize {
        self.g.n()
    }

    /// Lower-triangular factor `G`
    pub fn g(&self) -> &TriangularMatrix<T> {
        &self.g
    }

    /// `G` expanded to a dense matrix
    pub fn l(&self) -> Matrix<T> {
        self.g.to_dense()
    }

    /// 1-norm of the factorized matrix
    pub fn norm_one(&self) -> T {
        self.norm_one
    }

    /// `prod(g_ii)^2`
    pub fn determinant(&self) -> T {
        let p = self.g.diagonal().into_iter().fold(T::one(), |acc, d| acc * d);
        p * p
    }

    /// Solve `A x = b` in place (`A` is symmetric, so this also solves `Aᵗ x = b`)
    pub fn solve_in_place(&self, b: &mut [T]) -> Result<()> {
        check_vec_len("cholesky solve", self.n(), b.len())?;
        let n = self.n();
        substitute(n, |i, j| self.g.at(i, j), Uplo::Lower, false, b);
        substitute(n, |i, j| self.g.at(j, i), Uplo::Upper, false, b);
        Ok(())
    }

    /// Solve `A x = b`
    pub fn solve(&self, b: &[T]) -> Result<Vec<T>> {
        let mut x = b.to_vec();
        self.solve_in_place(&mut x)?;
        Ok(x)
    }

    /// `G Gᵗ`
    pub fn reconstruct(&self) -> Result<Matrix<T>> {
        let l = self.l();
        l.matmul(&l.transpose())
    }
}

/// Cholesky decomposition of a copy of `a`
pub fn cholesky<T: Scalar>(a: &SymmetricMatrix<T>) -> Result<CholeskyFactor<T>> {
    CholeskyFactor::new(a)
}

/// Cholesky decomposition that reports a non-positive-definite matrix as `Ok(None)`.
///
/// Non-finite input is still an error.
pub fn try_cholesky<T: Scalar>(a: &SymmetricMatrix<T>) -> Result<Option<CholeskyFactor<T>>> {
    match CholeskyFactor::new(a) {
        Ok(f) => Ok(Some(f)),
        Err(SolveError::NotPositiveDefinite { pivot }) => {
            log::debug!("try_cholesky: non-positive pivot at {pivot}");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
