//! Structure-driven factorization and the queries derived from it

use structsolve_matrix::{
    check_vec_len, Matrix, Result, Scalar, SolveError, Structure, StructuredMatrix,
    TriangularMatrix,
};

use crate::cholesky::CholeskyFactor;
use crate::condest::estimate_inverse_norm_one;
use crate::lu::LuFactor;
use crate::substitution::{
    det_triangular, is_singular_triangular, solve_triangular_in_place,
    solve_triangular_transpose_in_place,
};

/// How a `Symmetric` matrix is factorized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SymmetricPolicy {
    /// Cholesky only; an indefinite matrix is `NotPositiveDefinite`
    #[default]
    Cholesky,
    /// Try Cholesky, fall back to LU of the mirrored dense matrix
    CholeskyOrLu,
}

/// Options for [`Factorization::new`]
#[derive(Debug, Clone, Default)]
pub struct FactorizeOptions {
    /// Symmetric matrix policy.
    /// Default: `SymmetricPolicy::Cholesky`
    pub symmetric: SymmetricPolicy,

    /// Relative LU pivot threshold for `is_singular`.
    /// If `None`, uses `default_singular_rtol()`.
    pub singular_rtol: Option<f64>,

    /// Densify sparse matrices and factorize them with LU.
    /// Default: false (sparse input is `UnsupportedStructure`)
    pub densify_sparse: bool,
}

impl FactorizeOptions {
    /// Set the symmetric matrix policy.
    pub fn with_symmetric_policy(mut self, policy: SymmetricPolicy) -> Self {
        self.symmetric = policy;
        self
    }

    /// Set the LU singularity threshold.
    pub fn with_singular_rtol(mut self, rtol: f64) -> Self {
        self.singular_rtol = Some(rtol);
        self
    }

    /// Allow dense LU of sparse input.
    pub fn with_densify_sparse(mut self, densify: bool) -> Self {
        self.densify_sparse = densify;
        self
    }
}

/// Factors of a square matrix, selected by its structure.
///
/// Owns its storage; mutating the source matrix afterwards does not affect it.
#[derive(Debug, Clone, PartialEq)]
pub enum Factorization<T> {
    /// `P A = L U`
    Lu(LuFactor<T>),
    /// `A = G Gᵗ`
    Cholesky(CholeskyFactor<T>),
    /// The triangular matrix is its own factor
    Triangular(TriangularMatrix<T>),
}

impl<T: Scalar> Factorization<T> {
    /// Factorize a copy of `a`
    pub fn new(a: &StructuredMatrix<T>, options: &FactorizeOptions) -> Result<Self> {
        Self::from_owned(a.clone(), options)
    }

    /// Factorize `a`, reusing its storage where the structure allows
    pub fn from_owned(a: StructuredMatrix<T>, options: &FactorizeOptions) -> Result<Self> {
        let (nrows, ncols) = a.shape();
        if nrows != ncols {
            return Err(SolveError::not_square("factorize", nrows, ncols));
        }
        match a {
            StructuredMatrix::General(m) => {
                log::debug!("factorize: general {nrows}x{nrows} -> LU");
                Ok(Factorization::Lu(LuFactor::from_owned(m, options.singular_rtol)?))
            }
            StructuredMatrix::Symmetric(s) => match options.symmetric {
                SymmetricPolicy::Cholesky => {
                    log::debug!("factorize: symmetric {nrows}x{nrows} -> Cholesky");
                    Ok(Factorization::Cholesky(CholeskyFactor::from_owned(s)?))
                }
                SymmetricPolicy::CholeskyOrLu => match CholeskyFactor::new(&s) {
                    Ok(f) => Ok(Factorization::Cholesky(f)),
                    Err(SolveError::NotPositiveDefinite { pivot }) => {
                        log::warn!(
                            "factorize: symmetric matrix not positive definite (pivot {pivot}), falling back to LU"
                        );
                        let lu = LuFactor::from_owned(s.to_dense(), options.singular_rtol)?;
                        Ok(Factorization::Lu(lu))
                    }
                    Err(e) => Err(e),
                },
            },
            StructuredMatrix::Triangular(t) => {
                // entries as read: a unit diagonal is never looked at
                if t.to_dense().as_slice().iter().any(|x| !x.is_finite()) {
                    return Err(SolveError::NaNEncountered { stage: "triangular" });
                }
                Ok(Factorization::Triangular(t))
            }
            StructuredMatrix::Sparse(s) => {
                if !options.densify_sparse {
                    return Err(SolveError::UnsupportedStructure {
                        operation: "factorize",
                        structure: Structure::Sparse,
                    });
                }
                log::debug!(
                    "factorize: densifying sparse {nrows}x{nrows} matrix ({} nonzeros) for LU",
                    s.nnz()
                );
                Ok(Factorization::Lu(LuFactor::from_owned(
                    s.to_dense(),
                    options.singular_rtol,
                )?))
            }
        }
    }

    /// Dimension of the factorized matrix
    pub fn n(&self) -> usize {
        match self {
            Factorization::Lu(f) => f.n(),
            Factorization::Cholesky(f) => f.n(),
            Factorization::Triangular(t) => t.n(),
        }
    }

    /// Whether the factorized matrix is numerically singular
    pub fn is_singular(&self) -> bool {
        match self {
            Factorization::Lu(f) => f.is_singular(),
            // a failed Cholesky never yields a factor
            Factorization::Cholesky(_) => false,
            Factorization::Triangular(t) => is_singular_triangular(t),
        }
    }

    /// Solve `A x = b`, overwriting `b` with `x`
    pub fn solve_in_place(&self, b: &mut [T]) -> Result<()> {
        match self {
            Factorization::Lu(f) => f.solve_in_place(b),
            Factorization::Cholesky(f) => f.solve_in_place(b),
            Factorization::Triangular(t) => solve_triangular_in_place(t, b),
        }
    }

    /// Solve `Aᵗ x = b`, overwriting `b` with `x`
    pub fn solve_transpose_in_place(&self, b: &mut [T]) -> Result<()> {
        match self {
            Factorization::Lu(f) => f.solve_transpose_in_place(b),
            Factorization::Cholesky(f) => f.solve_in_place(b),
            Factorization::Triangular(t) => solve_triangular_transpose_in_place(t, b),
        }
    }

    /// Solve `A x = b`
    pub fn solve(&self, b: &[T]) -> Result<Vec<T>> {
        let mut x = b.to_vec();
        self.solve_in_place(&mut x)?;
        Ok(x)
    }

    /// Solve `A X = B` column by column, overwriting `B` with `X`
    pub fn solve_matrix_in_place(&self, b: &mut Matrix<T>) -> Result<()> {
        check_vec_len("solve_matrix", self.n(), b.nrows())?;
        if self.is_singular() {
            return Err(SolveError::SingularMatrix);
        }
        let mut columns: Vec<Vec<T>> = (0..b.ncols()).map(|j| b.col(j).to_vec()).collect();
        self.solve_columns(&mut columns)?;
        for (j, col) in columns.iter().enumerate() {
            b.set_col(j, col)?;
        }
        Ok(())
    }

    /// Solve `A X = B`
    pub fn solve_matrix(&self, b: &Matrix<T>) -> Result<Matrix<T>> {
        let mut x = b.clone();
        self.solve_matrix_in_place(&mut x)?;
        Ok(x)
    }

    #[cfg(feature = "rayon")]
    fn solve_columns(&self, columns: &mut [Vec<T>]) -> Result<()> {
        use rayon::prelude::*;
        columns
            .par_iter_mut()
            .try_for_each(|col| self.solve_in_place(col))
    }

    #[cfg(not(feature = "rayon"))]
    fn solve_columns(&self, columns: &mut [Vec<T>]) -> Result<()> {
        columns
            .iter_mut()
            .try_for_each(|col| self.solve_in_place(col))
    }

    /// `A⁻¹`, from `A X = I`
    pub fn inverse(&self) -> Result<Matrix<T>> {
        if self.is_singular() {
            return Err(SolveError::SingularMatrix);
        }
        self.solve_matrix(&Matrix::eye(self.n()))
    }

    /// Determinant from the factors
    pub fn determinant(&self) -> T {
        match self {
            Factorization::Lu(f) => f.determinant(),
            Factorization::Cholesky(f) => f.determinant(),
            Factorization::Triangular(t) => det_triangular(t),
        }
    }

    /// 1-norm of the factorized matrix
    pub fn norm_one(&self) -> T {
        match self {
            Factorization::Lu(f) => f.norm_one(),
            Factorization::Cholesky(f) => f.norm_one(),
            Factorization::Triangular(t) => t.norm_one(),
        }
    }

    /// Estimate of the 1-norm condition number `‖A‖₁ ‖A⁻¹‖₁`.
    ///
    /// Infinite for a singular factorization.
    pub fn estimate_condition_number(&self) -> Result<T> {
        if self.is_singular() {
            return Ok(T::infinity());
        }
        let inv_norm = estimate_inverse_norm_one(
            self.n(),
            |x: &mut [T]| self.solve_in_place(x),
            |x: &mut [T]| self.solve_transpose_in_place(x),
        )?;
        Ok(self.norm_one() * inv_norm)
    }
}

/// Factorize a copy of `a`, reporting a non-positive-definite matrix as `Ok(None)`.
///
/// Shape, structure and non-finite input errors are still returned as `Err`,
/// matching [`try_cholesky`](crate::cholesky::try_cholesky).
pub fn try_factorize<T: Scalar>(
    a: &StructuredMatrix<T>,
    options: &FactorizeOptions,
) -> Result<Option<Factorization<T>>> {
    match Factorization::new(a, options) {
        Ok(f) => Ok(Some(f)),
        Err(SolveError::NotPositiveDefinite { pivot }) => {
            log::debug!("try_factorize: non-positive pivot at {pivot}");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
