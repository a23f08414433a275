//! Direct factorizations for structured linear systems
//!
//! [`Factorization`] picks the decomposition from the matrix structure:
//! - General: LU with partial row pivoting
//! - Symmetric: Cholesky (optionally falling back to LU)
//! - Triangular: the matrix itself
//! - Sparse: rejected unless densification is requested; use the Krylov
//!   solvers instead
//!
//! Householder QR, one-sided Jacobi SVD and the symmetric Jacobi
//! eigendecomposition are available as standalone decompositions.
//!
//! # Example
//!
//! ```
//! use structsolve_linalg::{Factorization, FactorizeOptions};
//! use structsolve_matrix::{from_vec2d, StructuredMatrix, SymmetricMatrix, Uplo};
//!
//! let dense = from_vec2d(vec![vec![2.0, 0.0], vec![0.0, 2.0]]).unwrap();
//! let a: StructuredMatrix<f64> = SymmetricMatrix::from_dense(&dense, Uplo::Lower).unwrap().into();
//!
//! let f = Factorization::new(&a, &FactorizeOptions::default()).unwrap();
//! let x = f.solve(&[2.0, 2.0]).unwrap();
//! assert!((x[0] - 1.0).abs() < 1e-14 && (x[1] - 1.0).abs() < 1e-14);
//! ```

pub mod cholesky;
pub mod condest;
pub mod eig;
pub mod factorization;
pub mod lu;
pub mod qr;
pub mod substitution;
pub mod svd;

pub use cholesky::{cholesky, try_cholesky, CholeskyFactor};
pub use condest::estimate_inverse_norm_one;
pub use eig::{eig_symmetric, SymmetricEigen};
pub use factorization::{try_factorize, Factorization, FactorizeOptions, SymmetricPolicy};
pub use lu::{lu, lu_in_place, LuFactor};
pub use qr::{lstsq, qr, QrFactor};
pub use svd::{svd, Svd};
pub use substitution::{
    det_triangular, is_singular_triangular, solve_triangular, solve_triangular_in_place,
    solve_triangular_transpose_in_place,
};

// Re-export the matrix layer so downstream users need one import path
pub use structsolve_matrix::{Result, Scalar, SolveError};

use structsolve_matrix::{Matrix, StructuredMatrix};

/// Options used by the one-shot helpers: symmetric indefinite input falls back to LU
fn helper_options() -> FactorizeOptions {
    FactorizeOptions::default().with_symmetric_policy(SymmetricPolicy::CholeskyOrLu)
}

/// Solve `A x = b` with a one-off factorization
pub fn solve<T: Scalar>(a: &StructuredMatrix<T>, b: &[T]) -> Result<Vec<T>> {
    Factorization::new(a, &helper_options())?.solve(b)
}

/// `A⁻¹` with a one-off factorization
pub fn inv<T: Scalar>(a: &StructuredMatrix<T>) -> Result<Matrix<T>> {
    Factorization::new(a, &helper_options())?.inverse()
}

/// Determinant with a one-off factorization
pub fn det<T: Scalar>(a: &StructuredMatrix<T>) -> Result<T> {
    Ok(Factorization::new(a, &helper_options())?.determinant())
}

/// Estimated 1-norm condition number with a one-off factorization
pub fn cond<T: Scalar>(a: &StructuredMatrix<T>) -> Result<T> {
    Factorization::new(a, &helper_options())?.estimate_condition_number()
}
