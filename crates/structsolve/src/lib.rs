//! Structured linear solvers
//!
//! One import surface for the structsolve crates:
//! - matrix storage and the [`StructuredMatrix`] tagged union (`structsolve-matrix`)
//! - direct factorizations and the one-shot helpers (`structsolve-linalg`)
//! - preconditioned Krylov solvers (`structsolve-krylov`, feature `krylov`)
//!
//! # Example
//!
//! ```
//! use structsolve::prelude::*;
//!
//! let m = from_vec2d(vec![vec![2.0, 3.0], vec![0.0, 4.0]]).unwrap();
//! let t = TriangularMatrix::from_dense(&m, Uplo::Upper, Diag::NonUnit).unwrap();
//! let a: StructuredMatrix<f64> = t.into();
//!
//! let f = Factorization::new(&a, &FactorizeOptions::default()).unwrap();
//! assert_eq!(f.solve(&[8.0, 8.0]).unwrap(), vec![1.0, 2.0]);
//! ```

// Re-export everything from the matrix layer
pub use structsolve_matrix::*;

// Re-export everything from the factorization layer
pub use structsolve_linalg::*;

// Re-export everything from the iterative layer (when enabled)
#[cfg(feature = "krylov")]
pub use structsolve_krylov::*;

/// The types and functions most programs need.
pub mod prelude {
    pub use structsolve_linalg::{
        cholesky, cond, det, inv, solve, try_factorize, Factorization, FactorizeOptions,
        SymmetricPolicy,
    };
    pub use structsolve_matrix::{
        from_vec2d, Diag, Matrix, Result, Scalar, SolveError, SparseMatrix, Structure,
        StructuredMatrix, SymmetricMatrix, TriangularMatrix, Uplo,
    };

    #[cfg(feature = "krylov")]
    pub use structsolve_krylov::{
        bicg, cg, gmres, qmr, GmresOptions, IdentityPreconditioner, Ilu0Options,
        Ilu0Preconditioner, JacobiPreconditioner, KrylovOptions, KrylovResult, LinearOperator,
        Preconditioner, StopReason,
    };
}
