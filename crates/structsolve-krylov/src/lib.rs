//! Preconditioned Krylov subspace solvers for structsolve
//!
//! The solvers only see the system through two seams:
//! - [`LinearOperator`]: `y = A x` and `y = Aᵗ x`, implemented for every
//!   matrix kind of `structsolve-matrix`
//! - [`Preconditioner`]: `z = M⁻¹ r` and `z = M⁻ᵗ r`
//!
//! # Solvers
//!
//! - [`cg`]: Conjugate Gradient for symmetric positive-definite systems
//! - [`bicg`]: BiConjugate Gradient for non-symmetric systems
//! - [`qmr`]: Quasi-Minimal Residual for non-symmetric and symmetric-indefinite systems
//! - [`gmres`]: restarted GMRES with right preconditioning
//!
//! Every solver takes its preconditioner explicitly; pass
//! [`IdentityPreconditioner`] for none. Running out of iterations is reported
//! through [`KrylovResult::stop_reason`], not as an error.
//!
//! # Example
//!
//! ```
//! use structsolve_krylov::{qmr, Ilu0Preconditioner, KrylovOptions};
//! use structsolve_matrix::SparseMatrix;
//!
//! let a: SparseMatrix<f64> = SparseMatrix::from_triplets(
//!     3,
//!     3,
//!     &[(0, 0, 4.0), (0, 1, -1.0), (1, 0, -1.0), (1, 1, 4.0), (1, 2, -1.0), (2, 1, -1.0), (2, 2, 4.0)],
//! )
//! .unwrap();
//! let ilu = Ilu0Preconditioner::new(&a).unwrap();
//! let result = qmr(&a, &[3.0, 2.0, 3.0], None, &ilu, &KrylovOptions::default()).unwrap();
//!
//! assert!(result.converged());
//! assert!((result.solution[0] - 1.0).abs() < 1e-8);
//! ```

pub mod bicg;
pub mod cg;
pub mod gmres;
pub mod operator;
pub mod options;
pub mod preconditioner;
pub mod qmr;
mod util;

pub use bicg::bicg;
pub use cg::cg;
pub use gmres::gmres;
pub use operator::LinearOperator;
pub use options::{
    default_krylov_rtol, set_default_krylov_rtol, GmresOptions, KrylovOptions, KrylovResult,
    StopReason,
};
pub use preconditioner::{
    IdentityPreconditioner, Ilu0Options, Ilu0Preconditioner, JacobiPreconditioner, Preconditioner,
};
pub use qmr::qmr;
