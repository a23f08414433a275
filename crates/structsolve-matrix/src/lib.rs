//! Matrix storage for the structsolve linear solver layer
//!
//! This crate provides the data model shared by the factorization and
//! iterative-solver crates:
//! - `Matrix`: dense row-major storage with strided row/column views
//! - `SymmetricMatrix`: packed lower triangle, mirrored on read
//! - `TriangularMatrix`: packed upper or lower triangle, optional unit diagonal
//! - `SparseMatrix`: CSR with one entry per `(row, column)` key
//! - `StructuredMatrix`: a tagged union over the four kinds
//!
//! # Example
//!
//! ```
//! use structsolve_matrix::{from_vec2d, StructuredMatrix, SymmetricMatrix, Uplo, Structure};
//!
//! let dense = from_vec2d(vec![vec![4.0, 1.0], vec![1.0, 3.0]]).unwrap();
//! let sym = SymmetricMatrix::from_dense(&dense, Uplo::Lower).unwrap();
//! let a: StructuredMatrix<f64> = sym.into();
//!
//! assert_eq!(a.structure(), Structure::Symmetric);
//! assert_eq!(a.get(0, 1).unwrap(), 1.0);
//! ```

pub mod dense;
pub mod error;
pub mod global_default;
pub mod scalar;
pub mod sparse;
pub mod structure;
pub mod symmetric;
pub mod triangular;
pub mod view;

// Re-export main types
pub use dense::{asum, axpy, check_vec_len, dot, eye, from_vec2d, iamax, nrm2, zeros, Matrix, Order};
pub use error::{Result, SolveError};
pub use global_default::{
    default_singular_rtol, resolve_singular_rtol, set_default_singular_rtol, GlobalDefault,
    InvalidToleranceError,
};
pub use scalar::Scalar;
pub use sparse::SparseMatrix;
pub use structure::{Diag, Structure, StructuredMatrix, Uplo};
pub use symmetric::SymmetricMatrix;
pub use triangular::TriangularMatrix;
pub use view::{VecMut, VecRef};
