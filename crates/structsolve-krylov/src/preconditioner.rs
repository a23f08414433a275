//! Preconditioners: approximate inverses applied inside the Krylov iterations

use structsolve_matrix::global_default::validate_tolerance;
use structsolve_matrix::{check_vec_len, Result, Scalar, SolveError, SparseMatrix};

/// An approximate inverse `M⁻¹` of a square operator.
pub trait Preconditioner<T: Scalar> {
    /// Dimension of the preconditioned system
    fn dim(&self) -> usize;

    /// `z = M⁻¹ r`
    fn apply(&self, r: &[T], z: &mut [T]) -> Result<()>;

    /// `z = M⁻ᵗ r`
    fn apply_transpose(&self, r: &[T], z: &mut [T]) -> Result<()>;
}

/// `M = I`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityPreconditioner {
    n: usize,
}

impl IdentityPreconditioner {
    /// Identity of dimension `n`
    pub fn new(n: usize) -> Self {
        Self { n }
    }
}

impl<T: Scalar> Preconditioner<T> for IdentityPreconditioner {
    fn dim(&self) -> usize {
        self.n
    }

    fn apply(&self, r: &[T], z: &mut [T]) -> Result<()> {
        check_vec_len("IdentityPreconditioner::apply", self.n, r.len())?;
        check_vec_len("IdentityPreconditioner::apply", self.n, z.len())?;
        z.copy_from_slice(r);
        Ok(())
    }

    fn apply_transpose(&self, r: &[T], z: &mut [T]) -> Result<()> {
        Preconditioner::<T>::apply(self, r, z)
    }
}

/// `M = diag(A)`
#[derive(Debug, Clone, PartialEq)]
pub struct JacobiPreconditioner<T> {
    inv_diag: Vec<T>,
}

impl<T: Scalar> JacobiPreconditioner<T> {
    /// Build from an explicit diagonal; a zero entry is `SingularMatrix`
    pub fn from_diagonal(diag: &[T]) -> Result<Self> {
        if diag.iter().any(|d| d.is_zero() || !d.is_finite()) {
            return Err(SolveError::SingularMatrix);
        }
        Ok(Self {
            inv_diag: diag.iter().map(|&d| T::one() / d).collect(),
        })
    }

    /// Build from the stored diagonal of a square sparse matrix
    pub fn new(a: &SparseMatrix<T>) -> Result<Self> {
        if a.nrows() != a.ncols() {
            return Err(SolveError::not_square("JacobiPreconditioner", a.nrows(), a.ncols()));
        }
        Self::from_diagonal(&a.diagonal())
    }
}

impl<T: Scalar> Preconditioner<T> for JacobiPreconditioner<T> {
    fn dim(&self) -> usize {
        self.inv_diag.len()
    }

    fn apply(&self, r: &[T], z: &mut [T]) -> Result<()> {
        check_vec_len("JacobiPreconditioner::apply", self.dim(), r.len())?;
        check_vec_len("JacobiPreconditioner::apply", self.dim(), z.len())?;
        for ((zi, &ri), &d) in z.iter_mut().zip(r).zip(&self.inv_diag) {
            *zi = ri * d;
        }
        Ok(())
    }

    fn apply_transpose(&self, r: &[T], z: &mut [T]) -> Result<()> {
        self.apply(r, z)
    }
}

/// Options for [`Ilu0Preconditioner`]
#[derive(Debug, Clone)]
pub struct Ilu0Options {
    /// Added to every diagonal entry before factorizing.
    /// Default: 0.0
    pub diagonal_shift: f64,

    /// A pivot with `|u_ii| <= pivot_tol` is `SingularMatrix`.
    /// Default: 1e-14
    pub pivot_tol: f64,
}

impl Default for Ilu0Options {
    fn default() -> Self {
        Self {
            diagonal_shift: 0.0,
            pivot_tol: 1e-14,
        }
    }
}

impl Ilu0Options {
    /// Set the diagonal shift.
    pub fn with_diagonal_shift(mut self, shift: f64) -> Self {
        self.diagonal_shift = shift;
        self
    }

    /// Set the pivot tolerance.
    pub fn with_pivot_tol(mut self, tol: f64) -> Self {
        self.pivot_tol = tol;
        self
    }

    /// The pivot tolerance must be finite and non-negative, the shift finite.
    fn validate(&self) -> Result<()> {
        validate_tolerance(self.pivot_tol)?;
        if !self.diagonal_shift.is_finite() {
            return Err(SolveError::InvalidArgument {
                message: format!("ILU(0) diagonal shift must be finite, got {}", self.diagonal_shift),
            });
        }
        Ok(())
    }
}

/// Incomplete LU with zero fill-in.
///
/// `L` (unit lower) and `U` share the sparsity pattern of `A`; every update
/// that would create an entry outside that pattern is dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Ilu0Preconditioner<T> {
    n: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<T>,
    /// Position of the diagonal entry of each row in `values`
    diag: Vec<usize>,
}

impl<T: Scalar> Ilu0Preconditioner<T> {
    /// ILU(0) with default options
    pub fn new(a: &SparseMatrix<T>) -> Result<Self> {
        Self::with_options(a, &Ilu0Options::default())
    }

    /// ILU(0) of `a + shift I`.
    ///
    /// Every row must store its diagonal entry.
    pub fn with_options(a: &SparseMatrix<T>, options: &Ilu0Options) -> Result<Self> {
        options.validate()?;
        let n = a.nrows();
        if n != a.ncols() {
            return Err(SolveError::not_square("Ilu0Preconditioner", n, a.ncols()));
        }
        let row_ptr = a.row_ptr().to_vec();
        let col_idx = a.col_indices().to_vec();
        let mut values = a.values().to_vec();
        if values.iter().any(|v| !v.is_finite()) {
            return Err(SolveError::NaNEncountered { stage: "ilu0" });
        }

        let mut diag = Vec::with_capacity(n);
        for i in 0..n {
            let span = row_ptr[i]..row_ptr[i + 1];
            let pos = col_idx[span.clone()]
                .binary_search(&i)
                .map(|k| span.start + k)
                .map_err(|_| SolveError::InvalidArgument {
                    message: format!("ILU(0) needs a stored diagonal entry in row {i}"),
                })?;
            values[pos] += T::from_f64(options.diagonal_shift);
            diag.push(pos);
        }

        const NONE: usize = usize::MAX;
        let mut iw = vec![NONE; n];
        let pivot_tol = T::from_f64(options.pivot_tol);
        for i in 0..n {
            let (start, end) = (row_ptr[i], row_ptr[i + 1]);
            for p in start..end {
                iw[col_idx[p]] = p;
            }
            for p in start..diag[i] {
                let k = col_idx[p];
                let lik = values[p] / values[diag[k]];
                values[p] = lik;
                for q in diag[k] + 1..row_ptr[k + 1] {
                    let pos = iw[col_idx[q]];
                    if pos != NONE {
                        let ukj = values[q];
                        values[pos] -= lik * ukj;
                    }
                }
            }
            if values[diag[i]].abs() <= pivot_tol {
                log::warn!("ilu0: pivot {} in row {i} is below tolerance", values[diag[i]]);
                return Err(SolveError::SingularMatrix);
            }
            for p in start..end {
                iw[col_idx[p]] = NONE;
            }
        }
        log::debug!("ilu0: factorized {n}x{n} matrix with {} stored entries", values.len());

        Ok(Self {
            n,
            row_ptr,
            col_idx,
            values,
            diag,
        })
    }

    /// Number of stored entries of `L + U`
    pub fn nnz(&self) -> usize {
        self.values.len()
    }
}

impl<T: Scalar> Preconditioner<T> for Ilu0Preconditioner<T> {
    fn dim(&self) -> usize {
        self.n
    }

    fn apply(&self, r: &[T], z: &mut [T]) -> Result<()> {
        check_vec_len("Ilu0Preconditioner::apply", self.n, r.len())?;
        check_vec_len("Ilu0Preconditioner::apply", self.n, z.len())?;
        // L y = r
        for i in 0..self.n {
            let mut s = r[i];
            for p in self.row_ptr[i]..self.diag[i] {
                s -= self.values[p] * z[self.col_idx[p]];
            }
            z[i] = s;
        }
        // U z = y
        for i in (0..self.n).rev() {
            let mut s = z[i];
            for p in self.diag[i] + 1..self.row_ptr[i + 1] {
                s -= self.values[p] * z[self.col_idx[p]];
            }
            z[i] = s / self.values[self.diag[i]];
        }
        Ok(())
    }

    fn apply_transpose(&self, r: &[T], z: &mut [T]) -> Result<()> {
        check_vec_len("Ilu0Preconditioner::apply_transpose", self.n, r.len())?;
        check_vec_len("Ilu0Preconditioner::apply_transpose", self.n, z.len())?;
        z.copy_from_slice(r);
        // Uᵗ w = r, scattering each finished entry down its row of U
        for i in 0..self.n {
            z[i] /= self.values[self.diag[i]];
            let zi = z[i];
            for p in self.diag[i] + 1..self.row_ptr[i + 1] {
                z[self.col_idx[p]] -= self.values[p] * zi;
            }
        }
        // Lᵗ z = w
        for i in (0..self.n).rev() {
            let zi = z[i];
            for p in self.row_ptr[i]..self.diag[i] {
                z[self.col_idx[p]] -= self.values[p] * zi;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use structsolve_matrix::from_vec2d;

    fn tridiagonal(n: usize) -> SparseMatrix<f64> {
        let mut t = Vec::new();
        for i in 0..n {
            t.push((i, i, 4.0));
            if i > 0 {
                t.push((i, i - 1, -1.0));
            }
            if i + 1 < n {
                t.push((i, i + 1, -2.0));
            }
        }
        SparseMatrix::from_triplets(n, n, &t).unwrap()
    }

    #[test]
    fn test_identity_and_jacobi() {
        let a = tridiagonal(3);
        let mut z = [0.0; 3];
        Preconditioner::<f64>::apply(&IdentityPreconditioner::new(3), &[1.0, 2.0, 3.0], &mut z)
            .unwrap();
        assert_eq!(z, [1.0, 2.0, 3.0]);

        let jac = JacobiPreconditioner::new(&a).unwrap();
        jac.apply(&[4.0, 8.0, 2.0], &mut z).unwrap();
        assert_eq!(z, [1.0, 2.0, 0.5]);

        assert_eq!(
            JacobiPreconditioner::from_diagonal(&[1.0, 0.0]).unwrap_err(),
            SolveError::SingularMatrix
        );
    }

    #[test]
    fn test_ilu0_is_exact_without_fill() {
        // a tridiagonal LU has no fill-in, so ILU(0) is the exact inverse
        let a = tridiagonal(6);
        let m = Ilu0Preconditioner::new(&a).unwrap();
        let x: Vec<f64> = (0..6).map(|i| 1.0 + i as f64).collect();
        let b = a.matvec(&x).unwrap();

        let mut z = vec![0.0; 6];
        m.apply(&b, &mut z).unwrap();
        for (zi, xi) in z.iter().zip(&x) {
            assert_relative_eq!(zi, xi, epsilon = 1e-12);
        }

        let bt = a.transpose().matvec(&x).unwrap();
        m.apply_transpose(&bt, &mut z).unwrap();
        for (zi, xi) in z.iter().zip(&x) {
            assert_relative_eq!(zi, xi, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_ilu0_drops_fill() {
        // arrow pattern: full LU fills in (1, 2) and (2, 1), ILU(0) does not
        let dense = from_vec2d(vec![
            vec![4.0, 1.0, 1.0],
            vec![1.0, 4.0, 0.0],
            vec![1.0, 0.0, 4.0],
        ])
        .unwrap();
        let a = SparseMatrix::from_dense(&dense, 0.0);
        let m = Ilu0Preconditioner::new(&a).unwrap();
        assert_eq!(m.nnz(), a.nnz());

        // M = L U = [[4, 1, 1], [1, 4, 0.25], [1, 0.25, 4]], and M [1, 2, 3] = [9, 9.75, 13.5]
        let mut z = vec![0.0; 3];
        m.apply(&[9.0, 9.75, 13.5], &mut z).unwrap();
        for (zi, xi) in z.iter().zip(&[1.0, 2.0, 3.0]) {
            assert_relative_eq!(zi, xi, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_ilu0_structural_errors() {
        let no_diag = SparseMatrix::from_triplets(2, 2, &[(0, 1, 1.0), (1, 0, 1.0)]).unwrap();
        assert!(matches!(
            Ilu0Preconditioner::new(&no_diag),
            Err(SolveError::InvalidArgument { .. })
        ));

        let zero_pivot = SparseMatrix::from_triplets(2, 2, &[(0, 0, 0.0), (1, 1, 1.0)]).unwrap();
        assert_eq!(
            Ilu0Preconditioner::new(&zero_pivot).unwrap_err(),
            SolveError::SingularMatrix
        );
        let shifted = Ilu0Options::default().with_diagonal_shift(1.0);
        assert!(Ilu0Preconditioner::with_options(&zero_pivot, &shifted).is_ok());
    }

    #[test]
    fn test_ilu0_rejects_invalid_options() {
        let a = tridiagonal(3);
        for opts in [
            Ilu0Options::default().with_pivot_tol(-1.0),
            Ilu0Options::default().with_pivot_tol(f64::NAN),
            Ilu0Options::default().with_diagonal_shift(f64::INFINITY),
        ] {
            assert!(
                matches!(
                    Ilu0Preconditioner::with_options(&a, &opts),
                    Err(SolveError::InvalidArgument { .. })
                ),
                "{opts:?}"
            );
        }
        // a negative shift is a valid request
        let opts = Ilu0Options::default().with_diagonal_shift(-1.0);
        assert!(Ilu0Preconditioner::with_options(&a, &opts).is_ok());
    }
}
