//! Forward and backward substitution

use structsolve_matrix::{check_vec_len, Diag, Result, Scalar, SolveError, TriangularMatrix, Uplo};

/// Overwrite `b` with the solution of a triangular system.
///
/// `a(i, j)` is only read inside the `uplo` triangle; with `unit` the
/// diagonal is taken as one and never read. No singularity check is made.
pub(crate) fn substitute<T, F>(n: usize, a: F, uplo: Uplo, unit: bool, b: &mut [T])
where
    T: Scalar,
    F: Fn(usize, usize) -> T,
{
    match uplo {
        Uplo::Lower => {
            for i in 0..n {
                let mut s = b[i];
                for (j, &bj) in b.iter().enumerate().take(i) {
                    s -= a(i, j) * bj;
                }
                b[i] = if unit { s } else { s / a(i, i) };
            }
        }
        Uplo::Upper => {
            for i in (0..n).rev() {
                let mut s = b[i];
                for (j, &bj) in b.iter().enumerate().skip(i + 1) {
                    s -= a(i, j) * bj;
                }
                b[i] = if unit { s } else { s / a(i, i) };
            }
        }
    }
}

/// True iff a non-unit triangular matrix has an exactly zero diagonal entry
pub fn is_singular_triangular<T: Scalar>(t: &TriangularMatrix<T>) -> bool {
    t.diag() == Diag::NonUnit && t.diagonal().iter().any(|d| d.is_zero())
}

/// Product of the diagonal (one for a unit diagonal)
pub fn det_triangular<T: Scalar>(t: &TriangularMatrix<T>) -> T {
    t.diagonal().into_iter().fold(T::one(), |acc, d| acc * d)
}

/// Solve `T x = b` in place by forward or backward substitution
pub fn solve_triangular_in_place<T: Scalar>(t: &TriangularMatrix<T>, b: &mut [T]) -> Result<()> {
    check_vec_len("solve_triangular", t.n(), b.len())?;
    if is_singular_triangular(t) {
        return Err(SolveError::SingularMatrix);
    }
    substitute(t.n(), |i, j| t.at(i, j), t.uplo(), t.diag() == Diag::Unit, b);
    Ok(())
}

/// Solve `Tᵗ x = b` in place
pub fn solve_triangular_transpose_in_place<T: Scalar>(
    t: &TriangularMatrix<T>,
    b: &mut [T],
) -> Result<()> {
    check_vec_len("solve_triangular_transpose", t.n(), b.len())?;
    if is_singular_triangular(t) {
        return Err(SolveError::SingularMatrix);
    }
    let flipped = match t.uplo() {
        Uplo::Lower => Uplo::Upper,
        Uplo::Upper => Uplo::Lower,
    };
    substitute(t.n(), |i, j| t.at(j, i), flipped, t.diag() == Diag::Unit, b);
    Ok(())
}

/// Solve `T x = b`
pub fn solve_triangular<T: Scalar>(t: &TriangularMatrix<T>, b: &[T]) -> Result<Vec<T>> {
    let mut x = b.to_vec();
    solve_triangular_in_place(t, &mut x)?;
    Ok(x)
}
