//! LU decomposition with partial row pivoting

use structsolve_matrix::{
    check_vec_len, resolve_singular_rtol, Matrix, Result, Scalar, SolveError, Uplo,
};

use crate::substitution::substitute;

/// LU decomposition `P A = L U` of a square matrix.
///
/// `L` (unit lower, diagonal not stored) and `U` (upper) share one packed
/// dense matrix. Row `i` of `P A` is row `perm[i]` of `A`.
#[derive(Debug, Clone, PartialEq)]
pub struct LuFactor<T> {
    /// Packed factors
    lu: Matrix<T>,
    /// Row permutation
    perm: Vec<usize>,
    /// Number of row interchanges performed
    n_swaps: usize,
    /// Largest absolute entry of the source matrix
    max_abs: T,
    /// 1-norm of the source matrix
    norm_one: T,
    /// Relative pivot threshold for singularity
    singular_rtol: f64,
}

impl<T: Scalar> LuFactor<T> {
    /// Factorize a copy of `a`
    pub fn new(a: &Matrix<T>, singular_rtol: Option<f64>) -> Result<Self> {
        Self::from_owned(a.clone(), singular_rtol)
    }

    /// Factorize `a`, reusing its storage for the packed factors
    pub fn from_owned(mut a: Matrix<T>, singular_rtol: Option<f64>) -> Result<Self> {
        let singular_rtol = resolve_singular_rtol(singular_rtol)?;
        if !a.is_square() {
            return Err(SolveError::not_square("lu", a.nrows(), a.ncols()));
        }
        let max_abs = a.max_abs();
        let norm_one = a.norm_one();
        let (perm, n_swaps) = factor_dense(&mut a)?;
        Ok(Self {
            lu: a,
            perm,
            n_swaps,
            max_abs,
            norm_one,
            singular_rtol,
        })
    }

    /// Dimension of the factorized matrix
    pub fn n(&self) -> usize {
        self.lu.nrows()
    }

    /// Row permutation (`(P A)[i] = A[perm[i]]`)
    pub fn perm(&self) -> &[usize] {
        &self.perm
    }

    /// Packed `L \ U` storage
    pub fn packed(&self) -> &Matrix<T> {
        &self.lu
    }

    /// Unit lower-triangular factor
    pub fn l(&self) -> Matrix<T> {
        Matrix::from_fn(self.n(), self.n(), |i, j| {
            if i == j {
                T::one()
            } else if i > j {
                self.lu[[i, j]]
            } else {
                T::zero()
            }
        })
    }

    /// Upper-triangular factor
    pub fn u(&self) -> Matrix<T> {
        self.lu.upper_triangle()
    }

    /// Permutation matrix `P`
    pub fn p(&self) -> Matrix<T> {
        let mut p = Matrix::zeros(self.n(), self.n());
        for (i, &pi) in self.perm.iter().enumerate() {
            p[[i, pi]] = T::one();
        }
        p
    }

    /// Diagonal of `U`
    pub fn pivots(&self) -> Vec<T> {
        (0..self.n()).map(|i| self.lu[[i, i]]).collect()
    }

    /// Sign of the permutation, `±1`
    pub fn sign(&self) -> T {
        if self.n_swaps % 2 == 0 {
            T::one()
        } else {
            -T::one()
        }
    }

    /// 1-norm of the factorized matrix
    pub fn norm_one(&self) -> T {
        self.norm_one
    }

    /// True iff some `|u_ii| <= rtol * max |a_ij|`
    pub fn is_singular(&self) -> bool {
        let threshold = self.max_abs.as_f64() * self.singular_rtol;
        self.pivots()
            .iter()
            .any(|u| u.is_zero() || u.abs_val() <= threshold)
    }

    /// `sign(P) * prod(u_ii)`
    pub fn determinant(&self) -> T {
        self.pivots()
            .into_iter()
            .fold(self.sign(), |acc, u| acc * u)
    }

    /// Solve `A x = b` in place
    pub fn solve_in_place(&self, b: &mut [T]) -> Result<()> {
        check_vec_len("lu solve", self.n(), b.len())?;
        if self.is_singular() {
            return Err(SolveError::SingularMatrix);
        }
        let n = self.n();
        let permuted: Vec<T> = self.perm.iter().map(|&p| b[p]).collect();
        b.copy_from_slice(&permuted);
        substitute(n, |i, j| self.lu[[i, j]], Uplo::Lower, true, b);
        substitute(n, |i, j| self.lu[[i, j]], Uplo::Upper, false, b);
        Ok(())
    }

    /// Solve `Aᵗ x = b` in place
    pub fn solve_transpose_in_place(&self, b: &mut [T]) -> Result<()> {
        check_vec_len("lu transpose solve", self.n(), b.len())?;
        if self.is_singular() {
            return Err(SolveError::SingularMatrix);
        }
        let n = self.n();
        // Uᵗ z = b, Lᵗ w = z, x = Pᵗ w
        substitute(n, |i, j| self.lu[[j, i]], Uplo::Lower, false, b);
        substitute(n, |i, j| self.lu[[j, i]], Uplo::Upper, true, b);
        let mut x = vec![T::zero(); n];
        for (i, &p) in self.perm.iter().enumerate() {
            x[p] = b[i];
        }
        b.copy_from_slice(&x);
        Ok(())
    }

    /// Solve `A x = b`
    pub fn solve(&self, b: &[T]) -> Result<Vec<T>> {
        let mut x = b.to_vec();
        self.solve_in_place(&mut x)?;
        Ok(x)
    }

    /// `Pᵗ L U`, which reproduces the source matrix up to rounding
    pub fn reconstruct(&self) -> Result<Matrix<T>> {
        self.p().transpose().matmul(&self.l().matmul(&self.u())?)
    }
}

/// Eliminate in place; returns the row permutation and the swap count.
fn factor_dense<T: Scalar>(a: &mut Matrix<T>) -> Result<(Vec<usize>, usize)> {
    if !a.is_finite() {
        return Err(SolveError::NaNEncountered { stage: "lu" });
    }
    let n = a.nrows();
    let mut perm: Vec<usize> = (0..n).collect();
    let mut n_swaps = 0;
    log::debug!("lu: factorizing {n}x{n} matrix");

    for k in 0..n {
        let p = (k..n)
            .max_by(|&x, &y| {
                a[[x, k]]
                    .abs()
                    .partial_cmp(&a[[y, k]].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
                    // prefer the earlier row on ties
                    .then(y.cmp(&x))
            })
            .unwrap_or(k);
        if p != k {
            a.swap_rows(p, k);
            perm.swap(p, k);
            n_swaps += 1;
        }

        let pivot = a[[k, k]];
        if pivot.is_zero() {
            log::debug!("lu: zero pivot in column {k}");
            continue;
        }

        let data = a.as_mut_slice();
        let (top, bottom) = data.split_at_mut((k + 1) * n);
        let pivot_row = &top[k * n..];
        for row in bottom.chunks_exact_mut(n) {
            let l = row[k] / pivot;
            row[k] = l;
            if l.is_zero() {
                continue;
            }
            for (rj, &uj) in row[k + 1..].iter_mut().zip(&pivot_row[k + 1..]) {
                *rj -= l * uj;
            }
        }
    }
    Ok((perm, n_swaps))
}

/// Overwrite a square matrix with its packed `L \ U` factors.
///
/// Returns the row permutation. The caller's matrix must not be used as the
/// original data afterwards.
pub fn lu_in_place<T: Scalar>(a: &mut Matrix<T>) -> Result<Vec<usize>> {
    if !a.is_square() {
        return Err(SolveError::not_square("lu_in_place", a.nrows(), a.ncols()));
    }
    let (perm, _) = factor_dense(a)?;
    Ok(perm)
}

/// LU decomposition of a copy of `a` with the default singularity threshold
pub fn lu<T: Scalar>(a: &Matrix<T>) -> Result<LuFactor<T>> {
    LuFactor::new(a, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use structsolve_matrix::{from_vec2d, scalar_tests};

    #[test]
    fn test_lu_permutation_swap() {
        let a = from_vec2d(vec![vec![0.0, 1.0], vec![1.0, 0.0]]).unwrap();
        let f = lu(&a).unwrap();
        assert_eq!(f.perm(), &[1, 0]);
        assert_eq!(f.u(), Matrix::eye(2));
        assert_eq!(f.determinant(), -1.0);
        assert!(!f.is_singular());
    }

    #[test]
    fn test_lu_reconstruct() {
        let a: Matrix<f64> = from_vec2d(vec![
            vec![2.0, 1.0, 1.0],
            vec![4.0, -6.0, 0.0],
            vec![-2.0, 7.0, 2.0],
        ])
        .unwrap();
        let f = lu(&a).unwrap();
        assert!(f.reconstruct().unwrap().approx_eq(&a, 1e-12));
        // L is unit lower with bounded multipliers
        let l = f.l();
        for i in 0..3 {
            assert_eq!(l[[i, i]], 1.0);
            for j in 0..i {
                assert!(l[[i, j]].abs() <= 1.0);
            }
        }
        assert_relative_eq!(f.determinant(), -16.0, epsilon = 1e-12);
    }

    #[test]
    fn test_lu_singular() {
        let a = from_vec2d(vec![vec![1.0, 2.0], vec![2.0, 4.0]]).unwrap();
        let f = lu(&a).unwrap();
        assert!(f.is_singular());
        assert_eq!(f.determinant(), 0.0);
        assert_eq!(f.solve(&[1.0, 1.0]), Err(SolveError::SingularMatrix));
    }

    #[test]
    fn test_lu_rejects_non_square_and_nan() {
        let a = Matrix::<f64>::zeros(2, 3);
        assert!(matches!(lu(&a), Err(SolveError::ShapeMismatch { .. })));

        let b = from_vec2d(vec![vec![1.0, f64::NAN], vec![0.0, 1.0]]).unwrap();
        assert_eq!(
            lu(&b).unwrap_err(),
            SolveError::NaNEncountered { stage: "lu" }
        );
    }

    #[test]
    fn test_lu_in_place_overwrites() {
        let mut a = from_vec2d(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let perm = lu_in_place(&mut a).unwrap();
        assert_eq!(perm, vec![1, 0]);
        // U row 0 is the pivot row [3, 4]; multiplier 1/3 sits below it
        assert_eq!(a[[0, 0]], 3.0);
        assert_eq!(a[[0, 1]], 4.0);
        assert_relative_eq!(a[[1, 0]], 1.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(a[[1, 1]], 2.0 - 4.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_singular_rtol_override() {
        let a = from_vec2d(vec![vec![1.0, 0.0], vec![0.0, 1e-6]]).unwrap();
        assert!(!LuFactor::new(&a, None).unwrap().is_singular());
        assert!(LuFactor::new(&a, Some(1e-3)).unwrap().is_singular());
        assert!(matches!(
            LuFactor::new(&a, Some(-1.0)),
            Err(SolveError::InvalidArgument { .. })
        ));
    }

    fn test_lu_solve_both_sides_generic<T: Scalar>() {
        let a = Matrix::from_fn(5, 5, |i, j| {
            T::from_f64(if i == j { 6.0 } else { 1.0 / (1.0 + i as f64 + 2.0 * j as f64) })
        });
        let b: Vec<T> = (0..5).map(|i| T::from_f64(1.0 + i as f64)).collect();
        let f = lu(&a).unwrap();
        let tol = T::from_f64(structsolve_matrix::scalar::tolerance::<T>(200.0));

        let x = f.solve(&b).unwrap();
        let ax = a.matvec(&x).unwrap();
        for (l, r) in ax.iter().zip(b.iter()) {
            assert!((*l - *r).abs() <= tol);
        }

        let mut y = b.clone();
        f.solve_transpose_in_place(&mut y).unwrap();
        let aty = a.transpose().matvec(&y).unwrap();
        for (l, r) in aty.iter().zip(b.iter()) {
            assert!((*l - *r).abs() <= tol);
        }
    }

    scalar_tests!(test_lu_solve_both_sides, test_lu_solve_both_sides_generic);
}
