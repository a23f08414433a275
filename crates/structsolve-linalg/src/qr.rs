//! Householder QR decomposition and least squares

use structsolve_matrix::{check_vec_len, Matrix, Result, Scalar, SolveError, Uplo};

use crate::substitution::substitute;

/// QR decomposition `A = Q R` of an `m x n` matrix with `m >= n`.
///
/// Reflectors are stored below the diagonal of the packed matrix with an
/// implicit leading one; `R` occupies the upper triangle.
#[derive(Debug, Clone, PartialEq)]
pub struct QrFactor<T> {
    qr: Matrix<T>,
    tau: Vec<T>,
}

impl<T: Scalar> QrFactor<T> {
    /// Householder QR of a copy of `a`
    pub fn new(a: &Matrix<T>) -> Result<Self> {
        let (m, n) = a.shape();
        if m < n {
            return Err(SolveError::InvalidArgument {
                message: format!("QR needs nrows >= ncols, got {m}x{n}"),
            });
        }
        if !a.is_finite() {
            return Err(SolveError::NaNEncountered { stage: "qr" });
        }
        let mut qr = a.clone();
        let mut tau = vec![T::zero(); n];

        for k in 0..n {
            let norm_x = (k..m)
                .map(|i| qr[[i, k]] * qr[[i, k]])
                .sum::<T>()
                .sqrt();
            if norm_x.is_zero() {
                continue;
            }
            let x0 = qr[[k, k]];
            let beta = if x0 >= T::zero() { -norm_x } else { norm_x };
            tau[k] = (beta - x0) / beta;
            let scale = T::one() / (x0 - beta);
            for i in k + 1..m {
                qr[[i, k]] *= scale;
            }
            qr[[k, k]] = beta;

            for j in k + 1..n {
                let mut w = qr[[k, j]];
                for i in k + 1..m {
                    w += qr[[i, k]] * qr[[i, j]];
                }
                w *= tau[k];
                qr[[k, j]] -= w;
                for i in k + 1..m {
                    let v = qr[[i, k]];
                    qr[[i, j]] -= w * v;
                }
            }
        }
        Ok(Self { qr, tau })
    }

    /// Number of rows
    pub fn nrows(&self) -> usize {
        self.qr.nrows()
    }

    /// Number of columns
    pub fn ncols(&self) -> usize {
        self.qr.ncols()
    }

    /// Apply `Qᵗ` to a vector of length `m`
    pub fn apply_qt(&self, b: &mut [T]) -> Result<()> {
        check_vec_len("qr apply_qt", self.nrows(), b.len())?;
        for k in 0..self.ncols() {
            self.reflect(k, b);
        }
        Ok(())
    }

    /// Apply `Q` to a vector of length `m`
    pub fn apply_q(&self, b: &mut [T]) -> Result<()> {
        check_vec_len("qr apply_q", self.nrows(), b.len())?;
        for k in (0..self.ncols()).rev() {
            self.reflect(k, b);
        }
        Ok(())
    }

    fn reflect(&self, k: usize, b: &mut [T]) {
        let m = self.nrows();
        let mut w = b[k];
        for i in k + 1..m {
            w += self.qr[[i, k]] * b[i];
        }
        w *= self.tau[k];
        b[k] -= w;
        for i in k + 1..m {
            b[i] -= w * self.qr[[i, k]];
        }
    }

    /// Full orthogonal factor (`m x m`)
    pub fn q(&self) -> Result<Matrix<T>> {
        self.q_columns(self.nrows())
    }

    /// First `n` columns of `Q` (`m x n`)
    pub fn q_thin(&self) -> Result<Matrix<T>> {
        self.q_columns(self.ncols())
    }

    fn q_columns(&self, ncols: usize) -> Result<Matrix<T>> {
        let m = self.nrows();
        let mut q = Matrix::zeros(m, ncols);
        for j in 0..ncols {
            let mut e = vec![T::zero(); m];
            e[j] = T::one();
            self.apply_q(&mut e)?;
            q.set_col(j, &e)?;
        }
        Ok(q)
    }

    /// Upper-triangular factor (`n x n`)
    pub fn r(&self) -> Matrix<T> {
        let n = self.ncols();
        Matrix::from_fn(n, n, |i, j| if i <= j { self.qr[[i, j]] } else { T::zero() })
    }

    /// True unless some `|r_kk|` is negligible relative to the largest one
    pub fn is_full_rank(&self) -> bool {
        let n = self.ncols();
        let diag: Vec<T> = (0..n).map(|k| self.qr[[k, k]].abs()).collect();
        let max = diag.iter().copied().fold(T::zero(), T::max);
        let tol = max * T::epsilon() * T::from_f64(self.nrows().max(n) as f64);
        diag.iter().all(|&d| d > tol)
    }

    /// Least-squares solution minimizing `‖A x - b‖₂`
    pub fn solve(&self, b: &[T]) -> Result<Vec<T>> {
        let n = self.ncols();
        check_vec_len("qr solve", self.nrows(), b.len())?;
        if !self.is_full_rank() {
            return Err(SolveError::SingularMatrix);
        }
        let mut y = b.to_vec();
        self.apply_qt(&mut y)?;
        y.truncate(n);
        substitute(n, |i, j| self.qr[[i, j]], Uplo::Upper, false, &mut y);
        Ok(y)
    }
}

/// Householder QR of a copy of `a`
pub fn qr<T: Scalar>(a: &Matrix<T>) -> Result<QrFactor<T>> {
    QrFactor::new(a)
}

/// Least-squares solution of an overdetermined full-rank system
pub fn lstsq<T: Scalar>(a: &Matrix<T>, b: &[T]) -> Result<Vec<T>> {
    QrFactor::new(a)?.solve(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use structsolve_matrix::from_vec2d;

    fn tall() -> Matrix<f64> {
        from_vec2d(vec![
            vec![12.0, -51.0, 4.0],
            vec![6.0, 167.0, -68.0],
            vec![-4.0, 24.0, -41.0],
            vec![1.0, 2.0, 3.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_qr_reconstruct() {
        let a = tall();
        let f = qr(&a).unwrap();
        let q = f.q_thin().unwrap();
        let r = f.r();
        assert!(q.matmul(&r).unwrap().approx_eq(&a, 1e-10));

        let qtq = q.transpose().matmul(&q).unwrap();
        assert!(qtq.approx_eq(&Matrix::eye(3), 1e-12));

        let full = f.q().unwrap();
        let i4 = full.transpose().matmul(&full).unwrap();
        assert!(i4.approx_eq(&Matrix::eye(4), 1e-12));
        assert!(f.is_full_rank());
    }

    #[test]
    fn test_lstsq_line_fit() {
        // y = 1 + 2 t sampled exactly
        let a = from_vec2d(vec![
            vec![1.0, 0.0],
            vec![1.0, 1.0],
            vec![1.0, 2.0],
            vec![1.0, 3.0],
        ])
        .unwrap();
        let x = lstsq(&a, &[1.0, 3.0, 5.0, 7.0]).unwrap();
        assert_relative_eq!(x[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rank_deficient_and_wide() {
        let a = from_vec2d(vec![vec![1.0, 2.0], vec![2.0, 4.0], vec![3.0, 6.0]]).unwrap();
        let f = qr(&a).unwrap();
        assert!(!f.is_full_rank());
        assert_eq!(f.solve(&[1.0, 2.0, 3.0]), Err(SolveError::SingularMatrix));
        // the rhs length is checked before the rank
        assert!(matches!(
            f.solve(&[1.0, 2.0]),
            Err(SolveError::ShapeMismatch { .. })
        ));

        let wide = Matrix::<f64>::zeros(2, 3);
        assert!(matches!(qr(&wide), Err(SolveError::InvalidArgument { .. })));
    }
}
