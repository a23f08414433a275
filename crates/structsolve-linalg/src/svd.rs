//! Singular value decomposition by one-sided Jacobi rotations

use structsolve_matrix::{check_vec_len, Matrix, Result, Scalar, SolveError};

const MAX_SWEEPS: usize = 60;

/// Thin SVD `A = U diag(s) Vᵗ` with `k = min(m, n)` singular values.
#[derive(Debug, Clone, PartialEq)]
pub struct Svd<T> {
    u: Matrix<T>,
    s: Vec<T>,
    vt: Matrix<T>,
}

impl<T: Scalar> Svd<T> {
    /// Decompose a copy of `a`
    pub fn new(a: &Matrix<T>) -> Result<Self> {
        if !a.is_finite() {
            return Err(SolveError::NaNEncountered { stage: "svd" });
        }
        if a.nrows() >= a.ncols() {
            let (u, s, v) = one_sided_jacobi(a.clone());
            Ok(Self {
                u,
                s,
                vt: v.transpose(),
            })
        } else {
            // Aᵗ = U' S V'ᵗ  =>  A = V' S U'ᵗ
            let (u, s, v) = one_sided_jacobi(a.transpose());
            Ok(Self {
                u: v,
                s,
                vt: u.transpose(),
            })
        }
    }

    /// Singular values in descending order
    pub fn singular_values(&self) -> &[T] {
        &self.s
    }

    /// Left singular vectors (`m x k`)
    pub fn u(&self) -> &Matrix<T> {
        &self.u
    }

    /// Transposed right singular vectors (`k x n`)
    pub fn vt(&self) -> &Matrix<T> {
        &self.vt
    }

    fn cutoff(&self, rtol: Option<f64>) -> T {
        let smax = self.s.first().copied().unwrap_or_else(T::zero);
        let rtol = match rtol {
            Some(r) => T::from_f64(r),
            None => T::epsilon() * T::from_f64(self.u.nrows().max(self.vt.ncols()) as f64),
        };
        smax * rtol
    }

    /// Number of singular values above `rtol * s_max`.
    ///
    /// Without `rtol` the threshold is `eps * max(m, n) * s_max`.
    pub fn rank(&self, rtol: Option<f64>) -> usize {
        let cut = self.cutoff(rtol);
        self.s.iter().filter(|&&s| s > cut).count()
    }

    /// Exact 2-norm condition number `s_max / s_min` (infinite when rank deficient)
    pub fn condition_number(&self) -> T {
        match (self.s.first(), self.s.last()) {
            (Some(&max), Some(&min)) if self.rank(None) == self.s.len() => max / min,
            (Some(_), Some(_)) => T::infinity(),
            _ => T::zero(),
        }
    }

    /// Moore-Penrose pseudo-inverse (`n x m`), dropping singular values at or below the cutoff
    pub fn pseudo_inverse(&self, rtol: Option<f64>) -> Matrix<T> {
        let cut = self.cutoff(rtol);
        let (m, n) = (self.u.nrows(), self.vt.ncols());
        let mut pinv = Matrix::zeros(n, m);
        for (k, &s) in self.s.iter().enumerate() {
            if s <= cut {
                continue;
            }
            let inv = T::one() / s;
            for i in 0..n {
                let v = self.vt[[k, i]] * inv;
                for j in 0..m {
                    pinv[[i, j]] += v * self.u[[j, k]];
                }
            }
        }
        pinv
    }

    /// Minimum-norm least-squares solution of `A x = b`
    pub fn solve(&self, b: &[T]) -> Result<Vec<T>> {
        check_vec_len("svd solve", self.u.nrows(), b.len())?;
        self.pseudo_inverse(None).matvec(b)
    }

    /// `U diag(s) Vᵗ`
    pub fn reconstruct(&self) -> Result<Matrix<T>> {
        let mut us = self.u.clone();
        for (k, &s) in self.s.iter().enumerate() {
            us.col_mut(k).scale(s);
        }
        us.matmul(&self.vt)
    }
}

/// Orthogonalize the columns of a tall matrix; returns `(U, s, V)` sorted by `s` descending.
fn one_sided_jacobi<T: Scalar>(mut u: Matrix<T>) -> (Matrix<T>, Vec<T>, Matrix<T>) {
    let (m, n) = u.shape();
    let mut v = Matrix::eye(n);
    let eps = T::epsilon();

    let mut converged = false;
    for sweep in 0..MAX_SWEEPS {
        let mut rotated = false;
        for p in 0..n {
            for q in p + 1..n {
                let (mut alpha, mut beta, mut gamma) = (T::zero(), T::zero(), T::zero());
                for i in 0..m {
                    let (up, uq) = (u[[i, p]], u[[i, q]]);
                    alpha += up * up;
                    beta += uq * uq;
                    gamma += up * uq;
                }
                if gamma.is_zero() || gamma.abs() <= eps * (alpha * beta).sqrt() {
                    continue;
                }
                rotated = true;
                let zeta = (beta - alpha) / (T::from_f64(2.0) * gamma);
                let sign = if zeta >= T::zero() { T::one() } else { -T::one() };
                let t = sign / (zeta.abs() + (T::one() + zeta * zeta).sqrt());
                let c = T::one() / (T::one() + t * t).sqrt();
                let s = c * t;
                rotate_columns(&mut u, p, q, c, s);
                rotate_columns(&mut v, p, q, c, s);
            }
        }
        if !rotated {
            log::trace!("svd: converged after {sweep} sweeps");
            converged = true;
            break;
        }
    }
    if !converged {
        log::warn!("svd: columns not orthogonal after {MAX_SWEEPS} Jacobi sweeps");
    }

    let mut s: Vec<T> = (0..n).map(|j| u.col(j).norm()).collect();
    for (j, &sj) in s.iter().enumerate() {
        if !sj.is_zero() {
            u.col_mut(j).scale(T::one() / sj);
        }
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| s[b].partial_cmp(&s[a]).unwrap_or(std::cmp::Ordering::Equal));
    let u_sorted = Matrix::from_fn(m, n, |i, j| u[[i, order[j]]]);
    let v_sorted = Matrix::from_fn(n, n, |i, j| v[[i, order[j]]]);
    s = order.iter().map(|&j| s[j]).collect();
    (u_sorted, s, v_sorted)
}

fn rotate_columns<T: Scalar>(a: &mut Matrix<T>, p: usize, q: usize, c: T, s: T) {
    for i in 0..a.nrows() {
        let (ap, aq) = (a[[i, p]], a[[i, q]]);
        a[[i, p]] = c * ap - s * aq;
        a[[i, q]] = s * ap + c * aq;
    }
}

/// Thin SVD of a copy of `a`
pub fn svd<T: Scalar>(a: &Matrix<T>) -> Result<Svd<T>> {
    Svd::new(a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use structsolve_matrix::from_vec2d;

    #[test]
    fn test_svd_diagonal_sorted() {
        let a = from_vec2d(vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 3.0, 0.0],
            vec![0.0, 0.0, 2.0],
        ])
        .unwrap();
        let f = svd(&a).unwrap();
        assert_eq!(f.singular_values(), &[3.0, 2.0, 1.0]);
        assert_relative_eq!(f.condition_number(), 3.0);
        assert!(f.reconstruct().unwrap().approx_eq(&a, 1e-14));
    }

    #[test]
    fn test_svd_reconstruct_tall_and_wide() {
        let tall = from_vec2d(vec![
            vec![1.0, 2.0],
            vec![3.0, 4.0],
            vec![5.0, 6.0],
        ])
        .unwrap();
        for a in [tall.clone(), tall.transpose()] {
            let f = svd(&a).unwrap();
            assert_eq!(f.singular_values().len(), 2);
            assert!(f.reconstruct().unwrap().approx_eq(&a, 1e-12));
            let utu = f.u().transpose().matmul(f.u()).unwrap();
            assert!(utu.approx_eq(&Matrix::eye(2), 1e-12));
            assert_eq!(f.rank(None), 2);
        }
    }

    #[test]
    fn test_rank_and_pseudo_inverse() {
        let a = from_vec2d(vec![vec![1.0, 2.0], vec![2.0, 4.0]]).unwrap();
        let f = svd(&a).unwrap();
        assert_eq!(f.rank(None), 1);
        assert_eq!(f.condition_number(), f64::INFINITY);

        // A A⁺ A = A
        let pinv = f.pseudo_inverse(None);
        let back = a.matmul(&pinv).unwrap().matmul(&a).unwrap();
        assert!(back.approx_eq(&a, 1e-12));

        // minimum-norm solution of a consistent system lies in the row space
        let x = f.solve(&[1.0, 2.0]).unwrap();
        assert_relative_eq!(x[0], 0.2, epsilon = 1e-12);
        assert_relative_eq!(x[1], 0.4, epsilon = 1e-12);
    }
}
