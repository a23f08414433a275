//! Symmetric eigendecomposition by cyclic Jacobi rotations

use structsolve_matrix::{Matrix, Result, Scalar, SolveError, StructuredMatrix, SymmetricMatrix};

const MAX_SWEEPS: usize = 100;

/// `A = V diag(λ) Vᵗ` for symmetric `A`.
///
/// Eigenvalues ascend; column `k` of `V` is the unit eigenvector of `λ_k`.
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetricEigen<T> {
    eigenvalues: Vec<T>,
    eigenvectors: Matrix<T>,
}

impl<T: Scalar> SymmetricEigen<T> {
    /// Diagonalize `a`
    pub fn new(a: &SymmetricMatrix<T>) -> Result<Self> {
        if a.as_packed().iter().any(|x| !x.is_finite()) {
            return Err(SolveError::NaNEncountered { stage: "eig_symmetric" });
        }
        let n = a.n();
        let mut m = a.to_dense();
        let mut v = Matrix::eye(n);
        let scale = m.norm_frobenius();
        let tol = T::epsilon() * scale;

        for sweep in 0..MAX_SWEEPS {
            let off = off_diagonal_norm(&m);
            if off <= tol {
                log::trace!("eig_symmetric: converged after {sweep} sweeps");
                break;
            }
            for p in 0..n {
                for q in p + 1..n {
                    let apq = m[[p, q]];
                    if apq.is_zero() {
                        continue;
                    }
                    let theta = (m[[q, q]] - m[[p, p]]) / (T::from_f64(2.0) * apq);
                    let sign = if theta >= T::zero() { T::one() } else { -T::one() };
                    let t = sign / (theta.abs() + (theta * theta + T::one()).sqrt());
                    let c = T::one() / (t * t + T::one()).sqrt();
                    let s = t * c;
                    rotate(&mut m, &mut v, p, q, c, s);
                }
            }
        }

        let off = off_diagonal_norm(&m);
        if off > tol {
            log::warn!(
                "eig_symmetric: off-diagonal norm {off} still above {tol} after {MAX_SWEEPS} sweeps"
            );
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            m[[a, a]]
                .partial_cmp(&m[[b, b]])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let eigenvalues = order.iter().map(|&k| m[[k, k]]).collect();
        let eigenvectors = Matrix::from_fn(n, n, |i, j| v[[i, order[j]]]);
        Ok(Self {
            eigenvalues,
            eigenvectors,
        })
    }

    /// Eigenvalues in ascending order
    pub fn eigenvalues(&self) -> &[T] {
        &self.eigenvalues
    }

    /// Orthonormal eigenvectors as columns
    pub fn eigenvectors(&self) -> &Matrix<T> {
        &self.eigenvectors
    }

    /// `V diag(λ) Vᵗ`
    pub fn reconstruct(&self) -> Result<Matrix<T>> {
        let mut vl = self.eigenvectors.clone();
        for (k, &l) in self.eigenvalues.iter().enumerate() {
            vl.col_mut(k).scale(l);
        }
        vl.matmul(&self.eigenvectors.transpose())
    }
}

fn off_diagonal_norm<T: Scalar>(m: &Matrix<T>) -> T {
    let n = m.nrows();
    let mut sum = T::zero();
    for i in 0..n {
        for j in 0..n {
            if i != j {
                sum += m[[i, j]] * m[[i, j]];
            }
        }
    }
    sum.sqrt()
}

/// `M <- Jᵗ M J`, `V <- V J` for the rotation in the `(p, q)` plane
fn rotate<T: Scalar>(m: &mut Matrix<T>, v: &mut Matrix<T>, p: usize, q: usize, c: T, s: T) {
    let n = m.nrows();
    for k in 0..n {
        let (mkp, mkq) = (m[[k, p]], m[[k, q]]);
        m[[k, p]] = c * mkp - s * mkq;
        m[[k, q]] = s * mkp + c * mkq;
    }
    for k in 0..n {
        let (mpk, mqk) = (m[[p, k]], m[[q, k]]);
        m[[p, k]] = c * mpk - s * mqk;
        m[[q, k]] = s * mpk + c * mqk;
    }
    for k in 0..n {
        let (vkp, vkq) = (v[[k, p]], v[[k, q]]);
        v[[k, p]] = c * vkp - s * vkq;
        v[[k, q]] = s * vkp + c * vkq;
    }
}

/// Eigendecomposition of a matrix tagged `Symmetric`; any other kind is rejected
pub fn eig_symmetric<T: Scalar>(a: &StructuredMatrix<T>) -> Result<SymmetricEigen<T>> {
    match a {
        StructuredMatrix::Symmetric(s) => SymmetricEigen::new(s),
        other => Err(SolveError::UnsupportedStructure {
            operation: "eig_symmetric",
            structure: other.structure(),
        }),
    }
}
