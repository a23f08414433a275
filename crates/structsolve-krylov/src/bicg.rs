//! Preconditioned BiConjugate Gradient for non-symmetric systems

use structsolve_matrix::{axpy, dot, nrm2, Result, Scalar};

use crate::operator::LinearOperator;
use crate::options::{KrylovOptions, KrylovResult, StopReason};
use crate::preconditioner::Preconditioner;
use crate::util::{finish, residual, validate_system, vanishes, zero_solution, BestIterate};

/// Solve `A x = b` with preconditioned BiCG.
///
/// Runs the CG recurrences on the pair `(A, Aᵗ)` with shadow residual
/// `r̃₀ = r₀`; each iteration applies `A`, `Aᵗ`, `M⁻¹` and `M⁻ᵗ` once.
/// Residual norms are not monotone, so the best iterate is returned.
pub fn bicg<T, A, M>(
    a: &A,
    b: &[T],
    x0: Option<&[T]>,
    precond: &M,
    options: &KrylovOptions,
) -> Result<KrylovResult<T>>
where
    T: Scalar,
    A: LinearOperator<T> + ?Sized,
    M: Preconditioner<T> + ?Sized,
{
    let system = validate_system("bicg", a, b, x0, precond, options.tolerances()?)?;
    let n = system.n;
    if system.b_norm.is_zero() {
        return Ok(zero_solution("bicg", n));
    }

    let mut x = x0.map_or_else(|| vec![T::zero(); n], <[T]>::to_vec);
    let mut r = vec![T::zero(); n];
    residual(a, b, &x, &mut r)?;
    let r_norm = nrm2(&r);
    let mut best = BestIterate::new(&x, r_norm);
    if r_norm <= system.threshold {
        return finish("bicg", a, b, &system, best, 0, StopReason::Converged);
    }

    let mut r_shadow = r.clone();
    let mut z = vec![T::zero(); n];
    let mut z_shadow = vec![T::zero(); n];
    let mut p = vec![T::zero(); n];
    let mut p_shadow = vec![T::zero(); n];
    let mut q = vec![T::zero(); n];
    let mut q_shadow = vec![T::zero(); n];
    let mut rho_prev = T::one();

    let mut iterations = 0;
    let mut stop = StopReason::MaxIterations;
    while iterations < options.max_iter {
        precond.apply(&r, &mut z)?;
        precond.apply_transpose(&r_shadow, &mut z_shadow)?;
        let rho = dot(&z, &r_shadow);
        if vanishes(rho) {
            stop = StopReason::Breakdown;
            break;
        }
        iterations += 1;

        if iterations == 1 {
            p.copy_from_slice(&z);
            p_shadow.copy_from_slice(&z_shadow);
        } else {
            let beta = rho / rho_prev;
            for ((pi, pti), (&zi, &zti)) in p
                .iter_mut()
                .zip(p_shadow.iter_mut())
                .zip(z.iter().zip(&z_shadow))
            {
                *pi = zi + beta * *pi;
                *pti = zti + beta * *pti;
            }
        }

        a.apply(&p, &mut q)?;
        a.apply_transpose(&p_shadow, &mut q_shadow)?;
        let denom = dot(&p_shadow, &q);
        if vanishes(denom) {
            stop = StopReason::Breakdown;
            break;
        }
        let alpha = rho / denom;
        axpy(alpha, &p, &mut x);
        axpy(-alpha, &q, &mut r);
        axpy(-alpha, &q_shadow, &mut r_shadow);
        rho_prev = rho;

        let r_norm = nrm2(&r);
        best.offer(&x, r_norm);
        log::trace!("bicg iter {iterations}: residual = {:.6e}", r_norm.as_f64() / system.b_norm.as_f64());
        if r_norm <= system.threshold {
            stop = StopReason::Converged;
            break;
        }
    }

    finish("bicg", a, b, &system, best, iterations, stop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preconditioner::{IdentityPreconditioner, Ilu0Preconditioner};
    use structsolve_matrix::{from_vec2d, SparseMatrix};

    #[test]
    fn test_bicg_nonsymmetric() {
        let dense = from_vec2d(vec![
            vec![4.0, -1.0, 0.0, 0.5],
            vec![2.0, 5.0, -1.0, 0.0],
            vec![0.0, 1.5, 4.0, -2.0],
            vec![0.0, 0.0, 1.0, 3.0],
        ])
        .unwrap();
        let a = SparseMatrix::from_dense(&dense, 0.0);
        let x_true: [f64; 4] = [1.0, 2.0, -1.0, 0.5];
        let b = dense.matvec(&x_true).unwrap();
        let opts = KrylovOptions::default().with_rtol(1e-12);

        for res in [
            bicg(&a, &b, None, &IdentityPreconditioner::new(4), &opts).unwrap(),
            bicg(&a, &b, None, &Ilu0Preconditioner::new(&a).unwrap(), &opts).unwrap(),
        ] {
            assert!(res.converged(), "{res:?}");
            assert!(res.residual_norm <= 1e-12);
            for (xi, ti) in res.solution.iter().zip(&x_true) {
                assert!((xi - ti).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_bicg_iteration_cap() {
        let a = from_vec2d(vec![
            vec![3.0, 1.0, 0.0],
            vec![-1.0, 3.0, 1.0],
            vec![0.0, -1.0, 3.0],
        ])
        .unwrap();
        let opts = KrylovOptions::default().with_max_iter(1).with_rtol(1e-14);
        let res = bicg(&a, &[1.0, 2.0, 3.0], None, &IdentityPreconditioner::new(3), &opts).unwrap();
        assert_eq!(res.stop_reason, StopReason::MaxIterations);
        assert_eq!(res.iterations, 1);
        assert!(res.residual_norm < 1.0);
    }
}
