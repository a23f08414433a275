//! Preconditioned Conjugate Gradient for symmetric positive-definite systems

use structsolve_matrix::{axpy, dot, nrm2, Result, Scalar};

use crate::operator::LinearOperator;
use crate::options::{KrylovOptions, KrylovResult, StopReason};
use crate::preconditioner::Preconditioner;
use crate::util::{finish, residual, validate_system, vanishes, zero_solution, BestIterate};

/// Solve `A x = b` with preconditioned CG.
///
/// `A` and `M` must both be symmetric positive definite. A non-positive
/// curvature `pᵗ A p <= 0` stops the iteration with [`StopReason::Breakdown`].
///
/// # Arguments
///
/// * `a` - The operator
/// * `b` - Right-hand side
/// * `x0` - Initial guess (zero when `None`)
/// * `precond` - Preconditioner `M ≈ A`
/// * `options` - Iteration cap and tolerances
///
/// # Errors
///
/// Shape mismatches and invalid tolerances are reported before iterating.
/// Non-convergence is not an error; see [`KrylovResult::ensure_converged`].
pub fn cg<T, A, M>(
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
    let system = validate_system("cg", a, b, x0, precond, options.tolerances()?)?;
    let n = system.n;
    if system.b_norm.is_zero() {
        return Ok(zero_solution("cg", n));
    }

    let mut x = x0.map_or_else(|| vec![T::zero(); n], <[T]>::to_vec);
    let mut r = vec![T::zero(); n];
    residual(a, b, &x, &mut r)?;
    let mut best = BestIterate::new(&x, nrm2(&r));

    let mut z = vec![T::zero(); n];
    let mut q = vec![T::zero(); n];
    precond.apply(&r, &mut z)?;
    let mut p = z.clone();
    let mut rho = dot(&r, &z);

    let mut iterations = 0;
    let mut stop = StopReason::MaxIterations;
    if nrm2(&r) <= system.threshold {
        stop = StopReason::Converged;
    }
    while stop == StopReason::MaxIterations && iterations < options.max_iter {
        if vanishes(rho) {
            stop = StopReason::Breakdown;
            break;
        }
        iterations += 1;

        a.apply(&p, &mut q)?;
        let curvature = dot(&p, &q);
        if vanishes(curvature) || curvature < T::zero() {
            stop = StopReason::Breakdown;
            break;
        }
        let alpha = rho / curvature;
        axpy(alpha, &p, &mut x);
        axpy(-alpha, &q, &mut r);

        let r_norm = nrm2(&r);
        best.offer(&x, r_norm);
        log::trace!("cg iter {iterations}: residual = {:.6e}", r_norm.as_f64() / system.b_norm.as_f64());

        if r_norm <= system.threshold {
            // the recurrence may drift from the true residual
            residual(a, b, &x, &mut r)?;
            if nrm2(&r) <= system.threshold {
                stop = StopReason::Converged;
                break;
            }
            precond.apply(&r, &mut z)?;
            p.copy_from_slice(&z);
            rho = dot(&r, &z);
            continue;
        }

        precond.apply(&r, &mut z)?;
        let rho_next = dot(&r, &z);
        let beta = rho_next / rho;
        for (pi, &zi) in p.iter_mut().zip(&z) {
            *pi = zi + beta * *pi;
        }
        rho = rho_next;
    }

    if stop == StopReason::Converged {
        best = BestIterate::new(&x, T::zero());
    }
    finish("cg", a, b, &system, best, iterations, stop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preconditioner::{IdentityPreconditioner, JacobiPreconditioner};
    use approx::assert_relative_eq;
    use structsolve_matrix::scalar::tolerance;
    use structsolve_matrix::{from_vec2d, scalar_tests, SparseMatrix};

    fn spd3<T: Scalar>() -> SparseMatrix<T> {
        let t = |v: f64| T::from_f64(v);
        SparseMatrix::from_triplets(
            3,
            3,
            &[
                (0, 0, t(4.0)),
                (0, 1, t(1.0)),
                (1, 0, t(1.0)),
                (1, 1, t(3.0)),
                (1, 2, t(-1.0)),
                (2, 1, t(-1.0)),
                (2, 2, t(2.0)),
            ],
        )
        .unwrap()
    }

    fn test_cg_small_spd_generic<T: Scalar>() {
        let a = spd3::<T>();
        let x_true: Vec<T> = [1.0, -1.0, 2.0].iter().map(|&v| T::from_f64(v)).collect();
        let b = a.matvec(&x_true).unwrap();
        let opts = KrylovOptions::default().with_rtol(tolerance::<T>(1000.0));
        let res = cg(&a, &b, None, &JacobiPreconditioner::new(&a).unwrap(), &opts).unwrap();
        assert!(res.converged());
        // exact arithmetic terminates in n steps
        assert!(res.iterations <= 5);
        for (xi, ti) in res.solution.iter().zip(&x_true) {
            assert!((*xi - *ti).abs_val() < tolerance::<T>(1e5));
        }
    }

    scalar_tests!(test_cg_small_spd, test_cg_small_spd_generic);

    #[test]
    fn test_cg_zero_rhs_and_initial_guess() {
        let a = spd3::<f64>();
        let id = IdentityPreconditioner::new(3);
        let opts = KrylovOptions::default();
        let res = cg(&a, &[0.0; 3], Some(&[1.0, 2.0, 3.0][..]), &id, &opts).unwrap();
        assert_eq!(res.solution, vec![0.0; 3]);
        assert_eq!(res.iterations, 0);

        let b = a.matvec(&[1.0, 2.0, 3.0]).unwrap();
        let res = cg(&a, &b, Some(&[1.0, 2.0, 3.0][..]), &id, &opts).unwrap();
        assert!(res.converged());
        assert_eq!(res.iterations, 0);
    }

    #[test]
    fn test_cg_indefinite_breaks_down() {
        let a = from_vec2d(vec![vec![1.0, 0.0], vec![0.0, -1.0]]).unwrap();
        let res = cg(
            &a,
            &[0.0, 1.0],
            None,
            &IdentityPreconditioner::new(2),
            &KrylovOptions::default(),
        )
        .unwrap();
        assert_eq!(res.stop_reason, StopReason::Breakdown);
        assert_relative_eq!(res.residual_norm, 1.0);
    }
}
