//! Quasi-Minimal Residual method without look-ahead
//!
//! Two-sided Lanczos with a quasi-minimization of the residual, usable on
//! non-symmetric and symmetric-indefinite systems. The preconditioner is
//! applied from the left (`M⁻¹` on the Lanczos vectors, `M⁻ᵗ` on the shadow
//! vectors).

use structsolve_matrix::{dot, nrm2, Result, Scalar};

use crate::operator::LinearOperator;
use crate::options::{KrylovOptions, KrylovResult, StopReason};
use crate::preconditioner::Preconditioner;
use crate::util::{finish, residual, validate_system, vanishes, zero_solution, BestIterate};

/// Solve `A x = b` with preconditioned QMR.
///
/// A vanishing Lanczos coefficient stops the iteration with
/// [`StopReason::Breakdown`]; there is no look-ahead.
pub fn qmr<T, A, M>(
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
    let system = validate_system("qmr", a, b, x0, precond, options.tolerances()?)?;
    let n = system.n;
    if system.b_norm.is_zero() {
        return Ok(zero_solution("qmr", n));
    }

    let mut x = x0.map_or_else(|| vec![T::zero(); n], <[T]>::to_vec);
    let mut r = vec![T::zero(); n];
    residual(a, b, &x, &mut r)?;
    let r_norm = nrm2(&r);
    let mut best = BestIterate::new(&x, r_norm);
    if r_norm <= system.threshold {
        return finish("qmr", a, b, &system, best, 0, StopReason::Converged);
    }

    let zero = || vec![T::zero(); n];
    let mut v_tld = r.clone();
    let mut w_tld = r.clone();
    let mut v = zero();
    let mut w = zero();
    let mut y = zero();
    let mut z = w_tld.clone();
    let mut z_tld = zero();
    let mut p = zero();
    let mut q = zero();
    let mut p_tld = zero();
    let mut d = zero();
    let mut s = zero();

    precond.apply(&v_tld, &mut y)?;
    let mut rho = nrm2(&y);
    let mut xi = nrm2(&z);
    let mut gamma = T::one();
    let mut eta = -T::one();
    let mut theta = T::zero();
    let mut epsilon = T::one();

    let mut iterations = 0;
    let mut stop = StopReason::MaxIterations;
    while iterations < options.max_iter {
        if vanishes(rho) || vanishes(xi) {
            stop = StopReason::Breakdown;
            break;
        }
        for k in 0..n {
            v[k] = v_tld[k] / rho;
            y[k] /= rho;
            w[k] = w_tld[k] / xi;
            z[k] /= xi;
        }
        let delta = dot(&z, &y);
        if vanishes(delta) {
            stop = StopReason::Breakdown;
            break;
        }
        precond.apply_transpose(&z, &mut z_tld)?;
        iterations += 1;

        if iterations == 1 {
            p.copy_from_slice(&y);
            q.copy_from_slice(&z_tld);
        } else {
            let cp = xi * delta / epsilon;
            let cq = rho * delta / epsilon;
            for k in 0..n {
                p[k] = y[k] - cp * p[k];
                q[k] = z_tld[k] - cq * q[k];
            }
        }

        a.apply(&p, &mut p_tld)?;
        epsilon = dot(&q, &p_tld);
        if vanishes(epsilon) {
            stop = StopReason::Breakdown;
            break;
        }
        let beta = epsilon / delta;
        if vanishes(beta) {
            stop = StopReason::Breakdown;
            break;
        }

        for k in 0..n {
            v_tld[k] = p_tld[k] - beta * v[k];
        }
        precond.apply(&v_tld, &mut y)?;
        let rho_prev = rho;
        rho = nrm2(&y);

        a.apply_transpose(&q, &mut w_tld)?;
        for k in 0..n {
            w_tld[k] -= beta * w[k];
        }
        z.copy_from_slice(&w_tld);
        xi = nrm2(&z);

        let gamma_prev = gamma;
        let theta_prev = theta;
        theta = rho / (gamma_prev * beta.abs());
        gamma = T::one() / (T::one() + theta * theta).sqrt();
        if vanishes(gamma) {
            stop = StopReason::Breakdown;
            break;
        }
        eta = -eta * rho_prev * gamma * gamma / (beta * gamma_prev * gamma_prev);

        if iterations == 1 {
            for k in 0..n {
                d[k] = eta * p[k];
                s[k] = eta * p_tld[k];
            }
        } else {
            let c = (theta_prev * gamma) * (theta_prev * gamma);
            for k in 0..n {
                d[k] = eta * p[k] + c * d[k];
                s[k] = eta * p_tld[k] + c * s[k];
            }
        }
        for k in 0..n {
            x[k] += d[k];
            r[k] -= s[k];
        }

        let r_norm = nrm2(&r);
        best.offer(&x, r_norm);
        log::trace!("qmr iter {iterations}: residual = {:.6e}", r_norm.as_f64() / system.b_norm.as_f64());
        if r_norm <= system.threshold {
            stop = StopReason::Converged;
            break;
        }
    }

    finish("qmr", a, b, &system, best, iterations, stop)
}
