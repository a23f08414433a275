//! Restarted GMRES with right preconditioning
//!
//! Each cycle builds an orthonormal basis of
//! `K_m = span{r, (A M⁻¹) r, ..., (A M⁻¹)^{m-1} r}` with modified Gram-Schmidt
//! and minimizes `‖b − A x‖` over `x₀ + M⁻¹ K_m`. Because the preconditioner
//! sits on the right, the Givens-rotated residual estimate is the residual of
//! the original system.

use structsolve_matrix::{axpy, dot, nrm2, Result, Scalar};

use crate::operator::LinearOperator;
use crate::options::{GmresOptions, KrylovResult, StopReason};
use crate::preconditioner::Preconditioner;
use crate::util::{finish, residual, validate_system, zero_solution, BestIterate};

/// Solve `A x = b` using restarted GMRES.
///
/// # Arguments
///
/// * `a` - The operator (only `apply` is used)
/// * `b` - Right-hand side
/// * `x0` - Initial guess (zero when `None`)
/// * `precond` - Right preconditioner `M ≈ A`
/// * `options` - Iteration cap, tolerances and restart length
///
/// # Errors
///
/// Shape mismatches, invalid tolerances and a zero restart length are
/// reported before iterating.
pub fn gmres<T, A, M>(
    a: &A,
    b: &[T],
    x0: Option<&[T]>,
    precond: &M,
    options: &GmresOptions,
) -> Result<KrylovResult<T>>
where
    T: Scalar,
    A: LinearOperator<T> + ?Sized,
    M: Preconditioner<T> + ?Sized,
{
    let system = validate_system("gmres", a, b, x0, precond, options.tolerances()?)?;
    let n = system.n;
    if system.b_norm.is_zero() {
        return Ok(zero_solution("gmres", n));
    }

    let m = options.restart.min(n).max(1);
    let mut x = x0.map_or_else(|| vec![T::zero(); n], <[T]>::to_vec);
    let mut r = vec![T::zero(); n];
    let mut w = vec![T::zero(); n];
    let mut z = vec![T::zero(); n];
    residual(a, b, &x, &mut r)?;
    let mut best = BestIterate::new(&x, nrm2(&r));

    let mut total_iters = 0;
    let mut stop = StopReason::MaxIterations;
    let mut cycle = 0;
    loop {
        let r_norm = nrm2(&r);
        best.offer(&x, r_norm);
        log::debug!(
            "gmres restart {cycle}: initial residual = {:.6e}",
            r_norm.as_f64() / system.b_norm.as_f64()
        );
        if r_norm <= system.threshold {
            stop = StopReason::Converged;
            break;
        }
        if total_iters >= options.max_iter {
            break;
        }

        // Arnoldi basis and the Givens-reduced Hessenberg columns
        let mut v_basis: Vec<Vec<T>> = Vec::with_capacity(m + 1);
        v_basis.push(r.iter().map(|&ri| ri / r_norm).collect());
        let mut h_matrix: Vec<Vec<T>> = Vec::with_capacity(m);
        let mut cs: Vec<T> = Vec::with_capacity(m);
        let mut sn: Vec<T> = Vec::with_capacity(m);
        let mut g = vec![r_norm];
        let mut cycle_converged = false;
        let mut lucky = false;

        for j in 0..m {
            if total_iters >= options.max_iter {
                break;
            }
            total_iters += 1;

            precond.apply(&v_basis[j], &mut z)?;
            a.apply(&z, &mut w)?;

            let mut h_col: Vec<T> = Vec::with_capacity(j + 2);
            for v_i in &v_basis {
                let h_ij = dot(v_i, &w);
                axpy(-h_ij, v_i, &mut w);
                h_col.push(h_ij);
            }
            let h_next = nrm2(&w);
            h_col.push(h_next);

            for i in 0..j {
                let (hi, hip1) = apply_givens_rotation(cs[i], sn[i], h_col[i], h_col[i + 1]);
                h_col[i] = hi;
                h_col[i + 1] = hip1;
            }
            let (c_j, s_j) = compute_givens_rotation(h_col[j], h_col[j + 1]);
            cs.push(c_j);
            sn.push(s_j);
            h_col[j] = c_j * h_col[j] + s_j * h_col[j + 1];
            h_col[j + 1] = T::zero();

            let (gj, gjp1) = apply_givens_rotation(c_j, s_j, g[j], T::zero());
            g[j] = gj;
            g.push(gjp1);
            h_matrix.push(h_col);

            let res_norm = gjp1.abs();
            log::trace!(
                "gmres iter {total_iters}: residual = {:.6e}",
                res_norm.as_f64() / system.b_norm.as_f64()
            );
            if res_norm <= system.threshold {
                cycle_converged = true;
                break;
            }
            if h_next.is_zero() || !h_next.is_finite() {
                // the Krylov space is invariant: the cycle's minimizer is exact
                lucky = true;
                break;
            }
            v_basis.push(w.iter().map(|&wi| wi / h_next).collect());
        }

        let k = h_matrix.len();
        if k == 0 {
            break;
        }
        let Some(y) = solve_upper_triangular(&h_matrix, &g[..k]) else {
            stop = StopReason::Breakdown;
            break;
        };
        update_solution(precond, &mut x, &v_basis[..k], &y, &mut z)?;
        residual(a, b, &x, &mut r)?;
        if (cycle_converged || lucky) && nrm2(&r) > system.threshold {
            log::debug!("gmres: cycle {cycle} estimate met the tolerance but the true residual did not");
        }
        cycle += 1;
    }

    finish("gmres", a, b, &system, best, total_iters, stop)
}

/// Rotation `(c, s)` that zeroes `b` in `(a, b)`.
fn compute_givens_rotation<T: Scalar>(a: T, b: T) -> (T, T) {
    let r = a.hypot(b);
    if r.is_zero() {
        return (T::one(), T::zero());
    }
    (a / r, b / r)
}

/// `(c x + s y, −s x + c y)`
fn apply_givens_rotation<T: Scalar>(c: T, s: T, x: T, y: T) -> (T, T) {
    (c * x + s * y, -s * x + c * y)
}

/// Back substitution on the rotated Hessenberg columns; `None` on a zero pivot.
fn solve_upper_triangular<T: Scalar>(h: &[Vec<T>], g: &[T]) -> Option<Vec<T>> {
    let n = g.len();
    let mut y = vec![T::zero(); n];
    for i in (0..n).rev() {
        let mut sum = g[i];
        for j in (i + 1)..n {
            sum -= h[j][i] * y[j];
        }
        let h_ii = h[i][i];
        if h_ii.is_zero() || !h_ii.is_finite() {
            return None;
        }
        y[i] = sum / h_ii;
    }
    Some(y)
}

/// `x += M⁻¹ (V y)`
fn update_solution<T, M>(precond: &M, x: &mut [T], v_basis: &[Vec<T>], y: &[T], work: &mut [T]) -> Result<()>
where
    T: Scalar,
    M: Preconditioner<T> + ?Sized,
{
    let mut vy = vec![T::zero(); x.len()];
    for (vi, &yi) in v_basis.iter().zip(y) {
        axpy(yi, vi, &mut vy);
    }
    precond.apply(&vy, work)?;
    axpy(T::one(), work, x);
    Ok(())
}
