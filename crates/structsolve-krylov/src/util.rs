//! Bookkeeping shared by the solvers

use structsolve_matrix::{check_vec_len, nrm2, Result, Scalar, SolveError};

use crate::operator::LinearOperator;
use crate::options::{KrylovResult, StopReason};
use crate::preconditioner::Preconditioner;

/// Validated problem data common to every solver.
pub(crate) struct System<T> {
    pub n: usize,
    pub b_norm: T,
    /// `max(rtol ‖b‖, atol)`
    pub threshold: T,
}

/// Check shapes before any arithmetic.
pub(crate) fn validate_system<T, A, M>(
    operation: &'static str,
    a: &A,
    b: &[T],
    x0: Option<&[T]>,
    precond: &M,
    (rtol, atol): (f64, f64),
) -> Result<System<T>>
where
    T: Scalar,
    A: LinearOperator<T> + ?Sized,
    M: Preconditioner<T> + ?Sized,
{
    let n = a.nrows();
    if n != a.ncols() {
        return Err(SolveError::not_square(operation, n, a.ncols()));
    }
    check_vec_len(operation, n, b.len())?;
    if let Some(x0) = x0 {
        check_vec_len(operation, n, x0.len())?;
    }
    if precond.dim() != n {
        return Err(SolveError::ShapeMismatch {
            operation,
            expected: (n, n),
            actual: (precond.dim(), precond.dim()),
        });
    }
    if b.iter().chain(x0.unwrap_or_default()).any(|v| !v.is_finite()) {
        return Err(SolveError::NaNEncountered { stage: operation });
    }

    let b_norm = nrm2(b);
    let threshold = T::from_f64((rtol * b_norm.as_f64()).max(atol));
    Ok(System {
        n,
        b_norm,
        threshold,
    })
}

/// `r = b − A x`
pub(crate) fn residual<T, A>(a: &A, b: &[T], x: &[T], r: &mut [T]) -> Result<()>
where
    T: Scalar,
    A: LinearOperator<T> + ?Sized,
{
    a.apply(x, r)?;
    for (ri, &bi) in r.iter_mut().zip(b) {
        *ri = bi - *ri;
    }
    Ok(())
}

/// Iterate with the smallest residual estimate seen so far.
pub(crate) struct BestIterate<T> {
    x: Vec<T>,
    norm: T,
}

impl<T: Scalar> BestIterate<T> {
    pub fn new(x: &[T], norm: T) -> Self {
        Self {
            x: x.to_vec(),
            norm,
        }
    }

    pub fn offer(&mut self, x: &[T], norm: T) {
        if norm < self.norm {
            self.x.copy_from_slice(x);
            self.norm = norm;
        }
    }
}

/// Result for `b = 0`: the exact solution is zero.
pub(crate) fn zero_solution<T: Scalar>(operation: &str, n: usize) -> KrylovResult<T> {
    log::debug!("{operation}: zero right-hand side");
    KrylovResult {
        solution: vec![T::zero(); n],
        iterations: 0,
        residual_norm: 0.0,
        stop_reason: StopReason::Converged,
    }
}

/// Recompute the true residual of the best iterate and build the outcome.
///
/// A stop for any reason is reported as `Converged` when the true residual
/// meets the threshold, and a claimed convergence it misses is a `Breakdown`.
pub(crate) fn finish<T, A>(
    operation: &str,
    a: &A,
    b: &[T],
    system: &System<T>,
    best: BestIterate<T>,
    iterations: usize,
    stop_reason: StopReason,
) -> Result<KrylovResult<T>>
where
    T: Scalar,
    A: LinearOperator<T> + ?Sized,
{
    let mut r = vec![T::zero(); system.n];
    residual(a, b, &best.x, &mut r)?;
    let r_norm = nrm2(&r);
    let stop_reason = if r_norm <= system.threshold {
        StopReason::Converged
    } else if stop_reason == StopReason::Converged {
        log::warn!("{operation}: recurred residual drifted away from the true residual");
        StopReason::Breakdown
    } else {
        stop_reason
    };
    let residual_norm = r_norm.as_f64() / system.b_norm.as_f64();

    match stop_reason {
        StopReason::Converged => {
            log::debug!("{operation}: converged after {iterations} iterations, residual {residual_norm:e}")
        }
        StopReason::MaxIterations => {
            log::debug!("{operation}: stopped at the iteration cap {iterations}, residual {residual_norm:e}")
        }
        StopReason::Breakdown => {
            log::warn!("{operation}: breakdown after {iterations} iterations, residual {residual_norm:e}")
        }
    }

    Ok(KrylovResult {
        solution: best.x,
        iterations,
        residual_norm,
        stop_reason,
    })
}

/// `true` when `v` is zero or not finite, i.e. unusable as a divisor.
pub(crate) fn vanishes<T: Scalar>(v: T) -> bool {
    v.is_zero() || !v.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preconditioner::IdentityPreconditioner;
    use structsolve_matrix::Matrix;

    #[test]
    fn test_validate_system_shapes() {
        let a = Matrix::<f64>::eye(3);
        let tol = (1e-8, 0.0);
        let id = IdentityPreconditioner::new(3);
        assert!(validate_system("t", &a, &[1.0; 3], None, &id, tol).is_ok());
        assert!(validate_system("t", &a, &[1.0; 2], None, &id, tol).is_err());
        assert!(validate_system("t", &a, &[1.0; 3], Some(&[0.0; 4][..]), &id, tol).is_err());
        assert!(validate_system("t", &a, &[1.0; 3], None, &IdentityPreconditioner::new(2), tol).is_err());
        assert!(validate_system("t", &Matrix::<f64>::zeros(3, 2), &[1.0; 3], None, &id, tol).is_err());
    }

    #[test]
    fn test_threshold_uses_larger_tolerance() {
        let a = Matrix::<f64>::eye(2);
        let id = IdentityPreconditioner::new(2);
        let s = validate_system("t", &a, &[3.0, 4.0], None, &id, (0.5, 0.0)).unwrap();
        assert_eq!(s.b_norm, 5.0);
        assert_eq!(s.threshold, 2.5);
        let s = validate_system("t", &a, &[3.0, 4.0], None, &id, (0.5, 4.0)).unwrap();
        assert_eq!(s.threshold, 4.0);
    }

    #[test]
    fn test_best_iterate_keeps_minimum() {
        let mut best = BestIterate::new(&[0.0, 0.0], 1.0);
        best.offer(&[1.0, 1.0], 0.5);
        best.offer(&[2.0, 2.0], 0.7);
        assert_eq!(best.x, vec![1.0, 1.0]);
        assert_eq!(best.norm, 0.5);
    }
}
