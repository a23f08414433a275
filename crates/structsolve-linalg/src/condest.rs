//! 1-norm condition number estimation (Hager's method, Higham's refinement)

use structsolve_matrix::{asum, iamax, Result, Scalar};

/// Maximum number of solve / transpose-solve rounds
const MAX_STEPS: usize = 5;

/// Estimate `‖A⁻¹‖₁` from solves with `A` and `Aᵗ`.
///
/// `solve` must overwrite its argument with `A⁻¹ x` and `solve_transpose`
/// with `A⁻ᵗ x`. Each step costs one of each, so the estimate is `O(n²)`
/// per step for dense factors. The result is a lower bound of the true norm
/// and is usually exact or within a small factor of it.
pub fn estimate_inverse_norm_one<T, S, ST>(
    n: usize,
    mut solve: S,
    mut solve_transpose: ST,
) -> Result<T>
where
    T: Scalar,
    S: FnMut(&mut [T]) -> Result<()>,
    ST: FnMut(&mut [T]) -> Result<()>,
{
    if n == 0 {
        return Ok(T::zero());
    }
    let nf = T::from_f64(n as f64);
    let mut x = vec![T::one() / nf; n];
    let mut est = T::zero();
    let mut last_j: Option<usize> = None;

    for step in 0..MAX_STEPS {
        let mut y = x.clone();
        solve(&mut y)?;
        let new_est = asum(&y);
        if step > 0 && new_est <= est {
            break;
        }
        est = new_est;

        let mut z: Vec<T> = y
            .iter()
            .map(|&v| if v < T::zero() { -T::one() } else { T::one() })
            .collect();
        solve_transpose(&mut z)?;
        let j = iamax(&z);
        if let Some(prev) = last_j {
            // x = e_prev, so zᵗx = z[prev]
            if z[j].abs() <= z[prev] || j == prev {
                break;
            }
        }
        log::trace!("condest step {step}: estimate {est}");
        x.fill(T::zero());
        x[j] = T::one();
        last_j = Some(j);
    }

    // Alternating-sign probe guards against the rare cases the iteration misses
    let denom = T::from_f64((n.max(2) - 1) as f64);
    let mut alt: Vec<T> = (0..n)
        .map(|i| {
            let sign = if i % 2 == 0 { T::one() } else { -T::one() };
            sign * (T::one() + T::from_f64(i as f64) / denom)
        })
        .collect();
    solve(&mut alt)?;
    let alt_est = T::from_f64(2.0) * asum(&alt) / (T::from_f64(3.0) * nf);
    Ok(est.max(alt_est))
}
