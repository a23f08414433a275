//! Solver options and outcomes

use structsolve_matrix::global_default::validate_tolerance;
use structsolve_matrix::{GlobalDefault, InvalidToleranceError, Result, SolveError};

/// Relative residual tolerance used when `KrylovOptions::rtol` is `None`.
static DEFAULT_KRYLOV_RTOL: GlobalDefault = GlobalDefault::new(1e-8);

/// Get the global default relative tolerance of the Krylov solvers.
///
/// The default value is `1e-8`.
pub fn default_krylov_rtol() -> f64 {
    DEFAULT_KRYLOV_RTOL.get()
}

/// Set the global default relative tolerance of the Krylov solvers.
///
/// # Errors
/// Returns `InvalidToleranceError` if `rtol` is not finite or is negative.
pub fn set_default_krylov_rtol(rtol: f64) -> std::result::Result<(), InvalidToleranceError> {
    DEFAULT_KRYLOV_RTOL.set(rtol)
}

/// Options shared by CG, BiCG and QMR.
///
/// The iteration stops once `‖b − A x‖ <= max(rtol ‖b‖, atol)`.
#[derive(Debug, Clone, PartialEq)]
pub struct KrylovOptions {
    /// Maximum number of iterations.
    /// Default: 1000
    pub max_iter: usize,

    /// Relative tolerance against `‖b‖`.
    /// Default: None (uses [`default_krylov_rtol`])
    pub rtol: Option<f64>,

    /// Absolute tolerance on the residual norm.
    /// Default: 0.0
    pub atol: f64,
}

impl Default for KrylovOptions {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            rtol: None,
            atol: 0.0,
        }
    }
}

impl KrylovOptions {
    /// Set the iteration cap.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the relative tolerance.
    pub fn with_rtol(mut self, rtol: f64) -> Self {
        self.rtol = Some(rtol);
        self
    }

    /// Set the absolute tolerance.
    pub fn with_atol(mut self, atol: f64) -> Self {
        self.atol = atol;
        self
    }

    /// Validated `(rtol, atol)` pair.
    pub(crate) fn tolerances(&self) -> Result<(f64, f64)> {
        let rtol = DEFAULT_KRYLOV_RTOL.resolve(self.rtol)?;
        validate_tolerance(self.atol)?;
        Ok((rtol, self.atol))
    }
}

/// Options for restarted GMRES.
#[derive(Debug, Clone, PartialEq)]
pub struct GmresOptions {
    /// Maximum number of inner iterations summed over all restart cycles.
    /// Default: 1000
    pub max_iter: usize,

    /// Relative tolerance against `‖b‖`.
    /// Default: None (uses [`default_krylov_rtol`])
    pub rtol: Option<f64>,

    /// Absolute tolerance on the residual norm.
    /// Default: 0.0
    pub atol: f64,

    /// Krylov subspace dimension per cycle.
    /// Default: 30
    pub restart: usize,
}

impl Default for GmresOptions {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            rtol: None,
            atol: 0.0,
            restart: 30,
        }
    }
}

impl From<KrylovOptions> for GmresOptions {
    fn from(options: KrylovOptions) -> Self {
        Self {
            max_iter: options.max_iter,
            rtol: options.rtol,
            atol: options.atol,
            ..Self::default()
        }
    }
}

impl GmresOptions {
    /// Set the iteration cap.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the relative tolerance.
    pub fn with_rtol(mut self, rtol: f64) -> Self {
        self.rtol = Some(rtol);
        self
    }

    /// Set the absolute tolerance.
    pub fn with_atol(mut self, atol: f64) -> Self {
        self.atol = atol;
        self
    }

    /// Set the restart length.
    pub fn with_restart(mut self, restart: usize) -> Self {
        self.restart = restart;
        self
    }

    pub(crate) fn tolerances(&self) -> Result<(f64, f64)> {
        if self.restart == 0 {
            return Err(SolveError::InvalidArgument {
                message: "GMRES restart length must be at least 1".to_string(),
            });
        }
        let rtol = DEFAULT_KRYLOV_RTOL.resolve(self.rtol)?;
        validate_tolerance(self.atol)?;
        Ok((rtol, self.atol))
    }
}

/// Why an iteration stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The residual met the tolerance.
    Converged,
    /// The iteration cap was reached first.
    MaxIterations,
    /// A recurrence coefficient vanished or became non-finite, or the
    /// recurred residual lost track of the true one.
    Breakdown,
}

/// Outcome of an iterative solve.
#[derive(Debug, Clone, PartialEq)]
pub struct KrylovResult<T> {
    /// Best iterate seen (smallest residual).
    pub solution: Vec<T>,

    /// Number of iterations performed.
    pub iterations: usize,

    /// `‖b − A x‖ / ‖b‖` of `solution`, recomputed from scratch.
    pub residual_norm: f64,

    /// Why the iteration stopped.
    pub stop_reason: StopReason,
}

impl<T> KrylovResult<T> {
    /// Whether the tolerance was met.
    pub fn converged(&self) -> bool {
        self.stop_reason == StopReason::Converged
    }

    /// Turn a non-converged outcome into `ConvergenceFailure`.
    pub fn ensure_converged(self) -> Result<Self> {
        if self.converged() {
            Ok(self)
        } else {
            Err(SolveError::ConvergenceFailure {
                iterations: self.iterations,
                residual_norm: self.residual_norm,
            })
        }
    }
}
