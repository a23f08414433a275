//! Global default values with atomic access.
//!
//! Tolerances that callers can override per call through option structs
//! (`Option<f64>` fields) fall back to these process-wide values.

use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Error for invalid tolerance values.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
#[error("Invalid tolerance value: {0}. Tolerances must be finite and non-negative.")]
pub struct InvalidToleranceError(pub f64);

/// A global default f64 value with atomic access.
///
/// # Example
///
/// ```
/// use structsolve_matrix::GlobalDefault;
///
/// static MY_DEFAULT: GlobalDefault = GlobalDefault::new(1e-12);
///
/// let rtol = MY_DEFAULT.get();
/// MY_DEFAULT.set(1e-10).unwrap();
/// assert_eq!(MY_DEFAULT.get(), 1e-10);
/// # let _ = rtol;
/// ```
pub struct GlobalDefault {
    value: AtomicU64,
}

impl GlobalDefault {
    /// Create a new global default with the given initial value.
    #[must_use]
    pub const fn new(initial: f64) -> Self {
        Self {
            value: AtomicU64::new(initial.to_bits()),
        }
    }

    /// Get the current default value.
    #[must_use]
    pub fn get(&self) -> f64 {
        f64::from_bits(self.value.load(Ordering::Relaxed))
    }

    /// Set a new default value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidToleranceError` if the value is not finite or is negative.
    pub fn set(&self, value: f64) -> Result<(), InvalidToleranceError> {
        validate_tolerance(value)?;
        self.value.store(value.to_bits(), Ordering::Relaxed);
        Ok(())
    }

    /// Resolve an optional per-call override against this default.
    pub fn resolve(&self, value: Option<f64>) -> Result<f64, InvalidToleranceError> {
        match value {
            Some(v) => {
                validate_tolerance(v)?;
                Ok(v)
            }
            None => Ok(self.get()),
        }
    }
}

/// Check that a tolerance is finite and non-negative.
pub fn validate_tolerance(value: f64) -> Result<(), InvalidToleranceError> {
    if !value.is_finite() || value < 0.0 {
        return Err(InvalidToleranceError(value));
    }
    Ok(())
}

/// Relative threshold (against `max |a_ij|`) below which an LU pivot counts as zero.
static DEFAULT_SINGULAR_RTOL: GlobalDefault = GlobalDefault::new(f64::EPSILON);

/// Get the global default singularity tolerance.
///
/// The default value is `f64::EPSILON`.
pub fn default_singular_rtol() -> f64 {
    DEFAULT_SINGULAR_RTOL.get()
}

/// Set the global default singularity tolerance.
///
/// # Errors
/// Returns `InvalidToleranceError` if `rtol` is not finite or is negative.
pub fn set_default_singular_rtol(rtol: f64) -> Result<(), InvalidToleranceError> {
    DEFAULT_SINGULAR_RTOL.set(rtol)
}

/// Resolve a per-call singularity tolerance against the global default.
pub fn resolve_singular_rtol(rtol: Option<f64>) -> Result<f64, InvalidToleranceError> {
    DEFAULT_SINGULAR_RTOL.resolve(rtol)
}

impl From<InvalidToleranceError> for crate::error::SolveError {
    fn from(err: InvalidToleranceError) -> Self {
        crate::error::SolveError::InvalidArgument {
            message: err.to_string(),
        }
    }
}
