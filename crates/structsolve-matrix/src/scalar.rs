//! Real scalar trait shared by every structsolve crate.
//!
//! Factorizations and iterative solvers are written once against [`Scalar`]
//! and instantiated for `f32` and `f64`.

use num_traits::{Float, NumAssign};
use std::fmt::{Debug, Display};
use std::iter::Sum;

/// Real scalar type for matrix storage, factorizations and solvers.
///
/// Everything the algorithms need (zero, one, field arithmetic, ordering,
/// `sqrt`, `abs`, `epsilon`) comes from [`num_traits::Float`]; this trait only
/// adds lossless conversions to and from `f64` for tolerances and norms.
pub trait Scalar:
    Float + NumAssign + Sum + Default + Debug + Display + Send + Sync + 'static
{
    /// Create from f64 value.
    fn from_f64(val: f64) -> Self;

    /// Convert to f64.
    fn as_f64(self) -> f64;

    /// Absolute value as f64.
    fn abs_val(self) -> f64 {
        self.as_f64().abs()
    }
}

impl Scalar for f64 {
    #[inline]
    fn from_f64(val: f64) -> Self {
        val
    }

    #[inline]
    fn as_f64(self) -> f64 {
        self
    }
}

impl Scalar for f32 {
    #[inline]
    fn from_f64(val: f64) -> Self {
        val as f32
    }

    #[inline]
    fn as_f64(self) -> f64 {
        self as f64
    }
}

/// Macro to generate f64 and f32 test variants from a generic test function.
///
/// # Example
///
/// ```ignore
/// fn test_operation_generic<T: Scalar>() {
///     // test implementation
/// }
///
/// structsolve_matrix::scalar_tests!(test_operation, test_operation_generic);
/// // Generates:
/// // #[test] fn test_operation_f64() { test_operation_generic::<f64>(); }
/// // #[test] fn test_operation_f32() { test_operation_generic::<f32>(); }
/// ```
#[macro_export]
macro_rules! scalar_tests {
    ($name:ident, $test_fn:ident) => {
        paste::paste! {
            #[test]
            fn [<$name _f64>]() {
                $test_fn::<f64>();
            }

            #[test]
            fn [<$name _f32>]() {
                $test_fn::<f32>();
            }
        }
    };
}

/// Tolerance suited to the precision of `T`, scaled by `factor` ulps.
pub fn tolerance<T: Scalar>(factor: f64) -> f64 {
    T::epsilon().as_f64() * factor
}
