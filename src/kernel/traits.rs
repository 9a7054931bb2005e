//! Kernel trait definition and shared vector helpers

use crate::core::{Result, SVMError, SymmetricMatrix};

/// Magnitude below which a scale parameter is rejected
pub const MIN_SCALE: f64 = 1e-25;

/// Differentiable kernel function trait
///
/// Derivatives are taken with respect to the first argument. All methods
/// expect both points to have the same, positive dimension; callers check
/// dimensions before evaluating.
pub trait Kernel: Send + Sync {
    /// Short human-readable name
    fn name(&self) -> &'static str;

    /// Kernel value K(x1, x2)
    fn value(&self, x1: &[f64], x2: &[f64]) -> f64;

    /// Gradient of K with respect to x1
    fn gradient(&self, x1: &[f64], x2: &[f64]) -> Vec<f64>;

    /// Hessian of K with respect to x1
    fn hessian(&self, x1: &[f64], x2: &[f64]) -> SymmetricMatrix;

    /// Current parameter vector, in the order of `parameter_description`
    fn parameter(&self) -> Vec<f64>;

    /// Replace the parameter vector
    ///
    /// Fails with `InvalidParameter` when the length differs from the
    /// declared count or a value is out of range.
    fn set_parameter(&mut self, parameter: &[f64]) -> Result<()>;

    /// Names of the parameters, one per entry of `parameter`
    fn parameter_description(&self) -> Vec<&'static str>;
}

pub(crate) fn check_parameter_count(kernel: &str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(SVMError::InvalidParameter(format!(
            "{kernel} kernel expects {expected} parameter(s), got {actual}"
        )))
    }
}

pub(crate) fn check_scale(kernel: &str, name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value.abs() >= MIN_SCALE {
        Ok(())
    } else {
        Err(SVMError::InvalidParameter(format!(
            "{kernel} kernel {name} must have magnitude at least {MIN_SCALE}, got {value}"
        )))
    }
}

pub(crate) fn dot(x: &[f64], y: &[f64]) -> f64 {
    x.iter().zip(y).map(|(a, b)| a * b).sum()
}

pub(crate) fn difference(x: &[f64], y: &[f64]) -> Vec<f64> {
    x.iter().zip(y).map(|(a, b)| a - b).collect()
}

/// Outer product `factor * u u^T` plus `diagonal` on the diagonal
pub(crate) fn scaled_outer(u: &[f64], factor: f64, diagonal: f64) -> SymmetricMatrix {
    let mut hessian = SymmetricMatrix::zeros(u.len());
    for i in 0..u.len() {
        for j in 0..=i {
            let mut value = factor * u[i] * u[j];
            if i == j {
                value += diagonal;
            }
            hessian.set(i, j, value);
        }
    }
    hessian
}
