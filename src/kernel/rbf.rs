//! Normal RBF (Gaussian) kernel implementation
//!
//! The kernel is defined as: K(x, y) = exp(-||x - y||² / (2σ²))
//! where σ (sigma) controls the kernel width.

use crate::core::{Result, SymmetricMatrix};
use crate::kernel::traits::{check_parameter_count, check_scale, difference, scaled_outer, Kernel};

/// Gaussian kernel: K(x, y) = exp(-||x - y||² / (2σ²))
///
/// A small sigma makes each support vector influence only its close
/// neighbourhood; a large sigma flattens the kernel towards a constant.
/// When this kernel is handed to the solver its width maps onto
/// γ = 1 / (2σ²).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalRbfKernel {
    sigma: f64,
}

impl NormalRbfKernel {
    /// Create a Gaussian kernel with the given width
    ///
    /// Fails with `InvalidParameter` when |sigma| < 1e-25.
    pub fn new(sigma: f64) -> Result<Self> {
        check_scale("Normal RBF", "sigma", sigma)?;
        Ok(Self { sigma })
    }

    /// Create the kernel matching a solver γ, i.e. σ = 1/√(2γ)
    pub fn from_gamma(gamma: f64) -> Result<Self> {
        Self::new(1.0 / (2.0 * gamma).sqrt())
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }
}

impl Default for NormalRbfKernel {
    fn default() -> Self {
        Self { sigma: 1.0 }
    }
}

impl Kernel for NormalRbfKernel {
    fn name(&self) -> &'static str {
        "Normal RBF"
    }

    fn value(&self, x1: &[f64], x2: &[f64]) -> f64 {
        let d = difference(x1, x2);
        let r2: f64 = d.iter().map(|v| v * v).sum();
        (-r2 / (2.0 * self.sigma * self.sigma)).exp()
    }

    fn gradient(&self, x1: &[f64], x2: &[f64]) -> Vec<f64> {
        let s2 = self.sigma * self.sigma;
        let value = self.value(x1, x2);
        difference(x1, x2)
            .into_iter()
            .map(|d| -value * d / s2)
            .collect()
    }

    fn hessian(&self, x1: &[f64], x2: &[f64]) -> SymmetricMatrix {
        // v * ((d/σ²)(d/σ²)^T - I/σ²)
        let s2 = self.sigma * self.sigma;
        let value = self.value(x1, x2);
        let d = difference(x1, x2);
        scaled_outer(&d, value / (s2 * s2), -value / s2)
    }

    fn parameter(&self) -> Vec<f64> {
        vec![self.sigma]
    }

    fn set_parameter(&mut self, parameter: &[f64]) -> Result<()> {
        check_parameter_count(self.name(), 1, parameter.len())?;
        check_scale(self.name(), "sigma", parameter[0])?;
        self.sigma = parameter[0];
        Ok(())
    }

    fn parameter_description(&self) -> Vec<&'static str> {
        vec!["sigma"]
    }
}
