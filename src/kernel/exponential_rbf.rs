//! Exponential RBF kernel: K(x, y) = exp(-||x - y|| / (2σ²))
//!
//! With a = -1/(2σ²), r = ||x - y|| and d = x - y:
//! - ∂K/∂x_i = K * a * d_i / r
//! - ∂²K/∂x_i∂x_j = K * a * (a * d_i * d_j / r² + δ_ij / r - d_i * d_j / r³)
//!
//! The kernel is not differentiable at r = 0; both derivatives are reported
//! as zero there.

use crate::core::{Result, SymmetricMatrix};
use crate::kernel::traits::{check_parameter_count, check_scale, difference, Kernel};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialRbfKernel {
    sigma: f64,
}

impl ExponentialRbfKernel {
    /// Fails with `InvalidParameter` when |sigma| < 1e-25.
    pub fn new(sigma: f64) -> Result<Self> {
        check_scale("Exponential RBF", "sigma", sigma)?;
        Ok(Self { sigma })
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    fn rate(&self) -> f64 {
        -1.0 / (2.0 * self.sigma * self.sigma)
    }
}

impl Default for ExponentialRbfKernel {
    fn default() -> Self {
        Self { sigma: 1.0 }
    }
}

fn norm(d: &[f64]) -> f64 {
    d.iter().map(|v| v * v).sum::<f64>().sqrt()
}

impl Kernel for ExponentialRbfKernel {
    fn name(&self) -> &'static str {
        "Exponential RBF"
    }

    fn value(&self, x1: &[f64], x2: &[f64]) -> f64 {
        (self.rate() * norm(&difference(x1, x2))).exp()
    }

    fn gradient(&self, x1: &[f64], x2: &[f64]) -> Vec<f64> {
        let d = difference(x1, x2);
        let r = norm(&d);
        if r == 0.0 {
            return vec![0.0; d.len()];
        }
        let a = self.rate();
        let factor = (a * r).exp() * a / r;
        d.into_iter().map(|di| factor * di).collect()
    }

    fn hessian(&self, x1: &[f64], x2: &[f64]) -> SymmetricMatrix {
        let d = difference(x1, x2);
        let mut hessian = SymmetricMatrix::zeros(d.len());
        let r = norm(&d);
        if r == 0.0 {
            return hessian;
        }
        let a = self.rate();
        let scale = (a * r).exp() * a;
        let r2 = r * r;
        let r3 = r2 * r;
        for i in 0..d.len() {
            for j in 0..=i {
                let mut value = a * d[i] * d[j] / r2 - d[i] * d[j] / r3;
                if i == j {
                    value += 1.0 / r;
                }
                hessian.set(i, j, scale * value);
            }
        }
        hessian
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
