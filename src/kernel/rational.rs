//! Rational quadratic kernel: K(x, y) = 1 - r² / (r² + c), r = ||x - y||

use crate::core::{Result, SymmetricMatrix};
use crate::kernel::traits::{check_parameter_count, check_scale, difference, Kernel};

/// Rational quadratic kernel with constant c
///
/// Equivalent to c / (r² + c); decays polynomially rather than
/// exponentially with the distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RationalKernel {
    constant: f64,
}

impl RationalKernel {
    /// Fails with `InvalidParameter` when |constant| < 1e-25.
    pub fn new(constant: f64) -> Result<Self> {
        check_scale("Rational", "constant", constant)?;
        Ok(Self { constant })
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }
}

impl Default for RationalKernel {
    fn default() -> Self {
        Self { constant: 1.0 }
    }
}

impl Kernel for RationalKernel {
    fn name(&self) -> &'static str {
        "Rational"
    }

    fn value(&self, x1: &[f64], x2: &[f64]) -> f64 {
        let r2: f64 = difference(x1, x2).iter().map(|v| v * v).sum();
        1.0 - r2 / (r2 + self.constant)
    }

    fn gradient(&self, x1: &[f64], x2: &[f64]) -> Vec<f64> {
        let d = difference(x1, x2);
        let denominator = d.iter().map(|v| v * v).sum::<f64>() + self.constant;
        let factor = -2.0 * self.constant / (denominator * denominator);
        d.into_iter().map(|di| factor * di).collect()
    }

    fn hessian(&self, x1: &[f64], x2: &[f64]) -> SymmetricMatrix {
        let d = difference(x1, x2);
        let c = self.constant;
        let denominator = d.iter().map(|v| v * v).sum::<f64>() + c;
        let cube = denominator * denominator * denominator;
        let mut hessian = SymmetricMatrix::zeros(d.len());
        for i in 0..d.len() {
            hessian.set(i, i, 2.0 * c * (4.0 * d[i] * d[i] - denominator) / cube);
            for j in 0..i {
                hessian.set(i, j, 8.0 * c * d[i] * d[j] / cube);
            }
        }
        hessian
    }

    fn parameter(&self) -> Vec<f64> {
        vec![self.constant]
    }

    fn set_parameter(&mut self, parameter: &[f64]) -> Result<()> {
        check_parameter_count(self.name(), 1, parameter.len())?;
        check_scale(self.name(), "constant", parameter[0])?;
        self.constant = parameter[0];
        Ok(())
    }

    fn parameter_description(&self) -> Vec<&'static str> {
        vec!["constant"]
    }
}
