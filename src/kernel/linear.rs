//! Linear kernel implementation

use crate::core::{Result, SymmetricMatrix};
use crate::kernel::traits::{check_parameter_count, dot, Kernel};

/// Linear kernel: K(x, y) = x · y
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LinearKernel;

impl LinearKernel {
    pub fn new() -> Self {
        Self
    }
}

impl Kernel for LinearKernel {
    fn name(&self) -> &'static str {
        "Linear"
    }

    fn value(&self, x1: &[f64], x2: &[f64]) -> f64 {
        dot(x1, x2)
    }

    fn gradient(&self, _x1: &[f64], x2: &[f64]) -> Vec<f64> {
        x2.to_vec()
    }

    fn hessian(&self, x1: &[f64], _x2: &[f64]) -> SymmetricMatrix {
        SymmetricMatrix::zeros(x1.len())
    }

    fn parameter(&self) -> Vec<f64> {
        Vec::new()
    }

    fn set_parameter(&mut self, parameter: &[f64]) -> Result<()> {
        check_parameter_count(self.name(), 0, parameter.len())
    }

    fn parameter_description(&self) -> Vec<&'static str> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_kernel_value() {
        let kernel = LinearKernel::new();
        assert_relative_eq!(kernel.value(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]), 32.0);
        assert_eq!(kernel.value(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_linear_kernel_derivatives() {
        let kernel = LinearKernel::new();
        let grad = kernel.gradient(&[1.0, 2.0], &[3.0, -4.0]);
        assert_eq!(grad, vec![3.0, -4.0]);

        let hessian = kernel.hessian(&[1.0, 2.0], &[3.0, -4.0]);
        assert_eq!(hessian.dim(), 2);
        assert!((0..2).all(|i| (0..2).all(|j| hessian.get(i, j) == 0.0)));
    }

    #[test]
    fn test_linear_kernel_has_no_parameters() {
        let mut kernel = LinearKernel::new();
        assert!(kernel.parameter().is_empty());
        assert!(kernel.set_parameter(&[]).is_ok());
        assert!(kernel.set_parameter(&[1.0]).is_err());
    }
}
