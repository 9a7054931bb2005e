//! Polynomial Kernel Implementation
//!
//! The polynomial kernel is defined as:
//! K(x, y) = (a * <x, y> + c)^d
//!
//! Where:
//! - a: linear term scaling the dot product
//! - c: constant term
//! - d: degree of the polynomial
//!
//! Derivatives with respect to x, with s = a * <x, y> + c:
//! - ∂K/∂x_i = d * s^(d-1) * a * y_i
//! - ∂²K/∂x_i∂x_j = d * (d-1) * s^(d-2) * a² * y_i * y_j

use crate::core::{Result, SymmetricMatrix};
use crate::kernel::traits::{check_parameter_count, dot, scaled_outer, Kernel};

/// Polynomial kernel with configurable degree, linear term and constant term
#[derive(Debug, Clone, PartialEq)]
pub struct PolynomialKernel {
    /// Degree of the polynomial
    pub degree: f64,
    /// Factor applied to the dot product
    pub linear_term: f64,
    /// Independent term
    pub constant_term: f64,
}

impl PolynomialKernel {
    /// Creates a new polynomial kernel
    ///
    /// # Examples
    /// ```
    /// use svmeta::kernel::{Kernel, PolynomialKernel};
    ///
    /// // Quadratic kernel: (x·y + 1)²
    /// let kernel = PolynomialKernel::new(2.0, 1.0, 1.0);
    /// assert_eq!(kernel.value(&[1.0, 2.0], &[2.0, 1.0]), 25.0);
    /// ```
    pub fn new(degree: f64, linear_term: f64, constant_term: f64) -> Self {
        Self {
            degree,
            linear_term,
            constant_term,
        }
    }

    fn base(&self, x1: &[f64], x2: &[f64]) -> f64 {
        self.linear_term * dot(x1, x2) + self.constant_term
    }
}

impl Default for PolynomialKernel {
    /// Cubic kernel (x·y)³
    fn default() -> Self {
        Self::new(3.0, 1.0, 0.0)
    }
}

/// `s^exponent`, using integer powers when the exponent is integral
fn power(s: f64, exponent: f64) -> f64 {
    if exponent.fract() == 0.0 && exponent.abs() <= i32::MAX as f64 {
        s.powi(exponent as i32)
    } else {
        s.powf(exponent)
    }
}

impl Kernel for PolynomialKernel {
    fn name(&self) -> &'static str {
        "Polynomial"
    }

    fn value(&self, x1: &[f64], x2: &[f64]) -> f64 {
        power(self.base(x1, x2), self.degree)
    }

    fn gradient(&self, x1: &[f64], x2: &[f64]) -> Vec<f64> {
        if self.degree < 1.0 {
            return vec![0.0; x1.len()];
        }
        let factor =
            self.degree * power(self.base(x1, x2), self.degree - 1.0) * self.linear_term;
        x2.iter().map(|&y| factor * y).collect()
    }

    fn hessian(&self, x1: &[f64], x2: &[f64]) -> SymmetricMatrix {
        if self.degree < 2.0 {
            return SymmetricMatrix::zeros(x1.len());
        }
        let factor = self.degree
            * (self.degree - 1.0)
            * power(self.base(x1, x2), self.degree - 2.0)
            * self.linear_term
            * self.linear_term;
        scaled_outer(x2, factor, 0.0)
    }

    fn parameter(&self) -> Vec<f64> {
        vec![self.degree, self.linear_term, self.constant_term]
    }

    fn set_parameter(&mut self, parameter: &[f64]) -> Result<()> {
        check_parameter_count(self.name(), 3, parameter.len())?;
        self.degree = parameter[0];
        self.linear_term = parameter[1];
        self.constant_term = parameter[2];
        Ok(())
    }

    fn parameter_description(&self) -> Vec<&'static str> {
        vec!["degree", "linear term", "constant term"]
    }
}
