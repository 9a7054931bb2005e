//! Sigmoid (Tanh) Kernel Implementation
//!
//! The Sigmoid kernel, also known as the Hyperbolic Tangent kernel, is a
//! non-stationary kernel. It is not positive semi-definite for every choice
//! of parameters, so the solver may not reach a global optimum with it.
//!
//! The Sigmoid kernel is defined as:
//! K(x, y) = tanh(a * <x, y> + c)
//!
//! where:
//! - a is the linear term scaling the dot product
//! - c is the constant term
//!
//! With t = K(x, y):
//! - ∂K/∂x_i = a * y_i * (1 - t²)
//! - ∂²K/∂x_i∂x_j = -2 * a² * y_i * y_j * (1 - t²) * t

use crate::core::{Result, SymmetricMatrix};
use crate::kernel::traits::{check_parameter_count, dot, scaled_outer, Kernel};

/// Sigmoid (Hyperbolic Tangent) kernel
#[derive(Debug, Clone, PartialEq)]
pub struct SigmoidKernel {
    /// Scaling of the dot product
    pub linear_term: f64,
    /// Offset added before the tanh
    pub constant_term: f64,
}

impl SigmoidKernel {
    /// Creates a new Sigmoid kernel
    ///
    /// # Examples
    /// ```
    /// use svmeta::kernel::{Kernel, SigmoidKernel};
    ///
    /// let kernel = SigmoidKernel::new(0.1, -1.0);
    /// assert_eq!(kernel.parameter(), vec![0.1, -1.0]);
    /// ```
    pub fn new(linear_term: f64, constant_term: f64) -> Self {
        Self {
            linear_term,
            constant_term,
        }
    }

    fn tanh(&self, x1: &[f64], x2: &[f64]) -> f64 {
        (self.linear_term * dot(x1, x2) + self.constant_term).tanh()
    }
}

impl Default for SigmoidKernel {
    fn default() -> Self {
        Self::new(1.0, 0.0)
    }
}

impl Kernel for SigmoidKernel {
    fn name(&self) -> &'static str {
        "Sigmoid"
    }

    fn value(&self, x1: &[f64], x2: &[f64]) -> f64 {
        self.tanh(x1, x2)
    }

    fn gradient(&self, x1: &[f64], x2: &[f64]) -> Vec<f64> {
        let t = self.tanh(x1, x2);
        let factor = self.linear_term * (1.0 - t * t);
        x2.iter().map(|&y| factor * y).collect()
    }

    fn hessian(&self, x1: &[f64], x2: &[f64]) -> SymmetricMatrix {
        let t = self.tanh(x1, x2);
        let factor = -2.0 * self.linear_term * self.linear_term * (1.0 - t * t) * t;
        scaled_outer(x2, factor, 0.0)
    }

    fn parameter(&self) -> Vec<f64> {
        vec![self.linear_term, self.constant_term]
    }

    fn set_parameter(&mut self, parameter: &[f64]) -> Result<()> {
        check_parameter_count(self.name(), 2, parameter.len())?;
        self.linear_term = parameter[0];
        self.constant_term = parameter[1];
        Ok(())
    }

    fn parameter_description(&self) -> Vec<&'static str> {
        vec!["linear term", "constant term"]
    }
}
