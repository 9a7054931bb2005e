//! Differentiable kernel functions
//!
//! Each kernel exposes its value together with the exact gradient and Hessian
//! with respect to its first argument. [`SvmKernel`] closes the family into a
//! single value type used by kernel expansions.

pub mod exponential_rbf;
pub mod linear;
pub mod polynomial;
pub mod rational;
pub mod rbf;
pub mod sigmoid;
pub mod traits;

pub use self::exponential_rbf::*;
pub use self::linear::*;
pub use self::polynomial::*;
pub use self::rational::*;
pub use self::rbf::*;
pub use self::sigmoid::*;
pub use self::traits::*;

use crate::core::{Result, SymmetricMatrix};

/// The closed set of supported kernels
#[derive(Debug, Clone, PartialEq)]
pub enum SvmKernel {
    Linear(LinearKernel),
    Polynomial(PolynomialKernel),
    NormalRbf(NormalRbfKernel),
    ExponentialRbf(ExponentialRbfKernel),
    Sigmoid(SigmoidKernel),
    Rational(RationalKernel),
}

impl SvmKernel {
    fn inner(&self) -> &dyn Kernel {
        match self {
            Self::Linear(k) => k,
            Self::Polynomial(k) => k,
            Self::NormalRbf(k) => k,
            Self::ExponentialRbf(k) => k,
            Self::Sigmoid(k) => k,
            Self::Rational(k) => k,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Kernel {
        match self {
            Self::Linear(k) => k,
            Self::Polynomial(k) => k,
            Self::NormalRbf(k) => k,
            Self::ExponentialRbf(k) => k,
            Self::Sigmoid(k) => k,
            Self::Rational(k) => k,
        }
    }
}

impl Kernel for SvmKernel {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn value(&self, x1: &[f64], x2: &[f64]) -> f64 {
        self.inner().value(x1, x2)
    }

    fn gradient(&self, x1: &[f64], x2: &[f64]) -> Vec<f64> {
        self.inner().gradient(x1, x2)
    }

    fn hessian(&self, x1: &[f64], x2: &[f64]) -> SymmetricMatrix {
        self.inner().hessian(x1, x2)
    }

    fn parameter(&self) -> Vec<f64> {
        self.inner().parameter()
    }

    fn set_parameter(&mut self, parameter: &[f64]) -> Result<()> {
        self.inner_mut().set_parameter(parameter)
    }

    fn parameter_description(&self) -> Vec<&'static str> {
        self.inner().parameter_description()
    }
}

impl From<LinearKernel> for SvmKernel {
    fn from(kernel: LinearKernel) -> Self {
        Self::Linear(kernel)
    }
}

impl From<PolynomialKernel> for SvmKernel {
    fn from(kernel: PolynomialKernel) -> Self {
        Self::Polynomial(kernel)
    }
}

impl From<NormalRbfKernel> for SvmKernel {
    fn from(kernel: NormalRbfKernel) -> Self {
        Self::NormalRbf(kernel)
    }
}

impl From<ExponentialRbfKernel> for SvmKernel {
    fn from(kernel: ExponentialRbfKernel) -> Self {
        Self::ExponentialRbf(kernel)
    }
}

impl From<SigmoidKernel> for SvmKernel {
    fn from(kernel: SigmoidKernel) -> Self {
        Self::Sigmoid(kernel)
    }
}

impl From<RationalKernel> for SvmKernel {
    fn from(kernel: RationalKernel) -> Self {
        Self::Rational(kernel)
    }
}
