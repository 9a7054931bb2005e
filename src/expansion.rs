//! Kernel expansions: the closed-form surrogates built from trained models
//!
//! A [`KernelExpansion`] is `bias + Σ coef_i k(sv_i, x)` for one output.
//! [`AggregatedExpansion`] stacks one expansion per output column and
//! [`RegressionMetaModel`] composes the stack with the input normalization
//! and the output de-normalization.

use crate::adapter::TrainedModel;
use crate::core::{
    check_dimension, DifferentiableFunction, Result, SVMError, Sample, SymmetricMatrix,
};
use crate::kernel::{Kernel, SvmKernel};
use crate::utils::scaling::AffineTransform;
use rayon::prelude::*;

/// Single-output kernel expansion
#[derive(Debug, Clone)]
pub struct KernelExpansion {
    kernel: SvmKernel,
    coefficients: Vec<f64>,
    support_vectors: Sample,
    bias: f64,
}

impl KernelExpansion {
    /// Fails when coefficients and support vectors disagree in count
    pub fn new(
        kernel: SvmKernel,
        coefficients: Vec<f64>,
        support_vectors: Sample,
        bias: f64,
    ) -> Result<Self> {
        check_dimension(support_vectors.len(), coefficients.len())?;
        Ok(Self {
            kernel,
            coefficients,
            support_vectors,
            bias,
        })
    }

    pub fn from_trained(model: TrainedModel) -> Result<Self> {
        Self::new(
            model.kernel,
            model.coefficients,
            model.support_vectors,
            model.constant,
        )
    }

    pub fn kernel(&self) -> &SvmKernel {
        &self.kernel
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn support_vectors(&self) -> &Sample {
        &self.support_vectors
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn input_dimension(&self) -> usize {
        self.support_vectors.dim()
    }

    fn terms(&self) -> impl Iterator<Item = (f64, &[f64])> + '_ {
        self.coefficients
            .iter()
            .copied()
            .zip(self.support_vectors.rows())
            .filter(|(coef, _)| *coef != 0.0)
    }

    pub fn value(&self, x: &[f64]) -> Result<f64> {
        check_dimension(self.input_dimension(), x.len())?;
        Ok(self.bias
            + self
                .terms()
                .map(|(coef, sv)| coef * self.kernel.value(sv, x))
                .sum::<f64>())
    }

    pub fn gradient(&self, x: &[f64]) -> Result<Vec<f64>> {
        check_dimension(self.input_dimension(), x.len())?;
        let mut gradient = vec![0.0; x.len()];
        for (coef, sv) in self.terms() {
            for (g, k) in gradient.iter_mut().zip(self.kernel.gradient(x, sv)) {
                *g += coef * k;
            }
        }
        Ok(gradient)
    }

    pub fn hessian(&self, x: &[f64]) -> Result<SymmetricMatrix> {
        check_dimension(self.input_dimension(), x.len())?;
        let mut hessian = SymmetricMatrix::zeros(x.len());
        for (coef, sv) in self.terms() {
            hessian.add_scaled(&self.kernel.hessian(x, sv), coef);
        }
        Ok(hessian)
    }
}

/// One expansion per output, evaluated in parallel
#[derive(Debug, Clone)]
pub struct AggregatedExpansion {
    columns: Vec<KernelExpansion>,
}

impl AggregatedExpansion {
    /// All columns must share one input dimension
    pub fn new(columns: Vec<KernelExpansion>) -> Result<Self> {
        let first = columns.first().ok_or_else(|| {
            SVMError::InvalidParameter("aggregated expansion needs at least one column".to_string())
        })?;
        let dim = first.input_dimension();
        for column in &columns {
            check_dimension(dim, column.input_dimension())?;
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[KernelExpansion] {
        &self.columns
    }
}

impl DifferentiableFunction for AggregatedExpansion {
    fn input_dimension(&self) -> usize {
        self.columns[0].input_dimension()
    }

    fn output_dimension(&self) -> usize {
        self.columns.len()
    }

    fn evaluate(&self, x: &[f64]) -> Result<Vec<f64>> {
        self.columns.par_iter().map(|c| c.value(x)).collect()
    }

    fn jacobian(&self, x: &[f64]) -> Result<Vec<Vec<f64>>> {
        self.columns.par_iter().map(|c| c.gradient(x)).collect()
    }

    fn hessians(&self, x: &[f64]) -> Result<Vec<SymmetricMatrix>> {
        self.columns.par_iter().map(|c| c.hessian(x)).collect()
    }
}

/// Surrogate over the original input and output spaces
///
/// `f(x) = out(g(in(x)))` with `in`, `out` diagonal affine maps, so the
/// Jacobian and Hessians pick up the constant scale factors of both maps.
#[derive(Debug, Clone)]
pub struct RegressionMetaModel {
    expansion: AggregatedExpansion,
    input_transform: AffineTransform,
    output_transform: AffineTransform,
}

impl RegressionMetaModel {
    pub fn new(
        expansion: AggregatedExpansion,
        input_transform: AffineTransform,
        output_transform: AffineTransform,
    ) -> Result<Self> {
        check_dimension(expansion.input_dimension(), input_transform.dim())?;
        check_dimension(expansion.output_dimension(), output_transform.dim())?;
        Ok(Self {
            expansion,
            input_transform,
            output_transform,
        })
    }

    pub fn expansion(&self) -> &AggregatedExpansion {
        &self.expansion
    }

    pub fn input_transform(&self) -> &AffineTransform {
        &self.input_transform
    }

    pub fn output_transform(&self) -> &AffineTransform {
        &self.output_transform
    }
}

impl DifferentiableFunction for RegressionMetaModel {
    fn input_dimension(&self) -> usize {
        self.input_transform.dim()
    }

    fn output_dimension(&self) -> usize {
        self.output_transform.dim()
    }

    fn evaluate(&self, x: &[f64]) -> Result<Vec<f64>> {
        let inner = self.expansion.evaluate(&self.input_transform.apply(x)?)?;
        self.output_transform.apply(&inner)
    }

    fn jacobian(&self, x: &[f64]) -> Result<Vec<Vec<f64>>> {
        let inner = self.expansion.jacobian(&self.input_transform.apply(x)?)?;
        let input_scale = self.input_transform.scale();
        let output_scale = self.output_transform.scale();
        Ok(inner
            .into_iter()
            .zip(output_scale)
            .map(|(row, &out)| {
                row.iter()
                    .zip(input_scale)
                    .map(|(g, s)| out * g * s)
                    .collect()
            })
            .collect())
    }

    fn hessians(&self, x: &[f64]) -> Result<Vec<SymmetricMatrix>> {
        let inner = self.expansion.hessians(&self.input_transform.apply(x)?)?;
        let input_scale = self.input_transform.scale();
        let output_scale = self.output_transform.scale();
        let dim = input_scale.len();
        Ok(inner
            .iter()
            .zip(output_scale)
            .map(|(h, &out)| {
                let mut scaled = SymmetricMatrix::zeros(dim);
                for i in 0..dim {
                    for j in 0..=i {
                        scaled.set(i, j, out * h.get(i, j) * input_scale[i] * input_scale[j]);
                    }
                }
                scaled
            })
            .collect())
    }
}
