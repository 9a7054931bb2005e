//! Core traits

use crate::core::{Result, Sample, SymmetricMatrix};

/// A twice-differentiable map from `R^n` to `R^m`
pub trait DifferentiableFunction: Send + Sync {
    fn input_dimension(&self) -> usize;

    fn output_dimension(&self) -> usize;

    /// Function value at `x`
    fn evaluate(&self, x: &[f64]) -> Result<Vec<f64>>;

    /// Jacobian at `x`, one row per output
    fn jacobian(&self, x: &[f64]) -> Result<Vec<Vec<f64>>>;

    /// Hessian of each output at `x`
    fn hessians(&self, x: &[f64]) -> Result<Vec<SymmetricMatrix>>;

    /// Evaluate every point of a sample
    fn evaluate_sample(&self, sample: &Sample) -> Result<Sample> {
        let mut output = Sample::new(self.output_dimension());
        for row in sample.rows() {
            output.push(&self.evaluate(row)?)?;
        }
        Ok(output)
    }
}
