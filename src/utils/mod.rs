//! Utility functions: feature scaling and fit metrics

use crate::core::{check_dimension, Result, Sample};

/// Feature scaling utilities
pub mod scaling {
    use super::*;
    use serde::Serialize;

    /// Per-dimension affine map `y_i = (x_i - center_i) * factor_i + shift_i`
    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct AffineTransform {
        pub center: Vec<f64>,
        pub factor: Vec<f64>,
        pub shift: Vec<f64>,
    }

    impl AffineTransform {
        pub fn identity(dim: usize) -> Self {
            Self {
                center: vec![0.0; dim],
                factor: vec![1.0; dim],
                shift: vec![0.0; dim],
            }
        }

        pub fn dim(&self) -> usize {
            self.center.len()
        }

        /// Transform one point
        pub fn apply(&self, x: &[f64]) -> Result<Vec<f64>> {
            check_dimension(self.dim(), x.len())?;
            Ok(x.iter()
                .enumerate()
                .map(|(i, &v)| (v - self.center[i]) * self.factor[i] + self.shift[i])
                .collect())
        }

        /// Undo `apply`
        pub fn invert(&self, y: &[f64]) -> Result<Vec<f64>> {
            check_dimension(self.dim(), y.len())?;
            Ok(y.iter()
                .enumerate()
                .map(|(i, &v)| (v - self.shift[i]) / self.factor[i] + self.center[i])
                .collect())
        }

        /// Transform every point of a sample
        pub fn apply_sample(&self, sample: &Sample) -> Result<Sample> {
            let mut output = Sample::new(self.dim());
            for row in sample.rows() {
                output.push(&self.apply(row)?)?;
            }
            Ok(output)
        }

        /// Diagonal of the (constant) Jacobian
        pub fn scale(&self) -> &[f64] {
            &self.factor
        }
    }

    /// Mean/standard-deviation standardization
    pub struct Normalizer;

    impl Normalizer {
        /// Fit the standardization of `sample`
        ///
        /// Returns `(forward, inverse)`: the forward map subtracts the mean and
        /// divides by the unbiased standard deviation, the inverse undoes it.
        /// Dimensions whose standard deviation does not exceed
        /// `f64::MIN_POSITIVE` are only centered.
        pub fn fit(sample: &Sample) -> (AffineTransform, AffineTransform) {
            let dim = sample.dim();
            let mean = sample.mean();
            let std = sample.standard_deviation();
            let mut forward = AffineTransform::identity(dim);
            let mut inverse = AffineTransform::identity(dim);
            for j in 0..dim {
                forward.center[j] = mean[j];
                inverse.shift[j] = mean[j];
                if std[j].abs() > f64::MIN_POSITIVE {
                    forward.factor[j] = 1.0 / std[j];
                    inverse.factor[j] = std[j];
                }
            }
            (forward, inverse)
        }

        /// Fit and apply in one step
        pub fn fit_transform(sample: &Sample) -> Result<(Sample, AffineTransform, AffineTransform)> {
            let (forward, inverse) = Self::fit(sample);
            let normalized = forward.apply_sample(sample)?;
            Ok((normalized, forward, inverse))
        }
    }
}

/// Goodness-of-fit metrics
pub mod metrics {
    use super::*;

    /// Mean of squared differences
    pub fn mean_squared_error(expected: &[f64], actual: &[f64]) -> Result<f64> {
        check_dimension(expected.len(), actual.len())?;
        if expected.is_empty() {
            return Ok(0.0);
        }
        let sum: f64 = expected
            .iter()
            .zip(actual)
            .map(|(e, a)| (e - a) * (e - a))
            .sum();
        Ok(sum / expected.len() as f64)
    }

    /// Fraction of positions where the labels differ
    pub fn misclassification_rate(expected: &[f64], actual: &[f64]) -> Result<f64> {
        check_dimension(expected.len(), actual.len())?;
        if expected.is_empty() {
            return Ok(0.0);
        }
        let wrong = expected.iter().zip(actual).filter(|(e, a)| e != a).count();
        Ok(wrong as f64 / expected.len() as f64)
    }

    /// Residual `sqrt(Σ r²) / n`
    pub fn residual(expected: &[f64], actual: &[f64]) -> Result<f64> {
        check_dimension(expected.len(), actual.len())?;
        if expected.is_empty() {
            return Ok(0.0);
        }
        let sum: f64 = expected
            .iter()
            .zip(actual)
            .map(|(e, a)| (e - a) * (e - a))
            .sum();
        Ok(sum.sqrt() / expected.len() as f64)
    }

    /// Mean squared error relative to the unbiased variance of `expected`
    ///
    /// A constant `expected` leaves the error unnormalized.
    pub fn relative_error(expected: &[f64], actual: &[f64]) -> Result<f64> {
        let mse = mean_squared_error(expected, actual)?;
        let n = expected.len();
        if n < 2 {
            return Ok(mse);
        }
        let mean = expected.iter().sum::<f64>() / n as f64;
        let variance =
            expected.iter().map(|e| (e - mean) * (e - mean)).sum::<f64>() / (n - 1) as f64;
        if variance > f64::MIN_POSITIVE {
            Ok(mse / variance)
        } else {
            Ok(mse)
        }
    }
}
