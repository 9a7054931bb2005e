//! Multi-output SVM regression meta-model
//!
//! Inputs and outputs are standardized, one ε-SVR is fitted per output column
//! after a grid search, and the resulting expansions are composed back into
//! the original spaces as a [`RegressionMetaModel`].

use crate::adapter::SolverAdapter;
use crate::core::{check_dimension, DifferentiableFunction, Result, SVMError, Sample, SvmConfig};
use crate::expansion::{AggregatedExpansion, KernelExpansion, RegressionMetaModel};
use crate::selection::{GridSearchResult, ModelSelector};
use crate::solver::{KernelType, SvmType};
use crate::utils::metrics::{relative_error, residual};
use crate::utils::scaling::Normalizer;
use log::info;
use rayon::prelude::*;

/// Fitted regression surrogate with its quality indicators
#[derive(Debug, Clone)]
pub struct RegressionResult {
    pub meta_model: RegressionMetaModel,
    /// `sqrt(Σ r²) / n` per output
    pub residuals: Vec<f64>,
    /// Mean squared error over output variance, per output
    pub relative_errors: Vec<f64>,
    /// Selected hyperparameters per output
    pub selections: Vec<GridSearchResult>,
}

/// Regression driver
///
/// # Example
///
/// ```no_run
/// use svmeta::core::Sample;
/// use svmeta::regression::SvmRegression;
/// use svmeta::solver::KernelType;
///
/// let x: Vec<f64> = (0..20).map(|i| i as f64).collect();
/// let y: Vec<f64> = x.iter().map(|v| v.sin()).collect();
/// let result = SvmRegression::new(
///     Sample::from_columns(&[x]).unwrap(),
///     Sample::from_columns(&[y]).unwrap(),
/// )
/// .unwrap()
/// .with_kernel_type(KernelType::Rbf)
/// .with_tradeoffs(vec![1.0, 10.0])
/// .with_kernel_parameters(vec![0.5, 1.0, 2.0])
/// .run()
/// .unwrap();
/// println!("residual {}", result.residuals[0]);
/// ```
#[derive(Debug, Clone)]
pub struct SvmRegression {
    inputs: Sample,
    outputs: Sample,
    tradeoffs: Vec<f64>,
    kernel_parameters: Vec<f64>,
    kernel_type: KernelType,
    config: SvmConfig,
}

impl SvmRegression {
    pub fn new(inputs: Sample, outputs: Sample) -> Result<Self> {
        if inputs.is_empty() || outputs.is_empty() {
            return Err(SVMError::EmptyDataset);
        }
        check_dimension(inputs.len(), outputs.len())?;
        if inputs.dim() == 0 || outputs.dim() == 0 {
            return Err(SVMError::InvalidDataset(
                "samples must have at least one column".to_string(),
            ));
        }
        Ok(Self {
            inputs,
            outputs,
            tradeoffs: vec![10.0],
            kernel_parameters: vec![1.0],
            kernel_type: KernelType::Rbf,
            config: SvmConfig::default(),
        })
    }

    pub fn with_tradeoffs(mut self, tradeoffs: Vec<f64>) -> Self {
        self.tradeoffs = tradeoffs;
        self
    }

    pub fn with_kernel_parameters(mut self, kernel_parameters: Vec<f64>) -> Self {
        self.kernel_parameters = kernel_parameters;
        self
    }

    pub fn with_kernel_type(mut self, kernel_type: KernelType) -> Self {
        self.kernel_type = kernel_type;
        self
    }

    pub fn with_config(mut self, config: SvmConfig) -> Self {
        self.config = config;
        self
    }

    pub fn inputs(&self) -> &Sample {
        &self.inputs
    }

    pub fn outputs(&self) -> &Sample {
        &self.outputs
    }

    /// Fit one column of normalized outputs
    ///
    /// The adapter, and with it the solver buffers, lives only for this call.
    fn fit_column(
        &self,
        selector: &ModelSelector,
        inputs: &Sample,
        targets: &[f64],
    ) -> Result<(KernelExpansion, GridSearchResult)> {
        let mut adapter = SolverAdapter::new(SvmType::EpsilonSvr, &self.config);
        adapter.set_kernel_type(self.kernel_type);
        adapter.convert_data(inputs, targets)?;
        let selection = selector.select(&mut adapter)?;
        let expansion = KernelExpansion::from_trained(adapter.trained_model()?)?;
        Ok((expansion, selection))
    }

    pub fn run(&self) -> Result<RegressionResult> {
        let selector = ModelSelector::new(self.tradeoffs.clone(), self.kernel_parameters.clone())?
            .with_parallel(self.config.parallel);

        let (inputs, input_transform, _) = Normalizer::fit_transform(&self.inputs)?;
        let (outputs, _, output_inverse) = Normalizer::fit_transform(&self.outputs)?;

        let fit = |column: usize| {
            let fitted = self.fit_column(&selector, &inputs, &outputs.column(column));
            if let Ok((expansion, selection)) = &fitted {
                info!(
                    "Output {column}: C={} kernel parameter={} with {} support vectors",
                    selection.best_tradeoff,
                    selection.best_kernel_parameter,
                    expansion.support_vectors().len()
                );
            }
            fitted
        };
        let fitted: Vec<(KernelExpansion, GridSearchResult)> = if self.config.parallel {
            (0..outputs.dim()).into_par_iter().map(fit).collect::<Result<_>>()?
        } else {
            (0..outputs.dim()).map(fit).collect::<Result<_>>()?
        };
        let (columns, selections): (Vec<_>, Vec<_>) = fitted.into_iter().unzip();

        let meta_model = RegressionMetaModel::new(
            AggregatedExpansion::new(columns)?,
            input_transform,
            output_inverse,
        )?;

        let predicted = meta_model.evaluate_sample(&self.inputs)?;
        let mut residuals = Vec::with_capacity(self.outputs.dim());
        let mut relative_errors = Vec::with_capacity(self.outputs.dim());
        for j in 0..self.outputs.dim() {
            let expected = self.outputs.column(j);
            let actual = predicted.column(j);
            residuals.push(residual(&expected, &actual)?);
            relative_errors.push(relative_error(&expected, &actual)?);
        }
        info!("Regression residuals {residuals:?}, relative errors {relative_errors:?}");

        Ok(RegressionResult {
            meta_model,
            residuals,
            relative_errors,
            selections,
        })
    }
}
