//! Boundary between the modelling pipeline and the SVM solver
//!
//! [`SolverAdapter`] owns the solver parameter set, the converted training
//! problem and the trained solver model. Problem and model live in guards
//! that release them on drop, so every exit path frees the solver buffers.

use crate::core::{check_dimension, Result, SVMError, Sample, SvmConfig};
use crate::kernel::{LinearKernel, NormalRbfKernel, PolynomialKernel, SigmoidKernel, SvmKernel};
use crate::solver::{
    cross_validation, dense_to_nodes, nodes_to_dense, train, KernelType, SvmModel, SvmParameter,
    SvmProblem, SvmType,
};
use crate::utils::metrics::{mean_squared_error, misclassification_rate};
use log::debug;
use std::ops::Deref;

/// Owned training problem, released on drop
#[derive(Debug)]
pub struct ProblemGuard(SvmProblem);

impl Deref for ProblemGuard {
    type Target = SvmProblem;

    fn deref(&self) -> &SvmProblem {
        &self.0
    }
}

impl Drop for ProblemGuard {
    fn drop(&mut self) {
        debug!("Releasing training problem with {} rows", self.0.len());
    }
}

/// Owned solver model, released on drop
#[derive(Debug)]
pub struct ModelGuard(SvmModel);

impl Deref for ModelGuard {
    type Target = SvmModel;

    fn deref(&self) -> &SvmModel {
        &self.0
    }
}

impl Drop for ModelGuard {
    fn drop(&mut self) {
        debug!(
            "Releasing solver model with {} support vectors",
            self.0.n_support_vectors()
        );
    }
}

/// Support vectors, coefficients and bias copied out of a solver model
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub support_vectors: Sample,
    pub coefficients: Vec<f64>,
    /// Bias, i.e. `-rho`
    pub constant: f64,
    /// Kernel matching the solver kernel and its hyperparameters
    pub kernel: SvmKernel,
}

/// Differentiable kernel equivalent to a solver parameter set
///
/// The Gaussian width follows from γ = 1/(2σ²).
pub fn expansion_kernel(param: &SvmParameter) -> Result<SvmKernel> {
    Ok(match param.kernel_type {
        KernelType::Linear => LinearKernel::new().into(),
        KernelType::Polynomial => {
            PolynomialKernel::new(f64::from(param.degree), param.gamma, param.coef0).into()
        }
        KernelType::Rbf => NormalRbfKernel::from_gamma(param.gamma)?.into(),
        KernelType::Sigmoid => SigmoidKernel::new(param.gamma, param.coef0).into(),
    })
}

/// Map a kernel parameter p onto the solver γ = 1/(2p²)
pub fn gamma_from_kernel_parameter(kernel_parameter: f64) -> Result<f64> {
    if !kernel_parameter.is_finite() || kernel_parameter.abs() < 1e-25 {
        return Err(SVMError::InvalidParameter(format!(
            "kernel parameter too small: {kernel_parameter}"
        )));
    }
    Ok(1.0 / (2.0 * kernel_parameter * kernel_parameter))
}

/// Solver adapter for one training problem
#[derive(Debug)]
pub struct SolverAdapter {
    param: SvmParameter,
    folds: usize,
    seed: u64,
    input_dimension: usize,
    problem: Option<ProblemGuard>,
    model: Option<ModelGuard>,
}

impl SolverAdapter {
    /// Adapter for the given formulation, with defaults taken from `config`
    pub fn new(svm_type: SvmType, config: &SvmConfig) -> Self {
        let param = SvmParameter {
            svm_type,
            kernel_type: KernelType::Rbf,
            degree: config.polynomial_degree,
            coef0: config.polynomial_constant,
            cache_size: config.cache_size_mb,
            eps: config.epsilon,
            p: config.regression_epsilon,
            shrinking: config.shrinking,
            max_iterations: config.max_iterations,
            ..Default::default()
        };
        Self {
            param,
            folds: config.folds,
            seed: config.seed,
            input_dimension: 0,
            problem: None,
            model: None,
        }
    }

    pub fn parameter(&self) -> &SvmParameter {
        &self.param
    }

    pub fn set_kernel_type(&mut self, kernel_type: KernelType) {
        self.param.kernel_type = kernel_type;
    }

    pub fn set_tradeoff(&mut self, c: f64) -> Result<()> {
        if !(c > 0.0) || !c.is_finite() {
            return Err(SVMError::InvalidParameter(format!(
                "tradeoff factor must be positive, got {c}"
            )));
        }
        self.param.c = c;
        Ok(())
    }

    /// Store the kernel parameter as γ = 1/(2p²)
    pub fn set_kernel_parameter(&mut self, kernel_parameter: f64) -> Result<()> {
        self.param.gamma = gamma_from_kernel_parameter(kernel_parameter)?;
        Ok(())
    }

    pub fn set_degree(&mut self, degree: i32) {
        self.param.degree = degree;
    }

    pub fn set_constant(&mut self, coef0: f64) {
        self.param.coef0 = coef0;
    }

    pub fn set_epsilon(&mut self, eps: f64) {
        self.param.eps = eps;
    }

    /// Width of the ε-SVR insensitive tube
    pub fn set_loss_epsilon(&mut self, p: f64) {
        self.param.p = p;
    }

    pub fn set_shrinking(&mut self, shrinking: bool) {
        self.param.shrinking = shrinking;
    }

    pub fn set_cache_size(&mut self, megabytes: f64) {
        self.param.cache_size = megabytes;
    }

    /// Per-class weights as `(label, weight)` pairs
    pub fn set_weights(&mut self, weights: Vec<(f64, f64)>) {
        self.param.weight = weights;
    }

    /// Convert a sample pair into the solver training problem
    ///
    /// Any previous problem and model are released first.
    pub fn convert_data(&mut self, inputs: &Sample, targets: &[f64]) -> Result<()> {
        self.release();
        let problem = SvmProblem::from_dense(inputs, targets)?;
        self.input_dimension = inputs.dim();
        self.problem = Some(ProblemGuard(problem));
        Ok(())
    }

    fn problem(&self) -> Result<&SvmProblem> {
        self.problem
            .as_deref()
            .ok_or_else(|| SVMError::InvalidDataset("no training problem converted".to_string()))
    }

    fn model(&self) -> Result<&SvmModel> {
        self.model.as_deref().ok_or(SVMError::ModelNotTrained)
    }

    /// Cross-validation error of the pair (C, kernel parameter)
    ///
    /// Mean squared error for regression, misclassification rate for
    /// classification. The adapter's own parameter set is left untouched.
    pub fn cross_validate(&self, c: f64, kernel_parameter: f64) -> Result<f64> {
        let problem = self.problem()?;
        let param = SvmParameter {
            c,
            gamma: gamma_from_kernel_parameter(kernel_parameter)?,
            ..self.param.clone()
        };
        let predictions = cross_validation(problem, &param, self.folds, self.seed)?;
        let error = if param.svm_type.is_classification() {
            misclassification_rate(problem.targets(), &predictions)?
        } else {
            mean_squared_error(problem.targets(), &predictions)?
        };
        debug!(
            "Cross-validation gamma={} C={} err={error}",
            param.gamma, param.c
        );
        Ok(error)
    }

    /// Train on the converted problem with the current parameters
    pub fn train(&mut self) -> Result<()> {
        let model = train(self.problem()?, &self.param)?;
        self.model = Some(ModelGuard(model));
        Ok(())
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    /// Copy support vectors, coefficients and bias out of the solver model
    pub fn trained_model(&self) -> Result<TrainedModel> {
        let model = self.model()?;
        let mut support_vectors = Sample::new(self.input_dimension);
        for sv in &model.sv {
            support_vectors.push(&nodes_to_dense(sv, self.input_dimension))?;
        }
        let coefficients = model.sv_coef.first().cloned().unwrap_or_default();
        check_dimension(support_vectors.len(), coefficients.len())?;
        let constant = -model.rho.first().copied().unwrap_or(0.0);
        Ok(TrainedModel {
            support_vectors,
            coefficients,
            constant,
            kernel: expansion_kernel(&model.param)?,
        })
    }

    fn nodes(&self, x: &[f64]) -> Result<Vec<crate::solver::SvmNode>> {
        check_dimension(self.input_dimension, x.len())?;
        Ok(dense_to_nodes(x))
    }

    /// Predicted target or label of `x`
    pub fn predict(&self, x: &[f64]) -> Result<f64> {
        Ok(self.model()?.predict(&self.nodes(x)?))
    }

    /// Raw decision values of `x`
    pub fn decision_values(&self, x: &[f64]) -> Result<Vec<f64>> {
        Ok(self.model()?.predict_values(&self.nodes(x)?))
    }

    /// One-vs-one votes of `x`, in `labels()` order
    pub fn votes(&self, x: &[f64]) -> Result<Vec<usize>> {
        Ok(self.model()?.votes(&self.nodes(x)?))
    }

    /// Class labels in first-seen order
    pub fn labels(&self) -> Result<&[f64]> {
        Ok(&self.model()?.label)
    }

    /// Number of votes `x` collects for `label`
    pub fn grade(&self, x: &[f64], label: f64) -> Result<usize> {
        let position = self
            .labels()?
            .iter()
            .position(|&l| l == label)
            .ok_or_else(|| SVMError::InvalidParameter(format!("unknown class label {label}")))?;
        Ok(self.votes(x)?[position])
    }

    /// Percentage of training rows whose prediction matches their label
    pub fn accuracy(&self) -> Result<f64> {
        let problem = self.problem()?;
        let model = self.model()?;
        let misclassified = (0..problem.len())
            .filter(|&i| model.predict(problem.row(i)) != problem.targets()[i])
            .count();
        Ok((1.0 - misclassified as f64 / problem.len() as f64) * 100.0)
    }

    /// Drop the training problem and the solver model
    pub fn release(&mut self) {
        self.model = None;
        self.problem = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::Kernel;
    use approx::assert_relative_eq;

    fn line() -> (Sample, Vec<f64>) {
        let xs: Vec<f64> = (0..12).map(|i| i as f64 / 6.0 - 1.0).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 0.5 * x + 0.25).collect();
        (Sample::from_columns(&[xs]).unwrap(), ys)
    }

    fn regression_adapter() -> SolverAdapter {
        let mut adapter = SolverAdapter::new(SvmType::EpsilonSvr, &SvmConfig::default());
        adapter.set_kernel_type(KernelType::Linear);
        adapter.set_tradeoff(10.0).unwrap();
        adapter
    }

    #[test]
    fn test_kernel_parameter_maps_to_gamma() {
        let mut adapter = regression_adapter();
        adapter.set_kernel_parameter(2.0).unwrap();
        assert_relative_eq!(adapter.parameter().gamma, 0.125);
        assert!(matches!(
            adapter.set_kernel_parameter(1e-26),
            Err(SVMError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_config_defaults_reach_parameters() {
        let adapter = SolverAdapter::new(SvmType::EpsilonSvr, &SvmConfig::default());
        let param = adapter.parameter();
        assert_eq!(param.degree, 3);
        assert_eq!(param.cache_size, 100.0);
        assert_eq!(param.p, 1e-5);
        assert!(param.shrinking);
    }

    #[test]
    fn test_convert_data_size_mismatch() {
        let (inputs, targets) = line();
        let mut adapter = regression_adapter();
        assert!(matches!(
            adapter.convert_data(&inputs, &targets[..3]),
            Err(SVMError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_train_and_extract() {
        let (inputs, targets) = line();
        let mut adapter = regression_adapter();
        adapter.convert_data(&inputs, &targets).unwrap();
        adapter.train().unwrap();

        let trained = adapter.trained_model().unwrap();
        assert_eq!(trained.support_vectors.len(), trained.coefficients.len());
        assert_eq!(trained.support_vectors.dim(), 1);
        assert_eq!(trained.kernel.name(), "Linear");

        // Rebuild the prediction by hand
        let x = [0.3];
        let by_hand = trained.constant
            + trained
                .support_vectors
                .rows()
                .zip(&trained.coefficients)
                .map(|(sv, c)| c * trained.kernel.value(sv, &x))
                .sum::<f64>();
        assert_relative_eq!(by_hand, adapter.predict(&x).unwrap(), epsilon = 1e-10);
        assert!((by_hand - 0.4).abs() < 5e-3);
    }

    #[test]
    fn test_untrained_access_fails() {
        let adapter = regression_adapter();
        assert!(matches!(
            adapter.trained_model(),
            Err(SVMError::ModelNotTrained)
        ));
        assert!(adapter.cross_validate(1.0, 1.0).is_err());
    }

    #[test]
    fn test_cross_validate_leaves_parameters() {
        let (inputs, targets) = line();
        let mut adapter = regression_adapter();
        adapter.convert_data(&inputs, &targets).unwrap();
        let before = adapter.parameter().clone();
        let error = adapter.cross_validate(5.0, 0.5).unwrap();
        assert!(error >= 0.0);
        assert_eq!(adapter.parameter(), &before);
    }

    #[test]
    fn test_release_drops_buffers() {
        let (inputs, targets) = line();
        let mut adapter = regression_adapter();
        adapter.convert_data(&inputs, &targets).unwrap();
        adapter.train().unwrap();
        adapter.release();
        assert!(!adapter.is_trained());
        assert!(adapter.train().is_err());
    }

    #[test]
    fn test_classification_grade_and_accuracy() {
        let inputs =
            Sample::from_rows(&[vec![-2.0], vec![-1.5], vec![-1.0], vec![1.0], vec![1.5], vec![2.0]])
                .unwrap();
        let labels = [3.0, 3.0, 3.0, 8.0, 8.0, 8.0];
        let mut adapter = SolverAdapter::new(SvmType::CSvc, &SvmConfig::default());
        adapter.set_kernel_type(KernelType::Linear);
        adapter.set_tradeoff(10.0).unwrap();
        adapter.convert_data(&inputs, &labels).unwrap();
        adapter.train().unwrap();

        assert_eq!(adapter.labels().unwrap(), &[3.0, 8.0]);
        assert_eq!(adapter.predict(&[-3.0]).unwrap(), 3.0);
        assert_eq!(adapter.grade(&[-3.0], 3.0).unwrap(), 1);
        assert_eq!(adapter.grade(&[-3.0], 8.0).unwrap(), 0);
        assert!(adapter.grade(&[-3.0], 5.0).is_err());
        assert_relative_eq!(adapter.accuracy().unwrap(), 100.0);
    }

    #[test]
    fn test_expansion_kernel_mapping() {
        let param = SvmParameter {
            kernel_type: KernelType::Rbf,
            gamma: 0.5,
            ..Default::default()
        };
        match expansion_kernel(&param).unwrap() {
            SvmKernel::NormalRbf(k) => assert_relative_eq!(k.sigma(), 1.0, epsilon = 1e-12),
            other => panic!("unexpected kernel {other:?}"),
        }

        let param = SvmParameter {
            kernel_type: KernelType::Sigmoid,
            gamma: 0.25,
            coef0: -1.0,
            ..Default::default()
        };
        assert_eq!(expansion_kernel(&param).unwrap().parameter(), vec![0.25, -1.0]);
    }
}
