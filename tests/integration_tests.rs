//! Integration tests for the svmeta library
//!
//! These tests verify end-to-end functionality across multiple modules
//! and validate real-world usage scenarios.

use approx::assert_relative_eq;
use std::io::Write;
use svmeta::core::{DifferentiableFunction, Sample, SvmConfig};
use svmeta::solver::{KernelType, SvmType};
use svmeta::{
    CsvLoader, KernelExpansion, LibSvmLoader, SolverAdapter, SvmClassification, SvmRegression,
};
use tempfile::NamedTempFile;

fn linear_outputs() -> (Sample, Sample) {
    let x: Vec<f64> = (0..100).map(|i| i as f64).collect();
    let y1: Vec<f64> = (0..100).map(|i| 2.0 * (i + 1) as f64).collect();
    let y2: Vec<f64> = (0..100).map(|i| (i + 4) as f64).collect();
    (
        Sample::from_columns(&[x]).unwrap(),
        Sample::from_columns(&[y1, y2]).unwrap(),
    )
}

/// Gaussian-kernel regression of two linear outputs with a full grid search
#[test]
fn test_rbf_regression_end_to_end() {
    let (x, y) = linear_outputs();
    let result = SvmRegression::new(x, y)
        .unwrap()
        .with_kernel_type(KernelType::Rbf)
        .with_tradeoffs(vec![5.0, 10.0])
        .with_kernel_parameters(vec![0.001, 0.1, 10.0, 100.0, 1.0])
        .run()
        .expect("Regression should succeed");

    assert_eq!(result.residuals.len(), 2);
    for j in 0..2 {
        assert!(
            result.residuals[j] < 1e-2,
            "residual {j} too large: {}",
            result.residuals[j]
        );
        assert!(
            result.relative_errors[j] < 1e-2,
            "relative error {j} too large: {}",
            result.relative_errors[j]
        );
        assert_eq!(result.selections[j].evaluated, 10);
        assert!(result.selections[j].min_error.is_some());
    }

    let value = result.meta_model.evaluate(&[49.5]).unwrap();
    assert!((value[0] - 101.0).abs() < 0.5);
    assert!((value[1] - 53.5).abs() < 0.5);
}

/// The extracted linear expansion reproduces the solver's own predictions
#[test]
fn test_linear_expansion_matches_solver() {
    let xs: Vec<f64> = (0..20).map(|i| i as f64 / 10.0 - 1.0).collect();
    let ys: Vec<f64> = xs.iter().map(|x| 1.5 * x - 0.2).collect();
    let inputs = Sample::from_columns(&[xs.clone()]).unwrap();

    let mut adapter = SolverAdapter::new(SvmType::EpsilonSvr, &SvmConfig::default());
    adapter.set_kernel_type(KernelType::Linear);
    adapter.set_tradeoff(10.0).unwrap();
    adapter.convert_data(&inputs, &ys).unwrap();
    adapter.train().unwrap();

    let expansion = KernelExpansion::from_trained(adapter.trained_model().unwrap()).unwrap();
    for (x, y) in xs.iter().zip(&ys) {
        let surrogate = expansion.value(&[*x]).unwrap();
        assert_relative_eq!(surrogate, adapter.predict(&[*x]).unwrap(), epsilon = 1e-9);
        assert!((surrogate - y).abs() < 1e-2);
    }
    assert_relative_eq!(expansion.gradient(&[0.0]).unwrap()[0], 1.5, epsilon = 1e-2);
}

/// Expansions of the nonlinear solver kernels agree with the solver
#[test]
fn test_nonlinear_expansions_match_solver() {
    let xs: Vec<f64> = (0..25).map(|i| i as f64 / 12.0 - 1.0).collect();
    let ys: Vec<f64> = xs.iter().map(|x| x * x - 0.5 * x).collect();
    let inputs = Sample::from_columns(&[xs.clone()]).unwrap();

    let cases = [
        (KernelType::Polynomial, 2.0, 3, 1.0),
        (KernelType::Rbf, 0.5, 3, 0.0),
        (KernelType::Sigmoid, 2.0, 3, -0.5),
    ];
    for (kernel_type, kernel_parameter, degree, constant) in cases {
        let mut adapter = SolverAdapter::new(SvmType::EpsilonSvr, &SvmConfig::default());
        adapter.set_kernel_type(kernel_type);
        adapter.set_tradeoff(10.0).unwrap();
        adapter.set_kernel_parameter(kernel_parameter).unwrap();
        adapter.set_degree(degree);
        adapter.set_constant(constant);
        adapter.convert_data(&inputs, &ys).unwrap();
        adapter.train().unwrap();

        let expansion = KernelExpansion::from_trained(adapter.trained_model().unwrap()).unwrap();
        for x in xs.iter().map(|x| x + 0.03) {
            assert_relative_eq!(
                expansion.value(&[x]).unwrap(),
                adapter.predict(&[x]).unwrap(),
                epsilon = 1e-9
            );
        }
    }
}

/// Jacobian of the composed surrogate against finite differences
#[test]
fn test_meta_model_jacobian_in_original_space() {
    let x: Vec<f64> = (0..30).map(|i| i as f64 * 0.2).collect();
    let y: Vec<f64> = x.iter().map(|v| v.sin() * 10.0 + 3.0).collect();
    let result = SvmRegression::new(
        Sample::from_columns(&[x]).unwrap(),
        Sample::from_columns(&[y]).unwrap(),
    )
    .unwrap()
    .with_kernel_parameters(vec![0.5])
    .run()
    .unwrap();

    let model = &result.meta_model;
    let h = 1e-5;
    for &x0 in &[0.7, 2.3, 4.1] {
        let fd = (model.evaluate(&[x0 + h]).unwrap()[0] - model.evaluate(&[x0 - h]).unwrap()[0])
            / (2.0 * h);
        assert_relative_eq!(model.jacobian(&[x0]).unwrap()[0][0], fd, epsilon = 1e-4);

        let gfd = (model.jacobian(&[x0 + h]).unwrap()[0][0]
            - model.jacobian(&[x0 - h]).unwrap()[0][0])
            / (2.0 * h);
        assert_relative_eq!(model.hessians(&[x0]).unwrap()[0].get(0, 0), gfd, epsilon = 1e-3);
    }
}

/// Test complete workflow: data loading -> training -> classification
#[test]
fn test_classification_workflow_libsvm() {
    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(temp_file, "+1 1:2.0 2:1.0").expect("Failed to write");
    writeln!(temp_file, "+1 1:1.8 2:1.1").expect("Failed to write");
    writeln!(temp_file, "+1 1:2.2 2:0.9").expect("Failed to write");
    writeln!(temp_file, "-1 1:-2.0 2:-1.0").expect("Failed to write");
    writeln!(temp_file, "-1 1:-1.8 2:-1.1").expect("Failed to write");
    writeln!(temp_file, "-1 1:-2.2 2:-0.9").expect("Failed to write");
    temp_file.flush().expect("Failed to flush");

    let dataset = LibSvmLoader::from_file(temp_file.path()).expect("Failed to load dataset");
    let labels = dataset.labels();
    let mut classifier = SvmClassification::new(dataset.inputs, labels)
        .unwrap()
        .with_kernel_type(KernelType::Linear);
    classifier.run().expect("Training should succeed");

    assert_relative_eq!(classifier.accuracy().unwrap(), 100.0);
    assert_eq!(classifier.classify(&[1.9, 1.0]).unwrap(), 1.0);
    assert_eq!(classifier.classify(&[-1.9, -1.0]).unwrap(), -1.0);
    assert_eq!(classifier.grade(&[1.9, 1.0], 1.0).unwrap(), 1);
    assert_eq!(classifier.decision_values(&[1.9, 1.0]).unwrap().len(), 1);
}

/// Regression straight from a CSV file with two output columns
#[test]
fn test_regression_workflow_csv() {
    let mut temp_file = NamedTempFile::with_suffix(".csv").expect("Failed to create temp file");
    writeln!(temp_file, "x1,x2,y1,y2").expect("Failed to write");
    for i in 0..25 {
        let a = i as f64 * 0.1;
        let b = (i % 5) as f64;
        writeln!(temp_file, "{a},{b},{},{}", a + b, 2.0 * a - b).expect("Failed to write");
    }
    temp_file.flush().expect("Failed to flush");

    let dataset = CsvLoader::new(2).from_file(temp_file.path()).unwrap();
    assert_eq!(dataset.inputs.dim(), 2);
    let result = SvmRegression::new(dataset.inputs, dataset.outputs)
        .unwrap()
        .with_kernel_type(KernelType::Linear)
        .run()
        .unwrap();

    let value = result.meta_model.evaluate(&[1.0, 2.0]).unwrap();
    assert!((value[0] - 3.0).abs() < 1e-2);
    assert!((value[1] - 0.0).abs() < 1e-2);
    assert!(result.relative_errors.iter().all(|e| *e < 1e-4));
}
