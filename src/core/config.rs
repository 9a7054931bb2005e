//! Solver and pipeline configuration

use crate::core::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration shared by the solver adapter, grid search and k-means
///
/// Every field has a default, so a JSON file only needs to list the values it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvmConfig {
    /// Degree of the polynomial kernel
    pub polynomial_degree: i32,
    /// Constant term of the polynomial and sigmoid kernels
    pub polynomial_constant: f64,
    /// Kernel row cache size in megabytes
    pub cache_size_mb: f64,
    /// Tolerance of the termination criterion
    pub epsilon: f64,
    /// Number of cross-validation folds
    pub folds: usize,
    /// Enable the shrinking heuristic
    pub shrinking: bool,
    /// Width of the insensitive tube in epsilon-SVR
    pub regression_epsilon: f64,
    /// Iteration cap of a single solver run
    pub max_iterations: usize,
    /// Seed for fold shuffling and k-means initialization
    pub seed: u64,
    /// Run grid-search points and output columns on the rayon pool
    pub parallel: bool,
    /// Iteration cap of k-means
    pub kmeans_max_iterations: usize,
}

impl Default for SvmConfig {
    fn default() -> Self {
        Self {
            polynomial_degree: 3,
            polynomial_constant: 0.0,
            cache_size_mb: 100.0,
            epsilon: 1e-3,
            folds: 3,
            shrinking: true,
            regression_epsilon: 1e-5,
            max_iterations: 10_000_000,
            seed: 1,
            parallel: false,
            kmeans_max_iterations: 1000,
        }
    }
}

impl SvmConfig {
    /// Load a configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}
