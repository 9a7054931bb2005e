//! Kernel SVM meta-models
//!
//! Fits ε-SVR regression surrogates with closed-form value, gradient and
//! Hessian, and C-SVC classifiers with one-vs-one voting. Hyperparameters are
//! chosen by cross-validated grid search over tradeoff factors and kernel
//! parameters.

pub mod adapter;
pub mod cache;
pub mod classification;
pub mod core;
pub mod data;
pub mod expansion;
pub mod kernel;
pub mod kmeans;
pub mod regression;
pub mod selection;
pub mod solver;
pub mod utils;

// Re-export main types for convenience
pub use crate::adapter::{SolverAdapter, TrainedModel};
pub use crate::cache::{CacheStats, KernelCache};
pub use crate::classification::SvmClassification;
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::core::{Result, SVMError, SvmConfig};
pub use crate::data::{CsvLoader, Dataset, LibSvmLoader};
pub use crate::expansion::{AggregatedExpansion, KernelExpansion, RegressionMetaModel};
pub use crate::kernel::{Kernel, SvmKernel};
pub use crate::kmeans::{Clustering, ConvergenceRule, KMeans};
pub use crate::regression::{RegressionResult, SvmRegression};
pub use crate::selection::{GridSearchResult, ModelSelector, SolverBackend};
pub use crate::solver::KernelType;
pub use crate::utils::scaling::{AffineTransform, Normalizer};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
