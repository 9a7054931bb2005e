//! SVM solver in the LIBSVM formulation
//!
//! This module implements Sequential Minimal Optimization with second-order
//! working-set selection and shrinking, for C-SVC (one-vs-one multi-class,
//! per-class weights) and ε-SVR. The rest of the crate reaches it only
//! through [`crate::adapter::SolverAdapter`].

pub mod kernel;
pub mod model;
pub mod qmatrix;
pub mod shrinking;
pub mod smo;
pub mod types;

pub use self::model::{cross_validation, train, SvmModel};
pub use self::types::*;
