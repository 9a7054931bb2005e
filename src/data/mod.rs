//! Dense dataset loaders for the command-line front end
//!
//! Both formats produce an input [`Sample`] and an output [`Sample`]; for
//! classification the single output column holds the class labels.

pub mod csv;
pub mod libsvm;

pub use self::csv::*;
pub use self::libsvm::*;

use crate::core::{check_dimension, Result, Sample};

/// Paired input and output samples
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub inputs: Sample,
    pub outputs: Sample,
}

impl Dataset {
    pub fn new(inputs: Sample, outputs: Sample) -> Result<Self> {
        check_dimension(inputs.len(), outputs.len())?;
        Ok(Self { inputs, outputs })
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// First output column, read as class labels
    pub fn labels(&self) -> Vec<f64> {
        self.outputs.column(0)
    }
}
