//! Solver data types in the LIBSVM layout
//!
//! Training rows are sparse: each row is a run of `index:value` nodes with
//! 1-based, increasing indices, terminated by a sentinel node whose index is
//! `-1`. All rows of a problem live in one contiguous buffer.

use crate::core::{check_dimension, Result, SVMError, Sample};

/// Type of SVM formulation
///
/// Tags follow the LIBSVM numbering: `C_SVC=0, EPSILON_SVR=3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SvmType {
    /// C-Support Vector Classification
    CSvc,
    /// ε-Support Vector Regression
    EpsilonSvr,
}

impl SvmType {
    pub fn is_classification(self) -> bool {
        self == Self::CSvc
    }
}

impl TryFrom<i32> for SvmType {
    type Error = SVMError;

    fn try_from(tag: i32) -> Result<Self> {
        match tag {
            0 => Ok(Self::CSvc),
            3 => Ok(Self::EpsilonSvr),
            other => Err(SVMError::UnsupportedKernel(format!(
                "svm type tag {other} is not supported"
            ))),
        }
    }
}

/// Type of solver kernel function
///
/// Tags follow the LIBSVM numbering: `LINEAR=0, POLY=1, RBF=2, SIGMOID=3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelType {
    /// `K(x,y) = x·y`
    Linear,
    /// `K(x,y) = (γ·x·y + coef0)^degree`
    Polynomial,
    /// `K(x,y) = exp(-γ·‖x-y‖²)`
    Rbf,
    /// `K(x,y) = tanh(γ·x·y + coef0)`
    Sigmoid,
}

impl TryFrom<i32> for KernelType {
    type Error = SVMError;

    fn try_from(tag: i32) -> Result<Self> {
        match tag {
            0 => Ok(Self::Linear),
            1 => Ok(Self::Polynomial),
            2 => Ok(Self::Rbf),
            3 => Ok(Self::Sigmoid),
            other => Err(SVMError::UnsupportedKernel(format!(
                "kernel type tag {other} is not supported"
            ))),
        }
    }
}

/// A single sparse feature: `index:value`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvmNode {
    /// 1-based feature index, or [`SvmNode::END`] for the sentinel
    pub index: i32,
    pub value: f64,
}

impl SvmNode {
    /// Index of the sentinel node closing each row
    pub const END: i32 = -1;

    pub fn sentinel() -> Self {
        Self {
            index: Self::END,
            value: 0.0,
        }
    }
}

/// Dense point to sentinel-free sparse row, keeping every dimension
pub fn dense_to_nodes(point: &[f64]) -> Vec<SvmNode> {
    point
        .iter()
        .enumerate()
        .map(|(i, &value)| SvmNode {
            index: i as i32 + 1,
            value,
        })
        .collect()
}

/// Sparse row back to a dense point of dimension `dim`
pub fn nodes_to_dense(nodes: &[SvmNode], dim: usize) -> Vec<f64> {
    let mut point = vec![0.0; dim];
    for node in nodes.iter().take_while(|n| n.index != SvmNode::END) {
        let i = (node.index - 1) as usize;
        if i < dim {
            point[i] = node.value;
        }
    }
    point
}

/// A training problem: sentinel-terminated sparse rows plus one target per row
#[derive(Debug, Clone, PartialEq)]
pub struct SvmProblem {
    nodes: Vec<SvmNode>,
    starts: Vec<usize>,
    targets: Vec<f64>,
}

impl SvmProblem {
    /// Convert a dense input sample and its targets
    ///
    /// Every dimension is written, zeros included.
    pub fn from_dense(inputs: &Sample, targets: &[f64]) -> Result<Self> {
        check_dimension(inputs.len(), targets.len())?;
        if inputs.is_empty() {
            return Err(SVMError::EmptyDataset);
        }
        let mut nodes = Vec::with_capacity(inputs.len() * (inputs.dim() + 1));
        let mut starts = Vec::with_capacity(inputs.len());
        for row in inputs.rows() {
            starts.push(nodes.len());
            nodes.extend(dense_to_nodes(row));
            nodes.push(SvmNode::sentinel());
        }
        Ok(Self {
            nodes,
            starts,
            targets: targets.to_vec(),
        })
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Row `i` without its sentinel
    pub fn row(&self, i: usize) -> &[SvmNode] {
        let start = self.starts[i];
        let len = self.nodes[start..]
            .iter()
            .position(|n| n.index == SvmNode::END)
            .unwrap_or(self.nodes.len() - start);
        &self.nodes[start..start + len]
    }

    /// Row `i` including its sentinel
    pub fn raw_row(&self, i: usize) -> &[SvmNode] {
        let end = self.starts.get(i + 1).copied().unwrap_or(self.nodes.len());
        &self.nodes[self.starts[i]..end]
    }

    pub fn targets(&self) -> &[f64] {
        &self.targets
    }

    /// Problem made of the given rows, in order
    pub fn subset(&self, indices: &[usize]) -> Self {
        let mut nodes = Vec::new();
        let mut starts = Vec::with_capacity(indices.len());
        let mut targets = Vec::with_capacity(indices.len());
        for &i in indices {
            starts.push(nodes.len());
            nodes.extend_from_slice(self.raw_row(i));
            targets.push(self.targets[i]);
        }
        Self {
            nodes,
            starts,
            targets,
        }
    }
}

/// SVM parameters controlling the formulation, kernel, and solver
#[derive(Debug, Clone, PartialEq)]
pub struct SvmParameter {
    pub svm_type: SvmType,
    pub kernel_type: KernelType,
    /// Degree for polynomial kernel
    pub degree: i32,
    /// γ for RBF, polynomial, and sigmoid kernels
    pub gamma: f64,
    /// Independent term in polynomial and sigmoid kernels
    pub coef0: f64,
    /// Cache memory size in MB
    pub cache_size: f64,
    /// Stopping tolerance
    pub eps: f64,
    /// Cost parameter C
    pub c: f64,
    /// Per-class weight overrides: `(class_label, weight)` pairs
    pub weight: Vec<(f64, f64)>,
    /// ε in the ε-insensitive loss function
    pub p: f64,
    pub shrinking: bool,
    /// Iteration cap of one solver run
    pub max_iterations: usize,
}

impl Default for SvmParameter {
    fn default() -> Self {
        Self {
            svm_type: SvmType::CSvc,
            kernel_type: KernelType::Rbf,
            degree: 3,
            gamma: 1.0,
            coef0: 0.0,
            cache_size: 100.0,
            eps: 0.001,
            c: 1.0,
            weight: Vec::new(),
            p: 0.1,
            shrinking: true,
            max_iterations: 10_000_000,
        }
    }
}

impl SvmParameter {
    /// Check the parameter set before training
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(SVMError::InvalidParameter(msg));
        if !(self.c > 0.0) {
            return invalid(format!("C must be positive, got {}", self.c));
        }
        if !(self.eps > 0.0) {
            return invalid(format!("eps must be positive, got {}", self.eps));
        }
        if !(self.cache_size > 0.0) {
            return invalid(format!(
                "cache size must be positive, got {}",
                self.cache_size
            ));
        }
        if self.svm_type == SvmType::EpsilonSvr && !(self.p >= 0.0) {
            return invalid(format!("p must be non-negative, got {}", self.p));
        }
        if self.kernel_type != KernelType::Linear && !self.gamma.is_finite() {
            return invalid(format!("gamma must be finite, got {}", self.gamma));
        }
        if self.kernel_type == KernelType::Polynomial && self.degree < 0 {
            return invalid(format!(
                "polynomial degree must be non-negative, got {}",
                self.degree
            ));
        }
        if self.max_iterations == 0 {
            return invalid("max iterations must be positive".to_string());
        }
        if let Some((label, weight)) = self.weight.iter().find(|(_, w)| !(*w > 0.0)) {
            return invalid(format!(
                "weight of class {label} must be positive, got {weight}"
            ));
        }
        Ok(())
    }
}
