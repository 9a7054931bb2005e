//! Kernel evaluation on sparse node rows

use crate::solver::types::{KernelType, SvmNode, SvmParameter, SvmProblem};

/// Sparse dot product of two index-sorted rows (merge, O(n + m))
pub fn dot(x: &[SvmNode], y: &[SvmNode]) -> f64 {
    let mut sum = 0.0;
    let (mut ix, mut iy) = (0, 0);
    while ix < x.len() && iy < y.len() {
        if x[ix].index == y[iy].index {
            sum += x[ix].value * y[iy].value;
            ix += 1;
            iy += 1;
        } else if x[ix].index > y[iy].index {
            iy += 1;
        } else {
            ix += 1;
        }
    }
    sum
}

/// Kernel value K(x, y) for the given parameters
pub fn k_function(x: &[SvmNode], y: &[SvmNode], param: &SvmParameter) -> f64 {
    match param.kernel_type {
        KernelType::Linear => dot(x, y),
        KernelType::Polynomial => (param.gamma * dot(x, y) + param.coef0).powi(param.degree),
        KernelType::Rbf => {
            let sq_dist = dot(x, x) + dot(y, y) - 2.0 * dot(x, y);
            (-param.gamma * sq_dist.max(0.0)).exp()
        }
        KernelType::Sigmoid => (param.gamma * dot(x, y) + param.coef0).tanh(),
    }
}

/// Kernel evaluator over the rows of one training problem
///
/// Squared norms are precomputed for the RBF kernel.
pub struct ProblemKernel<'a> {
    problem: &'a SvmProblem,
    param: &'a SvmParameter,
    x_square: Vec<f64>,
}

impl<'a> ProblemKernel<'a> {
    pub fn new(problem: &'a SvmProblem, param: &'a SvmParameter) -> Self {
        let x_square = if param.kernel_type == KernelType::Rbf {
            (0..problem.len())
                .map(|i| dot(problem.row(i), problem.row(i)))
                .collect()
        } else {
            Vec::new()
        };
        Self {
            problem,
            param,
            x_square,
        }
    }

    /// K(x_i, x_j)
    pub fn evaluate(&self, i: usize, j: usize) -> f64 {
        let (xi, xj) = (self.problem.row(i), self.problem.row(j));
        match self.param.kernel_type {
            KernelType::Rbf => {
                let sq_dist = self.x_square[i] + self.x_square[j] - 2.0 * dot(xi, xj);
                (-self.param.gamma * sq_dist.max(0.0)).exp()
            }
            _ => k_function(xi, xj, self.param),
        }
    }

    pub fn len(&self) -> usize {
        self.problem.len()
    }
}
