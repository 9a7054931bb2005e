//! Q matrices of the dual problems
//!
//! C-SVC uses `Q[i][j] = y_i y_j K(x_i, x_j)`. ε-SVR has 2l variables
//! (α⁺ and α⁻); its Q is the kernel matrix tiled twice with signs.

use crate::cache::KernelCache;
use crate::solver::kernel::ProblemKernel;
use crate::solver::types::{SvmParameter, SvmProblem};
use std::sync::Arc;

/// Row access to the Q matrix, as consumed by the SMO solver
pub trait QMatrix {
    /// Number of dual variables
    fn size(&self) -> usize;

    /// Full row `i` of Q
    fn row(&mut self, i: usize) -> Arc<[f64]>;

    /// Diagonal of Q
    fn diagonal(&self) -> &[f64];
}

fn cache_bytes(param: &SvmParameter) -> usize {
    (param.cache_size * 1024.0 * 1024.0) as usize
}

/// Q matrix for C-SVC
pub struct SvcQ<'a> {
    kernel: ProblemKernel<'a>,
    cache: KernelCache,
    y: Vec<f64>,
    qd: Vec<f64>,
}

impl<'a> SvcQ<'a> {
    /// `y` holds ±1 per row of `problem`
    pub fn new(problem: &'a SvmProblem, param: &'a SvmParameter, y: &[f64]) -> Self {
        let kernel = ProblemKernel::new(problem, param);
        let l = kernel.len();
        let qd = (0..l).map(|i| kernel.evaluate(i, i)).collect();
        Self {
            kernel,
            cache: KernelCache::with_memory_limit(cache_bytes(param), l),
            y: y.to_vec(),
            qd,
        }
    }
}

impl QMatrix for SvcQ<'_> {
    fn size(&self) -> usize {
        self.y.len()
    }

    fn row(&mut self, i: usize) -> Arc<[f64]> {
        let (kernel, y) = (&self.kernel, &self.y);
        self.cache.get_or_insert_with(i, || {
            (0..y.len())
                .map(|j| y[i] * y[j] * kernel.evaluate(i, j))
                .collect()
        })
    }

    fn diagonal(&self) -> &[f64] {
        &self.qd
    }
}

/// Q matrix for ε-SVR
///
/// The cache holds plain kernel rows of the l data points; `row` expands them
/// to the 2l variables.
pub struct SvrQ<'a> {
    kernel: ProblemKernel<'a>,
    cache: KernelCache,
    l: usize,
    qd: Vec<f64>,
}

impl<'a> SvrQ<'a> {
    pub fn new(problem: &'a SvmProblem, param: &'a SvmParameter) -> Self {
        let kernel = ProblemKernel::new(problem, param);
        let l = kernel.len();
        let diagonal: Vec<f64> = (0..l).map(|i| kernel.evaluate(i, i)).collect();
        let qd = diagonal.iter().chain(&diagonal).copied().collect();
        Self {
            kernel,
            cache: KernelCache::with_memory_limit(cache_bytes(param), l),
            l,
            qd,
        }
    }

    fn sign(&self, k: usize) -> f64 {
        if k < self.l {
            1.0
        } else {
            -1.0
        }
    }
}

impl QMatrix for SvrQ<'_> {
    fn size(&self) -> usize {
        2 * self.l
    }

    fn row(&mut self, i: usize) -> Arc<[f64]> {
        let l = self.l;
        let real_i = i % l;
        let kernel = &self.kernel;
        let data = self
            .cache
            .get_or_insert_with(real_i, || (0..l).map(|j| kernel.evaluate(real_i, j)).collect());
        let si = self.sign(i);
        (0..2 * l)
            .map(|j| si * self.sign(j) * data[j % l])
            .collect::<Vec<f64>>()
            .into()
    }

    fn diagonal(&self) -> &[f64] {
        &self.qd
    }
}
