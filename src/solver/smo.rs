//! Sequential Minimal Optimization (SMO) solver implementation
//!
//! Solves the generic dual problem
//!
//! ```text
//! min  ½ αᵀQα + pᵀα
//! s.t. yᵀα = Δ,  0 ≤ α_i ≤ C_i
//! ```
//!
//! with second-order working-set selection and optional shrinking. Both C-SVC
//! and ε-SVR are reduced to this form by the training routines in
//! [`crate::solver::model`].

use crate::core::{Result, SVMError};
use crate::solver::qmatrix::QMatrix;
use crate::solver::shrinking::{be_shrunk, violation_bounds, ActiveSet, AlphaStatus};
use crate::solver::types::SvmParameter;
use log::{debug, warn};

/// Lower bound on the curvature of a working-set pair
const TAU: f64 = 1e-12;

/// Termination and heuristics settings of one solver run
#[derive(Debug, Clone)]
pub struct SolverSettings {
    pub eps: f64,
    pub shrinking: bool,
    pub max_iterations: usize,
}

impl From<&SvmParameter> for SolverSettings {
    fn from(param: &SvmParameter) -> Self {
        Self {
            eps: param.eps,
            shrinking: param.shrinking,
            max_iterations: param.max_iterations,
        }
    }
}

/// Dual problem data handed to the solver
#[derive(Debug, Clone)]
pub struct DualProblem {
    /// Linear term
    pub p: Vec<f64>,
    /// ±1 per variable
    pub y: Vec<f64>,
    /// Feasible starting point
    pub alpha: Vec<f64>,
    /// Upper bound of variables with y = +1
    pub cp: f64,
    /// Upper bound of variables with y = -1
    pub cn: f64,
}

/// Result of one solver run
#[derive(Debug, Clone)]
pub struct Solution {
    pub alpha: Vec<f64>,
    pub rho: f64,
    pub objective: f64,
    pub iterations: usize,
    /// False when the iteration cap stopped the run
    pub converged: bool,
}

/// Solve a dual problem over the given Q matrix
pub fn solve<Q: QMatrix>(q: &mut Q, dual: DualProblem, settings: &SolverSettings) -> Result<Solution> {
    let l = q.size();
    if l == 0 {
        return Err(SVMError::EmptyDataset);
    }
    if dual.p.len() != l || dual.y.len() != l || dual.alpha.len() != l {
        return Err(SVMError::OptimizationError(format!(
            "dual problem has {} variables but Q has {l}",
            dual.p.len()
        )));
    }

    let mut state = SmoState::new(q, dual);
    let shrink_interval = l.min(1000);
    let mut counter = shrink_interval + 1;
    let mut iterations = 0;

    while iterations < settings.max_iterations {
        counter -= 1;
        if counter == 0 {
            counter = shrink_interval;
            if settings.shrinking {
                state.shrink(settings.eps);
            }
        }

        let (i, j) = match state.select_working_set(settings.eps) {
            Some(pair) => pair,
            None => {
                // Check optimality over the whole set before stopping
                state.reconstruct_gradient();
                state.active.activate_all();
                match state.select_working_set(settings.eps) {
                    Some(pair) => {
                        counter = 1;
                        pair
                    }
                    None => break,
                }
            }
        };

        iterations += 1;
        state.update(i, j);
    }

    let converged = iterations < settings.max_iterations;
    if !converged {
        if !state.active.is_complete() {
            state.reconstruct_gradient();
            state.active.activate_all();
        }
        warn!(
            "Solver reached the maximum of {} iterations before converging",
            settings.max_iterations
        );
    }

    let rho = state.calculate_rho();
    if !rho.is_finite() {
        return Err(SVMError::OptimizationError(
            "solver produced a non-finite bias".to_string(),
        ));
    }
    let objective = state
        .alpha
        .iter()
        .zip(state.gradient.iter().zip(&state.p))
        .map(|(a, (g, p))| a * (g + p))
        .sum::<f64>()
        / 2.0;

    debug!("SMO finished after {iterations} iterations, objective {objective:.6}, rho {rho:.6}");

    Ok(Solution {
        alpha: state.alpha,
        rho,
        objective,
        iterations,
        converged,
    })
}

struct SmoState<'q, Q: QMatrix> {
    q: &'q mut Q,
    qd: Vec<f64>,
    y: Vec<f64>,
    p: Vec<f64>,
    alpha: Vec<f64>,
    status: Vec<AlphaStatus>,
    gradient: Vec<f64>,
    /// Gradient contribution of the variables at the upper bound
    gradient_bar: Vec<f64>,
    cp: f64,
    cn: f64,
    active: ActiveSet,
}

impl<'q, Q: QMatrix> SmoState<'q, Q> {
    fn new(q: &'q mut Q, dual: DualProblem) -> Self {
        let l = q.size();
        let qd = q.diagonal().to_vec();
        let mut state = Self {
            q,
            qd,
            y: dual.y,
            gradient: dual.p.clone(),
            p: dual.p,
            alpha: dual.alpha,
            status: Vec::with_capacity(l),
            gradient_bar: vec![0.0; l],
            cp: dual.cp,
            cn: dual.cn,
            active: ActiveSet::full(l),
        };
        state.status = (0..l)
            .map(|i| AlphaStatus::of(state.alpha[i], state.upper(i)))
            .collect();

        for i in 0..l {
            if state.status[i] == AlphaStatus::LowerBound {
                continue;
            }
            let row = state.q.row(i);
            let alpha_i = state.alpha[i];
            for (g, &q_ij) in state.gradient.iter_mut().zip(row.iter()) {
                *g += alpha_i * q_ij;
            }
            if state.status[i] == AlphaStatus::UpperBound {
                let c_i = state.upper(i);
                for (g, &q_ij) in state.gradient_bar.iter_mut().zip(row.iter()) {
                    *g += c_i * q_ij;
                }
            }
        }
        state
    }

    fn upper(&self, i: usize) -> f64 {
        if self.y[i] > 0.0 {
            self.cp
        } else {
            self.cn
        }
    }

    fn is_upper(&self, i: usize) -> bool {
        self.status[i] == AlphaStatus::UpperBound
    }

    fn is_lower(&self, i: usize) -> bool {
        self.status[i] == AlphaStatus::LowerBound
    }

    /// Second-order working-set selection
    ///
    /// Returns `None` when the maximal violation is below `eps`.
    fn select_working_set(&mut self, eps: f64) -> Option<(usize, usize)> {
        let mut gmax = f64::NEG_INFINITY;
        let mut gmax2 = f64::NEG_INFINITY;
        let mut gmax_idx = None;

        for &t in self.active.members() {
            if self.y[t] > 0.0 {
                if !self.is_upper(t) && -self.gradient[t] >= gmax {
                    gmax = -self.gradient[t];
                    gmax_idx = Some(t);
                }
            } else if !self.is_lower(t) && self.gradient[t] >= gmax {
                gmax = self.gradient[t];
                gmax_idx = Some(t);
            }
        }

        let i = gmax_idx?;
        let q_i = self.q.row(i);
        let mut gmin_idx = None;
        let mut obj_diff_min = f64::INFINITY;

        for &j in self.active.members() {
            let (grad_diff, quad) = if self.y[j] > 0.0 {
                if self.is_lower(j) {
                    continue;
                }
                gmax2 = gmax2.max(self.gradient[j]);
                (
                    gmax + self.gradient[j],
                    self.qd[i] + self.qd[j] - 2.0 * self.y[i] * q_i[j],
                )
            } else {
                if self.is_upper(j) {
                    continue;
                }
                gmax2 = gmax2.max(-self.gradient[j]);
                (
                    gmax - self.gradient[j],
                    self.qd[i] + self.qd[j] + 2.0 * self.y[i] * q_i[j],
                )
            };
            if grad_diff > 0.0 {
                let obj_diff = -(grad_diff * grad_diff) / if quad > 0.0 { quad } else { TAU };
                if obj_diff <= obj_diff_min {
                    gmin_idx = Some(j);
                    obj_diff_min = obj_diff;
                }
            }
        }

        if gmax + gmax2 < eps {
            return None;
        }
        gmin_idx.map(|j| (i, j))
    }

    /// Analytic two-variable update followed by the gradient update
    fn update(&mut self, i: usize, j: usize) {
        let q_i = self.q.row(i);
        let q_j = self.q.row(j);
        let (c_i, c_j) = (self.upper(i), self.upper(j));
        let (old_ai, old_aj) = (self.alpha[i], self.alpha[j]);
        let (mut ai, mut aj) = (old_ai, old_aj);

        if self.y[i] != self.y[j] {
            let mut quad = self.qd[i] + self.qd[j] + 2.0 * q_i[j];
            if quad <= 0.0 {
                quad = TAU;
            }
            let delta = (-self.gradient[i] - self.gradient[j]) / quad;
            let diff = ai - aj;
            ai += delta;
            aj += delta;

            if diff > 0.0 {
                if aj < 0.0 {
                    aj = 0.0;
                    ai = diff;
                }
            } else if ai < 0.0 {
                ai = 0.0;
                aj = -diff;
            }
            if diff > c_i - c_j {
                if ai > c_i {
                    ai = c_i;
                    aj = c_i - diff;
                }
            } else if aj > c_j {
                aj = c_j;
                ai = c_j + diff;
            }
        } else {
            let mut quad = self.qd[i] + self.qd[j] - 2.0 * q_i[j];
            if quad <= 0.0 {
                quad = TAU;
            }
            let delta = (self.gradient[i] - self.gradient[j]) / quad;
            let sum = ai + aj;
            ai -= delta;
            aj += delta;

            if sum > c_i {
                if ai > c_i {
                    ai = c_i;
                    aj = sum - c_i;
                }
            } else if aj < 0.0 {
                aj = 0.0;
                ai = sum;
            }
            if sum > c_j {
                if aj > c_j {
                    aj = c_j;
                    ai = sum - c_j;
                }
            } else if ai < 0.0 {
                ai = 0.0;
                aj = sum;
            }
        }

        self.alpha[i] = ai;
        self.alpha[j] = aj;

        let (delta_i, delta_j) = (ai - old_ai, aj - old_aj);
        for &k in self.active.members() {
            self.gradient[k] += q_i[k] * delta_i + q_j[k] * delta_j;
        }

        for (index, row, c) in [(i, &q_i, c_i), (j, &q_j, c_j)] {
            let was_upper = self.is_upper(index);
            self.status[index] = AlphaStatus::of(self.alpha[index], c);
            if was_upper != self.is_upper(index) {
                let factor = if was_upper { -c } else { c };
                for (g, &q) in self.gradient_bar.iter_mut().zip(row.iter()) {
                    *g += factor * q;
                }
            }
        }
    }

    /// Recompute the gradient of the shrunk variables
    fn reconstruct_gradient(&mut self) {
        if self.active.is_complete() {
            return;
        }
        let inactive = self.active.inactive();
        for &j in &inactive {
            self.gradient[j] = self.gradient_bar[j] + self.p[j];
        }
        let free: Vec<usize> = self
            .active
            .members()
            .iter()
            .copied()
            .filter(|&i| self.status[i] == AlphaStatus::Free)
            .collect();
        for i in free {
            let row = self.q.row(i);
            let alpha_i = self.alpha[i];
            for &j in &inactive {
                self.gradient[j] += alpha_i * row[j];
            }
        }
    }

    fn shrink(&mut self, eps: f64) {
        let (gmax1, gmax2) =
            violation_bounds(self.active.members(), &self.y, &self.gradient, &self.status);

        if !self.active.unshrunk() && gmax1 + gmax2 <= eps * 10.0 {
            self.active.mark_unshrunk();
            self.reconstruct_gradient();
            self.active.activate_all();
            debug!("Close to the optimum, restoring all shrunk variables");
        }

        let (status, y, gradient) = (&self.status, &self.y, &self.gradient);
        self.active
            .retain(|i| !be_shrunk(status[i], y[i], gradient[i], gmax1, gmax2));
    }

    fn calculate_rho(&self) -> f64 {
        let mut upper_bound = f64::INFINITY;
        let mut lower_bound = f64::NEG_INFINITY;
        let mut free_count = 0usize;
        let mut free_sum = 0.0;

        for &i in self.active.members() {
            let y_grad = self.y[i] * self.gradient[i];
            match self.status[i] {
                AlphaStatus::UpperBound => {
                    if self.y[i] < 0.0 {
                        upper_bound = upper_bound.min(y_grad);
                    } else {
                        lower_bound = lower_bound.max(y_grad);
                    }
                }
                AlphaStatus::LowerBound => {
                    if self.y[i] > 0.0 {
                        upper_bound = upper_bound.min(y_grad);
                    } else {
                        lower_bound = lower_bound.max(y_grad);
                    }
                }
                AlphaStatus::Free => {
                    free_count += 1;
                    free_sum += y_grad;
                }
            }
        }

        if free_count > 0 {
            free_sum / free_count as f64
        } else {
            (upper_bound + lower_bound) / 2.0
        }
    }
}
