//! Training, prediction and cross-validation in the LIBSVM formulation
//!
//! C-SVC trains one binary machine per class pair (one-vs-one) and predicts
//! by majority vote. ε-SVR trains a single machine whose coefficients are
//! α⁺ − α⁻.

use crate::core::{Result, SVMError};
use crate::solver::kernel::k_function;
use crate::solver::qmatrix::{SvcQ, SvrQ};
use crate::solver::smo::{solve, DualProblem, SolverSettings};
use crate::solver::types::{SvmNode, SvmParameter, SvmProblem, SvmType};
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// A trained SVM model
///
/// For k classes, `sv_coef` is a `(k-1) × n_sv` matrix and `rho` holds one
/// bias per class pair, in the order (0,1), (0,2), …, (1,2), …
/// Support vectors are grouped by class, `n_sv[c]` of them for class `c`.
/// Regression models have a single coefficient row and a single `rho`.
#[derive(Debug, Clone, PartialEq)]
pub struct SvmModel {
    pub param: SvmParameter,
    pub nr_class: usize,
    /// Support vectors, without sentinels
    pub sv: Vec<Vec<SvmNode>>,
    pub sv_coef: Vec<Vec<f64>>,
    pub rho: Vec<f64>,
    /// Class labels in first-seen order (empty for regression)
    pub label: Vec<f64>,
    pub n_sv: Vec<usize>,
}

impl SvmModel {
    pub fn n_support_vectors(&self) -> usize {
        self.sv.len()
    }

    /// Decision values of `x`
    ///
    /// Regression returns one value; classification returns one value per
    /// class pair, positive when the first class of the pair wins.
    pub fn predict_values(&self, x: &[SvmNode]) -> Vec<f64> {
        let kvalue: Vec<f64> = self
            .sv
            .iter()
            .map(|sv| k_function(x, sv, &self.param))
            .collect();

        if !self.param.svm_type.is_classification() {
            let sum: f64 = self.sv_coef[0]
                .iter()
                .zip(&kvalue)
                .map(|(c, k)| c * k)
                .sum();
            return vec![sum - self.rho[0]];
        }

        let mut start = vec![0usize; self.nr_class];
        for c in 1..self.nr_class {
            start[c] = start[c - 1] + self.n_sv[c - 1];
        }

        let mut values = Vec::with_capacity(self.rho.len());
        let mut pair = 0;
        for i in 0..self.nr_class {
            for j in i + 1..self.nr_class {
                let (si, sj) = (start[i], start[j]);
                let (ci, cj) = (self.n_sv[i], self.n_sv[j]);
                let coef1 = &self.sv_coef[j - 1];
                let coef2 = &self.sv_coef[i];
                let mut sum: f64 = (0..ci).map(|k| coef1[si + k] * kvalue[si + k]).sum();
                sum += (0..cj).map(|k| coef2[sj + k] * kvalue[sj + k]).sum::<f64>();
                values.push(sum - self.rho[pair]);
                pair += 1;
            }
        }
        values
    }

    /// One-vs-one vote count per class, in `label` order
    pub fn votes(&self, x: &[SvmNode]) -> Vec<usize> {
        let mut votes = vec![0usize; self.nr_class];
        let values = self.predict_values(x);
        let mut pair = 0;
        for i in 0..self.nr_class {
            for j in i + 1..self.nr_class {
                if values[pair] > 0.0 {
                    votes[i] += 1;
                } else {
                    votes[j] += 1;
                }
                pair += 1;
            }
        }
        votes
    }

    /// Predicted target (regression) or label (classification)
    ///
    /// Classification ties go to the class seen first during training.
    pub fn predict(&self, x: &[SvmNode]) -> f64 {
        if !self.param.svm_type.is_classification() {
            return self.predict_values(x)[0];
        }
        let votes = self.votes(x);
        let mut best = 0;
        for (c, &v) in votes.iter().enumerate() {
            if v > votes[best] {
                best = c;
            }
        }
        self.label.get(best).copied().unwrap_or(f64::NAN)
    }
}

/// Train a model on `problem`
pub fn train(problem: &SvmProblem, param: &SvmParameter) -> Result<SvmModel> {
    param.validate()?;
    if problem.is_empty() {
        return Err(SVMError::EmptyDataset);
    }
    match param.svm_type {
        SvmType::EpsilonSvr => train_epsilon_svr(problem, param),
        SvmType::CSvc => train_c_svc(problem, param),
    }
}

fn train_epsilon_svr(problem: &SvmProblem, param: &SvmParameter) -> Result<SvmModel> {
    let l = problem.len();
    let targets = problem.targets();
    let mut p = Vec::with_capacity(2 * l);
    p.extend(targets.iter().map(|y| param.p - y));
    p.extend(targets.iter().map(|y| param.p + y));
    let mut y = vec![1.0; l];
    y.extend(std::iter::repeat(-1.0).take(l));

    let dual = DualProblem {
        p,
        y,
        alpha: vec![0.0; 2 * l],
        cp: param.c,
        cn: param.c,
    };
    let mut q = SvrQ::new(problem, param);
    let solution = solve(&mut q, dual, &SolverSettings::from(param))?;

    let mut sv = Vec::new();
    let mut coef = Vec::new();
    for i in 0..l {
        let beta = solution.alpha[i] - solution.alpha[i + l];
        if beta != 0.0 {
            sv.push(problem.row(i).to_vec());
            coef.push(beta);
        }
    }
    debug!(
        "epsilon-SVR trained in {} iterations: {} support vectors out of {l}, objective {:.6}, rho {:.6}",
        solution.iterations,
        sv.len(),
        solution.objective,
        solution.rho
    );

    Ok(SvmModel {
        param: param.clone(),
        nr_class: 2,
        n_sv: Vec::new(),
        label: Vec::new(),
        sv,
        sv_coef: vec![coef],
        rho: vec![solution.rho],
    })
}

/// Distinct labels in first-seen order and, per label, its row indices
fn group_classes(targets: &[f64]) -> (Vec<f64>, Vec<Vec<usize>>) {
    let mut labels: Vec<f64> = Vec::new();
    let mut members: Vec<Vec<usize>> = Vec::new();
    for (i, &t) in targets.iter().enumerate() {
        match labels.iter().position(|&l| l == t) {
            Some(c) => members[c].push(i),
            None => {
                labels.push(t);
                members.push(vec![i]);
            }
        }
    }
    (labels, members)
}

fn train_c_svc(problem: &SvmProblem, param: &SvmParameter) -> Result<SvmModel> {
    let (label, members) = group_classes(problem.targets());
    let nr_class = label.len();

    let mut weighted_c = vec![param.c; nr_class];
    for &(class, weight) in &param.weight {
        match label.iter().position(|&l| l == class) {
            Some(c) => weighted_c[c] *= weight,
            None => warn!("Class label {class} specified in weight is not found"),
        }
    }

    if nr_class == 1 {
        warn!("Training data contain a single class; every prediction will be {}", label[0]);
        return Ok(SvmModel {
            param: param.clone(),
            nr_class,
            sv: Vec::new(),
            sv_coef: Vec::new(),
            rho: Vec::new(),
            label,
            n_sv: vec![0],
        });
    }

    // Rows regrouped by class; `order[k]` is the original index of row k
    let order: Vec<usize> = members.iter().flatten().copied().collect();
    let mut start = vec![0usize; nr_class];
    for c in 1..nr_class {
        start[c] = start[c - 1] + members[c - 1].len();
    }
    let count: Vec<usize> = members.iter().map(Vec::len).collect();
    let l = order.len();

    let mut nonzero = vec![false; l];
    let mut pair_alpha = Vec::new();
    let mut rho = Vec::new();
    let settings = SolverSettings::from(param);

    for i in 0..nr_class {
        for j in i + 1..nr_class {
            let rows: Vec<usize> = order[start[i]..start[i] + count[i]]
                .iter()
                .chain(&order[start[j]..start[j] + count[j]])
                .copied()
                .collect();
            let sub = problem.subset(&rows);
            let mut y = vec![1.0; count[i]];
            y.extend(std::iter::repeat(-1.0).take(count[j]));

            let dual = DualProblem {
                p: vec![-1.0; rows.len()],
                y: y.clone(),
                alpha: vec![0.0; rows.len()],
                cp: weighted_c[i],
                cn: weighted_c[j],
            };
            let mut q = SvcQ::new(&sub, param, &y);
            let solution = solve(&mut q, dual, &settings)?;
            debug!(
                "Pair ({}, {}) solved in {} iterations, objective {:.6}",
                label[i], label[j], solution.iterations, solution.objective
            );
            let alpha: Vec<f64> = solution
                .alpha
                .iter()
                .zip(&y)
                .map(|(a, yi)| a * yi)
                .collect();

            for k in 0..count[i] {
                if alpha[k] != 0.0 {
                    nonzero[start[i] + k] = true;
                }
            }
            for k in 0..count[j] {
                if alpha[count[i] + k] != 0.0 {
                    nonzero[start[j] + k] = true;
                }
            }
            pair_alpha.push(alpha);
            rho.push(solution.rho);
        }
    }

    let mut n_sv = vec![0usize; nr_class];
    for c in 0..nr_class {
        n_sv[c] = (0..count[c]).filter(|&k| nonzero[start[c] + k]).count();
    }
    let sv_indices: Vec<usize> = (0..l).filter(|&k| nonzero[k]).map(|k| order[k]).collect();
    let sv: Vec<Vec<SvmNode>> = sv_indices
        .iter()
        .map(|&i| problem.row(i).to_vec())
        .collect();
    let total_sv = sv.len();

    let mut nz_start = vec![0usize; nr_class];
    for c in 1..nr_class {
        nz_start[c] = nz_start[c - 1] + n_sv[c - 1];
    }

    let mut sv_coef = vec![vec![0.0; total_sv]; nr_class - 1];
    let mut pair = 0;
    for i in 0..nr_class {
        for j in i + 1..nr_class {
            let alpha = &pair_alpha[pair];
            let mut q = nz_start[i];
            for k in 0..count[i] {
                if nonzero[start[i] + k] {
                    sv_coef[j - 1][q] = alpha[k];
                    q += 1;
                }
            }
            let mut q = nz_start[j];
            for k in 0..count[j] {
                if nonzero[start[j] + k] {
                    sv_coef[i][q] = alpha[count[i] + k];
                    q += 1;
                }
            }
            pair += 1;
        }
    }

    debug!("C-SVC trained: {nr_class} classes, {total_sv} support vectors out of {l}");

    Ok(SvmModel {
        param: param.clone(),
        nr_class,
        sv,
        sv_coef,
        rho,
        label,
        n_sv,
    })
}

/// k-fold cross-validation
///
/// Returns the held-out prediction for every row of `problem`. Rows are
/// shuffled with a generator seeded from `seed`; classification folds are
/// stratified by class. More folds than rows are reduced to one row per fold.
pub fn cross_validation(
    problem: &SvmProblem,
    param: &SvmParameter,
    folds: usize,
    seed: u64,
) -> Result<Vec<f64>> {
    let l = problem.len();
    if l < 2 {
        return Err(SVMError::InvalidDataset(format!(
            "cross-validation needs at least 2 rows, got {l}"
        )));
    }
    if folds < 2 {
        return Err(SVMError::InvalidParameter(format!(
            "cross-validation needs at least 2 folds, got {folds}"
        )));
    }
    let folds = if folds > l {
        warn!("{folds} folds requested for {l} rows, using leave-one-out");
        l
    } else {
        folds
    };

    let mut rng = StdRng::seed_from_u64(seed);
    let mut fold_members: Vec<Vec<usize>> = vec![Vec::new(); folds];

    if param.svm_type.is_classification() && folds < l {
        let (_, mut members) = group_classes(problem.targets());
        let mut next = 0;
        for class in members.iter_mut() {
            class.shuffle(&mut rng);
            for &i in class.iter() {
                fold_members[next % folds].push(i);
                next += 1;
            }
        }
    } else {
        let mut perm: Vec<usize> = (0..l).collect();
        perm.shuffle(&mut rng);
        for f in 0..folds {
            let (begin, end) = (f * l / folds, (f + 1) * l / folds);
            fold_members[f].extend_from_slice(&perm[begin..end]);
        }
    }

    let mut target = vec![0.0; l];
    for held_out in &fold_members {
        let mut in_fold = vec![false; l];
        for &i in held_out {
            in_fold[i] = true;
        }
        let train_rows: Vec<usize> = (0..l).filter(|&i| !in_fold[i]).collect();
        let model = train(&problem.subset(&train_rows), param)?;
        for &i in held_out {
            target[i] = model.predict(problem.row(i));
        }
    }
    Ok(target)
}
