//! Lloyd k-means used to tile classification problems
//!
//! Initial centroids are drawn uniformly inside the per-dimension bounding
//! box of the sample from a seeded generator, so runs are reproducible.

use crate::core::{Result, SVMError, Sample};
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// When Lloyd iterations stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConvergenceRule {
    /// Stop as soon as one centroid is unchanged by an update
    #[default]
    AnyCentroidStable,
    /// Stop once no centroid moves
    AllCentroidsStable,
}

/// Cluster assignment of every row plus the final centroids
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Clustering {
    pub assignments: Vec<usize>,
    pub centroids: Sample,
    pub iterations: usize,
}

impl Clustering {
    /// Row indices of cluster `cluster`
    pub fn members(&self, cluster: usize) -> Vec<usize> {
        self.assignments
            .iter()
            .enumerate()
            .filter(|(_, &c)| c == cluster)
            .map(|(i, _)| i)
            .collect()
    }
}

/// K-means settings
#[derive(Debug, Clone)]
pub struct KMeans {
    max_iter: usize,
    seed: u64,
    rule: ConvergenceRule,
}

impl Default for KMeans {
    fn default() -> Self {
        Self::new()
    }
}

impl KMeans {
    pub fn new() -> Self {
        Self {
            max_iter: 1000,
            seed: 1,
            rule: ConvergenceRule::default(),
        }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_rule(mut self, rule: ConvergenceRule) -> Self {
        self.rule = rule;
        self
    }

    /// Partition `sample` into `k` clusters
    ///
    /// A cluster that loses all its points moves to the origin, which is the
    /// sample mean for standardized inputs.
    pub fn cluster(&self, sample: &Sample, k: usize) -> Result<Clustering> {
        if sample.is_empty() {
            return Err(SVMError::EmptyDataset);
        }
        if k == 0 {
            return Err(SVMError::InvalidParameter(
                "number of clusters must be positive".to_string(),
            ));
        }

        let dim = sample.dim();
        let (lower, upper) = sample.bounds();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut centroids: Vec<Vec<f64>> = (0..k)
            .map(|_| {
                (0..dim)
                    .map(|j| {
                        // Interpolated so that a span wider than f64::MAX stays finite
                        let t: f64 = rng.gen();
                        (lower[j] * (1.0 - t) + upper[j] * t).max(lower[j]).min(upper[j])
                    })
                    .collect()
            })
            .collect();

        let mut assignments = vec![0; sample.len()];
        let mut iterations = 0;
        loop {
            iterations += 1;
            for (i, row) in sample.rows().enumerate() {
                assignments[i] = nearest(&centroids, row);
            }

            let mut sums = vec![vec![0.0; dim]; k];
            let mut counts = vec![0usize; k];
            for (row, &c) in sample.rows().zip(&assignments) {
                counts[c] += 1;
                for (s, v) in sums[c].iter_mut().zip(row) {
                    *s += v;
                }
            }

            let mut stable = 0;
            for c in 0..k {
                let updated: Vec<f64> = if counts[c] > 0 {
                    sums[c].iter().map(|s| s / counts[c] as f64).collect()
                } else {
                    vec![0.0; dim]
                };
                if updated == centroids[c] {
                    stable += 1;
                }
                centroids[c] = updated;
            }

            let converged = match self.rule {
                ConvergenceRule::AnyCentroidStable => stable > 0,
                ConvergenceRule::AllCentroidsStable => stable == k,
            };
            if converged {
                debug!("k-means converged after {iterations} iteration(s)");
                break;
            }
            if iterations >= self.max_iter {
                warn!("k-means stopped after {iterations} iterations without converging");
                break;
            }
        }

        Ok(Clustering {
            assignments,
            centroids: Sample::from_rows(&centroids)?,
            iterations,
        })
    }
}

fn squared_distance(x: &[f64], y: &[f64]) -> f64 {
    x.iter().zip(y).map(|(a, b)| (a - b) * (a - b)).sum()
}

/// Index of the closest centroid, the earliest on ties
pub(crate) fn nearest<C: AsRef<[f64]>>(centroids: &[C], x: &[f64]) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (c, centroid) in centroids.iter().enumerate() {
        let distance = squared_distance(centroid.as_ref(), x);
        if distance < best_distance {
            best = c;
            best_distance = distance;
        }
    }
    best
}
