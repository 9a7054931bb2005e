//! Hyperparameter grid search
//!
//! Sweeps every (tradeoff, kernel parameter) pair with k-fold
//! cross-validation, then configures the backend with the best pair and
//! trains it once.

use crate::adapter::SolverAdapter;
use crate::core::{Result, SVMError};
use log::info;
use rayon::prelude::*;
use serde::Serialize;

/// What the grid search needs from a solver
pub trait SolverBackend {
    /// Cross-validation error of one pair; must not change the backend
    fn cross_validate(&self, tradeoff: f64, kernel_parameter: f64) -> Result<f64>;

    /// Make the pair the training parameters
    fn configure(&mut self, tradeoff: f64, kernel_parameter: f64) -> Result<()>;

    fn train(&mut self) -> Result<()>;
}

impl SolverBackend for SolverAdapter {
    fn cross_validate(&self, tradeoff: f64, kernel_parameter: f64) -> Result<f64> {
        SolverAdapter::cross_validate(self, tradeoff, kernel_parameter)
    }

    fn configure(&mut self, tradeoff: f64, kernel_parameter: f64) -> Result<()> {
        self.set_tradeoff(tradeoff)?;
        self.set_kernel_parameter(kernel_parameter)
    }

    fn train(&mut self) -> Result<()> {
        SolverAdapter::train(self)
    }
}

/// Outcome of a grid search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridSearchResult {
    pub best_tradeoff: f64,
    pub best_kernel_parameter: f64,
    /// Cross-validation error of the best pair; `None` when nothing was swept
    pub min_error: Option<f64>,
    /// Number of cross-validated pairs
    pub evaluated: usize,
}

/// Grid search over tradeoff factors and kernel parameters
#[derive(Debug, Clone)]
pub struct ModelSelector {
    tradeoffs: Vec<f64>,
    kernel_parameters: Vec<f64>,
    parallel: bool,
}

impl ModelSelector {
    /// Both lists must be non-empty
    pub fn new(tradeoffs: Vec<f64>, kernel_parameters: Vec<f64>) -> Result<Self> {
        if tradeoffs.is_empty() {
            return Err(SVMError::InvalidParameter(
                "tradeoff factor list is empty".to_string(),
            ));
        }
        if kernel_parameters.is_empty() {
            return Err(SVMError::InvalidParameter(
                "kernel parameter list is empty".to_string(),
            ));
        }
        Ok(Self {
            tradeoffs,
            kernel_parameters,
            parallel: false,
        })
    }

    /// Cross-validate the pairs on the rayon pool
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn tradeoffs(&self) -> &[f64] {
        &self.tradeoffs
    }

    pub fn kernel_parameters(&self) -> &[f64] {
        &self.kernel_parameters
    }

    /// Pairs in sweep order: tradeoff outer, kernel parameter inner
    fn grid(&self) -> Vec<(f64, f64)> {
        self.tradeoffs
            .iter()
            .flat_map(|&c| self.kernel_parameters.iter().map(move |&k| (c, k)))
            .collect()
    }

    /// Run the search, then configure and train `backend` with the winner
    ///
    /// The first pair seeds the best and only a strictly lower error replaces
    /// it, so ties go to the earliest pair. A single-pair grid skips
    /// cross-validation.
    pub fn select<B: SolverBackend + Sync>(&self, backend: &mut B) -> Result<GridSearchResult> {
        let grid = self.grid();
        let mut result = GridSearchResult {
            best_tradeoff: grid[0].0,
            best_kernel_parameter: grid[0].1,
            min_error: None,
            evaluated: 0,
        };

        if grid.len() > 1 {
            let shared: &B = backend;
            let errors: Vec<Result<f64>> = if self.parallel {
                grid.par_iter()
                    .map(|&(c, k)| shared.cross_validate(c, k))
                    .collect()
            } else {
                grid.iter()
                    .map(|&(c, k)| shared.cross_validate(c, k))
                    .collect()
            };

            for (&(c, k), error) in grid.iter().zip(errors) {
                let error = error?;
                info!("Cross validation for C={c} and kernel parameter={k} error={error}");
                let improves = result.min_error.map_or(true, |best| error < best);
                if improves {
                    result.best_tradeoff = c;
                    result.best_kernel_parameter = k;
                    result.min_error = Some(error);
                }
                result.evaluated += 1;
            }
        }

        info!(
            "Selected C={} and kernel parameter={}",
            result.best_tradeoff, result.best_kernel_parameter
        );
        backend.configure(result.best_tradeoff, result.best_kernel_parameter)?;
        backend.train()?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend whose error is a fixed function of the pair
    struct ScriptedBackend<F: Fn(f64, f64) -> f64 + Sync> {
        error: F,
        calls: AtomicUsize,
        configured: Option<(f64, f64)>,
        trained: usize,
    }

    impl<F: Fn(f64, f64) -> f64 + Sync> ScriptedBackend<F> {
        fn new(error: F) -> Self {
            Self {
                error,
                calls: AtomicUsize::new(0),
                configured: None,
                trained: 0,
            }
        }
    }

    impl<F: Fn(f64, f64) -> f64 + Sync> SolverBackend for ScriptedBackend<F> {
        fn cross_validate(&self, tradeoff: f64, kernel_parameter: f64) -> Result<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((self.error)(tradeoff, kernel_parameter))
        }

        fn configure(&mut self, tradeoff: f64, kernel_parameter: f64) -> Result<()> {
            self.configured = Some((tradeoff, kernel_parameter));
            Ok(())
        }

        fn train(&mut self) -> Result<()> {
            self.trained += 1;
            Ok(())
        }
    }

    #[test]
    fn test_single_pair_skips_cross_validation() {
        let mut backend = ScriptedBackend::new(|_, _| 1.0);
        let selector = ModelSelector::new(vec![3.0], vec![0.5]).unwrap();
        let result = selector.select(&mut backend).unwrap();

        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        assert_eq!(backend.configured, Some((3.0, 0.5)));
        assert_eq!(backend.trained, 1);
        assert_eq!(result.min_error, None);
        assert_eq!(result.evaluated, 0);
    }

    #[test]
    fn test_strict_minimum_is_selected() {
        for (tradeoffs, kernels) in [
            (vec![1.0, 10.0, 100.0], vec![0.1, 1.0]),
            (vec![100.0, 10.0, 1.0], vec![1.0, 0.1]),
        ] {
            let mut backend = ScriptedBackend::new(|c: f64, k: f64| {
                if c == 10.0 && k == 0.1 {
                    0.01
                } else {
                    1.0 + c * k
                }
            });
            let selector = ModelSelector::new(tradeoffs, kernels).unwrap();
            let result = selector.select(&mut backend).unwrap();

            assert_eq!(backend.calls.load(Ordering::SeqCst), 6);
            assert_eq!(result.best_tradeoff, 10.0);
            assert_eq!(result.best_kernel_parameter, 0.1);
            assert_eq!(result.min_error, Some(0.01));
            assert_eq!(backend.configured, Some((10.0, 0.1)));
            assert_eq!(backend.trained, 1);
        }
    }

    #[test]
    fn test_ties_go_to_first_pair() {
        let mut backend = ScriptedBackend::new(|_, _| 0.5);
        let selector = ModelSelector::new(vec![1.0, 2.0], vec![3.0, 4.0]).unwrap();
        let result = selector.select(&mut backend).unwrap();
        assert_eq!((result.best_tradeoff, result.best_kernel_parameter), (1.0, 3.0));
        assert_eq!(result.evaluated, 4);
    }

    #[test]
    fn test_first_pair_seeds_best_even_when_large() {
        // A +inf seed would still pick (1, 1); a 0.0 seed would never move
        let mut backend = ScriptedBackend::new(|c: f64, _| 10.0 / c);
        let selector = ModelSelector::new(vec![1.0, 5.0], vec![1.0]).unwrap();
        let result = selector.select(&mut backend).unwrap();
        assert_eq!(result.best_tradeoff, 5.0);
        assert_eq!(result.min_error, Some(2.0));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let error = |c: f64, k: f64| ((c - 4.0) * (k - 0.3)).abs();
        let tradeoffs = vec![1.0, 2.0, 4.0, 8.0];
        let kernels = vec![0.1, 0.3, 0.9];

        let mut sequential = ScriptedBackend::new(error);
        let expected = ModelSelector::new(tradeoffs.clone(), kernels.clone())
            .unwrap()
            .select(&mut sequential)
            .unwrap();

        let mut parallel = ScriptedBackend::new(error);
        let actual = ModelSelector::new(tradeoffs, kernels)
            .unwrap()
            .with_parallel(true)
            .select(&mut parallel)
            .unwrap();

        assert_eq!(expected, actual);
    }

    #[test]
    fn test_empty_lists_are_rejected() {
        assert!(matches!(
            ModelSelector::new(vec![], vec![1.0]),
            Err(SVMError::InvalidParameter(_))
        ));
        assert!(matches!(
            ModelSelector::new(vec![1.0], vec![]),
            Err(SVMError::InvalidParameter(_))
        ));
    }
}
