//! SVM classification with one-vs-one voting
//!
//! Inputs are standardized, a C-SVC is selected by grid search and trained on
//! the whole sample, or on each k-means tile with [`SvmClassification::run_clustered`].

use crate::adapter::SolverAdapter;
use crate::core::{check_dimension, Result, SVMError, Sample, SvmConfig};
use crate::kmeans::{nearest, ConvergenceRule, KMeans};
use crate::selection::{GridSearchResult, ModelSelector};
use crate::solver::{KernelType, SvmType};
use crate::utils::scaling::{AffineTransform, Normalizer};
use log::{info, warn};

/// A trained classifier together with the centroid it answers for
#[derive(Debug)]
struct Tile {
    centroid: Vec<f64>,
    adapter: SolverAdapter,
    selection: GridSearchResult,
}

#[derive(Debug)]
struct Fitted {
    input_transform: AffineTransform,
    tiles: Vec<Tile>,
    accuracy: f64,
}

/// Classification driver
#[derive(Debug)]
pub struct SvmClassification {
    inputs: Sample,
    labels: Vec<f64>,
    tradeoffs: Vec<f64>,
    kernel_parameters: Vec<f64>,
    kernel_type: KernelType,
    weights: Vec<f64>,
    config: SvmConfig,
    convergence_rule: ConvergenceRule,
    fitted: Option<Fitted>,
}

impl SvmClassification {
    pub fn new(inputs: Sample, labels: Vec<f64>) -> Result<Self> {
        if inputs.is_empty() {
            return Err(SVMError::EmptyDataset);
        }
        check_dimension(inputs.len(), labels.len())?;
        Ok(Self {
            inputs,
            labels,
            tradeoffs: vec![10.0],
            kernel_parameters: vec![1.0],
            kernel_type: KernelType::Rbf,
            weights: Vec::new(),
            config: SvmConfig::default(),
            convergence_rule: ConvergenceRule::default(),
            fitted: None,
        })
    }

    pub fn with_tradeoffs(mut self, tradeoffs: Vec<f64>) -> Self {
        self.tradeoffs = tradeoffs;
        self
    }

    pub fn with_kernel_parameters(mut self, kernel_parameters: Vec<f64>) -> Self {
        self.kernel_parameters = kernel_parameters;
        self
    }

    pub fn with_kernel_type(mut self, kernel_type: KernelType) -> Self {
        self.kernel_type = kernel_type;
        self
    }

    pub fn with_config(mut self, config: SvmConfig) -> Self {
        self.config = config;
        self
    }

    /// Stop rule used by [`run_clustered`](Self::run_clustered)
    pub fn with_convergence_rule(mut self, rule: ConvergenceRule) -> Self {
        self.convergence_rule = rule;
        self
    }

    /// Class weights, matched to the distinct labels in first-seen order
    pub fn set_weights(&mut self, weights: Vec<f64>) -> Result<()> {
        let classes = self.classes();
        if weights.len() > classes.len() {
            return Err(SVMError::InvalidParameter(format!(
                "{} weights given for {} classes",
                weights.len(),
                classes.len()
            )));
        }
        if let Some(w) = weights.iter().find(|w| !(**w > 0.0)) {
            return Err(SVMError::InvalidParameter(format!(
                "class weights must be positive, got {w}"
            )));
        }
        info!("Labels found: {classes:?}");
        self.weights = weights;
        Ok(())
    }

    /// Distinct labels in first-seen order
    pub fn classes(&self) -> Vec<f64> {
        let mut classes: Vec<f64> = Vec::new();
        for &label in &self.labels {
            if !classes.contains(&label) {
                classes.push(label);
            }
        }
        classes
    }

    fn weight_pairs(&self) -> Vec<(f64, f64)> {
        self.classes()
            .into_iter()
            .zip(self.weights.iter().copied())
            .collect()
    }

    /// Select and train one classifier on a normalized subset
    fn fit_tile(&self, selector: &ModelSelector, inputs: &Sample, labels: &[f64]) -> Result<Tile> {
        let mut adapter = SolverAdapter::new(SvmType::CSvc, &self.config);
        adapter.set_kernel_type(self.kernel_type);
        adapter.set_weights(self.weight_pairs());
        adapter.convert_data(inputs, labels)?;

        let single_class = labels.iter().all(|&l| l == labels[0]);
        let selection = if single_class || labels.len() < 2 {
            // Nothing to cross-validate; train with the first pair
            ModelSelector::new(vec![self.tradeoffs[0]], vec![self.kernel_parameters[0]])?
                .select(&mut adapter)?
        } else {
            selector.select(&mut adapter)?
        };
        Ok(Tile {
            centroid: Vec::new(),
            adapter,
            selection,
        })
    }

    fn selector(&self) -> Result<ModelSelector> {
        Ok(
            ModelSelector::new(self.tradeoffs.clone(), self.kernel_parameters.clone())?
                .with_parallel(self.config.parallel),
        )
    }

    /// Train one classifier on the whole sample
    pub fn run(&mut self) -> Result<()> {
        let selector = self.selector()?;
        let (inputs, input_transform, _) = Normalizer::fit_transform(&self.inputs)?;
        let tile = self.fit_tile(&selector, &inputs, &self.labels)?;
        let accuracy = tile.adapter.accuracy()?;
        info!(
            "Classifier trained with C={} kernel parameter={} accuracy={accuracy}%",
            tile.selection.best_tradeoff, tile.selection.best_kernel_parameter
        );
        self.fitted = Some(Fitted {
            input_transform,
            tiles: vec![tile],
            accuracy,
        });
        Ok(())
    }

    /// Tile the input space with k-means and train one classifier per cluster
    ///
    /// Accuracy is the percentage of rows whose tile classifier reproduces
    /// their label. Empty clusters get no classifier.
    pub fn run_clustered(&mut self, k: usize) -> Result<()> {
        let selector = self.selector()?;
        let (inputs, input_transform, _) = Normalizer::fit_transform(&self.inputs)?;
        let clustering = KMeans::new()
            .with_max_iter(self.config.kmeans_max_iterations)
            .with_seed(self.config.seed)
            .with_rule(self.convergence_rule)
            .cluster(&inputs, k)?;

        let mut tiles = Vec::new();
        let mut agreeing = 0usize;
        for cluster in 0..k {
            let members = clustering.members(cluster);
            if members.is_empty() {
                warn!("Cluster {cluster} is empty, no classifier trained for it");
                continue;
            }
            let tile_inputs = inputs.select(&members);
            let tile_labels: Vec<f64> = members.iter().map(|&i| self.labels[i]).collect();
            let mut tile = self.fit_tile(&selector, &tile_inputs, &tile_labels)?;
            for (row, &label) in tile_inputs.rows().zip(&tile_labels) {
                if tile.adapter.predict(row)? == label {
                    agreeing += 1;
                }
            }
            info!(
                "Cluster {cluster}: {} rows, C={} kernel parameter={}",
                members.len(),
                tile.selection.best_tradeoff,
                tile.selection.best_kernel_parameter
            );
            tile.centroid = clustering.centroids.row(cluster).to_vec();
            tiles.push(tile);
        }

        let accuracy = agreeing as f64 / self.inputs.len() as f64 * 100.0;
        info!("Clustered classification accuracy={accuracy}%");
        self.fitted = Some(Fitted {
            input_transform,
            tiles,
            accuracy,
        });
        Ok(())
    }

    fn fitted(&self) -> Result<&Fitted> {
        self.fitted.as_ref().ok_or(SVMError::ModelNotTrained)
    }

    /// Normalized point and the classifier responsible for it
    fn route(&self, x: &[f64]) -> Result<(Vec<f64>, &SolverAdapter)> {
        let fitted = self.fitted()?;
        let point = fitted.input_transform.apply(x)?;
        let tile = if fitted.tiles.len() == 1 {
            &fitted.tiles[0]
        } else {
            let centroids: Vec<&[f64]> = fitted.tiles.iter().map(|t| t.centroid.as_slice()).collect();
            &fitted.tiles[nearest(&centroids, &point)]
        };
        Ok((point, &tile.adapter))
    }

    /// Label with the most votes; ties go to the earliest class
    pub fn classify(&self, x: &[f64]) -> Result<f64> {
        let (point, adapter) = self.route(x)?;
        adapter.predict(&point)
    }

    /// Votes `x` collects for `label`
    pub fn grade(&self, x: &[f64], label: f64) -> Result<usize> {
        let (point, adapter) = self.route(x)?;
        adapter.grade(&point, label)
    }

    /// Pairwise decision values, class pairs `i < j` in first-seen order
    pub fn decision_values(&self, x: &[f64]) -> Result<Vec<f64>> {
        let (point, adapter) = self.route(x)?;
        adapter.decision_values(&point)
    }

    /// Training accuracy in percent
    pub fn accuracy(&self) -> Result<f64> {
        Ok(self.fitted()?.accuracy)
    }

    /// Selected hyperparameters, one entry per trained classifier
    pub fn selections(&self) -> Result<Vec<GridSearchResult>> {
        Ok(self
            .fitted()?
            .tiles
            .iter()
            .map(|t| t.selection.clone())
            .collect())
    }
}
