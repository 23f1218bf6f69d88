//! # Locally Linear Embedding
//!
//! LLE describes every point as an affine combination of its nearest neighbors
//! and then looks for low-dimensional coordinates that keep those combinations
//! intact. The computation runs in three stages, each usable on its own:
//!
//! 1. [`find_neighbors`](crate::neighbors::find_neighbors): brute-force kNN
//! 2. [`compute_weights`]: local reconstruction weights
//! 3. [`compute_embedding`]: bottom eigenvectors of `(I − W)ᵗ(I − W)`
//!
//! [`LocallyLinearEmbedding`] validates the arguments once and chains the
//! stages. It holds configuration only, so a single instance can be shared
//! between threads and reused for any number of datasets.

mod embedding;
mod weights;

pub use embedding::{
    compute_embedding, compute_embedding_with_limit, cost_matrix, default_max_iterations,
    Embedding,
};
pub use weights::{
    compute_weights, compute_weights_with, reconstruction_errors, ReconstructionPolicy,
    ReconstructionWeights, WeightConfig, DEFAULT_REGULARIZATION,
};

use crate::error::{LleError, Result};
use crate::neighbors::{find_neighbors, NeighborList};
use log::info;
use ndarray::{Array2, ArrayView2};

pub struct LLEBuilder {
    n_neighbors: usize,
    n_components: usize,
    regularization: f64,
    policy: ReconstructionPolicy,
    max_eigen_iterations: Option<usize>,
}

impl LLEBuilder {
    pub fn new() -> Self {
        LLEBuilder {
            n_neighbors: 5,
            n_components: 2,
            regularization: DEFAULT_REGULARIZATION,
            policy: ReconstructionPolicy::Fail,
            max_eigen_iterations: None,
        }
    }

    pub fn n_neighbors(mut self, n_neighbors: usize) -> Self {
        self.n_neighbors = n_neighbors;
        self
    }

    pub fn n_components(mut self, n_components: usize) -> Self {
        self.n_components = n_components;
        self
    }

    /// Ridge factor applied to the local Gram matrix when `k` exceeds the
    /// input dimensionality.
    pub fn regularization(mut self, regularization: f64) -> Self {
        self.regularization = regularization;
        self
    }

    pub fn reconstruction_policy(mut self, policy: ReconstructionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Caps the eigensolver iterations; `0` removes the cap. Without this the
    /// cap is [`default_max_iterations`] of the dataset size.
    pub fn max_eigen_iterations(mut self, max_iterations: usize) -> Self {
        self.max_eigen_iterations = Some(max_iterations);
        self
    }

    pub fn build(self) -> LocallyLinearEmbedding {
        LocallyLinearEmbedding {
            n_neighbors: self.n_neighbors,
            n_components: self.n_components,
            weight_config: WeightConfig {
                regularization: self.regularization,
                policy: self.policy,
            },
            max_eigen_iterations: self.max_eigen_iterations,
        }
    }
}

impl Default for LLEBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct LocallyLinearEmbedding {
    n_neighbors: usize,
    n_components: usize,
    weight_config: WeightConfig,
    max_eigen_iterations: Option<usize>,
}

/// Result of one LLE run, with every intermediate stage.
#[derive(Debug, Clone)]
pub struct LleFit {
    neighbors: NeighborList<f64>,
    weights: ReconstructionWeights,
    embedding: Embedding,
}

impl LleFit {
    pub fn neighbors(&self) -> &NeighborList<f64> {
        &self.neighbors
    }

    pub fn weights(&self) -> &ReconstructionWeights {
        &self.weights
    }

    pub fn embedding(&self) -> &Embedding {
        &self.embedding
    }

    /// `n_components × N` coordinates, one column per point.
    pub fn coordinates(&self) -> &Array2<f64> {
        self.embedding.coordinates()
    }

    /// `N × n_components` coordinates, one row per point.
    pub fn to_point_major(&self) -> Array2<f64> {
        self.embedding.to_point_major()
    }
}

impl LocallyLinearEmbedding {
    pub fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    pub fn n_components(&self) -> usize {
        self.n_components
    }

    pub fn weight_config(&self) -> &WeightConfig {
        &self.weight_config
    }

    /// Checks the configuration against an `n_points × n_features` dataset.
    pub fn validate(&self, n_points: usize, n_features: usize) -> Result<()> {
        if n_points < 2 {
            return Err(LleError::invalid(format!(
                "at least 2 points are required, got {}",
                n_points
            )));
        }
        if n_features < 1 {
            return Err(LleError::invalid("points must have at least one coordinate"));
        }
        if self.n_neighbors < 1 || self.n_neighbors >= n_points {
            return Err(LleError::invalid(format!(
                "n_neighbors ({}) must be in 1..={} for {} points",
                self.n_neighbors,
                n_points - 1,
                n_points
            )));
        }
        if self.n_components < 1 || self.n_components + 2 > n_points {
            return Err(LleError::invalid(format!(
                "n_components ({}) must be in 1..={} for {} points",
                self.n_components,
                n_points.saturating_sub(2),
                n_points
            )));
        }
        if !(self.weight_config.regularization.is_finite()
            && self.weight_config.regularization >= 0.0)
        {
            return Err(LleError::invalid(format!(
                "regularization must be a non-negative finite number, got {}",
                self.weight_config.regularization
            )));
        }
        Ok(())
    }

    /// Runs the full pipeline on `x` (one point per row).
    ///
    /// # Returns
    /// - `Ok(LleFit)`: neighbors, weights and the `n_components × N` embedding
    /// - `Err(LleError)`: invalid arguments, an unsolvable local system (under
    ///   [`ReconstructionPolicy::Fail`]) or a non-converging eigensolver
    pub fn fit(&self, x: ArrayView2<f64>) -> Result<LleFit> {
        let (n_points, n_features) = x.dim();
        self.validate(n_points, n_features)?;

        let neighbors = find_neighbors(self.n_neighbors, x)?;
        let weights = compute_weights_with(x, &neighbors, &self.weight_config)?;

        let max_iterations = self
            .max_eigen_iterations
            .unwrap_or_else(|| default_max_iterations(n_points));
        let embedding = compute_embedding_with_limit(self.n_components, weights.view(), max_iterations)?;

        info!(
            "Embedded {} points from {} to {} dimensions (k = {}, {} fallback points)",
            n_points,
            n_features,
            self.n_components,
            self.n_neighbors,
            weights.fallback_points().len()
        );

        Ok(LleFit {
            neighbors,
            weights,
            embedding,
        })
    }

    /// Runs the pipeline and returns `N × n_components` coordinates.
    pub fn fit_transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        Ok(self.fit(x)?.to_point_major())
    }
}
