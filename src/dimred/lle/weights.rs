//! # Reconstruction Weights
//!
//! Fits, for every point, the affine combination of its neighbors that best
//! reconstructs it. The weights of a point minimise `‖X_i − Σ w_j X_{n_j}‖²`
//! subject to `Σ w_j = 1`, which reduces to solving `C·w = 1` on the local Gram
//! matrix `C = ZᵗZ` of neighbor offsets and rescaling `w` to unit sum.
//!
//! When a point has more neighbors than the space has dimensions, `C` is rank
//! deficient and gets a ridge of `regularization · trace(C)` on its diagonal.

use crate::error::{LleError, Result};
use crate::neighbors::NeighborList;
use log::{debug, warn};
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2, ArrayView2};

/// Ridge factor applied to the local Gram matrix when `k > D`.
pub const DEFAULT_REGULARIZATION: f64 = 1e-3;

/// What to do when a point's local system cannot be solved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconstructionPolicy {
    /// Abort the whole computation with [`LleError::ReconstructionFailure`].
    #[default]
    Fail,
    /// Give the point uniform weights `1/k` and record it as a fallback.
    UniformFallback,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightConfig {
    pub regularization: f64,
    pub policy: ReconstructionPolicy,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            regularization: DEFAULT_REGULARIZATION,
            policy: ReconstructionPolicy::Fail,
        }
    }
}

/// Dense N×N reconstruction weight matrix.
///
/// Row `i` is zero outside the neighbor columns of point `i`, and its entries
/// sum to one.
#[derive(Debug, Clone)]
pub struct ReconstructionWeights {
    weights: Array2<f64>,
    fallback_points: Vec<usize>,
}

impl ReconstructionWeights {
    pub fn matrix(&self) -> &Array2<f64> {
        &self.weights
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.weights.view()
    }

    pub fn into_matrix(self) -> Array2<f64> {
        self.weights
    }

    /// Points whose weights were replaced by the uniform fallback, ascending.
    pub fn fallback_points(&self) -> &[usize] {
        &self.fallback_points
    }

    pub fn n_points(&self) -> usize {
        self.weights.nrows()
    }
}

/// Computes reconstruction weights with the default regularization and the
/// [`ReconstructionPolicy::Fail`] policy.
pub fn compute_weights<T>(
    points: ArrayView2<f64>,
    neighbors: &NeighborList<T>,
) -> Result<ReconstructionWeights> {
    compute_weights_with(points, neighbors, &WeightConfig::default())
}

/// Computes reconstruction weights for every point.
///
/// # Parameters
/// - `points`: N×D input matrix, one point per row
/// - `neighbors`: neighbor list computed on the same points
/// - `config`: regularization factor and failure policy
///
/// # Returns
/// - `Ok(ReconstructionWeights)`: N×N matrix with unit row sums
/// - `Err(LleError::InvalidArgument)`: neighbor list and points disagree, or the
///   regularization factor is negative or not finite
/// - `Err(LleError::ReconstructionFailure)`: a local system was singular and the
///   policy is [`ReconstructionPolicy::Fail`]
pub fn compute_weights_with<T>(
    points: ArrayView2<f64>,
    neighbors: &NeighborList<T>,
    config: &WeightConfig,
) -> Result<ReconstructionWeights> {
    let (n_points, n_features) = points.dim();

    if neighbors.n_points() != n_points {
        return Err(LleError::invalid(format!(
            "neighbor list covers {} points but {} points were given",
            neighbors.n_points(),
            n_points
        )));
    }
    if !(config.regularization.is_finite() && config.regularization >= 0.0) {
        return Err(LleError::invalid(format!(
            "regularization must be a non-negative finite number, got {}",
            config.regularization
        )));
    }

    let k = neighbors.k();
    let regularization = (k > n_features).then_some(config.regularization);

    debug!(
        "Computing reconstruction weights: {} points, k = {}, {} features, regularized: {}",
        n_points,
        k,
        n_features,
        regularization.is_some()
    );

    let mut weights = Array2::zeros((n_points, n_points));
    let mut fallback_points = Vec::new();

    for i in 0..n_points {
        let point_neighbors = neighbors.neighbors_of(i);

        let w = match solve_local_weights(points, i, point_neighbors, regularization) {
            Ok(w) => w,
            Err(reason) => match config.policy {
                ReconstructionPolicy::Fail => {
                    return Err(LleError::ReconstructionFailure { point: i, reason });
                }
                ReconstructionPolicy::UniformFallback => {
                    warn!("Point {}: {}; using uniform weights", i, reason);
                    fallback_points.push(i);
                    DVector::from_element(k, 1.0 / k as f64)
                }
            },
        };

        for (j, &neighbor) in point_neighbors.iter().enumerate() {
            weights[[i, neighbor]] = w[j];
        }
    }

    if !fallback_points.is_empty() {
        warn!(
            "{} of {} points fell back to uniform reconstruction weights",
            fallback_points.len(),
            n_points
        );
    }

    Ok(ReconstructionWeights {
        weights,
        fallback_points,
    })
}

fn solve_local_weights(
    points: ArrayView2<f64>,
    point: usize,
    neighbors: &[usize],
    regularization: Option<f64>,
) -> std::result::Result<DVector<f64>, String> {
    let n_features = points.ncols();
    let k = neighbors.len();

    // Column j holds the offset of neighbor j from the point
    let z = DMatrix::from_fn(n_features, k, |d, j| {
        points[[neighbors[j], d]] - points[[point, d]]
    });
    let mut gram = z.transpose() * &z;

    let trace = gram.trace();
    if !(trace.is_finite() && trace > 0.0) {
        return Err(format!("local covariance has degenerate trace {}", trace));
    }

    if let Some(eps) = regularization {
        let ridge = eps * trace;
        for j in 0..k {
            gram[(j, j)] += ridge;
        }
    }

    let cholesky = gram
        .cholesky()
        .ok_or_else(|| "local covariance is not positive definite".to_string())?;
    let w = cholesky.solve(&DVector::from_element(k, 1.0));

    if w.iter().any(|v| !v.is_finite()) {
        return Err("local solve produced non-finite weights".to_string());
    }

    let sum = w.sum();
    if !sum.is_finite() || sum == 0.0 {
        return Err(format!("local weights cannot be normalised (sum = {})", sum));
    }

    Ok(w / sum)
}

/// Squared reconstruction error `‖X_i − Σ_j W_ij X_j‖²` of every point.
pub fn reconstruction_errors(points: ArrayView2<f64>, weights: ArrayView2<f64>) -> Result<Array1<f64>> {
    let n_points = points.nrows();
    if weights.dim() != (n_points, n_points) {
        return Err(LleError::invalid(format!(
            "weight matrix is {:?}, expected {}x{}",
            weights.dim(),
            n_points,
            n_points
        )));
    }

    let reconstructed = weights.dot(&points);
    let residual = &points - &reconstructed;
    Ok(residual.map_axis(ndarray::Axis(1), |row| row.dot(&row)))
}
