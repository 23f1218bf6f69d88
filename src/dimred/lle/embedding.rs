//! # Global Embedding
//!
//! Turns reconstruction weights into low-dimensional coordinates. The cost
//! matrix `M = (I − W)ᵗ(I − W)` is decomposed densely; its eigenvectors with the
//! smallest eigenvalues give the coordinates that best preserve the local
//! weights. The very smallest one is the constant vector (eigenvalue zero) and
//! is discarded.

use crate::error::{LleError, Result};
use log::debug;
use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use nshare::{IntoNalgebra, IntoNdarray2};
use std::cmp::Ordering;

/// Low-dimensional coordinates of every point.
///
/// `coordinates` is `n_components × N`: row `d` is the eigenvector used as axis
/// `d`, column `i` is the embedded point `i`.
#[derive(Debug, Clone)]
pub struct Embedding {
    coordinates: Array2<f64>,
    eigenvalues: Array1<f64>,
    trivial_eigenvalue: f64,
}

impl Embedding {
    pub fn coordinates(&self) -> &Array2<f64> {
        &self.coordinates
    }

    pub fn into_coordinates(self) -> Array2<f64> {
        self.coordinates
    }

    /// Eigenvalues of the selected axes, ascending.
    pub fn eigenvalues(&self) -> &Array1<f64> {
        &self.eigenvalues
    }

    /// Eigenvalue of the discarded constant eigenvector, close to zero.
    pub fn trivial_eigenvalue(&self) -> f64 {
        self.trivial_eigenvalue
    }

    pub fn n_components(&self) -> usize {
        self.coordinates.nrows()
    }

    pub fn n_points(&self) -> usize {
        self.coordinates.ncols()
    }

    /// Coordinates laid out one point per row (`N × n_components`).
    pub fn to_point_major(&self) -> Array2<f64> {
        self.coordinates.t().to_owned()
    }
}

/// Builds the symmetric cost matrix `M = (I − W)ᵗ(I − W)`.
pub fn cost_matrix(weights: ArrayView2<f64>) -> Result<Array2<f64>> {
    let (n_rows, n_cols) = weights.dim();
    if n_rows != n_cols {
        return Err(LleError::invalid(format!(
            "weight matrix must be square, got {}x{}",
            n_rows, n_cols
        )));
    }

    let mut i_minus_w = weights.mapv(|w| -w);
    for i in 0..n_rows {
        i_minus_w[[i, i]] += 1.0;
    }

    let m = i_minus_w.t().dot(&i_minus_w);
    // Average with the transpose so the eigensolver sees exact symmetry
    Ok((&m + &m.t()) * 0.5)
}

/// Iteration bound used by [`compute_embedding`] for an `n_points`-sized problem.
pub fn default_max_iterations(n_points: usize) -> usize {
    (100 * n_points).max(1000)
}

/// Computes an `out_dim`-dimensional embedding from the weight matrix.
pub fn compute_embedding(out_dim: usize, weights: ArrayView2<f64>) -> Result<Embedding> {
    compute_embedding_with_limit(out_dim, weights, default_max_iterations(weights.nrows()))
}

/// Computes an `out_dim`-dimensional embedding with an explicit bound on the
/// eigensolver's iterations.
///
/// # Parameters
/// - `out_dim`: number of output axes, `1 <= out_dim <= N - 2`
/// - `weights`: N×N reconstruction weight matrix
/// - `max_iterations`: eigensolver iteration limit, `0` for unbounded
///
/// # Returns
/// - `Ok(Embedding)` holding the `out_dim × N` coordinates
/// - `Err(LleError::InvalidArgument)` for a non-square or non-finite weight
///   matrix, or an out-of-range `out_dim`
/// - `Err(LleError::DecompositionFailure)` when the eigensolver does not converge
pub fn compute_embedding_with_limit(
    out_dim: usize,
    weights: ArrayView2<f64>,
    max_iterations: usize,
) -> Result<Embedding> {
    let n_points = weights.nrows();

    if out_dim < 1 || out_dim + 2 > n_points {
        return Err(LleError::invalid(format!(
            "output dimension ({}) must be in 1..=N-2 for N = {} points",
            out_dim, n_points
        )));
    }
    if weights.iter().any(|w| !w.is_finite()) {
        return Err(LleError::invalid("weight matrix contains NaN or infinite entries"));
    }

    let cost = cost_matrix(weights)?;

    debug!(
        "Decomposing {}x{} cost matrix for {} output dimensions",
        n_points, n_points, out_dim
    );

    let (eigenvalues, eigenvectors) = decompose(cost, max_iterations)?;

    let mut order: Vec<usize> = (0..n_points).collect();
    order.sort_by(|&a, &b| {
        eigenvalues[a]
            .partial_cmp(&eigenvalues[b])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });

    let selected = &order[1..=out_dim];
    let mut coordinates = Array2::zeros((out_dim, n_points));
    for (axis, &col) in selected.iter().enumerate() {
        coordinates
            .row_mut(axis)
            .assign(&eigenvectors.column(col));
    }
    flip_signs(&mut coordinates);

    let trivial_eigenvalue = eigenvalues[order[0]];
    let selected_eigenvalues = Array1::from_iter(selected.iter().map(|&col| eigenvalues[col]));

    debug!(
        "Discarded trivial eigenvalue {:.3e}; selected eigenvalues {:?}",
        trivial_eigenvalue,
        selected_eigenvalues.to_vec()
    );

    Ok(Embedding {
        coordinates,
        eigenvalues: selected_eigenvalues,
        trivial_eigenvalue,
    })
}

fn decompose(cost: Array2<f64>, max_iterations: usize) -> Result<(Array1<f64>, Array2<f64>)> {
    let size = cost.nrows();
    let matrix: DMatrix<f64> = cost.into_nalgebra();

    let eigen = SymmetricEigen::try_new(matrix, f64::EPSILON, max_iterations)
        .ok_or(LleError::DecompositionFailure { size })?;

    let eigenvalues = Array1::from(eigen.eigenvalues.as_slice().to_vec());
    let eigenvectors: Array2<f64> = eigen.eigenvectors.into_ndarray2().into_owned();

    if eigenvalues.iter().chain(eigenvectors.iter()).any(|v| !v.is_finite()) {
        return Err(LleError::DecompositionFailure { size });
    }

    Ok((eigenvalues, eigenvectors))
}

/// Flips each row so its largest-magnitude entry is positive.
fn flip_signs(coordinates: &mut Array2<f64>) {
    for mut row in coordinates.axis_iter_mut(Axis(0)) {
        let mut pivot = 0.0f64;
        for &v in row.iter() {
            if v.abs() > pivot.abs() {
                pivot = v;
            }
        }
        if pivot < 0.0 {
            row.mapv_inplace(|v| -v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimred::lle::weights::{compute_weights, compute_weights_with, WeightConfig};
    use crate::neighbors::find_neighbors;
    use approx::assert_abs_diff_eq;
    use ndarray::{arr2, Array1, Array2};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn random_weights(n: usize, d: usize, k: usize, seed: u64) -> Array2<f64> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let points = Array2::from_shape_fn((n, d), |_| rng.random::<f64>());
        let neighbors = find_neighbors(k, points.view()).unwrap();
        compute_weights(points.view(), &neighbors).unwrap().into_matrix()
    }

    #[test]
    fn test_cost_matrix_symmetric_psd() {
        let w = random_weights(25, 4, 6, 3);
        let m = cost_matrix(w.view()).unwrap();

        for i in 0..25 {
            for j in 0..25 {
                assert_abs_diff_eq!(m[[i, j]], m[[j, i]], epsilon = 1e-12);
            }
        }

        let (eigenvalues, _) = decompose(m.clone(), 0).unwrap();
        assert!(eigenvalues.iter().all(|&v| v >= -1e-9));

        // Rows of W sum to one, so the constant vector is in the null space
        let ones = Array1::<f64>::ones(25);
        for v in m.dot(&ones).iter() {
            assert_abs_diff_eq!(*v, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_cost_matrix_rejects_non_square() {
        let w = Array2::<f64>::zeros((3, 4));
        assert!(matches!(
            cost_matrix(w.view()),
            Err(LleError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_unit_square_embedding() {
        let square = arr2(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
        let neighbors = find_neighbors(2, square.view()).unwrap();
        let w = compute_weights(square.view(), &neighbors).unwrap();

        let embedding = compute_embedding(1, w.view()).unwrap();
        assert_eq!(embedding.coordinates().dim(), (1, 4));
        assert_eq!(embedding.n_components(), 1);
        assert_eq!(embedding.n_points(), 4);

        // Spectrum of M for the 4-cycle is {0, 1, 1, 4}
        assert_abs_diff_eq!(embedding.trivial_eigenvalue(), 0.0, epsilon = 1e-10);
        assert_abs_diff_eq!(embedding.eigenvalues()[0], 1.0, epsilon = 1e-10);

        // Any vector of the degenerate eigenspace is unit length and orthogonal to the constant
        let axis = embedding.coordinates().row(0);
        assert_abs_diff_eq!(axis.sum(), 0.0, epsilon = 1e-10);
        assert_abs_diff_eq!(axis.dot(&axis), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_complete_graph_weights() {
        let w = arr2(&[[0.0, 0.5, 0.5], [0.5, 0.0, 0.5], [0.5, 0.5, 0.0]]);
        let embedding = compute_embedding(1, w.view()).unwrap();

        assert_eq!(embedding.coordinates().dim(), (1, 3));
        assert_abs_diff_eq!(embedding.eigenvalues()[0], 2.25, epsilon = 1e-10);
    }

    #[test]
    fn test_line_embedding_is_monotone() {
        let line = Array2::from_shape_fn((8, 1), |(i, _)| i as f64);
        let neighbors = find_neighbors(2, line.view()).unwrap();
        let config = WeightConfig {
            regularization: 1e-6,
            ..WeightConfig::default()
        };
        let w = compute_weights_with(line.view(), &neighbors, &config).unwrap();

        let embedding = compute_embedding(1, w.view()).unwrap();
        let axis = embedding.coordinates().row(0).to_vec();
        let increasing = axis.windows(2).all(|p| p[0] < p[1]);
        let decreasing = axis.windows(2).all(|p| p[0] > p[1]);
        assert!(increasing || decreasing, "embedding of a line is not monotone: {:?}", axis);
    }

    #[test]
    fn test_sign_convention_and_shape() {
        let w = random_weights(20, 3, 5, 9);
        let embedding = compute_embedding(3, w.view()).unwrap();

        assert_eq!(embedding.coordinates().dim(), (3, 20));
        assert_eq!(embedding.to_point_major().dim(), (20, 3));
        let eigenvalues = embedding.eigenvalues().to_vec();
        assert!(eigenvalues.windows(2).all(|p| p[0] <= p[1]));
        assert!(embedding.trivial_eigenvalue() <= embedding.eigenvalues()[0]);

        for row in embedding.coordinates().rows() {
            let pivot = row
                .iter()
                .cloned()
                .fold(0.0f64, |acc, v| if v.abs() > acc.abs() { v } else { acc });
            assert!(pivot > 0.0);
        }
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let w = random_weights(18, 3, 4, 21);
        let first = compute_embedding(2, w.view()).unwrap();
        let second = compute_embedding(2, w.view()).unwrap();
        assert_eq!(first.coordinates(), second.coordinates());
    }

    #[test]
    fn test_iteration_limit_reports_failure() {
        let w = random_weights(6, 2, 3, 5);
        assert!(matches!(
            compute_embedding_with_limit(2, w.view(), 1),
            Err(LleError::DecompositionFailure { size: 6 })
        ));
    }

    #[test]
    fn test_invalid_output_dimension() {
        let w = random_weights(5, 2, 2, 1);
        assert!(compute_embedding(0, w.view()).is_err());
        assert!(compute_embedding(4, w.view()).is_err());
        assert!(compute_embedding(3, w.view()).is_ok());

        let mut bad = w.clone();
        bad[[0, 1]] = f64::NAN;
        assert!(matches!(
            compute_embedding(1, bad.view()),
            Err(LleError::InvalidArgument(_))
        ));
    }
}
