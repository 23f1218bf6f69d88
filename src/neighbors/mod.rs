//! # Nearest Neighbors
//!
//! Exact k-nearest-neighbor search by squared Euclidean distance. Every point is
//! compared against every other point, so the cost is O(N²·D); there is no index
//! structure.
//!
//! Ties on distance are broken by ascending point index, which keeps the result
//! deterministic for duplicated or lattice-like inputs.

use crate::error::{LleError, Result};
use log::debug;
use ndarray::{ArrayView1, ArrayView2};
use num_traits::Float;
use std::cmp::Ordering;

/// The k nearest neighbors of every point in a dataset.
///
/// Row `i` holds exactly `k` distinct indices, none equal to `i`, ordered by
/// non-decreasing distance to point `i`. The squared distances are kept in the
/// same order.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborList<T> {
    k: usize,
    n_points: usize,
    indices: Vec<usize>,
    distances: Vec<T>,
}

impl<T> NeighborList<T> {
    pub fn k(&self) -> usize {
        self.k
    }

    pub fn n_points(&self) -> usize {
        self.n_points
    }

    /// Neighbor indices of `point`, nearest first.
    pub fn neighbors_of(&self, point: usize) -> &[usize] {
        &self.indices[point * self.k..(point + 1) * self.k]
    }

    /// Squared distances from `point` to each of its neighbors.
    pub fn distances_of(&self, point: usize) -> &[T] {
        &self.distances[point * self.k..(point + 1) * self.k]
    }

    /// Iterates the neighbor rows in point order.
    pub fn iter(&self) -> impl Iterator<Item = &[usize]> + '_ {
        self.indices.chunks_exact(self.k)
    }

    /// Flat row-major view of all neighbor indices (N×k).
    pub fn as_slice(&self) -> &[usize] {
        &self.indices
    }
}

/// Squared Euclidean distance between two points of equal dimensionality.
pub fn squared_euclidean<T: Float>(a: ArrayView1<T>, b: ArrayView1<T>) -> T {
    a.iter().zip(b.iter()).fold(T::zero(), |acc, (&x, &y)| {
        let diff = x - y;
        acc + diff * diff
    })
}

/// Finds the `k` nearest neighbors of each row in `points`.
///
/// # Parameters
/// - `k`: number of neighbors per point, `1 <= k <= N - 1`
/// - `points`: N×D matrix, one point per row
///
/// # Returns
/// - `Ok(NeighborList)` with exactly `k` neighbors per point
/// - `Err(LleError::InvalidArgument)` for fewer than two points, zero-width
///   points, non-finite coordinates or squared distances, or an out-of-range `k`
pub fn find_neighbors<T: Float>(k: usize, points: ArrayView2<T>) -> Result<NeighborList<T>> {
    let (n_points, n_features) = points.dim();

    if n_points < 2 {
        return Err(LleError::invalid(format!(
            "at least 2 points are required, got {}",
            n_points
        )));
    }
    if n_features == 0 {
        return Err(LleError::invalid("points must have at least one coordinate"));
    }
    if k < 1 || k >= n_points {
        return Err(LleError::invalid(format!(
            "k ({}) must be in 1..={} for {} points",
            k,
            n_points - 1,
            n_points
        )));
    }
    if points.iter().any(|v| !v.is_finite()) {
        return Err(LleError::invalid("points contain NaN or infinite coordinates"));
    }

    let mut indices = Vec::with_capacity(n_points * k);
    let mut distances = Vec::with_capacity(n_points * k);
    let mut candidates: Vec<(T, usize)> = Vec::with_capacity(n_points - 1);

    for i in 0..n_points {
        let row_i = points.row(i);

        candidates.clear();
        for j in 0..n_points {
            if i != j {
                let dist = squared_euclidean(row_i, points.row(j));
                if !dist.is_finite() {
                    return Err(LleError::invalid(format!(
                        "squared distance between points {} and {} overflows",
                        i, j
                    )));
                }
                candidates.push((dist, j));
            }
        }

        candidates.select_nth_unstable_by(k - 1, compare_candidates);
        let nearest = &mut candidates[..k];
        nearest.sort_unstable_by(compare_candidates);

        for &(dist, j) in nearest.iter() {
            indices.push(j);
            distances.push(dist);
        }
    }

    debug!(
        "Found {} neighbors for each of {} points ({} features)",
        k, n_points, n_features
    );

    Ok(NeighborList {
        k,
        n_points,
        indices,
        distances,
    })
}

// Distances are finite here, so partial_cmp always succeeds.
fn compare_candidates<T: Float>(a: &(T, usize), b: &(T, usize)) -> Ordering {
    a.0.partial_cmp(&b.0)
        .unwrap_or(Ordering::Equal)
        .then(a.1.cmp(&b.1))
}
