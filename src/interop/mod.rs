//! # Flat Buffer Interop
//!
//! Callers outside Rust hand over points as one contiguous row-major buffer and
//! expect the embedding back the same way. This module converts between those
//! buffers and the matrices used by [`crate::dimred::lle`]; it does no numerical
//! work of its own. The C ABI lives in [`ffi`].
//!
//! Layouts:
//! - input: point `i` occupies `data[i * in_dim .. (i + 1) * in_dim]`
//! - output: point `i` occupies `out[i * out_dim .. (i + 1) * out_dim]`

pub mod ffi;

use crate::dimred::lle::LLEBuilder;
use crate::error::{LleError, Result};
use ndarray::{Array2, ArrayView2};

/// Reshapes a row-major `num_points × in_dim` buffer into a point matrix.
pub fn points_from_flat(data: &[f64], num_points: usize, in_dim: usize) -> Result<Array2<f64>> {
    let expected = num_points.checked_mul(in_dim).ok_or_else(|| {
        LleError::invalid(format!(
            "{} points of dimension {} overflow the buffer size",
            num_points, in_dim
        ))
    })?;

    if data.len() != expected {
        return Err(LleError::invalid(format!(
            "buffer holds {} values, expected {} ({} points x {} dimensions)",
            data.len(),
            expected,
            num_points,
            in_dim
        )));
    }

    Array2::from_shape_vec((num_points, in_dim), data.to_vec())
        .map_err(|e| LleError::invalid(format!("cannot reshape input buffer: {}", e)))
}

/// Flattens `out_dim × N` coordinates into a point-major buffer.
pub fn flatten_coordinates(coordinates: ArrayView2<f64>) -> Vec<f64> {
    coordinates.t().iter().copied().collect()
}

/// Runs LLE on a flat row-major buffer and returns a flat row-major result.
///
/// # Parameters
/// - `in_dim`: dimensionality D of each input point
/// - `out_dim`: dimensionality of the embedding, `1 <= out_dim <= num_points - 2`
/// - `num_points`: number of points N
/// - `k`: neighbors per point, `1 <= k <= num_points - 1`
/// - `data`: `num_points * in_dim` coordinates
///
/// # Returns
/// - `Ok(Vec<f64>)` of length `num_points * out_dim`
/// - `Err(LleError)` with nothing computed for invalid arguments, or the error
///   of the failing stage
pub fn embed_flat(
    in_dim: usize,
    out_dim: usize,
    num_points: usize,
    k: usize,
    data: &[f64],
) -> Result<Vec<f64>> {
    embed_flat_with(LLEBuilder::new(), in_dim, out_dim, num_points, k, data)
}

/// Same as [`embed_flat`], with the remaining estimator settings taken from
/// `builder`. `k` and `out_dim` override the builder's values.
pub fn embed_flat_with(
    builder: LLEBuilder,
    in_dim: usize,
    out_dim: usize,
    num_points: usize,
    k: usize,
    data: &[f64],
) -> Result<Vec<f64>> {
    let points = points_from_flat(data, num_points, in_dim)?;

    let fit = builder
        .n_neighbors(k)
        .n_components(out_dim)
        .build()
        .fit(points.view())?;

    Ok(flatten_coordinates(fit.coordinates().view()))
}
