//! # Dimensionality Reduction
//!
//! This module provides algorithms for reducing the dimensionality of high-dimensional data
//! while preserving important structural properties.
//!
//! ## Currently Available
//! - **LLE** ([`lle`]): Locally Linear Embedding for non-linear manifold unrolling
//!
//! ## Algorithm Notes
//! - **LLE** keeps the local affine structure of each neighborhood. It suits data lying on a
//!   smooth low-dimensional manifold that is sampled densely enough for every neighborhood
//!   to look flat.
//! - The eigen step is dense and exact, so memory grows as N² and time as N³.

pub mod lle;
