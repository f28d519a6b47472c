//! Fixed-point math shared by every fuzzy c-means engine.
//!
//! All functions work on C x N matrices (clusters x samples). Columns of a
//! membership matrix sum to one.

use crate::error::{CmeansError, Result};
use ndarray::{Array1, Array2, ArrayView2, Axis, Zip};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::Rng;

/// Raise every entry below machine epsilon up to machine epsilon.
#[inline]
pub fn clamp_epsilon(values: &mut Array2<f64>) {
    values.mapv_inplace(|x| x.max(f64::EPSILON));
}

/// Divide every column by its sum, then clamp entries up to machine epsilon.
///
/// A column whose sum is zero (or not finite) carries no information and is
/// reset to the uniform partition `1 / C`.
///
/// # Errors
///
/// Returns [`CmeansError::InvalidDimensions`] if either dimension is zero.
pub fn normalize_columns(membership: &ArrayView2<f64>) -> Result<Array2<f64>> {
    let (n_clusters, n_samples) = membership.dim();
    if n_clusters == 0 || n_samples == 0 {
        return Err(CmeansError::InvalidDimensions(format!(
            "membership must be non-empty, got {} x {}",
            n_clusters, n_samples
        )));
    }

    let uniform = 1.0 / n_clusters as f64;
    let mut normalized = membership.to_owned();
    for mut column in normalized.columns_mut() {
        let sum = column.sum();
        if sum > 0.0 && sum.is_finite() {
            column /= sum;
        } else {
            column.fill(uniform);
        }
    }
    clamp_epsilon(&mut normalized);
    Ok(normalized)
}

/// Elementwise `U ** m`.
#[inline]
pub fn fuzzify(membership: &ArrayView2<f64>, m: f64) -> Array2<f64> {
    membership.mapv(|x| x.powf(m))
}

/// Objective `sum(Um * D**2)`.
///
/// # Panics
///
/// Panics if the two matrices differ in shape.
pub fn objective(fuzzified: &ArrayView2<f64>, distances: &ArrayView2<f64>) -> f64 {
    Zip::from(fuzzified)
        .and(distances)
        .fold(0.0, |acc, &um, &d| acc + um * d * d)
}

/// New membership `D ** (-2 / (m - 1))`, normalized per column.
///
/// Each column is divided by its smallest distance before exponentiation.
/// The ratio is unchanged by normalization but keeps the power finite when
/// `m - 1` is small.
pub fn update_membership(distances: &ArrayView2<f64>, m: f64) -> Result<Array2<f64>> {
    let exponent = -2.0 / (m - 1.0);
    let mut membership = distances.mapv(|d| d.max(f64::EPSILON));
    for mut column in membership.columns_mut() {
        let nearest = column.fold(f64::INFINITY, |acc, &d| acc.min(d));
        column.mapv_inplace(|d| (d / nearest).powf(exponent));
    }
    normalize_columns(&membership.view())
}

/// Frobenius norm of `new - old`.
pub fn convergence_norm(new: &ArrayView2<f64>, old: &ArrayView2<f64>) -> f64 {
    Zip::from(new)
        .and(old)
        .fold(0.0, |acc, &a, &b| acc + (a - b) * (a - b))
        .sqrt()
}

/// Fuzzy partition coefficient `trace(U U^T) / N`, in `[1/C, 1]`.
pub fn partition_coefficient(membership: &ArrayView2<f64>) -> f64 {
    let n_samples = membership.ncols();
    if n_samples == 0 {
        return 0.0;
    }
    membership.iter().map(|&u| u * u).sum::<f64>() / n_samples as f64
}

/// Uniform random membership, normalized per column.
pub fn random_membership<R: Rng + ?Sized>(
    n_clusters: usize,
    n_samples: usize,
    rng: &mut R,
) -> Result<Array2<f64>> {
    let raw = Array2::random_using((n_clusters, n_samples), Uniform::new(0.0, 1.0), rng);
    normalize_columns(&raw.view())
}

/// Cluster with the highest membership for every sample (first wins on ties).
pub fn hard_assignments(membership: &ArrayView2<f64>) -> Array1<usize> {
    membership.map_axis(Axis(0), |column| {
        let mut best = 0;
        for (c, &u) in column.iter().enumerate() {
            if u > column[best] {
                best = c;
            }
        }
        best
    })
}

/// Derived record pairing a sample with its dominant cluster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assignment {
    /// Sample (column) index
    pub sample: usize,
    /// Arg-max cluster
    pub cluster: usize,
    /// Membership of the sample in that cluster
    pub membership: f64,
}

/// One [`Assignment`] per sample, in sample order.
pub fn assignments(membership: &ArrayView2<f64>) -> Vec<Assignment> {
    hard_assignments(membership)
        .iter()
        .enumerate()
        .map(|(sample, &cluster)| Assignment {
            sample,
            cluster,
            membership: membership[[cluster, sample]],
        })
        .collect()
}
