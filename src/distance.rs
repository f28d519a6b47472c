use crate::config::Algorithm;
use crate::error::{CmeansError, Result};
use ndarray::{Array1, Array2, ArrayView2, Axis, Zip};
use rayon::prelude::*;

/// Compute squared L2 norms for each row of a 2D array
#[inline]
pub fn compute_squared_norms(data: &ArrayView2<f64>) -> Array1<f64> {
    let mut norms = Array1::zeros(data.nrows());

    Zip::from(&mut norms)
        .and(data.rows())
        .par_for_each(|norm, row| *norm = row.dot(&row));

    norms
}

/// Euclidean distance from every point to every center.
///
/// Uses the identity `||x - c||^2 = ||x||^2 + ||c||^2 - 2*x.c` so the heavy
/// part is a single matrix product. Points and centers are first shifted by
/// the mean point: the identity cancels catastrophically when coordinates are
/// large relative to their spread (e.g. projected metres).
///
/// # Arguments
/// * `points` - Samples (n_samples, n_features)
/// * `centers` - Cluster centers (n_clusters, n_features)
///
/// # Returns
/// * Distance matrix of shape (n_clusters, n_samples)
pub fn pairwise_euclidean(
    points: &ArrayView2<f64>,
    centers: &ArrayView2<f64>,
) -> Result<Array2<f64>> {
    if points.ncols() != centers.ncols() {
        return Err(CmeansError::InvalidDimensions(format!(
            "points have {} features but centers have {}",
            points.ncols(),
            centers.ncols()
        )));
    }

    let (points, centers) = match points.mean_axis(Axis(0)) {
        Some(mean) => (points - &mean, centers - &mean),
        None => (points.to_owned(), centers.to_owned()),
    };

    let point_norms = compute_squared_norms(&points.view());
    let center_norms = compute_squared_norms(&centers.view());

    // (n_clusters, n_samples) dot products, turned into distances in place
    let mut distances = centers.dot(&points.t());
    Zip::indexed(&mut distances).par_for_each(|(c, j), d| {
        // Rounding can push the squared distance slightly below zero
        let squared = center_norms[c] + point_norms[j] - 2.0 * *d;
        *d = squared.max(0.0).sqrt();
    });

    Ok(distances)
}

/// Scale distances into [0, 1] by dividing by the largest entry.
///
/// An all-zero matrix is returned unchanged.
pub fn to_similarity(distances: &ArrayView2<f64>) -> Array2<f64> {
    let max = distances.fold(0.0f64, |acc, &d| acc.max(d));
    if max > 0.0 {
        distances.mapv(|d| d / max)
    } else {
        distances.to_owned()
    }
}

/// Fused dissimilarity `w * s1 + (1 - w) * (1 - s2)`.
///
/// `s1` contributes as a distance, `s2` as one minus a similarity.
pub fn fuse_similarities(
    scaled_primary: &ArrayView2<f64>,
    scaled_secondary: &ArrayView2<f64>,
    weight: f64,
) -> Array2<f64> {
    Zip::from(scaled_primary)
        .and(scaled_secondary)
        .map_collect(|&s1, &s2| weight * s1 + (1.0 - weight) * (1.0 - s2))
}

/// Pairwise distance between sequences, addressed by index.
///
/// Implementations are evaluated lazily: the center-free engine only asks for
/// distances between its exemplars and every sequence.
pub trait SequenceDistance: Send + Sync {
    /// Number of sequences
    fn len(&self) -> usize;

    /// Distance between sequence `i` and sequence `j`
    fn distance(&self, i: usize, j: usize) -> f64;

    /// Whether there are no sequences
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distances from sequence `i` to every sequence.
    fn row(&self, i: usize) -> Array1<f64> {
        let values: Vec<f64> = (0..self.len())
            .into_par_iter()
            .map(|j| self.distance(i, j))
            .collect();
        Array1::from(values)
    }
}

impl SequenceDistance for Array2<f64> {
    fn len(&self) -> usize {
        self.nrows()
    }

    #[inline]
    fn distance(&self, i: usize, j: usize) -> f64 {
        self[[i, j]]
    }

    fn row(&self, i: usize) -> Array1<f64> {
        self.row(i).to_owned()
    }
}

impl SequenceDistance for ArrayView2<'_, f64> {
    fn len(&self) -> usize {
        self.nrows()
    }

    #[inline]
    fn distance(&self, i: usize, j: usize) -> f64 {
        self[[i, j]]
    }

    fn row(&self, i: usize) -> Array1<f64> {
        ArrayView2::row(self, i).to_owned()
    }
}

/// Adapter turning a closure into a [`SequenceDistance`] over `n` sequences.
pub struct FnDistance<F> {
    n: usize,
    f: F,
}

impl<F> FnDistance<F>
where
    F: Fn(usize, usize) -> f64 + Send + Sync,
{
    /// Wrap `f`, which is called with two sequence indices in `0..n`.
    pub fn new(n: usize, f: F) -> Self {
        Self { n, f }
    }
}

impl<F> SequenceDistance for FnDistance<F>
where
    F: Fn(usize, usize) -> f64 + Send + Sync,
{
    fn len(&self) -> usize {
        self.n
    }

    #[inline]
    fn distance(&self, i: usize, j: usize) -> f64 {
        (self.f)(i, j)
    }
}

/// One or two distance sources combined under an [`Algorithm`].
pub struct FusedDistance<'a> {
    primary: &'a dyn SequenceDistance,
    secondary: Option<&'a dyn SequenceDistance>,
    algorithm: Algorithm,
    weight: f64,
}

impl<'a> FusedDistance<'a> {
    /// Combine `primary` and an optional `secondary` source.
    ///
    /// # Errors
    ///
    /// Fails when the sources index different numbers of sequences, when the
    /// algorithm needs a second source that is missing (or gets one it would
    /// ignore), or when `algorithm` is `LocationFrequency`, which has no
    /// meaning without centroids.
    pub fn new(
        primary: &'a dyn SequenceDistance,
        secondary: Option<&'a dyn SequenceDistance>,
        algorithm: Algorithm,
        weight: f64,
    ) -> Result<Self> {
        if algorithm == Algorithm::LocationFrequency {
            return Err(CmeansError::InvalidParameter(
                "LocationFrequency requires centroids and cannot combine sequence distances"
                    .to_string(),
            ));
        }
        match (algorithm.uses_secondary(), secondary) {
            (true, None) => {
                return Err(CmeansError::InvalidParameter(format!(
                    "{:?} requires a second distance source",
                    algorithm
                )));
            }
            (false, Some(_)) => {
                return Err(CmeansError::InvalidParameter(format!(
                    "{:?} uses a single distance source but two were given",
                    algorithm
                )));
            }
            (true, Some(other)) if other.len() != primary.len() => {
                return Err(CmeansError::InvalidDimensions(format!(
                    "distance sources index {} and {} sequences",
                    primary.len(),
                    other.len()
                )));
            }
            _ => {}
        }
        if !(0.0..=1.0).contains(&weight) {
            return Err(CmeansError::InvalidParameter(format!(
                "fusion weight must lie in [0, 1], got {}",
                weight
            )));
        }

        Ok(Self {
            primary,
            secondary,
            algorithm,
            weight,
        })
    }

    /// The combination variant in use
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }
}

impl SequenceDistance for FusedDistance<'_> {
    fn len(&self) -> usize {
        self.primary.len()
    }

    #[inline]
    fn distance(&self, i: usize, j: usize) -> f64 {
        let primary = self.primary.distance(i, j);
        match self.secondary {
            Some(secondary) => {
                self.algorithm
                    .combine(primary, secondary.distance(i, j), self.weight)
            }
            None => primary,
        }
    }
}
