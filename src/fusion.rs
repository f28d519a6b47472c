//! Dual-modality fuzzy c-means.
//!
//! Two feature matrices describe the same samples (for example coordinates
//! and tag counts). Each keeps its own centroids; the modalities only meet
//! in the fused dissimilarity that drives the shared membership.
//!
//! The second modality may also be a precomputed sample-to-sample similarity
//! (for example topic overlap); then only the coordinates have centroids.

use crate::algorithm::{
    initial_membership, iterate, validate_samples, StepOutput, Termination, UpdateStep,
};
use crate::config::{Algorithm, FuzzyConfig};
use crate::coordinate::{validate_frequency, weighted_centers};
use crate::distance::{fuse_similarities, pairwise_euclidean, to_similarity};
use crate::error::{CmeansError, Result};
use crate::observer::{IterationObserver, TracingObserver};
use crate::partition;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Result of dual-modality fuzzy c-means
#[derive(Debug, Clone)]
pub struct FusionResult {
    /// Centers in the primary feature space (n_clusters, n_features_1)
    pub centers_primary: Array2<f64>,
    /// Centers in the secondary feature space (n_clusters, n_features_2)
    pub centers_secondary: Array2<f64>,
    /// Shared final membership (n_clusters, n_samples)
    pub membership: Array2<f64>,
    /// Membership the run started from
    pub initial_membership: Array2<f64>,
    /// Primary distances scaled to [0, 1] (n_clusters, n_samples)
    pub distances_primary: Array2<f64>,
    /// Secondary distances scaled to [0, 1] (n_clusters, n_samples)
    pub distances_secondary: Array2<f64>,
    /// Fused dissimilarity that produced the final membership
    pub distances: Array2<f64>,
    /// Objective value of every step
    pub objective_history: Vec<f64>,
    /// Update steps actually run
    pub n_iterations: usize,
    /// Membership change of the last step
    pub convergence_norm: f64,
    /// Fuzzy partition coefficient of the final membership
    pub partition_coefficient: f64,
    /// Why the loop stopped
    pub termination: Termination,
}

impl FusionResult {
    /// Arg-max cluster per sample
    pub fn hard_assignments(&self) -> Array1<usize> {
        partition::hard_assignments(&self.membership.view())
    }
}

/// Result of fusing coordinates with a precomputed similarity matrix
#[derive(Debug, Clone)]
pub struct SimilarityFusionResult {
    /// Centers in the coordinate space (n_clusters, n_features)
    pub centers: Array2<f64>,
    /// Final membership (n_clusters, n_samples)
    pub membership: Array2<f64>,
    /// Membership the run started from
    pub initial_membership: Array2<f64>,
    /// Coordinate distances scaled to [0, 1] (n_clusters, n_samples)
    pub distances_primary: Array2<f64>,
    /// Membership-weighted mean similarity of every sample to every cluster
    pub cluster_similarity: Array2<f64>,
    /// Fused dissimilarity that produced the final membership
    pub distances: Array2<f64>,
    /// Objective value of every step
    pub objective_history: Vec<f64>,
    /// Update steps actually run
    pub n_iterations: usize,
    /// Membership change of the last step
    pub convergence_norm: f64,
    /// Fuzzy partition coefficient of the final membership
    pub partition_coefficient: f64,
    /// Why the loop stopped
    pub termination: Termination,
}

impl SimilarityFusionResult {
    /// Arg-max cluster per sample
    pub fn hard_assignments(&self) -> Array1<usize> {
        partition::hard_assignments(&self.membership.view())
    }
}

/// Fuzzy c-means over two modalities fused as
/// `w * s1 + (1 - w) * (1 - s2)`, where `s1` and `s2` are the per-modality
/// distances divided by their maximum.
///
/// With `w = 1` the secondary modality has no influence and the membership
/// matches [`CoordinateEngine`](crate::CoordinateEngine) on the primary one.
#[derive(Debug, Clone)]
pub struct FusionEngine {
    config: FuzzyConfig,
}

impl FusionEngine {
    /// Validate `config` and build the engine.
    ///
    /// Accepts the `Original` and `LocationFrequency` variants.
    pub fn new(config: FuzzyConfig) -> Result<Self> {
        config.validate()?;
        match config.algorithm {
            Algorithm::Original | Algorithm::LocationFrequency => Ok(Self { config }),
            other => Err(CmeansError::InvalidParameter(format!(
                "{:?} combines sequence distances; use the center-free engine",
                other
            ))),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &FuzzyConfig {
        &self.config
    }

    /// Cluster samples described by `primary` and `secondary` feature matrices.
    ///
    /// Both matrices must have one row per sample. `frequency` is required by
    /// `LocationFrequency` and weights the centroids of both modalities.
    pub fn fit(
        &self,
        primary: &ArrayView2<f64>,
        secondary: &ArrayView2<f64>,
        frequency: Option<&ArrayView1<f64>>,
        init: Option<&ArrayView2<f64>>,
    ) -> Result<FusionResult> {
        self.fit_observed(primary, secondary, frequency, init, &mut TracingObserver)
    }

    /// Like [`fit`](Self::fit), reporting every step to `observer`.
    pub fn fit_observed(
        &self,
        primary: &ArrayView2<f64>,
        secondary: &ArrayView2<f64>,
        frequency: Option<&ArrayView1<f64>>,
        init: Option<&ArrayView2<f64>>,
        observer: &mut dyn IterationObserver,
    ) -> Result<FusionResult> {
        let config = &self.config;
        if primary.nrows() != secondary.nrows() {
            return Err(CmeansError::InvalidDimensions(format!(
                "modalities describe {} and {} samples",
                primary.nrows(),
                secondary.nrows()
            )));
        }
        validate_samples(primary, config.n_clusters)?;
        validate_samples(secondary, config.n_clusters)?;
        let frequency = validate_frequency(config.algorithm, frequency, primary.nrows())?;

        let n_samples = primary.nrows();
        tracing::info!(
            "Training fused fuzzy c-means: {} samples, {} + {} features, {} clusters, w = {}",
            n_samples,
            primary.ncols(),
            secondary.ncols(),
            config.n_clusters,
            config.weight
        );

        let initial = initial_membership(init, config.n_clusters, n_samples, config.seed)?;

        let shape = (config.n_clusters, n_samples);
        let mut step = FusionStep {
            primary: primary.view(),
            secondary: secondary.view(),
            frequency,
            m: config.m,
            weight: config.weight,
            centers_primary: Array2::zeros((config.n_clusters, primary.ncols())),
            centers_secondary: Array2::zeros((config.n_clusters, secondary.ncols())),
            scaled_primary: Array2::zeros(shape),
            scaled_secondary: Array2::zeros(shape),
            fused: Array2::zeros(shape),
        };
        let outcome = iterate(&mut step, &initial.view(), config, observer)?;

        Ok(FusionResult {
            centers_primary: step.centers_primary,
            centers_secondary: step.centers_secondary,
            partition_coefficient: partition::partition_coefficient(&outcome.membership.view()),
            membership: outcome.membership,
            initial_membership: initial,
            distances_primary: step.scaled_primary,
            distances_secondary: step.scaled_secondary,
            distances: step.fused,
            objective_history: outcome.objective_history,
            n_iterations: outcome.n_iterations,
            convergence_norm: outcome.convergence_norm,
            termination: outcome.termination,
        })
    }

    /// Cluster `coordinates` (n_samples, n_features) together with a
    /// precomputed `similarity` (n_samples, n_samples) with entries in [0, 1].
    ///
    /// Only the coordinates have centroids. A sample's similarity to a
    /// cluster is the fuzzified-membership-weighted mean of its similarity to
    /// all samples, and the fused dissimilarity is
    /// `w * s1 + (1 - w) * (1 - similarity)`. `frequency` weights the
    /// coordinate centroids under `LocationFrequency`.
    pub fn fit_with_similarity(
        &self,
        coordinates: &ArrayView2<f64>,
        similarity: &ArrayView2<f64>,
        frequency: Option<&ArrayView1<f64>>,
        init: Option<&ArrayView2<f64>>,
    ) -> Result<SimilarityFusionResult> {
        self.fit_with_similarity_observed(
            coordinates,
            similarity,
            frequency,
            init,
            &mut TracingObserver,
        )
    }

    /// Like [`fit_with_similarity`](Self::fit_with_similarity), reporting every step to `observer`.
    pub fn fit_with_similarity_observed(
        &self,
        coordinates: &ArrayView2<f64>,
        similarity: &ArrayView2<f64>,
        frequency: Option<&ArrayView1<f64>>,
        init: Option<&ArrayView2<f64>>,
        observer: &mut dyn IterationObserver,
    ) -> Result<SimilarityFusionResult> {
        let config = &self.config;
        validate_samples(coordinates, config.n_clusters)?;
        let n_samples = coordinates.nrows();
        if similarity.dim() != (n_samples, n_samples) {
            return Err(CmeansError::InvalidDimensions(format!(
                "similarity must be {} x {}, got {} x {}",
                n_samples,
                n_samples,
                similarity.nrows(),
                similarity.ncols()
            )));
        }
        if similarity.iter().any(|&s| !(0.0..=1.0).contains(&s)) {
            return Err(CmeansError::InvalidParameter(
                "similarities must lie in [0, 1]".to_string(),
            ));
        }
        let frequency = validate_frequency(config.algorithm, frequency, n_samples)?;

        tracing::info!(
            "Training fuzzy c-means on coordinates and similarity: {} samples, {} clusters, w = {}",
            n_samples,
            config.n_clusters,
            config.weight
        );

        let initial = initial_membership(init, config.n_clusters, n_samples, config.seed)?;

        let shape = (config.n_clusters, n_samples);
        let mut step = SimilarityStep {
            coordinates: coordinates.view(),
            similarity: similarity.view(),
            frequency,
            m: config.m,
            weight: config.weight,
            centers: Array2::zeros((config.n_clusters, coordinates.ncols())),
            scaled_primary: Array2::zeros(shape),
            cluster_similarity: Array2::zeros(shape),
            fused: Array2::zeros(shape),
        };
        let outcome = iterate(&mut step, &initial.view(), config, observer)?;

        Ok(SimilarityFusionResult {
            centers: step.centers,
            partition_coefficient: partition::partition_coefficient(&outcome.membership.view()),
            membership: outcome.membership,
            initial_membership: initial,
            distances_primary: step.scaled_primary,
            cluster_similarity: step.cluster_similarity,
            distances: step.fused,
            objective_history: outcome.objective_history,
            n_iterations: outcome.n_iterations,
            convergence_norm: outcome.convergence_norm,
            termination: outcome.termination,
        })
    }
}

struct FusionStep<'a> {
    primary: ArrayView2<'a, f64>,
    secondary: ArrayView2<'a, f64>,
    frequency: Option<ArrayView1<'a, f64>>,
    m: f64,
    weight: f64,
    centers_primary: Array2<f64>,
    centers_secondary: Array2<f64>,
    scaled_primary: Array2<f64>,
    scaled_secondary: Array2<f64>,
    fused: Array2<f64>,
}

impl UpdateStep for FusionStep<'_> {
    fn step(&mut self, membership: &ArrayView2<f64>) -> Result<StepOutput> {
        let normalized = partition::normalize_columns(membership)?;
        let fuzzified = partition::fuzzify(&normalized.view(), self.m);
        let frequency = self.frequency.as_ref();

        // Both centroid sets come from the same fuzzified membership
        self.centers_primary = weighted_centers(&fuzzified.view(), &self.primary, frequency);
        self.centers_secondary = weighted_centers(&fuzzified.view(), &self.secondary, frequency);

        let primary = pairwise_euclidean(&self.primary, &self.centers_primary.view())?;
        let secondary = pairwise_euclidean(&self.secondary, &self.centers_secondary.view())?;
        self.scaled_primary = to_similarity(&primary.view());
        self.scaled_secondary = to_similarity(&secondary.view());

        let mut fused = fuse_similarities(
            &self.scaled_primary.view(),
            &self.scaled_secondary.view(),
            self.weight,
        );
        partition::clamp_epsilon(&mut fused);

        let objective = partition::objective(&fuzzified.view(), &fused.view());
        let membership = partition::update_membership(&fused.view(), self.m)?;
        self.fused = fused;

        Ok(StepOutput {
            membership,
            objective,
        })
    }
}

struct SimilarityStep<'a> {
    coordinates: ArrayView2<'a, f64>,
    similarity: ArrayView2<'a, f64>,
    frequency: Option<ArrayView1<'a, f64>>,
    m: f64,
    weight: f64,
    centers: Array2<f64>,
    scaled_primary: Array2<f64>,
    cluster_similarity: Array2<f64>,
    fused: Array2<f64>,
}

impl UpdateStep for SimilarityStep<'_> {
    fn step(&mut self, membership: &ArrayView2<f64>) -> Result<StepOutput> {
        let normalized = partition::normalize_columns(membership)?;
        let fuzzified = partition::fuzzify(&normalized.view(), self.m);

        self.centers =
            weighted_centers(&fuzzified.view(), &self.coordinates, self.frequency.as_ref());
        let primary = pairwise_euclidean(&self.coordinates, &self.centers.view())?;
        self.scaled_primary = to_similarity(&primary.view());
        self.cluster_similarity = mean_similarity(&fuzzified.view(), &self.similarity);

        let mut fused = fuse_similarities(
            &self.scaled_primary.view(),
            &self.cluster_similarity.view(),
            self.weight,
        );
        partition::clamp_epsilon(&mut fused);

        let objective = partition::objective(&fuzzified.view(), &fused.view());
        let membership = partition::update_membership(&fused.view(), self.m)?;
        self.fused = fused;

        Ok(StepOutput {
            membership,
            objective,
        })
    }
}

/// `sum_e Um[c, e] * S[e, j] / sum_e Um[c, e]` for every cluster and sample.
fn mean_similarity(fuzzified: &ArrayView2<f64>, similarity: &ArrayView2<f64>) -> Array2<f64> {
    let totals = fuzzified
        .sum_axis(Axis(1))
        .mapv(|total| total.max(f64::EPSILON))
        .insert_axis(Axis(1));
    fuzzified.dot(similarity) / &totals
}
