use crate::algorithm::{
    initial_membership, iterate, validate_samples, StepOutput, Termination, UpdateStep,
};
use crate::config::{Algorithm, FuzzyConfig};
use crate::distance::pairwise_euclidean;
use crate::error::{CmeansError, Result};
use crate::observer::{IterationObserver, TracingObserver};
use crate::partition;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Result of single-modality fuzzy c-means
#[derive(Debug, Clone)]
pub struct CoordinateResult {
    /// Cluster centers (n_clusters, n_features)
    pub centers: Array2<f64>,
    /// Final membership (n_clusters, n_samples)
    pub membership: Array2<f64>,
    /// Membership the run started from
    pub initial_membership: Array2<f64>,
    /// Final point-to-center distances (n_clusters, n_samples)
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

impl CoordinateResult {
    /// Arg-max cluster per sample
    pub fn hard_assignments(&self) -> Array1<usize> {
        partition::hard_assignments(&self.membership.view())
    }
}

/// Fuzzy c-means over one feature matrix, recomputing centroids every step.
///
/// # Example
///
/// ```
/// use fusioncmeans_rs::{CoordinateEngine, FuzzyConfig};
/// use ndarray::array;
///
/// let points = array![[0.0, 0.0], [0.0, 1.0], [10.0, 0.0], [10.0, 1.0]];
/// let engine = CoordinateEngine::new(FuzzyConfig::new(2).with_seed(1)).unwrap();
///
/// let result = engine.fit(&points.view(), None, None).unwrap();
/// let labels = result.hard_assignments();
/// assert_eq!(labels[0], labels[1]);
/// assert_ne!(labels[0], labels[2]);
/// ```
#[derive(Debug, Clone)]
pub struct CoordinateEngine {
    config: FuzzyConfig,
}

impl CoordinateEngine {
    /// Validate `config` and build the engine.
    ///
    /// Accepts the `Original` and `LocationFrequency` variants.
    pub fn new(config: FuzzyConfig) -> Result<Self> {
        config.validate()?;
        match config.algorithm {
            Algorithm::Original | Algorithm::LocationFrequency => Ok(Self { config }),
            other => Err(CmeansError::InvalidParameter(format!(
                "{:?} needs two distance sources; use the fusion or center-free engine",
                other
            ))),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &FuzzyConfig {
        &self.config
    }

    /// Cluster `data` (n_samples, n_features).
    ///
    /// # Arguments
    ///
    /// * `data` - Feature matrix, one sample per row
    /// * `frequency` - Per-sample weights, required by `LocationFrequency` only
    /// * `init` - Initial membership (n_clusters, n_samples), used verbatim when given
    pub fn fit(
        &self,
        data: &ArrayView2<f64>,
        frequency: Option<&ArrayView1<f64>>,
        init: Option<&ArrayView2<f64>>,
    ) -> Result<CoordinateResult> {
        self.fit_observed(data, frequency, init, &mut TracingObserver)
    }

    /// Like [`fit`](Self::fit), reporting every step to `observer`.
    pub fn fit_observed(
        &self,
        data: &ArrayView2<f64>,
        frequency: Option<&ArrayView1<f64>>,
        init: Option<&ArrayView2<f64>>,
        observer: &mut dyn IterationObserver,
    ) -> Result<CoordinateResult> {
        let config = &self.config;
        validate_samples(data, config.n_clusters)?;
        let frequency = validate_frequency(config.algorithm, frequency, data.nrows())?;

        let (n_samples, n_features) = data.dim();
        tracing::info!(
            "Training fuzzy c-means: {} samples, {} features, {} clusters, m = {}",
            n_samples,
            n_features,
            config.n_clusters,
            config.m
        );

        let initial = initial_membership(init, config.n_clusters, n_samples, config.seed)?;

        let mut step = CentroidStep {
            data: data.view(),
            frequency,
            m: config.m,
            centers: Array2::zeros((config.n_clusters, n_features)),
            distances: Array2::zeros((config.n_clusters, n_samples)),
        };
        let outcome = iterate(&mut step, &initial.view(), config, observer)?;

        Ok(CoordinateResult {
            centers: step.centers,
            distances: step.distances,
            partition_coefficient: partition::partition_coefficient(&outcome.membership.view()),
            membership: outcome.membership,
            initial_membership: initial,
            objective_history: outcome.objective_history,
            n_iterations: outcome.n_iterations,
            convergence_norm: outcome.convergence_norm,
            termination: outcome.termination,
        })
    }
}

struct CentroidStep<'a> {
    data: ArrayView2<'a, f64>,
    frequency: Option<ArrayView1<'a, f64>>,
    m: f64,
    centers: Array2<f64>,
    distances: Array2<f64>,
}

impl UpdateStep for CentroidStep<'_> {
    fn step(&mut self, membership: &ArrayView2<f64>) -> Result<StepOutput> {
        let normalized = partition::normalize_columns(membership)?;
        let fuzzified = partition::fuzzify(&normalized.view(), self.m);

        self.centers = weighted_centers(&fuzzified.view(), &self.data, self.frequency.as_ref());

        let mut distances = pairwise_euclidean(&self.data, &self.centers.view())?;
        partition::clamp_epsilon(&mut distances);

        let objective = partition::objective(&fuzzified.view(), &distances.view());
        let membership = partition::update_membership(&distances.view(), self.m)?;
        self.distances = distances;

        Ok(StepOutput {
            membership,
            objective,
        })
    }
}

/// Centers as the fuzzified-membership-weighted mean of the samples.
///
/// With `frequency`, every sample's weight is additionally scaled by its frequency.
pub(crate) fn weighted_centers(
    fuzzified: &ArrayView2<f64>,
    data: &ArrayView2<f64>,
    frequency: Option<&ArrayView1<f64>>,
) -> Array2<f64> {
    let weights = match frequency {
        Some(frequency) => fuzzified * &frequency.view().insert_axis(Axis(0)),
        None => fuzzified.to_owned(),
    };
    let totals = weights
        .sum_axis(Axis(1))
        .mapv(|total| total.max(f64::EPSILON))
        .insert_axis(Axis(1));

    weights.dot(data) / &totals
}

/// Frequencies are required by `LocationFrequency` and rejected otherwise.
pub(crate) fn validate_frequency<'a>(
    algorithm: Algorithm,
    frequency: Option<&'a ArrayView1<'_, f64>>,
    n_samples: usize,
) -> Result<Option<ArrayView1<'a, f64>>> {
    match (algorithm, frequency) {
        (Algorithm::LocationFrequency, None) => Err(CmeansError::InvalidParameter(
            "LocationFrequency requires per-sample frequencies".to_string(),
        )),
        (Algorithm::LocationFrequency, Some(frequency)) => {
            if frequency.len() != n_samples {
                return Err(CmeansError::InvalidDimensions(format!(
                    "expected {} frequencies, got {}",
                    n_samples,
                    frequency.len()
                )));
            }
            if frequency.iter().any(|&f| !f.is_finite() || f < 0.0) {
                return Err(CmeansError::InvalidParameter(
                    "frequencies must be finite and non-negative".to_string(),
                ));
            }
            Ok(Some(frequency.view()))
        }
        (_, Some(_)) => Err(CmeansError::InvalidParameter(format!(
            "frequencies are only used by LocationFrequency, not {:?}",
            algorithm
        ))),
        (_, None) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn two_pairs() -> Array2<f64> {
        array![[0.0, 0.0], [0.0, 1.0], [10.0, 0.0], [10.0, 1.0]]
    }

    #[test]
    fn test_weighted_centers() {
        let data = array![[0.0, 0.0], [2.0, 4.0]];
        let um = array![[1.0, 1.0], [1.0, 3.0]];

        let centers = weighted_centers(&um.view(), &data.view(), None);
        assert_relative_eq!(centers[[0, 0]], 1.0, epsilon = 1e-12);
        assert_relative_eq!(centers[[1, 1]], 3.0, epsilon = 1e-12);

        let frequency = array![3.0, 1.0];
        let weighted = weighted_centers(&um.view(), &data.view(), Some(&frequency.view()));
        assert_relative_eq!(weighted[[0, 0]], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_fit_two_pairs() {
        let data = two_pairs();
        let engine = CoordinateEngine::new(FuzzyConfig::new(2).with_seed(42).with_error(1e-6))
            .unwrap();

        let result = engine.fit(&data.view(), None, None).unwrap();

        assert_eq!(result.centers.dim(), (2, 2));
        assert_eq!(result.membership.dim(), (2, 4));
        assert_eq!(result.distances.dim(), (2, 4));
        assert_eq!(result.termination, Termination::Converged);
        assert_eq!(result.objective_history.len(), result.n_iterations);

        let labels = result.hard_assignments();
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[2], labels[3]);
        assert_ne!(labels[0], labels[2]);
        for (j, &label) in labels.iter().enumerate() {
            assert!(result.membership[[label, j]] > 0.9);
        }
    }

    #[test]
    fn test_supplied_init_is_kept() {
        let data = two_pairs();
        let init = array![[1.0, 1.0, 0.0, 0.0], [0.0, 0.0, 1.0, 1.0]];
        let engine = CoordinateEngine::new(FuzzyConfig::new(2)).unwrap();

        let result = engine.fit(&data.view(), None, Some(&init.view())).unwrap();

        assert_eq!(result.initial_membership, init);
        let labels = result.hard_assignments();
        assert_eq!(labels.to_vec(), vec![0, 0, 1, 1]);
    }

    #[test]
    fn test_location_frequency_requires_weights() {
        let data = two_pairs();
        let engine =
            CoordinateEngine::new(FuzzyConfig::new(2).with_algorithm(Algorithm::LocationFrequency))
                .unwrap();

        assert!(engine.fit(&data.view(), None, None).is_err());

        let frequency = array![1.0, 5.0, 1.0, 5.0];
        let result = engine
            .fit(&data.view(), Some(&frequency.view()), None)
            .unwrap();
        // Heavier samples pull their center towards y = 1
        for c in 0..2 {
            assert!(result.centers[[c, 1]] > 0.5);
        }
    }

    #[test]
    fn test_rejects_two_source_algorithms() {
        let config = FuzzyConfig::new(2).with_algorithm(Algorithm::TwoDistance);
        assert!(matches!(
            CoordinateEngine::new(config),
            Err(CmeansError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_rejects_stray_frequency() {
        let data = two_pairs();
        let frequency = array![1.0, 1.0, 1.0, 1.0];
        let engine = CoordinateEngine::new(FuzzyConfig::new(2)).unwrap();
        assert!(engine
            .fit(&data.view(), Some(&frequency.view()), None)
            .is_err());
    }
}
