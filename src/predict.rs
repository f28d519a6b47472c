use crate::algorithm::{initial_membership, iterate, StepOutput, Termination, UpdateStep};
use crate::config::FuzzyConfig;
use crate::distance::pairwise_euclidean;
use crate::error::{CmeansError, Result};
use crate::observer::{IterationObserver, TracingObserver};
use crate::partition;
use ndarray::{Array1, Array2, ArrayView2};

/// Result of assigning new samples to a trained partition
#[derive(Debug, Clone)]
pub struct PredictResult {
    /// Final membership (n_clusters, n_samples)
    pub membership: Array2<f64>,
    /// Membership the run started from
    pub initial_membership: Array2<f64>,
    /// Sample-to-center distances (n_clusters, n_samples)
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

impl PredictResult {
    /// Arg-max cluster per sample
    pub fn hard_assignments(&self) -> Array1<usize> {
        partition::hard_assignments(&self.membership.view())
    }
}

/// Fuzzy assignment of new samples against fixed, previously trained centers.
///
/// The iteration is the coordinate one without the center update, so the
/// trained partition is never disturbed. The cluster count is taken from the
/// centers; `n_clusters` in the configuration is not consulted.
#[derive(Debug, Clone)]
pub struct PredictEngine {
    config: FuzzyConfig,
}

impl PredictEngine {
    /// Validate the iteration settings of `config` and build the engine.
    pub fn new(config: FuzzyConfig) -> Result<Self> {
        config.validate_iteration()?;
        Ok(Self { config })
    }

    /// Get the configuration.
    pub fn config(&self) -> &FuzzyConfig {
        &self.config
    }

    /// Fuzzily assign `data` (n_samples, n_features) to `centers` (n_clusters, n_features).
    pub fn predict(
        &self,
        centers: &ArrayView2<f64>,
        data: &ArrayView2<f64>,
        init: Option<&ArrayView2<f64>>,
    ) -> Result<PredictResult> {
        self.predict_observed(centers, data, init, &mut TracingObserver)
    }

    /// Like [`predict`](Self::predict), reporting every step to `observer`.
    pub fn predict_observed(
        &self,
        centers: &ArrayView2<f64>,
        data: &ArrayView2<f64>,
        init: Option<&ArrayView2<f64>>,
        observer: &mut dyn IterationObserver,
    ) -> Result<PredictResult> {
        let n_clusters = centers.nrows();
        if n_clusters == 0 {
            return Err(CmeansError::InvalidClusterCount(
                "trained centers are empty".to_string(),
            ));
        }
        if data.nrows() == 0 {
            return Err(CmeansError::InsufficientData(
                "no samples to predict".to_string(),
            ));
        }
        if data.iter().any(|x| !x.is_finite()) {
            return Err(CmeansError::InvalidParameter(
                "samples contain non-finite values".to_string(),
            ));
        }
        if centers.iter().any(|x| !x.is_finite()) {
            return Err(CmeansError::InvalidParameter(
                "trained centers contain non-finite values".to_string(),
            ));
        }

        let mut distances = pairwise_euclidean(data, centers)?;
        partition::clamp_epsilon(&mut distances);

        tracing::info!(
            "Predicting fuzzy membership: {} samples against {} trained centers",
            data.nrows(),
            n_clusters
        );

        let initial = initial_membership(init, n_clusters, data.nrows(), self.config.seed)?;
        let mut step = FixedCenterStep {
            distances,
            m: self.config.m,
        };
        let outcome = iterate(&mut step, &initial.view(), &self.config, observer)?;

        Ok(PredictResult {
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

/// Centers are read-only, so their distances are computed once up front.
struct FixedCenterStep {
    distances: Array2<f64>,
    m: f64,
}

impl UpdateStep for FixedCenterStep {
    fn step(&mut self, membership: &ArrayView2<f64>) -> Result<StepOutput> {
        let normalized = partition::normalize_columns(membership)?;
        let fuzzified = partition::fuzzify(&normalized.view(), self.m);

        let objective = partition::objective(&fuzzified.view(), &self.distances.view());
        let membership = partition::update_membership(&self.distances.view(), self.m)?;

        Ok(StepOutput {
            membership,
            objective,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_predict_against_fixed_centers() {
        let centers = array![[0.0, 0.0], [10.0, 10.0]];
        let data = array![[0.5, 0.0], [9.0, 10.0], [1.0, 1.0]];
        let engine = PredictEngine::new(FuzzyConfig::new(2).with_seed(0)).unwrap();

        let result = engine.predict(&centers.view(), &data.view(), None).unwrap();

        assert_eq!(result.hard_assignments().to_vec(), vec![0, 1, 0]);
        assert_eq!(result.distances.dim(), (2, 3));
        assert_eq!(result.termination, Termination::Converged);
        for column in result.membership.columns() {
            assert_abs_diff_eq!(column.sum(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_predict_objective_non_increasing() {
        let centers = array![[0.0], [4.0], [9.0]];
        let data = array![[0.1], [1.0], [3.5], [5.0], [8.0], [9.5]];
        let engine = PredictEngine::new(FuzzyConfig::new(3).with_seed(11).with_error(0.0))
            .unwrap();

        let result = engine.predict(&centers.view(), &data.view(), None).unwrap();

        for pair in result.objective_history.windows(2) {
            assert!(pair[1] <= pair[0] + 1e-9);
        }
    }

    #[test]
    fn test_predict_feature_mismatch() {
        let centers = array![[0.0, 0.0]];
        let data = array![[0.0, 0.0, 0.0]];
        let engine = PredictEngine::new(FuzzyConfig::default()).unwrap();

        assert!(matches!(
            engine.predict(&centers.view(), &data.view(), None),
            Err(CmeansError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn test_predict_rejects_non_finite_samples() {
        let centers = array![[0.0, 0.0], [10.0, 10.0]];
        let data = array![[f64::NAN, 0.0], [9.0, 10.0]];
        let engine = PredictEngine::new(FuzzyConfig::new(2).with_seed(0)).unwrap();

        assert!(matches!(
            engine.predict(&centers.view(), &data.view(), None),
            Err(CmeansError::InvalidParameter(_))
        ));

        let bad_centers = array![[0.0, f64::INFINITY], [10.0, 10.0]];
        let clean = array![[0.5, 0.0], [9.0, 10.0]];
        assert!(matches!(
            engine.predict(&bad_centers.view(), &clean.view(), None),
            Err(CmeansError::InvalidParameter(_))
        ));
    }
}
