use crate::config::FuzzyConfig;
use crate::error::{CmeansError, Result};
use crate::observer::{IterationEvent, IterationObserver};
use crate::partition;
use ndarray::{Array2, ArrayView2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Instant;

/// Why an engine stopped iterating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The membership change fell below the configured error
    Converged,
    /// The iteration budget ran out first. Not an error: the result is the
    /// best partition reached so far.
    MaxIterations,
    /// The observer asked to stop between iterations
    Cancelled,
}

/// Output of one update step
pub(crate) struct StepOutput {
    pub membership: Array2<f64>,
    pub objective: f64,
}

/// One engine-specific fixed-point update.
///
/// Implementations normalize and fuzzify the incoming membership, refresh
/// their distances, and return the next membership with the objective.
pub(crate) trait UpdateStep {
    fn step(&mut self, membership: &ArrayView2<f64>) -> Result<StepOutput>;
}

/// State left behind by [`iterate`]
pub(crate) struct IterationOutcome {
    pub membership: Array2<f64>,
    pub objective_history: Vec<f64>,
    pub n_iterations: usize,
    pub convergence_norm: f64,
    pub termination: Termination,
}

/// Run `step` until the membership settles, the budget is spent, or the
/// observer cancels.
///
/// At most `config.max_iters - 1` steps are taken. The previous membership is
/// kept intact for the convergence check; every step builds a fresh matrix.
pub(crate) fn iterate<S: UpdateStep>(
    step: &mut S,
    initial: &ArrayView2<f64>,
    config: &FuzzyConfig,
    observer: &mut dyn IterationObserver,
) -> Result<IterationOutcome> {
    let mut membership = initial.mapv(|x| x.max(f64::EPSILON));
    let mut objective_history = Vec::with_capacity(config.max_iters);
    let mut convergence_norm = f64::INFINITY;
    let mut termination = Termination::MaxIterations;
    let mut n_iterations = 0;

    while n_iterations + 1 < config.max_iters {
        let iter_start = Instant::now();
        let output = step.step(&membership.view())?;
        n_iterations += 1;

        convergence_norm =
            partition::convergence_norm(&output.membership.view(), &membership.view());
        objective_history.push(output.objective);
        membership = output.membership;

        observer.on_iteration(&IterationEvent {
            iteration: n_iterations,
            objective: output.objective,
            convergence_norm,
            elapsed: iter_start.elapsed(),
        });

        if convergence_norm < config.error {
            termination = Termination::Converged;
            break;
        }
        if observer.should_stop() {
            termination = Termination::Cancelled;
            break;
        }
    }

    match termination {
        Termination::Converged => tracing::info!(
            "Converged after {} iterations (norm {:.6e} < error {:.6e})",
            n_iterations,
            convergence_norm,
            config.error
        ),
        Termination::MaxIterations => tracing::info!(
            "Stopped after {} iterations without converging (norm {:.6e})",
            n_iterations,
            convergence_norm
        ),
        Termination::Cancelled => {
            tracing::info!("Cancelled by observer after {} iterations", n_iterations)
        }
    }

    Ok(IterationOutcome {
        membership,
        objective_history,
        n_iterations,
        convergence_norm,
        termination,
    })
}

/// Deterministic RNG when a seed is given, entropy-seeded otherwise.
pub(crate) fn make_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Use a caller-supplied membership verbatim, or draw a random partition.
pub(crate) fn initial_membership(
    init: Option<&ArrayView2<f64>>,
    n_clusters: usize,
    n_samples: usize,
    seed: Option<u64>,
) -> Result<Array2<f64>> {
    match init {
        Some(init) => {
            if init.dim() != (n_clusters, n_samples) {
                return Err(CmeansError::InvalidDimensions(format!(
                    "initial membership must be {} x {}, got {} x {}",
                    n_clusters,
                    n_samples,
                    init.nrows(),
                    init.ncols()
                )));
            }
            if init.iter().any(|&u| !u.is_finite() || u < 0.0) {
                return Err(CmeansError::InvalidParameter(
                    "initial membership must be finite and non-negative".to_string(),
                ));
            }
            Ok(init.to_owned())
        }
        None => {
            let mut rng = make_rng(seed);
            partition::random_membership(n_clusters, n_samples, &mut rng)
        }
    }
}

/// Reject empty feature matrices and more clusters than samples.
pub(crate) fn validate_samples(data: &ArrayView2<f64>, n_clusters: usize) -> Result<()> {
    let (n_samples, n_features) = data.dim();
    if n_features == 0 {
        return Err(CmeansError::InvalidDimensions(
            "feature matrix has no columns".to_string(),
        ));
    }
    if n_samples < n_clusters {
        return Err(CmeansError::InsufficientData(format!(
            "Number of samples ({}) is less than the number of clusters ({})",
            n_samples, n_clusters
        )));
    }
    if data.iter().any(|x| !x.is_finite()) {
        return Err(CmeansError::InvalidParameter(
            "feature matrix contains non-finite values".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::EventLog;
    use ndarray::array;

    /// Halves the distance to a fixed target each step.
    struct Halving {
        target: Array2<f64>,
    }

    impl UpdateStep for Halving {
        fn step(&mut self, membership: &ArrayView2<f64>) -> Result<StepOutput> {
            let next = (&membership.to_owned() + &self.target) / 2.0;
            let objective = partition::convergence_norm(&next.view(), &self.target.view());
            Ok(StepOutput {
                membership: next,
                objective,
            })
        }
    }

    fn halving() -> (Halving, Array2<f64>) {
        let target = array![[1.0, 0.0], [0.0, 1.0]];
        let start = array![[0.0, 1.0], [1.0, 0.0]];
        (Halving { target }, start)
    }

    #[test]
    fn test_iterate_converges() {
        let (mut step, start) = halving();
        let config = FuzzyConfig::new(2).with_error(1e-3).with_max_iters(100);
        let mut log = EventLog::new();

        let outcome = iterate(&mut step, &start.view(), &config, &mut log).unwrap();

        assert_eq!(outcome.termination, Termination::Converged);
        assert!(outcome.convergence_norm < 1e-3);
        assert_eq!(outcome.objective_history.len(), outcome.n_iterations);
        assert_eq!(log.events().len(), outcome.n_iterations);
        assert_eq!(log.events()[0].iteration, 1);
    }

    #[test]
    fn test_iterate_respects_budget() {
        let (mut step, start) = halving();
        let config = FuzzyConfig::new(2).with_error(0.0).with_max_iters(5);
        let mut log = EventLog::new();

        let outcome = iterate(&mut step, &start.view(), &config, &mut log).unwrap();

        assert_eq!(outcome.termination, Termination::MaxIterations);
        assert_eq!(outcome.n_iterations, 4);
    }

    #[test]
    fn test_iterate_cancellation() {
        let (mut step, start) = halving();
        let config = FuzzyConfig::new(2).with_error(0.0).with_max_iters(100);
        let mut log = EventLog::stop_after(2);

        let outcome = iterate(&mut step, &start.view(), &config, &mut log).unwrap();

        assert_eq!(outcome.termination, Termination::Cancelled);
        assert_eq!(outcome.n_iterations, 2);
    }

    #[test]
    fn test_initial_membership_verbatim_and_random() {
        let init = array![[0.2, 1.0], [0.8, 0.0]];
        let used = initial_membership(Some(&init.view()), 2, 2, None).unwrap();
        assert_eq!(used, init);

        let a = initial_membership(None, 3, 10, Some(5)).unwrap();
        let b = initial_membership(None, 3, 10, Some(5)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_initial_membership_shape_mismatch() {
        let init = array![[0.5, 0.5]];
        assert!(matches!(
            initial_membership(Some(&init.view()), 2, 2, None),
            Err(CmeansError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn test_validate_samples() {
        let data = array![[0.0, 1.0], [2.0, 3.0]];
        assert!(validate_samples(&data.view(), 2).is_ok());
        assert!(matches!(
            validate_samples(&data.view(), 3),
            Err(CmeansError::InsufficientData(_))
        ));
    }
}
