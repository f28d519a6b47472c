//! Fuzzy clustering without centroids.
//!
//! Used when no mean exists for the samples, e.g. trajectories compared with
//! an edit distance. Each cluster is represented by a fixed set of exemplar
//! sequences chosen at initialization. A sequence's distance to a cluster is
//! the membership-weighted mean of its distances to that cluster's exemplars.
//!
//! Exemplars are never refit, so unlike the centroid engines the objective is
//! not guaranteed to decrease from step to step.

use crate::algorithm::{initial_membership, iterate, StepOutput, Termination, UpdateStep};
use crate::config::{Algorithm, FuzzyConfig, SeedConfig};
use crate::distance::{FusedDistance, SequenceDistance};
use crate::error::{CmeansError, Result};
use crate::observer::{IterationObserver, TracingObserver};
use crate::partition;
use crate::seed::SeedInitializer;
use ndarray::{Array1, Array2, ArrayView2};

/// Result of center-free fuzzy clustering
#[derive(Debug, Clone)]
pub struct CenterFreeResult {
    /// Final membership (n_clusters, n_sequences)
    pub membership: Array2<f64>,
    /// Seed membership (from seeding, or as supplied)
    pub initial_membership: Array2<f64>,
    /// Final sequence-to-cluster distances (n_clusters, n_sequences)
    pub distances: Array2<f64>,
    /// Objective value of every step. Not guaranteed to be monotone here.
    pub objective_history: Vec<f64>,
    pub n_iterations: usize,
    pub convergence_norm: f64,
    pub partition_coefficient: f64,
    /// Why the loop stopped
    pub termination: Termination,
    /// Fixed exemplar sequences of every cluster, strongest first
    pub exemplars: Vec<Vec<usize>>,
    /// Reference sequence per cluster when the engine seeded itself
    pub references: Option<Vec<usize>>,
}

impl CenterFreeResult {
    /// Arg-max cluster per sequence
    pub fn hard_assignments(&self) -> Array1<usize> {
        partition::hard_assignments(&self.membership.view())
    }
}

/// Center-free fuzzy c-means over one or two sequence distances.
///
/// The distance sources are combined by `config.algorithm`:
/// `Original` uses the primary source alone, `TwoDistance` multiplies the two,
/// and `TwoWeightedDistance` mixes them with `config.weight`.
///
/// Only exemplar-to-sequence distances are ever evaluated, which keeps the
/// cost at `n_clusters * k * n_sequences` distance calls for expensive metrics.
///
/// All randomness comes from the seeds in [`SeedConfig`]; `FuzzyConfig::seed`
/// is not used by this engine.
#[derive(Debug, Clone)]
pub struct CenterFreeEngine {
    config: FuzzyConfig,
    seeding: SeedConfig,
}

impl CenterFreeEngine {
    /// Validate `config` and build the engine. `seeding.k` is the exemplar budget.
    pub fn new(config: FuzzyConfig, seeding: SeedConfig) -> Result<Self> {
        config.validate()?;
        if config.algorithm == Algorithm::LocationFrequency {
            return Err(CmeansError::InvalidParameter(
                "LocationFrequency weights centroids; the center-free engine has none".to_string(),
            ));
        }
        if seeding.k == 0 {
            return Err(CmeansError::InvalidParameter(
                "exemplar budget k must be greater than 0".to_string(),
            ));
        }
        Ok(Self { config, seeding })
    }

    /// Get the iteration configuration.
    pub fn config(&self) -> &FuzzyConfig {
        &self.config
    }

    /// Get the seeding configuration.
    pub fn seeding(&self) -> &SeedConfig {
        &self.seeding
    }

    /// Cluster sequences given their pairwise distances.
    ///
    /// # Arguments
    ///
    /// * `primary` - First distance source
    /// * `secondary` - Second source, required by the two-distance variants
    /// * `init` - Initial membership (n_clusters, n_sequences). Its positive
    ///   entries define the exemplars. When absent, farthest-point seeding is run.
    pub fn fit(
        &self,
        primary: &dyn SequenceDistance,
        secondary: Option<&dyn SequenceDistance>,
        init: Option<&ArrayView2<f64>>,
    ) -> Result<CenterFreeResult> {
        self.fit_observed(primary, secondary, init, &mut TracingObserver)
    }

    /// Like [`fit`](Self::fit), reporting every step to `observer`.
    pub fn fit_observed(
        &self,
        primary: &dyn SequenceDistance,
        secondary: Option<&dyn SequenceDistance>,
        init: Option<&ArrayView2<f64>>,
        observer: &mut dyn IterationObserver,
    ) -> Result<CenterFreeResult> {
        let config = &self.config;
        let fused = FusedDistance::new(primary, secondary, config.algorithm, config.weight)?;
        let n_sequences = fused.len();
        if n_sequences < config.n_clusters {
            return Err(CmeansError::InsufficientData(format!(
                "Number of sequences ({}) is less than the number of clusters ({})",
                n_sequences, config.n_clusters
            )));
        }

        let (initial, references) = match init {
            Some(init) => (
                initial_membership(Some(init), config.n_clusters, n_sequences, None)?,
                None,
            ),
            None => {
                let seeding =
                    SeedInitializer::new(self.seeding.clone()).seed(&fused, config.n_clusters)?;
                (seeding.membership, Some(seeding.references))
            }
        };

        let exemplars = select_exemplars(&initial.view(), self.seeding.k)?;

        tracing::info!(
            "Training center-free fuzzy c-means: {} sequences, {} clusters, {:?}, up to {} exemplars per cluster",
            n_sequences,
            config.n_clusters,
            config.algorithm,
            self.seeding.k
        );

        let mut step = ExemplarStep::new(&fused, &exemplars, config.m)?;
        let outcome = iterate(&mut step, &initial.view(), config, observer)?;

        Ok(CenterFreeResult {
            distances: step.distances,
            partition_coefficient: partition::partition_coefficient(&outcome.membership.view()),
            membership: outcome.membership,
            initial_membership: initial,
            objective_history: outcome.objective_history,
            n_iterations: outcome.n_iterations,
            convergence_norm: outcome.convergence_norm,
            termination: outcome.termination,
            exemplars,
            references,
        })
    }
}

/// Positive entries of every row, strongest first, capped at `k`.
fn select_exemplars(membership: &ArrayView2<f64>, k: usize) -> Result<Vec<Vec<usize>>> {
    membership
        .outer_iter()
        .enumerate()
        .map(|(c, row)| {
            let mut members: Vec<usize> = (0..row.len()).filter(|&j| row[j] > 0.0).collect();
            if members.is_empty() {
                return Err(CmeansError::InvalidParameter(format!(
                    "cluster {} has no exemplars in the initial membership",
                    c
                )));
            }
            // Stable sort keeps index order among equal memberships
            members.sort_by(|&a, &b| row[b].total_cmp(&row[a]));
            members.truncate(k);
            Ok(members)
        })
        .collect()
}

struct ExemplarStep {
    /// For every cluster: (exemplar sequence, row in `exemplar_distances`)
    groups: Vec<Vec<(usize, usize)>>,
    /// Distances from each distinct exemplar to every sequence
    exemplar_distances: Array2<f64>,
    m: f64,
    distances: Array2<f64>,
}

impl ExemplarStep {
    /// Evaluate every distinct exemplar's distance row once.
    fn new(distance: &dyn SequenceDistance, exemplars: &[Vec<usize>], m: f64) -> Result<Self> {
        let n_sequences = distance.len();
        let mut slot = vec![None; n_sequences];
        let mut distinct = Vec::new();
        let groups: Vec<Vec<(usize, usize)>> = exemplars
            .iter()
            .map(|members| {
                members
                    .iter()
                    .map(|&e| {
                        let row = *slot[e].get_or_insert_with(|| {
                            distinct.push(e);
                            distinct.len() - 1
                        });
                        (e, row)
                    })
                    .collect()
            })
            .collect();

        let mut exemplar_distances = Array2::zeros((distinct.len(), n_sequences));
        for (row, &e) in distinct.iter().enumerate() {
            let values = distance.row(e);
            if values.iter().any(|&d| !d.is_finite() || d < 0.0) {
                return Err(CmeansError::InvalidParameter(format!(
                    "distances from sequence {} must be finite and non-negative",
                    e
                )));
            }
            exemplar_distances.row_mut(row).assign(&values);
        }

        Ok(Self {
            groups,
            exemplar_distances,
            m,
            distances: Array2::zeros((exemplars.len(), n_sequences)),
        })
    }
}

impl UpdateStep for ExemplarStep {
    fn step(&mut self, membership: &ArrayView2<f64>) -> Result<StepOutput> {
        let normalized = partition::normalize_columns(membership)?;
        let fuzzified = partition::fuzzify(&normalized.view(), self.m);

        let mut distances = Array2::zeros(fuzzified.dim());
        for (c, group) in self.groups.iter().enumerate() {
            let mut target = distances.row_mut(c);
            let mut total = 0.0;
            for &(e, row) in group {
                let weight = fuzzified[[c, e]];
                target.scaled_add(weight, &self.exemplar_distances.row(row));
                total += weight;
            }
            if total > 0.0 {
                target /= total;
            } else {
                // Every weight underflowed (large m): fall back to the plain mean
                for &(_, row) in group {
                    target += &self.exemplar_distances.row(row);
                }
                target /= group.len() as f64;
            }
        }
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
