//! Initial membership for center-free clustering.
//!
//! Without centroids there is no natural random start, so clusters are
//! seeded from well separated reference sequences and each reference's `k`
//! nearest sequences become that cluster's exemplars.

use crate::algorithm::make_rng;
use crate::config::SeedConfig;
use crate::distance::SequenceDistance;
use crate::error::{CmeansError, Result};
use ndarray::{s, Array1, Array2, ArrayView2, Axis};
use rand::seq::SliceRandom;
use rand::Rng;

/// Output of [`SeedInitializer::seed`]
#[derive(Debug, Clone)]
pub struct Seeding {
    /// Reference sequence of every cluster, in cluster order
    pub references: Vec<usize>,
    /// Distances from every reference to every sequence (n_clusters, n_sequences)
    pub reference_distances: Array2<f64>,
    /// 0/1 membership with exactly `k` ones per row (n_clusters, n_sequences)
    pub membership: Array2<f64>,
}

impl Seeding {
    /// Seed members of every cluster
    pub fn exemplars(&self) -> Vec<Vec<usize>> {
        self.membership
            .outer_iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter(|(_, &u)| u > 0.0)
                    .map(|(j, _)| j)
                    .collect()
            })
            .collect()
    }
}

/// Farthest-point seeding followed by k-nearest membership construction.
#[derive(Debug, Clone, Default)]
pub struct SeedInitializer {
    config: SeedConfig,
}

impl SeedInitializer {
    /// Create an initializer from `config`.
    pub fn new(config: SeedConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &SeedConfig {
        &self.config
    }

    /// Pick `n_clusters` references and build the seed membership.
    ///
    /// Deterministic when both seeds in the configuration are set.
    pub fn seed(&self, distance: &dyn SequenceDistance, n_clusters: usize) -> Result<Seeding> {
        let n_sequences = distance.len();
        let (references, reference_distances) = self.farthest_references(distance, n_clusters)?;
        let membership = self.nearest_membership(&reference_distances.view())?;

        tracing::info!(
            "Seeded {} clusters from {} sequences, references {:?}",
            n_clusters,
            n_sequences,
            references
        );

        Ok(Seeding {
            references,
            reference_distances,
            membership,
        })
    }

    /// Farthest-point reference selection.
    ///
    /// The first reference is pinned or random. Every later one is drawn at
    /// random from the sequences whose distance to all existing references is
    /// at least the configured threshold; if there are none, the sequence with
    /// the largest summed distance to the existing references is taken.
    pub fn farthest_references(
        &self,
        distance: &dyn SequenceDistance,
        n_clusters: usize,
    ) -> Result<(Vec<usize>, Array2<f64>)> {
        let n_sequences = distance.len();
        if n_clusters == 0 || n_clusters > n_sequences {
            return Err(CmeansError::InvalidClusterCount(format!(
                "cannot seed {} clusters from {} sequences",
                n_clusters, n_sequences
            )));
        }
        self.config.validate(n_sequences)?;

        let threshold = self.config.distance_threshold;
        let mut rng = make_rng(self.config.seed);

        let first = match self.config.first_reference {
            Some(first) => first,
            None => rng.gen_range(0..n_sequences),
        };

        let mut references = Vec::with_capacity(n_clusters);
        let mut rows = Array2::zeros((n_clusters, n_sequences));
        references.push(first);
        rows.row_mut(0).assign(&checked_row(distance, first)?);

        for c in 1..n_clusters {
            let chosen = rows.slice(s![..c, ..]);
            let candidates: Vec<usize> = (0..n_sequences)
                .filter(|&j| chosen.column(j).iter().all(|&d| d >= threshold))
                .collect();

            let next = match candidates.choose(&mut rng) {
                Some(&j) => j,
                None => {
                    let farthest = argmax(chosen.sum_axis(Axis(0)).iter().copied());
                    tracing::warn!(
                        "No sequence is {} away from all {} references; falling back to farthest on average ({})",
                        threshold,
                        c,
                        farthest
                    );
                    farthest
                }
            };

            references.push(next);
            rows.row_mut(c).assign(&checked_row(distance, next)?);
        }

        Ok((references, rows))
    }

    /// Mark the `k` nearest sequences of every reference.
    ///
    /// The k-th smallest distance is the inclusion cutoff, so ties can admit
    /// more than `k` candidates; those rows are randomly down-sampled to
    /// exactly `k`.
    pub fn nearest_membership(&self, reference_distances: &ArrayView2<f64>) -> Result<Array2<f64>> {
        let k = self.config.k;
        let n_sequences = reference_distances.ncols();
        if k == 0 || k > n_sequences {
            return Err(CmeansError::InvalidParameter(format!(
                "exemplar budget k must lie in 1..={}, got {}",
                n_sequences, k
            )));
        }

        let mut rng = make_rng(self.config.downsample_seed);
        let mut membership = Array2::zeros(reference_distances.dim());

        for (c, row) in reference_distances.outer_iter().enumerate() {
            let mut sorted = row.to_vec();
            sorted.sort_by(f64::total_cmp);
            let cutoff = sorted[k - 1];

            let candidates: Vec<usize> = row
                .iter()
                .enumerate()
                .filter(|(_, &d)| d <= cutoff)
                .map(|(j, _)| j)
                .collect();

            let members: Vec<usize> = if candidates.len() > k {
                tracing::debug!(
                    "Cluster {}: {} candidates tie at cutoff {}, keeping {}",
                    c,
                    candidates.len(),
                    cutoff,
                    k
                );
                candidates.choose_multiple(&mut rng, k).copied().collect()
            } else {
                candidates
            };

            for j in members {
                membership[[c, j]] = 1.0;
            }
        }

        Ok(membership)
    }
}

fn checked_row(distance: &dyn SequenceDistance, i: usize) -> Result<Array1<f64>> {
    let row = distance.row(i);
    if row.iter().any(|&d| !d.is_finite() || d < 0.0) {
        return Err(CmeansError::InvalidParameter(format!(
            "distances from sequence {} must be finite and non-negative",
            i
        )));
    }
    Ok(row)
}

/// Index of the first maximum
fn argmax(values: impl Iterator<Item = f64>) -> usize {
    let mut best = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (i, value) in values.enumerate() {
        if value > best_value {
            best = i;
            best_value = value;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::FnDistance;
    use ndarray::array;

    const POINTS: [f64; 5] = [0.0, 0.5, 10.0, 10.2, 100.0];

    fn group_of(index: usize) -> usize {
        match index {
            0 | 1 => 0,
            2 | 3 => 1,
            _ => 2,
        }
    }

    fn line_distance() -> FnDistance<impl Fn(usize, usize) -> f64 + Send + Sync> {
        FnDistance::new(POINTS.len(), |i, j| (POINTS[i] - POINTS[j]).abs())
    }

    #[test]
    fn test_farthest_references_are_well_separated() {
        let distance = line_distance();

        for seed in 0..20 {
            let initializer = SeedInitializer::new(
                SeedConfig::new(1)
                    .with_distance_threshold(5.0)
                    .with_seed(seed)
                    .with_first_reference(0),
            );
            let (references, rows) = initializer.farthest_references(&distance, 3).unwrap();

            assert_eq!(references[0], 0);
            let mut groups: Vec<usize> = references[1..].iter().map(|&r| group_of(r)).collect();
            groups.sort_unstable();
            assert_eq!(groups, vec![1, 2], "seed {} picked {:?}", seed, references);
            assert_eq!(rows.dim(), (3, 5));
        }
    }

    #[test]
    fn test_random_first_reference_still_separates() {
        let distance = line_distance();
        let initializer =
            SeedInitializer::new(SeedConfig::new(1).with_distance_threshold(5.0).with_seed(4));

        let (references, _) = initializer.farthest_references(&distance, 3).unwrap();

        let mut groups: Vec<usize> = references.iter().map(|&r| group_of(r)).collect();
        groups.sort_unstable();
        assert_eq!(groups, vec![0, 1, 2]);
    }

    #[test]
    fn test_fallback_takes_farthest_on_average() {
        let distance = line_distance();
        let initializer = SeedInitializer::new(
            SeedConfig::new(1)
                .with_distance_threshold(1_000.0)
                .with_first_reference(0),
        );

        let (references, _) = initializer.farthest_references(&distance, 2).unwrap();
        assert_eq!(references, vec![0, 4]);
    }

    #[test]
    fn test_nearest_membership_exactly_k_with_ties() {
        let rows = array![
            [0.0, 1.0, 1.0, 1.0, 1.0, 5.0],
            [5.0, 4.0, 3.0, 2.0, 1.0, 0.0]
        ];
        let initializer = SeedInitializer::new(SeedConfig::new(3));

        let membership = initializer.nearest_membership(&rows.view()).unwrap();

        for row in membership.outer_iter() {
            assert_eq!(row.iter().filter(|&&u| u == 1.0).count(), 3);
        }
        // Tied row: members come from the five sequences at or below the cutoff
        assert_eq!(membership[[0, 5]], 0.0);
        // Untied row: exactly the three nearest
        assert_eq!(membership.row(1).to_vec(), vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_seed_is_deterministic() {
        let distance = line_distance();
        let initializer =
            SeedInitializer::new(SeedConfig::new(2).with_distance_threshold(5.0).with_seed(1));

        let a = initializer.seed(&distance, 3).unwrap();
        let b = initializer.seed(&distance, 3).unwrap();

        assert_eq!(a.references, b.references);
        assert_eq!(a.membership, b.membership);
        for members in a.exemplars() {
            assert_eq!(members.len(), 2);
        }
    }

    #[test]
    fn test_seed_rejects_too_many_clusters() {
        let distance = line_distance();
        let initializer = SeedInitializer::new(SeedConfig::new(1));
        assert!(matches!(
            initializer.seed(&distance, 6),
            Err(CmeansError::InvalidClusterCount(_))
        ));
    }
}
