use crate::error::{CmeansError, Result};

/// How the engines combine their two distance sources or weight their centroids.
///
/// The iteration skeleton is shared by every variant; the variant is only
/// consulted where distances are combined or centroids are averaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    /// Plain fuzzy c-means on the primary source.
    #[default]
    Original,
    /// Centroids are means weighted by a per-sample frequency
    /// (e.g. the number of distinct visitors of a location).
    LocationFrequency,
    /// Two distance sources combined by elementwise product.
    TwoDistance,
    /// Two distance sources combined as `w * d1 + (1 - w) * d2`.
    TwoWeightedDistance,
}

impl Algorithm {
    /// Combine one entry of the primary and secondary distance sources.
    ///
    /// `Original` and `LocationFrequency` only look at `primary`.
    #[inline]
    pub fn combine(self, primary: f64, secondary: f64, weight: f64) -> f64 {
        match self {
            Algorithm::Original | Algorithm::LocationFrequency => primary,
            Algorithm::TwoDistance => primary * secondary,
            Algorithm::TwoWeightedDistance => weight * primary + (1.0 - weight) * secondary,
        }
    }

    /// Whether this variant reads a second distance source.
    pub fn uses_secondary(self) -> bool {
        matches!(self, Algorithm::TwoDistance | Algorithm::TwoWeightedDistance)
    }
}

/// Configuration shared by every fuzzy c-means engine
#[derive(Debug, Clone)]
pub struct FuzzyConfig {
    /// Number of clusters
    pub n_clusters: usize,

    /// Fuzzification exponent. Must be > 1; values close to 1 approach hard clustering.
    pub m: f64,

    /// Stopping criterion: iteration ends once the Frobenius norm of the
    /// membership change drops below this value.
    pub error: f64,

    /// Iteration budget. At most `max_iters - 1` update steps are run.
    pub max_iters: usize,

    /// Random seed for the initial membership. `None` draws from entropy.
    pub seed: Option<u64>,

    /// Fusion weight in [0, 1]. Higher values favour the primary modality.
    pub weight: f64,

    /// Distance combination / centroid weighting variant
    pub algorithm: Algorithm,
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        Self {
            n_clusters: 8,
            m: 2.0,
            error: 0.01,
            max_iters: 100,
            seed: None,
            weight: 0.4,
            algorithm: Algorithm::Original,
        }
    }
}

impl FuzzyConfig {
    /// Create a new configuration with the specified number of clusters
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            ..Default::default()
        }
    }

    /// Defaults tuned for center-free clustering, where each iteration is costly.
    pub fn center_free(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            max_iters: 30,
            error: 0.001,
            ..Default::default()
        }
    }

    /// Set the fuzzification exponent
    pub fn with_m(mut self, m: f64) -> Self {
        self.m = m;
        self
    }

    /// Set the convergence threshold
    pub fn with_error(mut self, error: f64) -> Self {
        self.error = error;
        self
    }

    /// Set the maximum number of iterations
    pub fn with_max_iters(mut self, max_iters: usize) -> Self {
        self.max_iters = max_iters;
        self
    }

    /// Set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the fusion weight
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Set the algorithm variant
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Check the parameters that drive the update loop itself.
    pub(crate) fn validate_iteration(&self) -> Result<()> {
        if !(self.m.is_finite() && self.m > 1.0) {
            return Err(CmeansError::InvalidParameter(format!(
                "fuzzification exponent m must be finite and > 1, got {}",
                self.m
            )));
        }
        if self.error.is_nan() || self.error < 0.0 {
            return Err(CmeansError::InvalidParameter(format!(
                "error threshold must be >= 0, got {}",
                self.error
            )));
        }
        if self.max_iters < 2 {
            return Err(CmeansError::InvalidParameter(format!(
                "max_iters must be >= 2 to allow one update step, got {}",
                self.max_iters
            )));
        }
        Ok(())
    }

    /// Validate the full configuration before any iteration starts.
    pub fn validate(&self) -> Result<()> {
        if self.n_clusters == 0 {
            return Err(CmeansError::InvalidClusterCount(
                "n_clusters must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.weight) {
            return Err(CmeansError::InvalidParameter(format!(
                "fusion weight must lie in [0, 1], got {}",
                self.weight
            )));
        }
        self.validate_iteration()
    }
}

/// Configuration of farthest-point seeding and k-nearest membership construction
#[derive(Debug, Clone)]
pub struct SeedConfig {
    /// Exemplar budget: number of seed members per cluster
    pub k: usize,

    /// A sequence qualifies as a new reference when its distance to every
    /// existing reference is at least this value.
    pub distance_threshold: f64,

    /// Seed for picking references. `None` draws from entropy.
    pub seed: Option<u64>,

    /// Seed for down-sampling tied candidates to exactly `k`. `None` draws from entropy.
    pub downsample_seed: Option<u64>,

    /// Pin the first reference instead of drawing it at random.
    pub first_reference: Option<usize>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            k: 30,
            distance_threshold: 0.9,
            seed: Some(10),
            downsample_seed: Some(0),
            first_reference: None,
        }
    }
}

impl SeedConfig {
    /// Create a seeding configuration with the given exemplar budget
    pub fn new(k: usize) -> Self {
        Self {
            k,
            ..Default::default()
        }
    }

    /// Set the "far enough" distance threshold
    pub fn with_distance_threshold(mut self, threshold: f64) -> Self {
        self.distance_threshold = threshold;
        self
    }

    /// Set the reference-picking seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the down-sampling seed
    pub fn with_downsample_seed(mut self, seed: u64) -> Self {
        self.downsample_seed = Some(seed);
        self
    }

    /// Use `index` as the first cluster reference
    pub fn with_first_reference(mut self, index: usize) -> Self {
        self.first_reference = Some(index);
        self
    }

    pub(crate) fn validate(&self, n_samples: usize) -> Result<()> {
        if self.k == 0 || self.k > n_samples {
            return Err(CmeansError::InvalidParameter(format!(
                "exemplar budget k must lie in 1..={}, got {}",
                n_samples, self.k
            )));
        }
        if !self.distance_threshold.is_finite() {
            return Err(CmeansError::InvalidParameter(
                "distance threshold must be finite".to_string(),
            ));
        }
        if let Some(first) = self.first_reference {
            if first >= n_samples {
                return Err(CmeansError::InvalidParameter(format!(
                    "first reference {} is out of range for {} samples",
                    first, n_samples
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(FuzzyConfig::default().validate().is_ok());
        assert!(FuzzyConfig::center_free(3).validate().is_ok());
    }

    #[test]
    fn test_rejects_m_at_one() {
        let config = FuzzyConfig::new(2).with_m(1.0);
        assert!(matches!(
            config.validate(),
            Err(CmeansError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_rejects_zero_clusters() {
        assert!(matches!(
            FuzzyConfig::new(0).validate(),
            Err(CmeansError::InvalidClusterCount(_))
        ));
    }

    #[test]
    fn test_rejects_weight_out_of_range() {
        assert!(FuzzyConfig::new(2).with_weight(1.5).validate().is_err());
        assert!(FuzzyConfig::new(2).with_weight(-0.1).validate().is_err());
    }

    #[test]
    fn test_rejects_single_iteration_budget() {
        assert!(FuzzyConfig::new(2).with_max_iters(1).validate().is_err());
    }

    #[test]
    fn test_combine_variants() {
        assert_eq!(Algorithm::Original.combine(0.5, 0.2, 0.3), 0.5);
        assert_eq!(Algorithm::TwoDistance.combine(0.5, 0.2, 0.3), 0.1);
        let fused = Algorithm::TwoWeightedDistance.combine(1.0, 0.0, 0.25);
        assert!((fused - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_seed_config_bounds() {
        assert!(SeedConfig::new(0).validate(10).is_err());
        assert!(SeedConfig::new(11).validate(10).is_err());
        assert!(SeedConfig::new(3).with_first_reference(10).validate(10).is_err());
        assert!(SeedConfig::new(3).validate(10).is_ok());
    }
}
