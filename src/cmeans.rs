use crate::config::FuzzyConfig;
use crate::coordinate::{CoordinateEngine, CoordinateResult};
use crate::error::{CmeansError, Result};
use crate::predict::{PredictEngine, PredictResult};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// Stateful fuzzy c-means model with a scikit-learn style API.
///
/// Wraps [`CoordinateEngine`] for training and [`PredictEngine`] for
/// assigning new samples to the trained centers.
///
/// # Example
///
/// ```
/// use fusioncmeans_rs::FuzzyCMeans;
/// use ndarray::Array2;
/// use ndarray_rand::RandomExt;
/// use ndarray_rand::rand_distr::Uniform;
///
/// let data = Array2::random((200, 3), Uniform::new(-1.0, 1.0));
///
/// let mut model = FuzzyCMeans::new(3, 4);
/// model.train(&data.view()).unwrap();
///
/// let labels = model.predict(&data.view()).unwrap();
/// assert_eq!(labels.len(), 200);
/// ```
pub struct FuzzyCMeans {
    /// Model configuration
    config: FuzzyConfig,

    /// Number of features (dimensions)
    d: usize,

    /// Result of the last training run (None if not yet fitted)
    trained: Option<CoordinateResult>,
}

impl FuzzyCMeans {
    /// Create a new model with default configuration.
    ///
    /// # Arguments
    ///
    /// * `d` - Number of features (dimensions) in the data
    /// * `n_clusters` - Number of clusters
    ///
    /// # Panics
    ///
    /// Panics if `n_clusters` is 0.
    pub fn new(d: usize, n_clusters: usize) -> Self {
        assert!(n_clusters > 0, "n_clusters must be greater than 0");

        Self {
            config: FuzzyConfig::new(n_clusters),
            d,
            trained: None,
        }
    }

    /// Create a new model with custom configuration.
    ///
    /// # Panics
    ///
    /// Panics if `config.n_clusters` is 0.
    pub fn with_config(config: FuzzyConfig) -> Self {
        assert!(config.n_clusters > 0, "n_clusters must be greater than 0");

        Self {
            d: 0, // Will be set on first train call
            config,
            trained: None,
        }
    }

    /// Train the model on `data` (n_samples, n_features).
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration is invalid
    /// - Number of samples is less than the number of clusters
    /// - Data dimensions don't match (for subsequent calls)
    pub fn train(&mut self, data: &ArrayView2<f64>) -> Result<()> {
        self.train_inner(data, None)
    }

    /// Train with per-sample frequencies (`Algorithm::LocationFrequency`).
    pub fn train_with_frequency(
        &mut self,
        data: &ArrayView2<f64>,
        frequency: &ArrayView1<f64>,
    ) -> Result<()> {
        self.train_inner(data, Some(frequency))
    }

    fn train_inner(
        &mut self,
        data: &ArrayView2<f64>,
        frequency: Option<&ArrayView1<f64>>,
    ) -> Result<()> {
        let n_features = data.ncols();

        // Set dimensions on first call, validate on subsequent calls
        if self.d == 0 {
            self.d = n_features;
        } else if n_features != self.d {
            return Err(CmeansError::InvalidDimensions(format!(
                "Expected {} features, got {}",
                self.d, n_features
            )));
        }

        let engine = CoordinateEngine::new(self.config.clone())?;
        self.trained = Some(engine.fit(data, frequency, None)?);
        Ok(())
    }

    /// Fit the model to the data. Equivalent to `train()`.
    ///
    /// # Returns
    ///
    /// Returns `&mut Self` for method chaining.
    pub fn fit(&mut self, data: &ArrayView2<f64>) -> Result<&mut Self> {
        self.train(data)?;
        Ok(self)
    }

    /// Predict hard cluster labels for new data.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The model has not been fitted yet
    /// - Data dimensions don't match the training data
    pub fn predict(&self, data: &ArrayView2<f64>) -> Result<Array1<usize>> {
        Ok(self.predict_membership(data)?.hard_assignments())
    }

    /// Fuzzy membership of new data in the trained clusters.
    pub fn predict_membership(&self, data: &ArrayView2<f64>) -> Result<PredictResult> {
        let trained = self.trained.as_ref().ok_or(CmeansError::NotFitted)?;

        let n_features = data.ncols();
        if n_features != self.d {
            return Err(CmeansError::InvalidDimensions(format!(
                "Expected {} features, got {}",
                self.d, n_features
            )));
        }

        PredictEngine::new(self.config.clone())?.predict(&trained.centers.view(), data, None)
    }

    /// Fit the model and predict hard labels in one call.
    pub fn fit_predict(&mut self, data: &ArrayView2<f64>) -> Result<Array1<usize>> {
        self.train(data)?;
        self.predict(data)
    }

    /// Trained centers, if fitted
    pub fn centers(&self) -> Option<&Array2<f64>> {
        self.trained.as_ref().map(|result| &result.centers)
    }

    /// Training membership, if fitted
    pub fn membership(&self) -> Option<&Array2<f64>> {
        self.trained.as_ref().map(|result| &result.membership)
    }

    /// Full output of the last training run
    pub fn result(&self) -> Option<&CoordinateResult> {
        self.trained.as_ref()
    }

    /// Get the number of clusters.
    pub fn n_clusters(&self) -> usize {
        self.config.n_clusters
    }

    /// Get the number of features (dimensions).
    pub fn d(&self) -> usize {
        self.d
    }

    /// Get the configuration.
    pub fn config(&self) -> &FuzzyConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Algorithm;
    use ndarray::{array, Array2};
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;

    #[test]
    fn test_fuzzycmeans_new() {
        let model = FuzzyCMeans::new(16, 5);
        assert_eq!(model.n_clusters(), 5);
        assert_eq!(model.d(), 16);
        assert!(model.centers().is_none());
    }

    #[test]
    fn test_fuzzycmeans_train() {
        let data = Array2::random((300, 8), Uniform::new(-1.0, 1.0));
        let mut model = FuzzyCMeans::new(8, 4);

        model.train(&data.view()).unwrap();

        let centers = model.centers().unwrap();
        assert_eq!(centers.dim(), (4, 8));
        assert_eq!(model.membership().unwrap().dim(), (4, 300));
    }

    #[test]
    fn test_fuzzycmeans_predict() {
        let train_data = Array2::random((200, 4), Uniform::new(-1.0, 1.0));
        let test_data = Array2::random((50, 4), Uniform::new(-1.0, 1.0));

        let mut model = FuzzyCMeans::new(4, 3);
        model.train(&train_data.view()).unwrap();

        let labels = model.predict(&test_data.view()).unwrap();
        assert_eq!(labels.len(), 50);
        assert!(labels.iter().all(|&label| label < 3));
    }

    #[test]
    fn test_fuzzycmeans_fit_predict() {
        let data = Array2::random((120, 2), Uniform::new(-1.0, 1.0));
        let mut model = FuzzyCMeans::new(2, 3);

        let labels = model.fit_predict(&data.view()).unwrap();
        assert_eq!(labels.len(), 120);
        assert!(model.result().is_some());
    }

    #[test]
    fn test_fuzzycmeans_predict_before_fit() {
        let data = Array2::random((10, 2), Uniform::new(-1.0, 1.0));
        let model = FuzzyCMeans::new(2, 2);

        let result = model.predict(&data.view());
        assert!(matches!(result, Err(CmeansError::NotFitted)));
    }

    #[test]
    fn test_fuzzycmeans_dimension_mismatch() {
        let train_data = Array2::random((40, 2), Uniform::new(-1.0, 1.0));
        let test_data = Array2::random((10, 3), Uniform::new(-1.0, 1.0));

        let mut model = FuzzyCMeans::new(2, 2);
        model.train(&train_data.view()).unwrap();

        let result = model.predict(&test_data.view());
        assert!(matches!(result, Err(CmeansError::InvalidDimensions(_))));
    }

    #[test]
    fn test_fuzzycmeans_train_with_frequency() {
        let data = array![[0.0, 0.0], [0.0, 1.0], [10.0, 0.0], [10.0, 1.0]];
        let frequency = array![1.0, 3.0, 1.0, 3.0];
        let config = FuzzyConfig::new(2)
            .with_seed(5)
            .with_algorithm(Algorithm::LocationFrequency);

        let mut model = FuzzyCMeans::with_config(config);
        model
            .train_with_frequency(&data.view(), &frequency.view())
            .unwrap();

        assert_eq!(model.d(), 2);
        assert!(model.centers().is_some());
    }

    #[test]
    #[should_panic(expected = "n_clusters must be greater than 0")]
    fn test_fuzzycmeans_zero_clusters() {
        let _ = FuzzyCMeans::new(2, 0);
    }
}
