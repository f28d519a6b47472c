use thiserror::Error;

/// Error types for the fusioncmeans library
#[derive(Error, Debug)]
pub enum CmeansError {
    /// The number of clusters is invalid (must be > 0 and fit the data)
    #[error("Invalid cluster count: {0}")]
    InvalidClusterCount(String),

    /// Not enough data points for the requested number of clusters
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Model has not been fitted yet
    #[error("Model has not been fitted. Call train() or fit() first.")]
    NotFitted,

    /// Shape mismatch between matrices taking part in one run
    #[error("Dimension mismatch: {0}")]
    InvalidDimensions(String),

    /// A configuration value is outside its valid range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, CmeansError>;
