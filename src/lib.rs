//! # fusioncmeans-rs
//!
//! Fuzzy c-means clustering that fuses two heterogeneous distance signals,
//! such as geographic coordinates and tag or topic similarity, compatible
//! with ndarray.
//!
//! ## Engines
//!
//! - [`CoordinateEngine`]: single-modality fuzzy c-means with recomputed centroids
//! - [`FusionEngine`]: two feature matrices, independent centroids, one fused
//!   dissimilarity driving a shared membership; or coordinates fused with a
//!   precomputed sample similarity matrix
//! - [`CenterFreeEngine`]: clustering from pairwise sequence distances where no
//!   centroid exists, anchored on fixed exemplar sets per cluster
//! - [`PredictEngine`]: fuzzy assignment of new samples to trained centers
//! - [`SeedInitializer`]: farthest-point seeding and k-nearest exemplar selection
//!
//! All engines share one fixed-point loop and report per-step diagnostics
//! through an [`IterationObserver`] (by default, `tracing` events).
//!
//! ## Example
//!
//! ```rust
//! use fusioncmeans_rs::{FusionEngine, FuzzyConfig};
//! use ndarray::array;
//!
//! let coordinates = array![[0.0, 0.0], [0.0, 1.0], [10.0, 0.0], [10.0, 1.0]];
//! let tags = array![[2.0, 0.0], [1.0, 0.0], [0.0, 1.0], [0.0, 3.0]];
//!
//! let config = FuzzyConfig::new(2).with_weight(0.6).with_seed(42);
//! let engine = FusionEngine::new(config).unwrap();
//! let result = engine.fit(&coordinates.view(), &tags.view(), None, None).unwrap();
//!
//! assert_eq!(result.membership.dim(), (2, 4));
//! assert_eq!(result.hard_assignments().len(), 4);
//! ```
//!
//! ## Center-free clustering
//!
//! ```rust
//! use fusioncmeans_rs::{CenterFreeEngine, FnDistance, FuzzyConfig, SeedConfig};
//!
//! let positions = [0.0f64, 0.1, 0.2, 5.0, 5.1, 5.2];
//! let metric = FnDistance::new(positions.len(), |i, j| (positions[i] - positions[j]).abs() / 5.2);
//!
//! let engine = CenterFreeEngine::new(
//!     FuzzyConfig::center_free(2),
//!     SeedConfig::new(2).with_distance_threshold(0.5),
//! )
//! .unwrap();
//! let result = engine.fit(&metric, None, None).unwrap();
//!
//! let labels = result.hard_assignments();
//! assert_eq!(labels[0], labels[2]);
//! assert_ne!(labels[0], labels[5]);
//! ```
//!
//! ## BLAS Acceleration
//!
//! For improved performance on large datasets, enable a BLAS backend:
//!
//! ```toml
//! # macOS (recommended - uses Apple Accelerate)
//! fusioncmeans-rs = { version = "0.1", features = ["accelerate"] }
//!
//! # Linux/Windows (requires OpenBLAS installed)
//! fusioncmeans-rs = { version = "0.1", features = ["openblas"] }
//! ```

// Link BLAS libraries when features are enabled
#[cfg(feature = "accelerate")]
extern crate accelerate_src;

#[cfg(feature = "openblas")]
extern crate openblas_src;

mod algorithm;
mod center_free;
mod cmeans;
mod config;
mod coordinate;
pub mod distance;
mod error;
mod fusion;
pub mod observer;
pub mod partition;
mod predict;
mod seed;

pub use algorithm::Termination;
pub use center_free::{CenterFreeEngine, CenterFreeResult};
pub use cmeans::FuzzyCMeans;
pub use config::{Algorithm, FuzzyConfig, SeedConfig};
pub use coordinate::{CoordinateEngine, CoordinateResult};
pub use distance::{FnDistance, FusedDistance, SequenceDistance};
pub use error::{CmeansError, Result};
pub use fusion::{FusionEngine, FusionResult, SimilarityFusionResult};
pub use observer::{EventLog, IterationEvent, IterationObserver, TracingObserver};
pub use partition::Assignment;
pub use predict::{PredictEngine, PredictResult};
pub use seed::{SeedInitializer, Seeding};
