//! learnkit: a small machine-learning toolkit built on its own numeric kernel.
//!
//! The crate provides shape-tagged arrays with broadcasting arithmetic,
//! dense linear algebra (least squares, determinants, Jacobi
//! eigendecomposition), axis-aware statistics, quicksort-based ordering,
//! p-norm distances and a gradient-descent optimizer with five update rules
//! and one-vs-rest orchestration. Linear and logistic regression, PCA,
//! K-means and KNN are thin consumers of those pieces.
//!
//! Library code only emits `log` records; installing a logger is left to the
//! caller.
pub mod config;
pub mod datasets;
pub mod error;
pub mod math;
pub mod metrics;
pub mod models;
pub mod optim;
pub mod preprocessing;
pub mod stats;

pub use config::{OptimizerConfig, UpdateRule};
pub use error::{LearnError, Result};
