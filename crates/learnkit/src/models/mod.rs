use rand::distributions::Distribution;
use rand::rngs::StdRng;
use statrs::distribution::Normal;

use crate::error::{LearnError, Result};
use crate::math::{Array1, Array2};

pub mod kmeans;
pub mod knn;
pub mod linear_regression;
pub mod logistic_regression;
pub mod pca;
pub mod traits;

pub use kmeans::{Initialisation, KMeans, KMeansParams};
pub use knn::{KnnClassifier, KnnParams, KnnRegressor};
pub use linear_regression::{LinearRegression, LinearRegressionParams, Solver};
pub use logistic_regression::{LogisticRegression, LogisticRegressionParams};
pub use pca::{Components, Pca, PcaParams};
pub use traits::{Predictor, ProbabilisticClassifier, Trainable, Transformer};

/// `x` with a leading column of ones when `bias` is set.
pub(crate) fn design_matrix(x: &Array2<f64>, bias: bool) -> Array2<f64> {
    if bias {
        x.prepend_ones()
    } else {
        x.clone()
    }
}

/// `dim` independent draws from N(0, 1).
pub(crate) fn gaussian_weights(dim: usize, rng: &mut StdRng) -> Result<Array1<f64>> {
    let normal =
        Normal::new(0.0, 1.0).map_err(|e| LearnError::config("initial_weights", e.to_string()))?;
    Ok((0..dim).map(|_| normal.sample(rng)).collect())
}
