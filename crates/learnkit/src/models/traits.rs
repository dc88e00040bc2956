use crate::error::Result;
use crate::math::Array2;

/// Capability traits shared by the models.
///
/// Each model implements only the roles it supports: regressors are
/// `Trainable + Predictor`, classifiers add `ProbabilisticClassifier`, PCA
/// is `Trainable + Transformer`, K-means is `Trainable + Predictor` with a
/// unit target.
pub trait Trainable {
    /// What `train` learns from: regression targets, class labels, or `()`
    /// for unsupervised models.
    type Target: ?Sized;

    fn train(&mut self, x: &Array2<f64>, y: &Self::Target) -> Result<()>;

    /// Human readable name, used in log messages.
    fn name(&self) -> &str {
        "model"
    }
}

pub trait Predictor {
    type Output;

    /// Predict one value per row of `x`. Fails with `NotTrained` before `train`.
    fn predict(&self, x: &Array2<f64>) -> Result<Self::Output>;
}

pub trait ProbabilisticClassifier: Predictor {
    /// `n x k` matrix of class probabilities; every row sums to one.
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>>;
}

pub trait Transformer {
    fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>>;

    /// Map transformed rows back into the input space.
    fn inverse_transform(&self, z: &Array2<f64>) -> Result<Array2<f64>>;
}
