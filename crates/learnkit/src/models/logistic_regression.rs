use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::OptimizerConfig;
use crate::error::{LearnError, Result};
use crate::math::normalisers::sigmoid_scalar;
use crate::math::{argmax_axis, matmul, matrix_vector, softmax_rows, Array1, Array2, Axis};
use crate::metrics::accuracy;
use crate::models::traits::{Predictor, ProbabilisticClassifier, Trainable};
use crate::models::{design_matrix, gaussian_weights};
use crate::optim::{run_gradient_descent, run_one_vs_rest, LossKind, Termination};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LogisticRegressionParams {
    pub bias: bool,
    pub optimizer: OptimizerConfig,
    /// Seed for the N(0, 1) initial weights, drawn in class order.
    pub seed: u64,
}

impl Default for LogisticRegressionParams {
    fn default() -> Self {
        Self {
            bias: true,
            optimizer: OptimizerConfig::default(),
            seed: 0,
        }
    }
}

#[derive(Debug, Clone)]
enum Weights {
    Binary(Array1<f64>),
    /// One column per class.
    OneVsRest(Array2<f64>),
}

/// Logistic classifier over class indices `0..k`.
///
/// Two classes train a single sigmoid model. More classes train one binary
/// model per class and combine their scores with a row-wise softmax.
pub struct LogisticRegression {
    params: LogisticRegressionParams,
    weights: Option<Weights>,
    costs: Vec<Vec<f64>>,
    iterations: Vec<usize>,
}

impl LogisticRegression {
    pub fn new(params: LogisticRegressionParams) -> Self {
        LogisticRegression {
            params,
            weights: None,
            costs: Vec::new(),
            iterations: Vec::new(),
        }
    }

    pub fn n_classes(&self) -> Option<usize> {
        self.weights.as_ref().map(|w| match w {
            Weights::Binary(_) => 2,
            Weights::OneVsRest(m) => m.ncols(),
        })
    }

    /// Coefficients as a `d x c` matrix: one column for a binary model,
    /// one per class otherwise.
    pub fn coefficients(&self) -> Result<Array2<f64>> {
        match self.weights.as_ref().ok_or(LearnError::NotTrained)? {
            Weights::Binary(theta) => Array2::from_shape_vec((theta.len(), 1), theta.to_vec()),
            Weights::OneVsRest(m) => Ok(m.clone()),
        }
    }

    /// One cost trajectory per trained sub-model.
    pub fn costs(&self) -> &[Vec<f64>] {
        &self.costs
    }

    pub fn iterations(&self) -> &[usize] {
        &self.iterations
    }

    /// Fraction of correctly predicted labels.
    pub fn score(&self, x: &Array2<f64>, y: &[usize]) -> Result<f64> {
        let predicted = self.predict(x)?;
        accuracy(y, predicted.as_slice())
    }

    fn warn_unconverged(&self, terminations: &[Termination]) {
        for (class, termination) in terminations.iter().enumerate() {
            if *termination == Termination::MaxIterationsReached {
                log::warn!(
                    "{}: sub-model {} did not converge within the iteration cap",
                    self.name(),
                    class
                );
            }
        }
    }
}

impl Trainable for LogisticRegression {
    type Target = [usize];

    fn train(&mut self, x: &Array2<f64>, y: &[usize]) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(LearnError::mismatch(x.shape(), (y.len(),)));
        }
        let n_classes = y.iter().copied().max().ok_or(LearnError::EmptyInput)? + 1;
        if n_classes < 2 {
            return Err(LearnError::config(
                "labels",
                "logistic regression needs at least two classes",
            ));
        }

        let design = design_matrix(x, self.params.bias);
        let mut rng = StdRng::seed_from_u64(self.params.seed);

        if n_classes == 2 {
            let theta = gaussian_weights(design.ncols(), &mut rng)?;
            let target: Array1<f64> = y.iter().map(|&label| label as f64).collect();
            let outcome = run_gradient_descent(
                &LossKind::LogLoss,
                &design,
                &target,
                theta,
                &self.params.optimizer,
            )?;
            self.warn_unconverged(&[outcome.termination]);
            self.weights = Some(Weights::Binary(outcome.theta));
            self.costs = vec![outcome.costs];
            self.iterations = vec![outcome.iterations];
        } else {
            let thetas = (0..n_classes)
                .map(|_| gaussian_weights(design.ncols(), &mut rng))
                .collect::<Result<Vec<_>>>()?;
            let outcome =
                run_one_vs_rest(&LossKind::LogLoss, &design, y, thetas, &self.params.optimizer)?;
            self.warn_unconverged(&outcome.terminations);
            self.weights = Some(Weights::OneVsRest(outcome.coefficient_matrix()?));
            self.costs = outcome.costs;
            self.iterations = outcome.iterations;
        }

        log::debug!(
            "{} trained on {} samples, {} classes, iterations {:?}",
            self.name(),
            x.nrows(),
            n_classes,
            self.iterations
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "logistic regression"
    }
}

impl Predictor for LogisticRegression {
    type Output = Array1<usize>;

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>> {
        argmax_axis(&self.predict_proba(x)?, Axis::ROWS)
    }
}

impl ProbabilisticClassifier for LogisticRegression {
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let weights = self.weights.as_ref().ok_or(LearnError::NotTrained)?;
        let design = design_matrix(x, self.params.bias);
        match weights {
            Weights::Binary(theta) => {
                let scores = matrix_vector(&design, theta)?;
                let data = scores
                    .iter()
                    .flat_map(|&z| {
                        let p = sigmoid_scalar(z);
                        [1.0 - p, p]
                    })
                    .collect();
                Array2::from_shape_vec((scores.len(), 2), data)
            }
            Weights::OneVsRest(w) => softmax_rows(&matmul(&design, w)?),
        }
    }
}
