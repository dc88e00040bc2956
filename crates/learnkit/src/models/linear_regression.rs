use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::OptimizerConfig;
use crate::error::{LearnError, Result};
use crate::math::{least_squares, matrix_vector, Array1, Array2};
use crate::metrics::mean_squared_error;
use crate::models::traits::{Predictor, Trainable};
use crate::models::{design_matrix, gaussian_weights};
use crate::optim::{run_gradient_descent, LossKind, Termination};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Solver {
    /// Closed form via the normal equations.
    Ols,
    GradientDescent,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LinearRegressionParams {
    pub solver: Solver,
    /// Fit an intercept by prepending a column of ones.
    pub bias: bool,
    pub optimizer: OptimizerConfig,
    /// Seed for the N(0, 1) initial weights of the gradient-descent solver.
    pub seed: u64,
}

impl Default for LinearRegressionParams {
    fn default() -> Self {
        Self {
            solver: Solver::Ols,
            bias: true,
            optimizer: OptimizerConfig::default(),
            seed: 0,
        }
    }
}

pub struct LinearRegression {
    params: LinearRegressionParams,
    coefficients: Option<Array1<f64>>,
    costs: Vec<f64>,
    iterations: usize,
}

impl LinearRegression {
    pub fn new(params: LinearRegressionParams) -> Self {
        LinearRegression {
            params,
            coefficients: None,
            costs: Vec::new(),
            iterations: 0,
        }
    }

    pub fn params(&self) -> &LinearRegressionParams {
        &self.params
    }

    /// Learned weights; the intercept comes first when `bias` is set.
    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.coefficients.as_ref()
    }

    /// Cost trajectory of the last gradient-descent fit (empty for OLS).
    pub fn costs(&self) -> &[f64] {
        &self.costs
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Mean squared error of the predictions for `x` against `y`.
    pub fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        mean_squared_error(y, &self.predict(x)?)
    }
}

impl Trainable for LinearRegression {
    type Target = Array1<f64>;

    fn train(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(LearnError::mismatch(x.shape(), y.shape()));
        }
        let design = design_matrix(x, self.params.bias);

        match self.params.solver {
            Solver::Ols => {
                self.coefficients = Some(least_squares(&design, y)?);
                self.costs.clear();
                self.iterations = 0;
            }
            Solver::GradientDescent => {
                let mut rng = StdRng::seed_from_u64(self.params.seed);
                let theta = gaussian_weights(design.ncols(), &mut rng)?;
                let outcome = run_gradient_descent(
                    &LossKind::SquaredError,
                    &design,
                    y,
                    theta,
                    &self.params.optimizer,
                )?;
                if outcome.termination == Termination::MaxIterationsReached {
                    log::warn!(
                        "{} did not converge within {} iterations",
                        self.name(),
                        outcome.iterations
                    );
                }
                self.coefficients = Some(outcome.theta);
                self.costs = outcome.costs;
                self.iterations = outcome.iterations;
            }
        }
        log::debug!("{} trained on {} samples", self.name(), x.nrows());
        Ok(())
    }

    fn name(&self) -> &str {
        "linear regression"
    }
}

impl Predictor for LinearRegression {
    type Output = Array1<f64>;

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let theta = self.coefficients.as_ref().ok_or(LearnError::NotTrained)?;
        matrix_vector(&design_matrix(x, self.params.bias), theta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpdateRule;

    fn line() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_rows((0..8).map(|i| vec![i as f64 * 0.25]).collect()).unwrap();
        let y = x.column(0).mapv(|v| 1.5 - 2.0 * v);
        (x, y)
    }

    #[test]
    fn ols_recovers_exact_line() {
        let (x, y) = line();
        let mut model = LinearRegression::new(LinearRegressionParams::default());
        model.train(&x, &y).unwrap();
        let theta = model.coefficients().unwrap();
        assert!((theta[0] - 1.5).abs() < 1e-9);
        assert!((theta[1] + 2.0).abs() < 1e-9);
        assert!(model.score(&x, &y).unwrap() < 1e-16);
        assert!(model.costs().is_empty());
    }

    #[test]
    fn gradient_descent_approaches_ols() {
        let (x, y) = line();
        let params = LinearRegressionParams {
            solver: Solver::GradientDescent,
            optimizer: OptimizerConfig::new(UpdateRule::Normal)
                .with_learning_rate(0.3)
                .with_epsilon(1e-14)
                .with_max_iterations(100_000),
            seed: 7,
            ..LinearRegressionParams::default()
        };
        let mut model = LinearRegression::new(params);
        model.train(&x, &y).unwrap();
        let theta = model.coefficients().unwrap();
        assert!((theta[0] - 1.5).abs() < 1e-4);
        assert!((theta[1] + 2.0).abs() < 1e-4);
        assert_eq!(model.costs().len(), model.iterations());
    }

    #[test]
    fn predict_before_train_fails() {
        let model = LinearRegression::new(LinearRegressionParams::default());
        let (x, _) = line();
        assert_eq!(model.predict(&x), Err(LearnError::NotTrained));
    }
}
