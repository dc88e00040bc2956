use serde::{Deserialize, Serialize};

use crate::error::{LearnError, Result};
use crate::math::linalg::{matrix_vector, transpose_vector};
use crate::math::normalisers::{sigmoid_scalar, softplus};
use crate::math::{Array1, Array2};

/// Loss and gradient of a model parameterised by `theta`.
///
/// `x` is `n x d`, `y` has length `n` and `theta` length `d`. Both methods
/// average over the `n` rows so that mini-batches of different sizes are
/// comparable.
pub trait Objective {
    fn loss(&self, x: &Array2<f64>, y: &Array1<f64>, theta: &Array1<f64>) -> Result<f64>;

    fn gradient(&self, x: &Array2<f64>, y: &Array1<f64>, theta: &Array1<f64>)
        -> Result<Array1<f64>>;
}

/// Built-in objectives.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LossKind {
    /// `Σ (xθ - y)² / 2n`, used by linear regression.
    SquaredError,
    /// Mean negative log-likelihood of a logistic model, `y ∈ {0, 1}`.
    LogLoss,
}

fn check_inputs(x: &Array2<f64>, y: &Array1<f64>, theta: &Array1<f64>) -> Result<()> {
    if x.nrows() == 0 {
        return Err(LearnError::EmptyInput);
    }
    if x.nrows() != y.len() {
        return Err(LearnError::mismatch(x.shape(), y.shape()));
    }
    if x.ncols() != theta.len() {
        return Err(LearnError::mismatch(x.shape(), theta.shape()));
    }
    Ok(())
}

impl Objective for LossKind {
    fn loss(&self, x: &Array2<f64>, y: &Array1<f64>, theta: &Array1<f64>) -> Result<f64> {
        check_inputs(x, y, theta)?;
        let z = matrix_vector(x, theta)?;
        let n = y.len() as f64;
        let total: f64 = match self {
            LossKind::SquaredError => z.iter().zip(y.iter()).map(|(h, t)| (h - t).powi(2)).sum::<f64>() / 2.0,
            LossKind::LogLoss => z.iter().zip(y.iter()).map(|(z, t)| softplus(*z) - t * z).sum(),
        };
        Ok(total / n)
    }

    fn gradient(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        theta: &Array1<f64>,
    ) -> Result<Array1<f64>> {
        check_inputs(x, y, theta)?;
        let z = matrix_vector(x, theta)?;
        let residuals: Array1<f64> = match self {
            LossKind::SquaredError => z.iter().zip(y.iter()).map(|(h, t)| h - t).collect(),
            LossKind::LogLoss => z
                .iter()
                .zip(y.iter())
                .map(|(z, t)| sigmoid_scalar(*z) - t)
                .collect(),
        };
        let n = y.len() as f64;
        Ok(transpose_vector(x, &residuals)?.mapv(|g| g / n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_rows(vec![vec![1.0, 0.0], vec![1.0, 1.0], vec![1.0, 2.0]]).unwrap();
        let y = Array1::from_vec(vec![1.0, 3.0, 5.0]);
        (x, y)
    }

    #[test]
    fn squared_error_is_zero_at_the_exact_fit() {
        let (x, y) = line();
        let theta = Array1::from_vec(vec![1.0, 2.0]);
        assert_eq!(LossKind::SquaredError.loss(&x, &y, &theta).unwrap(), 0.0);
        let g = LossKind::SquaredError.gradient(&x, &y, &theta).unwrap();
        assert_eq!(g.to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn squared_error_at_origin() {
        let (x, y) = line();
        let theta = Array1::zeros(2);
        // (1 + 9 + 25) / 6
        let loss = LossKind::SquaredError.loss(&x, &y, &theta).unwrap();
        assert!((loss - 35.0 / 6.0).abs() < 1e-12);
        // -(1 + 3 + 5) / 3, -(0 + 3 + 10) / 3
        let g = LossKind::SquaredError.gradient(&x, &y, &theta).unwrap();
        assert!((g[0] + 3.0).abs() < 1e-12);
        assert!((g[1] + 13.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn log_loss_at_zero_is_ln2() {
        let x = Array2::from_rows(vec![vec![1.0, -2.0], vec![1.0, 3.0]]).unwrap();
        let y = Array1::from_vec(vec![0.0, 1.0]);
        let theta = Array1::zeros(2);
        let loss = LossKind::LogLoss.loss(&x, &y, &theta).unwrap();
        assert!((loss - std::f64::consts::LN_2).abs() < 1e-12);
        let g = LossKind::LogLoss.gradient(&x, &y, &theta).unwrap();
        // residuals 0.5 and -0.5
        assert!(g[0].abs() < 1e-12);
        assert!((g[1] - (-1.0 - 1.5) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn gradient_matches_finite_differences() {
        let x = Array2::from_rows(vec![
            vec![1.0, 0.5, -1.0],
            vec![1.0, -0.3, 2.0],
            vec![1.0, 1.2, 0.1],
            vec![1.0, -2.0, 0.7],
        ])
        .unwrap();
        let y = Array1::from_vec(vec![1.0, 0.0, 1.0, 0.0]);
        let theta = Array1::from_vec(vec![0.2, -0.4, 0.3]);
        let h = 1e-6;
        for kind in [LossKind::SquaredError, LossKind::LogLoss] {
            let g = kind.gradient(&x, &y, &theta).unwrap();
            for j in 0..theta.len() {
                let mut up = theta.clone();
                let mut down = theta.clone();
                up[j] += h;
                down[j] -= h;
                let numeric =
                    (kind.loss(&x, &y, &up).unwrap() - kind.loss(&x, &y, &down).unwrap()) / (2.0 * h);
                assert!((numeric - g[j]).abs() < 1e-6, "{:?} component {}", kind, j);
            }
        }
    }

    #[test]
    fn rejects_mismatched_shapes() {
        let (x, y) = line();
        let theta = Array1::zeros(3);
        assert!(matches!(
            LossKind::SquaredError.loss(&x, &y, &theta),
            Err(LearnError::DimensionMismatch { .. })
        ));
    }
}
