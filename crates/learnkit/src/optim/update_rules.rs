use crate::config::{OptimizerConfig, UpdateRule};
use crate::error::Result;
use crate::math::{Array1, Array2};
use crate::optim::objective::Objective;

/// Accumulators carried between iterations, zero-initialised to θ's shape.
#[derive(Debug, Clone, PartialEq)]
enum RuleState {
    Plain,
    Nesterov { velocity: Vec<f64> },
    Adagrad { sq_grad: Vec<f64> },
    Adadelta { sq_grad: Vec<f64>, sq_delta: Vec<f64> },
    Rmsprop { sq_grad: Vec<f64> },
}

impl RuleState {
    fn new(rule: UpdateRule, dim: usize) -> Self {
        match rule {
            UpdateRule::Normal => RuleState::Plain,
            UpdateRule::Nesterov => RuleState::Nesterov {
                velocity: vec![0.0; dim],
            },
            UpdateRule::Adagrad => RuleState::Adagrad {
                sq_grad: vec![0.0; dim],
            },
            UpdateRule::Adadelta => RuleState::Adadelta {
                sq_grad: vec![0.0; dim],
                sq_delta: vec![0.0; dim],
            },
            UpdateRule::Rmsprop => RuleState::Rmsprop {
                sq_grad: vec![0.0; dim],
            },
        }
    }
}

/// Parameters plus rule state for a single optimizer run.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerState {
    theta: Array1<f64>,
    rule: RuleState,
}

impl OptimizerState {
    pub fn new(theta: Array1<f64>, rule: UpdateRule) -> Self {
        let rule = RuleState::new(rule, theta.len());
        Self { theta, rule }
    }

    pub fn theta(&self) -> &Array1<f64> {
        &self.theta
    }

    pub fn into_theta(self) -> Array1<f64> {
        self.theta
    }

    /// Evaluate the gradient on `(x, y)` and apply one update.
    ///
    /// `config` must already be validated.
    pub fn step<O>(
        &mut self,
        objective: &O,
        x: &Array2<f64>,
        y: &Array1<f64>,
        config: &OptimizerConfig,
    ) -> Result<()>
    where
        O: Objective + ?Sized,
    {
        let lr = config.learning_rate;
        let alpha = config.momentum;
        let eps = config.fudge_factor;
        let theta = self.theta.as_mut_slice();

        match &mut self.rule {
            RuleState::Plain => {
                let g = objective.gradient(x, y, &Array1::from_vec(theta.to_vec()))?;
                for (t, g) in theta.iter_mut().zip(g.iter()) {
                    *t -= lr * g;
                }
            }
            RuleState::Nesterov { velocity } => {
                let ahead: Array1<f64> = theta
                    .iter()
                    .zip(velocity.iter())
                    .map(|(t, v)| t + alpha * v)
                    .collect();
                let g = objective.gradient(x, y, &ahead)?;
                for ((t, v), g) in theta.iter_mut().zip(velocity.iter_mut()).zip(g.iter()) {
                    *v = alpha * *v - lr * g;
                    *t += *v;
                }
            }
            RuleState::Adagrad { sq_grad } => {
                let g = objective.gradient(x, y, &Array1::from_vec(theta.to_vec()))?;
                for ((t, acc), g) in theta.iter_mut().zip(sq_grad.iter_mut()).zip(g.iter()) {
                    *acc += g * g;
                    *t -= lr * g / (acc.sqrt() + eps);
                }
            }
            RuleState::Adadelta { sq_grad, sq_delta } => {
                let g = objective.gradient(x, y, &Array1::from_vec(theta.to_vec()))?;
                for (((t, eg), ed), g) in theta
                    .iter_mut()
                    .zip(sq_grad.iter_mut())
                    .zip(sq_delta.iter_mut())
                    .zip(g.iter())
                {
                    *eg = alpha * *eg + (1.0 - alpha) * g * g;
                    let delta = -((*ed + eps).sqrt() / (*eg + eps).sqrt()) * g;
                    *ed = alpha * *ed + (1.0 - alpha) * delta * delta;
                    *t += lr * delta;
                }
            }
            RuleState::Rmsprop { sq_grad } => {
                let g = objective.gradient(x, y, &Array1::from_vec(theta.to_vec()))?;
                for ((t, acc), g) in theta.iter_mut().zip(sq_grad.iter_mut()).zip(g.iter()) {
                    *acc = alpha * *acc + (1.0 - alpha) * g * g;
                    *t -= lr * g / (acc.sqrt() + eps);
                }
            }
        }
        Ok(())
    }
}
