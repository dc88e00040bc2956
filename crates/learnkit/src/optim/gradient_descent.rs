use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::OptimizerConfig;
use crate::error::{LearnError, Result};
use crate::math::{Array1, Array2};
use crate::optim::objective::Objective;
use crate::optim::update_rules::OptimizerState;

/// How a run ended. Hitting the iteration cap is not an error.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Converged,
    MaxIterationsReached,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradientDescentOutcome {
    pub theta: Array1<f64>,
    /// Full-data loss after each iteration; `costs.len() == iterations`.
    pub costs: Vec<f64>,
    pub iterations: usize,
    pub termination: Termination,
}

impl GradientDescentOutcome {
    pub fn converged(&self) -> bool {
        self.termination == Termination::Converged
    }

    pub fn final_cost(&self) -> Option<f64> {
        self.costs.last().copied()
    }
}

/// Yields the row indices for each iteration.
///
/// Full-batch runs never shuffle. Otherwise a seeded permutation is cut into
/// `batch_size` slices and reshuffled at the start of every epoch; the last
/// slice of an epoch holds the remainder.
struct BatchSampler {
    order: Vec<usize>,
    batch_size: usize,
    cursor: usize,
    rng: StdRng,
}

impl BatchSampler {
    fn new(n_samples: usize, batch_size: usize, seed: u64) -> Option<Self> {
        if batch_size == 0 || batch_size >= n_samples {
            return None;
        }
        Some(Self {
            order: (0..n_samples).collect(),
            batch_size,
            cursor: n_samples,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    fn next_batch(&mut self) -> &[usize] {
        if self.cursor >= self.order.len() {
            self.order.shuffle(&mut self.rng);
            self.cursor = 0;
        }
        let start = self.cursor;
        let end = (start + self.batch_size).min(self.order.len());
        self.cursor = end;
        &self.order[start..end]
    }
}

fn check_finite(iteration: usize, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(LearnError::Diverged { iteration, value })
    }
}

/// Minimise `objective` over `(x, y)` starting from `initial_theta`.
///
/// Each iteration draws one batch, applies one update with the configured
/// rule and then re-evaluates the loss on the full data. The run stops once
/// the loss changes by less than `config.epsilon` or after
/// `config.max_iterations` updates.
pub fn run_gradient_descent<O>(
    objective: &O,
    x: &Array2<f64>,
    y: &Array1<f64>,
    initial_theta: Array1<f64>,
    config: &OptimizerConfig,
) -> Result<GradientDescentOutcome>
where
    O: Objective + ?Sized,
{
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(LearnError::EmptyInput);
    }
    if x.nrows() != y.len() {
        return Err(LearnError::mismatch(x.shape(), y.shape()));
    }
    if x.ncols() != initial_theta.len() {
        return Err(LearnError::mismatch(x.shape(), initial_theta.shape()));
    }
    let config = config.validated()?;

    let mut sampler = BatchSampler::new(x.nrows(), config.batch_size, config.seed);
    let mut state = OptimizerState::new(initial_theta, config.update_rule);
    let mut loss_prev = check_finite(0, objective.loss(x, y, state.theta())?)?;
    let mut costs = Vec::with_capacity(config.max_iterations.min(1 << 16));
    let mut termination = Termination::MaxIterationsReached;

    log::debug!(
        "gradient descent: rule={}, lr={}, batch_size={}, n={}, initial loss={:.6}",
        config.update_rule,
        config.learning_rate,
        config.batch_size,
        x.nrows(),
        loss_prev
    );

    for iteration in 1..=config.max_iterations {
        match sampler.as_mut() {
            None => state.step(objective, x, y, &config)?,
            Some(sampler) => {
                let batch = sampler.next_batch();
                let xb = x.select_rows(batch);
                let yb = y.select(batch);
                state.step(objective, &xb, &yb, &config)?;
            }
        }

        let loss = check_finite(iteration, objective.loss(x, y, state.theta())?)?;
        costs.push(loss);
        let delta = (loss_prev - loss).abs();
        log::trace!("iteration {}: loss={:.8}, delta={:.3e}", iteration, loss, delta);
        if delta < config.epsilon {
            termination = Termination::Converged;
            break;
        }
        loss_prev = loss;
    }

    let iterations = costs.len();
    match termination {
        Termination::Converged => log::debug!(
            "gradient descent converged after {} iterations (loss={:.6})",
            iterations,
            loss_prev
        ),
        Termination::MaxIterationsReached => log::debug!(
            "gradient descent stopped at the iteration cap of {}",
            iterations
        ),
    }

    Ok(GradientDescentOutcome {
        theta: state.into_theta(),
        costs,
        iterations,
        termination,
    })
}
