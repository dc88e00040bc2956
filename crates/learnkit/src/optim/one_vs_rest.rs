use rayon::prelude::*;

use crate::config::OptimizerConfig;
use crate::error::{LearnError, Result};
use crate::math::{Array1, Array2};
use crate::optim::gradient_descent::{run_gradient_descent, Termination};
use crate::optim::objective::Objective;

/// Per-class results of a one-vs-rest decomposition, indexed by class.
#[derive(Debug, Clone, PartialEq)]
pub struct OneVsRestOutcome {
    pub coefficients: Vec<Array1<f64>>,
    pub costs: Vec<Vec<f64>>,
    pub iterations: Vec<usize>,
    pub terminations: Vec<Termination>,
}

impl OneVsRestOutcome {
    pub fn n_classes(&self) -> usize {
        self.coefficients.len()
    }

    /// Stack the per-class coefficients as the columns of a `d x k` matrix.
    pub fn coefficient_matrix(&self) -> Result<Array2<f64>> {
        let rows = self
            .coefficients
            .iter()
            .map(|c| c.to_vec())
            .collect::<Vec<_>>();
        Ok(Array2::from_rows(rows)?.t())
    }
}

/// Binary target for `class`: `1` where the label matches, `0` elsewhere.
pub fn binary_targets(labels: &[usize], class: usize) -> Array1<f64> {
    labels
        .iter()
        .map(|&label| if label == class { 1.0 } else { 0.0 })
        .collect()
}

/// Fit one binary model per class against all others.
///
/// `initial_thetas[c]` seeds the run for class `c`. The runs are independent
/// and execute on the rayon pool; results are returned in class order, so
/// the outcome does not depend on scheduling.
pub fn run_one_vs_rest<O>(
    objective: &O,
    x: &Array2<f64>,
    labels: &[usize],
    initial_thetas: Vec<Array1<f64>>,
    config: &OptimizerConfig,
) -> Result<OneVsRestOutcome>
where
    O: Objective + Sync + ?Sized,
{
    let n_classes = initial_thetas.len();
    if n_classes < 2 {
        return Err(LearnError::config(
            "n_classes",
            format!("one-vs-rest needs at least two classes, got {}", n_classes),
        ));
    }
    if labels.len() != x.nrows() {
        return Err(LearnError::mismatch(x.shape(), (labels.len(),)));
    }
    if let Some(&label) = labels.iter().find(|&&l| l >= n_classes) {
        return Err(LearnError::InvalidShape(format!(
            "label {} is out of range for {} classes",
            label, n_classes
        )));
    }
    let config = config.validated()?;

    log::debug!("one-vs-rest over {} classes", n_classes);

    let runs = initial_thetas
        .into_par_iter()
        .enumerate()
        .map(|(class, theta)| {
            let target = binary_targets(labels, class);
            run_gradient_descent(objective, x, &target, theta, &config)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut outcome = OneVsRestOutcome {
        coefficients: Vec::with_capacity(n_classes),
        costs: Vec::with_capacity(n_classes),
        iterations: Vec::with_capacity(n_classes),
        terminations: Vec::with_capacity(n_classes),
    };
    for run in runs {
        outcome.coefficients.push(run.theta);
        outcome.costs.push(run.costs);
        outcome.iterations.push(run.iterations);
        outcome.terminations.push(run.termination);
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpdateRule;
    use crate::optim::objective::LossKind;

    fn three_blobs() -> (Array2<f64>, Vec<usize>) {
        let centres = [(-3.0, 0.0), (3.0, 0.0), (0.0, 4.0)];
        let offsets = [(0.1, 0.2), (-0.2, 0.1), (0.0, -0.3), (0.3, 0.0)];
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for (class, (cx, cy)) in centres.iter().enumerate() {
            for (dx, dy) in offsets.iter() {
                rows.push(vec![1.0, cx + dx, cy + dy]);
                labels.push(class);
            }
        }
        (Array2::from_rows(rows).unwrap(), labels)
    }

    #[test]
    fn targets_are_one_hot_per_class() {
        assert_eq!(binary_targets(&[0, 2, 1, 2], 2).to_vec(), vec![0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn returns_one_result_per_class_in_order() {
        let (x, labels) = three_blobs();
        let config = OptimizerConfig::new(UpdateRule::Normal)
            .with_learning_rate(0.5)
            .with_epsilon(1e-6)
            .with_max_iterations(2_000);
        let thetas = vec![Array1::zeros(3); 3];
        let out = run_one_vs_rest(&LossKind::LogLoss, &x, &labels, thetas, &config).unwrap();
        assert_eq!(out.n_classes(), 3);
        assert_eq!(out.costs.len(), 3);
        for c in 0..3 {
            assert_eq!(out.costs[c].len(), out.iterations[c]);
        }
        // class 0 sits at negative x, class 1 at positive x
        assert!(out.coefficients[0][1] < 0.0);
        assert!(out.coefficients[1][1] > 0.0);
        assert!(out.coefficients[2][2] > 0.0);

        let w = out.coefficient_matrix().unwrap();
        assert_eq!(w.shape(), (3, 3));
        assert_eq!(w[(1, 0)], out.coefficients[0][1]);
    }

    #[test]
    fn parallel_runs_match_sequential_runs() {
        let (x, labels) = three_blobs();
        let config = OptimizerConfig::new(UpdateRule::Rmsprop).with_max_iterations(200);
        let thetas = vec![
            Array1::from_vec(vec![0.1, -0.2, 0.3]),
            Array1::from_vec(vec![0.0, 0.5, -0.5]),
            Array1::from_vec(vec![-0.3, 0.2, 0.1]),
        ];
        let out =
            run_one_vs_rest(&LossKind::LogLoss, &x, &labels, thetas.clone(), &config).unwrap();
        for (class, theta) in thetas.into_iter().enumerate() {
            let single = run_gradient_descent(
                &LossKind::LogLoss,
                &x,
                &binary_targets(&labels, class),
                theta,
                &config,
            )
            .unwrap();
            assert_eq!(single.theta, out.coefficients[class]);
            assert_eq!(single.costs, out.costs[class]);
        }
    }

    #[test]
    fn rejects_labels_outside_class_range() {
        let (x, mut labels) = three_blobs();
        labels[0] = 5;
        let err = run_one_vs_rest(
            &LossKind::LogLoss,
            &x,
            &labels,
            vec![Array1::zeros(3); 3],
            &OptimizerConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LearnError::InvalidShape(_)));
    }
}
