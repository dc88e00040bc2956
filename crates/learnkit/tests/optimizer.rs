use anyhow::Result;
use learnkit::config::{OptimizerConfig, UpdateRule};
use learnkit::datasets;
use learnkit::math::{least_squares, Array1, Array2};
use learnkit::models::{
    LogisticRegression, LogisticRegressionParams, Predictor, ProbabilisticClassifier, Trainable,
};
use learnkit::optim::{run_gradient_descent, LossKind, Objective, Termination};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn regression_problem() -> Result<(Array2<f64>, Array1<f64>)> {
    let (x, y) = datasets::regression(60, 2024)?;
    Ok((x.prepend_ones(), y))
}

#[test]
fn normal_descent_reaches_the_least_squares_cost() -> Result<()> {
    init_logger();
    let (x, y) = regression_problem()?;
    let config = OptimizerConfig::new(UpdateRule::Normal)
        .with_learning_rate(0.01)
        .with_epsilon(1e-10)
        .with_max_iterations(200_000);

    let outcome = run_gradient_descent(&LossKind::SquaredError, &x, &y, Array1::zeros(2), &config)?;
    assert_eq!(outcome.termination, Termination::Converged);
    assert_eq!(outcome.costs.len(), outcome.iterations);
    assert!(outcome.costs.windows(2).all(|w| w[1] <= w[0]));

    let optimum = least_squares(&x, &y)?;
    let best = LossKind::SquaredError.loss(&x, &y, &optimum)?;
    let reached = outcome.final_cost().expect("at least one iteration");
    assert!(reached >= best - 1e-12);
    assert!(reached - best < 1e-5, "gap {}", reached - best);
    Ok(())
}

#[test]
fn every_rule_lowers_the_loss() -> Result<()> {
    init_logger();
    let (x, y) = regression_problem()?;
    let start = Array1::zeros(2);
    let initial = LossKind::SquaredError.loss(&x, &y, &start)?;

    for rule in [
        UpdateRule::Normal,
        UpdateRule::Nesterov,
        UpdateRule::Adagrad,
        UpdateRule::Adadelta,
        UpdateRule::Rmsprop,
    ] {
        let config = OptimizerConfig::new(rule)
            .with_learning_rate(0.005)
            .with_epsilon(1e-8)
            .with_max_iterations(3_000);
        let outcome = run_gradient_descent(&LossKind::SquaredError, &x, &y, start.clone(), &config)?;
        let last = outcome.final_cost().expect("at least one iteration");
        assert!(last < initial, "{} did not improve: {} >= {}", rule, last, initial);
        assert!(outcome.costs.len() <= 3_000);
    }
    Ok(())
}

#[test]
fn mini_batches_are_reproducible_for_a_seed() -> Result<()> {
    let (x, y) = regression_problem()?;
    let config = OptimizerConfig::new(UpdateRule::Rmsprop)
        .with_learning_rate(0.05)
        .with_batch_size(8)
        .with_epsilon(0.0)
        .with_max_iterations(300)
        .with_seed(5);
    let a = run_gradient_descent(&LossKind::SquaredError, &x, &y, Array1::zeros(2), &config)?;
    let b = run_gradient_descent(&LossKind::SquaredError, &x, &y, Array1::zeros(2), &config)?;
    assert_eq!(a, b);
    assert_eq!(a.iterations, 300);
    assert_eq!(a.termination, Termination::MaxIterationsReached);

    let c = run_gradient_descent(
        &LossKind::SquaredError,
        &x,
        &y,
        Array1::zeros(2),
        &config.clone().with_seed(6),
    )?;
    assert_ne!(a.theta, c.theta);
    Ok(())
}

#[test]
fn seeded_logistic_regression_is_reproducible() -> Result<()> {
    init_logger();
    let (x, labels) = datasets::gaussian(40, 2, 2, 0.1, 1970, true)?;
    let params = LogisticRegressionParams {
        optimizer: OptimizerConfig::new(UpdateRule::Normal)
            .with_epsilon(0.01)
            .with_max_iterations(10_000),
        seed: 1970,
        ..LogisticRegressionParams::default()
    };

    let mut first = LogisticRegression::new(params.clone());
    first.train(&x, &labels)?;
    let mut second = LogisticRegression::new(params);
    second.train(&x, &labels)?;

    assert_eq!(first.iterations(), second.iterations());
    assert!(first.iterations()[0] < 10_000);
    assert_eq!(first.coefficients()?, second.coefficients()?);
    assert_eq!(first.predict_proba(&x)?, second.predict_proba(&x)?);
    assert_eq!(first.predict(&x)?, second.predict(&x)?);
    Ok(())
}

#[test]
fn config_round_trips_through_json() -> Result<()> {
    let config = OptimizerConfig::new(UpdateRule::Adadelta)
        .with_momentum(0.95)
        .with_batch_size(32)
        .with_seed(42);
    let json = serde_json::to_string(&config)?;
    assert!(json.contains("\"update_rule\":\"adadelta\""));
    let back: OptimizerConfig = serde_json::from_str(&json)?;
    assert_eq!(back, config);

    // missing fields take their defaults
    let partial: OptimizerConfig =
        serde_json::from_str(r#"{"update_rule": "nesterov", "learning_rate": 0.2}"#)?;
    assert_eq!(partial.update_rule, UpdateRule::Nesterov);
    assert_eq!(partial.learning_rate, 0.2);
    assert_eq!(partial.max_iterations, OptimizerConfig::default().max_iterations);

    assert!(serde_json::from_str::<OptimizerConfig>(r#"{"update_rule": "adam"}"#).is_err());
    Ok(())
}

#[test]
fn adadelta_ignores_the_configured_learning_rate() -> Result<()> {
    let (x, y) = regression_problem()?;
    let base = OptimizerConfig::new(UpdateRule::Adadelta)
        .with_epsilon(0.0)
        .with_max_iterations(50);
    let a = run_gradient_descent(&LossKind::SquaredError, &x, &y, Array1::zeros(2), &base)?;
    let b = run_gradient_descent(
        &LossKind::SquaredError,
        &x,
        &y,
        Array1::zeros(2),
        &base.clone().with_learning_rate(0.3),
    )?;
    assert_eq!(a.theta, b.theta);
    Ok(())
}
