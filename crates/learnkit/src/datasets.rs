//! Seeded synthetic datasets.

use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use statrs::distribution::Normal;

use crate::error::{LearnError, Result};
use crate::math::{Array1, Array2};

fn normal(mean: f64, sigma: f64) -> Result<Normal> {
    Normal::new(mean, sigma).map_err(|e| LearnError::config("sigma", e.to_string()))
}

/// `labels` Gaussian blobs of `n` points each in `d` dimensions.
///
/// Blob centres are drawn uniformly from `[0, 1)^d`; every coordinate of a
/// point is the centre's coordinate plus N(0, sigma²) noise. Without
/// `shuffle` the rows come grouped by label in ascending order; with it they
/// are shuffled and the returned labels follow their rows.
pub fn gaussian(
    n: usize,
    d: usize,
    labels: usize,
    sigma: f64,
    seed: u64,
    shuffle: bool,
) -> Result<(Array2<f64>, Vec<usize>)> {
    if n == 0 || d == 0 || labels == 0 {
        return Err(LearnError::EmptyInput);
    }
    if !(sigma.is_finite() && sigma > 0.0) {
        return Err(LearnError::config(
            "sigma",
            format!("must be positive and finite, got {}", sigma),
        ));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let centres: Vec<Vec<f64>> = (0..labels)
        .map(|_| (0..d).map(|_| rng.gen::<f64>()).collect())
        .collect();

    let mut points: Vec<(Vec<f64>, usize)> = Vec::with_capacity(n * labels);
    for (label, centre) in centres.iter().enumerate() {
        let noise = centre
            .iter()
            .map(|&mu| normal(mu, sigma))
            .collect::<Result<Vec<_>>>()?;
        for _ in 0..n {
            let point = noise.iter().map(|dist| dist.sample(&mut rng)).collect();
            points.push((point, label));
        }
    }
    if shuffle {
        points.shuffle(&mut rng);
    }

    let (rows, targets): (Vec<Vec<f64>>, Vec<usize>) = points.into_iter().unzip();
    Ok((Array2::from_rows(rows)?, targets))
}

/// `n` samples of `y = 1 + x + ε` with `x` uniform in `[0, 10)` and
/// `ε ~ N(0, 1)`. `x` is returned as a single-column matrix.
pub fn regression(n: usize, seed: u64) -> Result<(Array2<f64>, Array1<f64>)> {
    if n == 0 {
        return Err(LearnError::EmptyInput);
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = normal(0.0, 1.0)?;
    let mut xs = Vec::with_capacity(n);
    let mut ys = Vec::with_capacity(n);
    for _ in 0..n {
        let x = rng.gen_range(0.0..10.0);
        xs.push(x);
        ys.push(1.0 + x + noise.sample(&mut rng));
    }
    Ok((Array2::from_shape_vec((n, 1), xs)?, Array1::from_vec(ys)))
}
