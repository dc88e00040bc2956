//! Small preprocessing utilities shared by the models and tests.
//!
//! Provides a standard scaler (per-column mean/std) and a seeded
//! train/test split. Everything operates on the crate `Array2` and returns
//! new arrays.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{LearnError, Result};
use crate::math::{Array1, Array2};

/// Simple standard scaler (per-column mean/std).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl Scaler {
    /// Minimum stddev to avoid division by zero when transforming.
    pub const MIN_STD: f64 = 1e-6;

    /// Undo [`transform_all`].
    pub fn inverse(&self, z: &Array2<f64>) -> Result<Array2<f64>> {
        self.check(z)?;
        let mut out = z.clone();
        for r in 0..out.nrows() {
            for (c, v) in out.row_slice_mut(r).iter_mut().enumerate() {
                *v = *v * self.std[c] + self.mean[c];
            }
        }
        Ok(out)
    }

    fn check(&self, x: &Array2<f64>) -> Result<()> {
        if x.ncols() != self.mean.len() {
            return Err(LearnError::mismatch(x.shape(), (self.mean.len(),)));
        }
        Ok(())
    }
}

/// Fit a `Scaler` from an `Array2<f64>` where rows are samples and
/// columns are features. Uses the population standard deviation.
pub fn fit_scaler(x: &Array2<f64>) -> Result<Scaler> {
    let (nrows, ncols) = x.shape();
    if nrows == 0 || ncols == 0 {
        return Err(LearnError::EmptyInput);
    }

    let mut mean = vec![0.0; ncols];
    for row in x.rows() {
        for (m, v) in mean.iter_mut().zip(row) {
            *m += v;
        }
    }
    let nrows_f = nrows as f64;
    for v in mean.iter_mut() {
        *v /= nrows_f;
    }

    let mut var = vec![0.0; ncols];
    for row in x.rows() {
        for ((acc, v), m) in var.iter_mut().zip(row).zip(&mean) {
            let d = v - m;
            *acc += d * d;
        }
    }
    for v in var.iter_mut() {
        *v = (*v / nrows_f).sqrt().max(Scaler::MIN_STD);
    }

    Ok(Scaler { mean, std: var })
}

/// Transform all rows using the provided `Scaler` and return a new `Array2<f64>`.
pub fn transform_all(x: &Array2<f64>, sc: &Scaler) -> Result<Array2<f64>> {
    sc.check(x)?;
    let (nrows, ncols) = x.shape();
    let mut out = Vec::with_capacity(nrows * ncols);
    for row in x.rows() {
        for (c, v) in row.iter().enumerate() {
            out.push((v - sc.mean[c]) / sc.std[c]);
        }
    }
    Array2::from_shape_vec((nrows, ncols), out)
}

pub fn fit_transform(x: &Array2<f64>) -> Result<(Scaler, Array2<f64>)> {
    let scaler = fit_scaler(x)?;
    let scaled = transform_all(x, &scaler)?;
    Ok((scaler, scaled))
}

/// Rows of a split, in the order they were drawn.
#[derive(Clone, Debug, PartialEq)]
pub struct Split<T> {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Vec<T>,
    pub y_test: Vec<T>,
}

/// Split `(x, y)` into train and test parts.
///
/// The train part gets `round(train_fraction * n)` rows. With `shuffle` the
/// rows are permuted by a `StdRng` seeded from `seed` first; otherwise the
/// leading rows form the train part.
pub fn train_test_split<T: Clone>(
    x: &Array2<f64>,
    y: &[T],
    train_fraction: f64,
    shuffle: bool,
    seed: u64,
) -> Result<Split<T>> {
    if x.nrows() != y.len() {
        return Err(LearnError::mismatch(x.shape(), (y.len(),)));
    }
    if !(train_fraction > 0.0 && train_fraction < 1.0) {
        return Err(LearnError::config(
            "train_fraction",
            format!("must lie in (0, 1), got {}", train_fraction),
        ));
    }

    let mut order: Vec<usize> = (0..x.nrows()).collect();
    if shuffle {
        order.shuffle(&mut StdRng::seed_from_u64(seed));
    }
    let cut = (train_fraction * x.nrows() as f64).round() as usize;
    let (train, test) = order.split_at(cut);
    let pick = |rows: &[usize]| rows.iter().map(|&i| y[i].clone()).collect::<Vec<T>>();

    log::debug!("train/test split: {} train, {} test", train.len(), test.len());
    Ok(Split {
        x_train: x.select_rows(train),
        x_test: x.select_rows(test),
        y_train: pick(train),
        y_test: pick(test),
    })
}

/// Convenience for regression targets stored as `Array1`.
pub fn train_test_split_regression(
    x: &Array2<f64>,
    y: &Array1<f64>,
    train_fraction: f64,
    shuffle: bool,
    seed: u64,
) -> Result<Split<f64>> {
    train_test_split(x, y.as_slice(), train_fraction, shuffle, seed)
}
