use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{LearnError, Result};
use crate::math::{argsort, pairwise_distances, Array1, Array2, Norm};
use crate::metrics::{accuracy, mean_squared_error};
use crate::models::traits::{Predictor, Trainable};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct KnnParams {
    pub n_neighbours: usize,
    pub norm: Norm,
}

impl Default for KnnParams {
    fn default() -> Self {
        Self {
            n_neighbours: 5,
            norm: Norm::Euclidean,
        }
    }
}

/// Stored training set shared by both KNN flavours.
#[derive(Debug, Clone)]
struct Memory<T> {
    x: Array2<f64>,
    y: Vec<T>,
}

fn memorise<T: Clone>(params: &KnnParams, x: &Array2<f64>, y: &[T]) -> Result<Memory<T>> {
    if x.is_empty() {
        return Err(LearnError::EmptyInput);
    }
    if x.nrows() != y.len() {
        return Err(LearnError::mismatch(x.shape(), (y.len(),)));
    }
    if params.n_neighbours == 0 || params.n_neighbours > x.nrows() {
        return Err(LearnError::config(
            "n_neighbours",
            format!(
                "expected 1..={} neighbours, got {}",
                x.nrows(),
                params.n_neighbours
            ),
        ));
    }
    Ok(Memory {
        x: x.clone(),
        y: y.to_vec(),
    })
}

/// Apply `vote` to the targets of the nearest neighbours of every query row.
///
/// Queries are independent and run on the rayon pool; results keep row order.
fn query<T, U, F>(
    memory: Option<&Memory<T>>,
    params: &KnnParams,
    x: &Array2<f64>,
    vote: F,
) -> Result<Vec<U>>
where
    T: Sync,
    U: Send,
    F: Fn(Vec<&T>) -> U + Sync,
{
    let memory = memory.ok_or(LearnError::NotTrained)?;
    if x.ncols() != memory.x.ncols() {
        return Err(LearnError::mismatch(x.shape(), memory.x.shape()));
    }
    let queries: Vec<&[f64]> = x.rows().collect();
    queries
        .par_iter()
        .map(|row| {
            let distances = pairwise_distances(&memory.x, row, params.norm)?;
            let nearest = argsort(&distances);
            let targets = nearest.as_slice()[..params.n_neighbours]
                .iter()
                .map(|&i| &memory.y[i])
                .collect();
            Ok(vote(targets))
        })
        .collect()
}

/// Most frequent label; ties go to the label met first among the nearest.
fn majority(labels: Vec<&usize>) -> usize {
    let mut counts: Vec<(usize, usize)> = Vec::new();
    for &label in labels {
        match counts.iter_mut().find(|(l, _)| *l == label) {
            Some((_, c)) => *c += 1,
            None => counts.push((label, 1)),
        }
    }
    let mut best = counts[0];
    for &(label, count) in &counts[1..] {
        if count > best.1 {
            best = (label, count);
        }
    }
    best.0
}

pub struct KnnClassifier {
    params: KnnParams,
    memory: Option<Memory<usize>>,
}

impl KnnClassifier {
    pub fn new(params: KnnParams) -> Self {
        KnnClassifier {
            params,
            memory: None,
        }
    }

    pub fn score(&self, x: &Array2<f64>, y: &[usize]) -> Result<f64> {
        accuracy(y, self.predict(x)?.as_slice())
    }
}

impl Trainable for KnnClassifier {
    type Target = [usize];

    fn train(&mut self, x: &Array2<f64>, y: &[usize]) -> Result<()> {
        self.memory = Some(memorise(&self.params, x, y)?);
        Ok(())
    }

    fn name(&self) -> &str {
        "knn classifier"
    }
}

impl Predictor for KnnClassifier {
    type Output = Array1<usize>;

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>> {
        query(self.memory.as_ref(), &self.params, x, majority).map(Array1::from_vec)
    }
}

pub struct KnnRegressor {
    params: KnnParams,
    memory: Option<Memory<f64>>,
}

impl KnnRegressor {
    pub fn new(params: KnnParams) -> Self {
        KnnRegressor {
            params,
            memory: None,
        }
    }

    /// Mean squared error of the predictions.
    pub fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        mean_squared_error(y, &self.predict(x)?)
    }
}

impl Trainable for KnnRegressor {
    type Target = Array1<f64>;

    fn train(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.memory = Some(memorise(&self.params, x, y.as_slice())?);
        Ok(())
    }

    fn name(&self) -> &str {
        "knn regressor"
    }
}

impl Predictor for KnnRegressor {
    type Output = Array1<f64>;

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        query(self.memory.as_ref(), &self.params, x, |targets| {
            targets.iter().copied().sum::<f64>() / targets.len() as f64
        })
        .map(Array1::from_vec)
    }
}
