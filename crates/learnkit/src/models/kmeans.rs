use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{LearnError, Result};
use crate::math::{argmin, pairwise_distances, Array1, Array2, Norm};
use crate::models::traits::{Predictor, Trainable};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Initialisation {
    /// `k` distinct rows of the training data.
    Forgy,
    /// Uniform coordinates in `[0, 1)`.
    Random,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct KMeansParams {
    pub k: usize,
    pub initialisation: Initialisation,
    pub max_iterations: usize,
    /// Stop once at most this many points change cluster in an iteration.
    pub min_change: usize,
    pub norm: Norm,
    pub seed: u64,
}

impl Default for KMeansParams {
    fn default() -> Self {
        Self {
            k: 2,
            initialisation: Initialisation::Forgy,
            max_iterations: 300,
            min_change: 0,
            norm: Norm::Euclidean,
            seed: 0,
        }
    }
}

pub struct KMeans {
    params: KMeansParams,
    centroids: Option<Array2<f64>>,
    labels: Vec<usize>,
    iterations: usize,
}

impl KMeans {
    pub fn new(params: KMeansParams) -> Self {
        KMeans {
            params,
            centroids: None,
            labels: Vec::new(),
            iterations: 0,
        }
    }

    pub fn centroids(&self) -> Option<&Array2<f64>> {
        self.centroids.as_ref()
    }

    /// Cluster of every training row after the last iteration.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    fn initial_centroids(&self, x: &Array2<f64>, rng: &mut StdRng) -> Array2<f64> {
        match self.params.initialisation {
            Initialisation::Forgy => {
                let rows = sample(rng, x.nrows(), self.params.k).into_vec();
                x.select_rows(&rows)
            }
            Initialisation::Random => {
                let mut c = Array2::zeros(self.params.k, x.ncols());
                for v in c.as_mut_slice() {
                    *v = rng.gen::<f64>();
                }
                c
            }
        }
    }
}

/// Index of the nearest centroid for every row of `x`.
fn assign(x: &Array2<f64>, centroids: &Array2<f64>, norm: Norm) -> Result<Vec<usize>> {
    x.rows()
        .map(|row| argmin(&pairwise_distances(centroids, row, norm)?))
        .collect()
}

/// Mean of the rows assigned to each cluster; empty clusters keep `previous`.
fn update_centroids(x: &Array2<f64>, labels: &[usize], previous: &Array2<f64>) -> Array2<f64> {
    let (k, d) = previous.shape();
    let mut sums = Array2::zeros(k, d);
    let mut counts = vec![0usize; k];
    for (row, &label) in x.rows().zip(labels) {
        counts[label] += 1;
        for (acc, v) in sums.row_slice_mut(label).iter_mut().zip(row) {
            *acc += v;
        }
    }
    for (cluster, &count) in counts.iter().enumerate() {
        if count == 0 {
            sums.row_slice_mut(cluster)
                .copy_from_slice(previous.row_slice(cluster));
        } else {
            for v in sums.row_slice_mut(cluster) {
                *v /= count as f64;
            }
        }
    }
    sums
}

impl Trainable for KMeans {
    type Target = ();

    fn train(&mut self, x: &Array2<f64>, _y: &()) -> Result<()> {
        if x.is_empty() {
            return Err(LearnError::EmptyInput);
        }
        let k = self.params.k;
        if k == 0 || k > x.nrows() {
            return Err(LearnError::config(
                "k",
                format!("expected 1..={} clusters, got {}", x.nrows(), k),
            ));
        }

        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let mut centroids = self.initial_centroids(x, &mut rng);
        let mut labels = assign(x, &centroids, self.params.norm)?;
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.params.max_iterations {
            iterations += 1;
            centroids = update_centroids(x, &labels, &centroids);
            let next = assign(x, &centroids, self.params.norm)?;
            let changed = next.iter().zip(&labels).filter(|(a, b)| a != b).count();
            labels = next;
            log::trace!("k-means iteration {}: {} reassigned", iterations, changed);
            if changed <= self.params.min_change {
                converged = true;
                break;
            }
        }
        if !converged {
            log::warn!(
                "{} stopped after {} iterations without settling",
                self.name(),
                iterations
            );
        }

        self.centroids = Some(centroids);
        self.labels = labels;
        self.iterations = iterations;
        Ok(())
    }

    fn name(&self) -> &str {
        "k-means"
    }
}

impl Predictor for KMeans {
    type Output = Array1<usize>;

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>> {
        let centroids = self.centroids.as_ref().ok_or(LearnError::NotTrained)?;
        assign(x, centroids, self.params.norm).map(Array1::from_vec)
    }
}
