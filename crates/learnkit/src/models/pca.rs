use serde::{Deserialize, Serialize};

use crate::error::{LearnError, Result};
use crate::math::linalg::MAX_EIGEN_DIM;
use crate::math::{eigen, matmul, Array1, Array2, EigenOptions};
use crate::models::traits::{Trainable, Transformer};
use crate::stats::{column_means, covariance};

/// How many principal components to keep.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Components {
    Count(usize),
    /// Share of the feature count, rounded to the nearest whole component.
    Fraction(f64),
}

impl Components {
    fn resolve(&self, n_features: usize) -> Result<usize> {
        let k = match *self {
            Components::Count(k) => k,
            Components::Fraction(f) => {
                if !(f > 0.0 && f <= 1.0) {
                    return Err(LearnError::config(
                        "n_components",
                        format!("fraction must lie in (0, 1], got {}", f),
                    ));
                }
                ((f * n_features as f64).round() as usize).max(1)
            }
        };
        if k == 0 || k > n_features {
            return Err(LearnError::config(
                "n_components",
                format!("expected 1..={} components, got {}", n_features, k),
            ));
        }
        Ok(k)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PcaParams {
    pub n_components: Components,
    pub tolerance: f64,
    /// Jacobi rotation cap; `0` picks a default from the feature count.
    pub max_iterations: usize,
}

impl Default for PcaParams {
    fn default() -> Self {
        Self {
            n_components: Components::Fraction(0.95),
            tolerance: 1e-9,
            max_iterations: 1000,
        }
    }
}

#[derive(Debug, Clone)]
struct Fitted {
    mean: Array1<f64>,
    /// `m x k`, one principal axis per column.
    components: Array2<f64>,
    explained_variance: Array1<f64>,
    total_variance: f64,
}

/// Principal component analysis via the eigendecomposition of the
/// covariance matrix.
pub struct Pca {
    params: PcaParams,
    fitted: Option<Fitted>,
}

impl Pca {
    pub fn new(params: PcaParams) -> Self {
        Pca {
            params,
            fitted: None,
        }
    }

    fn fitted(&self) -> Result<&Fitted> {
        self.fitted.as_ref().ok_or(LearnError::NotTrained)
    }

    pub fn n_components(&self) -> Option<usize> {
        self.fitted.as_ref().map(|f| f.components.ncols())
    }

    pub fn components(&self) -> Result<&Array2<f64>> {
        Ok(&self.fitted()?.components)
    }

    pub fn mean(&self) -> Result<&Array1<f64>> {
        Ok(&self.fitted()?.mean)
    }

    /// Eigenvalues of the kept components, largest first.
    pub fn explained_variance(&self) -> Result<&Array1<f64>> {
        Ok(&self.fitted()?.explained_variance)
    }

    /// `λ_i / Σλ` over all eigenvalues, for the kept components.
    pub fn explained_variance_ratio(&self) -> Result<Array1<f64>> {
        let fitted = self.fitted()?;
        if fitted.total_variance == 0.0 {
            return Err(LearnError::DivisionByZero);
        }
        Ok(fitted
            .explained_variance
            .mapv(|v| v / fitted.total_variance))
    }
}

fn check_features(fitted: &Fitted, cols: usize, expected: usize) -> Result<()> {
    if cols != expected {
        return Err(LearnError::mismatch(
            (fitted.mean.len(), fitted.components.ncols()),
            (cols,),
        ));
    }
    Ok(())
}

impl Trainable for Pca {
    type Target = ();

    fn train(&mut self, x: &Array2<f64>, _y: &()) -> Result<()> {
        let m = x.ncols();
        if x.is_empty() {
            return Err(LearnError::EmptyInput);
        }
        if m > MAX_EIGEN_DIM {
            return Err(LearnError::DimensionTooLarge {
                dim: m,
                max: MAX_EIGEN_DIM,
            });
        }
        let k = self.params.n_components.resolve(m)?;

        let mean = column_means(x)?;
        let cov = covariance(x)?;
        let decomposition = eigen(
            &cov,
            EigenOptions {
                tolerance: self.params.tolerance,
                max_iterations: self.params.max_iterations,
                sort: true,
                normalise: false,
            },
        )?;

        let total_variance = decomposition.values.sum();
        let explained_variance = Array1::from_vec(decomposition.values.as_slice()[..k].to_vec());
        let components = decomposition.vectors.select_columns(..k);

        log::debug!(
            "{}: kept {} of {} components after {} rotations",
            self.name(),
            k,
            m,
            decomposition.rotations
        );
        self.fitted = Some(Fitted {
            mean,
            components,
            explained_variance,
            total_variance,
        });
        Ok(())
    }

    fn name(&self) -> &str {
        "pca"
    }
}

impl Transformer for Pca {
    /// `(x - mean) · W`.
    fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let fitted = self.fitted()?;
        check_features(fitted, x.ncols(), fitted.mean.len())?;
        let mut centred = x.clone();
        for r in 0..centred.nrows() {
            for (v, mu) in centred.row_slice_mut(r).iter_mut().zip(fitted.mean.iter()) {
                *v -= mu;
            }
        }
        matmul(&centred, &fitted.components)
    }

    /// `z · Wᵀ + mean`.
    fn inverse_transform(&self, z: &Array2<f64>) -> Result<Array2<f64>> {
        let fitted = self.fitted()?;
        check_features(fitted, z.ncols(), fitted.components.ncols())?;
        let mut restored = matmul(z, &fitted.components.t())?;
        for r in 0..restored.nrows() {
            for (v, mu) in restored.row_slice_mut(r).iter_mut().zip(fitted.mean.iter()) {
                *v += mu;
            }
        }
        Ok(restored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn correlated() -> Array2<f64> {
        // points close to the line y = 2x
        Array2::from_rows(vec![
            vec![1.0, 2.1],
            vec![2.0, 3.9],
            vec![3.0, 6.2],
            vec![4.0, 7.8],
            vec![5.0, 10.1],
        ])
        .unwrap()
    }

    #[test]
    fn fraction_rounds_against_feature_count() {
        assert_eq!(Components::Fraction(0.5).resolve(5).unwrap(), 3);
        assert_eq!(Components::Fraction(0.01).resolve(5).unwrap(), 1);
        assert!(Components::Fraction(1.5).resolve(5).is_err());
        assert!(Components::Count(6).resolve(5).is_err());
    }

    #[test]
    fn first_component_follows_the_line() {
        let mut pca = Pca::new(PcaParams {
            n_components: Components::Count(1),
            ..PcaParams::default()
        });
        pca.train(&correlated(), &()).unwrap();
        let w = pca.components().unwrap();
        let ratio = w[(1, 0)] / w[(0, 0)];
        assert!((ratio - 2.0).abs() < 0.1);
        assert!(pca.explained_variance_ratio().unwrap()[0] > 0.99);
    }

    #[test]
    fn full_rank_round_trip_is_lossless() {
        let x = correlated();
        let mut pca = Pca::new(PcaParams {
            n_components: Components::Count(2),
            ..PcaParams::default()
        });
        pca.train(&x, &()).unwrap();
        let restored = pca.inverse_transform(&pca.transform(&x).unwrap()).unwrap();
        for (a, b) in x.as_slice().iter().zip(restored.as_slice()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn defaults_keep_most_components() {
        let params = PcaParams::default();
        assert_eq!(params.n_components, Components::Fraction(0.95));
        assert_eq!(params.max_iterations, 1000);
        assert_eq!(params.n_components.resolve(10).unwrap(), 10);
        assert_eq!(params.n_components.resolve(4).unwrap(), 4);
    }

    #[test]
    fn single_feature_with_zero_tolerance() {
        let x = Array2::from_rows(vec![vec![1.0], vec![2.0], vec![4.0]]).unwrap();
        let mut pca = Pca::new(PcaParams {
            n_components: Components::Count(1),
            tolerance: 0.0,
            ..PcaParams::default()
        });
        pca.train(&x, &()).unwrap();
        assert_eq!(pca.components().unwrap(), &Array2::from_rows(vec![vec![1.0]]).unwrap());
        // population variance of [1, 2, 4]
        assert!((pca.explained_variance().unwrap()[0] - 14.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn too_many_features() {
        let x = Array2::<f64>::zeros(3, 21);
        let mut pca = Pca::new(PcaParams::default());
        assert_eq!(
            pca.train(&x, &()),
            Err(LearnError::DimensionTooLarge { dim: 21, max: 20 })
        );
    }
}
