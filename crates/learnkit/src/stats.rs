//! Axis-aware reductions.
//!
//! For a matrix, `Some(Axis(0))` reduces down the columns (one value per
//! column), `Some(Axis(1))` across the rows (one value per row) and `None`
//! reduces to a single scalar. For vectors the axis is ignored; for scalars
//! the value itself is the only sample.

use crate::error::{LearnError, Result};
use crate::math::{Array, Array1, Array2, Axis};

/// Apply `op` to every lane selected by `axis`, or to all values when `axis` is `None`.
fn reduce<F>(a: &Array, axis: Option<Axis>, op: F) -> Result<Array>
where
    F: Fn(&[f64]) -> Result<f64>,
{
    let values = a.values();
    if values.is_empty() {
        return Err(LearnError::EmptyInput);
    }
    match (a, axis) {
        (Array::Matrix(m), Some(axis)) => {
            let axis = axis.check()?;
            let lanes: Result<Vec<f64>> = if axis.0 == 0 {
                (0..m.ncols())
                    .map(|c| op(m.column(c).as_slice()))
                    .collect()
            } else {
                m.rows().map(&op).collect()
            };
            lanes.map(|v| Array::Vector(Array1::from_vec(v)))
        }
        _ => op(values).map(Array::Scalar),
    }
}

fn lane_sum(values: &[f64]) -> Result<f64> {
    Ok(values.iter().sum())
}

fn lane_mean(values: &[f64]) -> Result<f64> {
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

fn lane_variance(values: &[f64], ddof: usize) -> Result<f64> {
    if values.len() <= ddof {
        return Err(LearnError::DivisionByZero);
    }
    let mean = lane_mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    Ok(ss / (values.len() - ddof) as f64)
}

pub fn sum(a: &Array, axis: Option<Axis>) -> Result<Array> {
    reduce(a, axis, lane_sum)
}

pub fn mean(a: &Array, axis: Option<Axis>) -> Result<Array> {
    reduce(a, axis, lane_mean)
}

/// Variance with `ddof` delta degrees of freedom (`0` for the population variance).
pub fn variance(a: &Array, ddof: usize, axis: Option<Axis>) -> Result<Array> {
    reduce(a, axis, |lane| lane_variance(lane, ddof))
}

/// Standard deviation with `ddof` delta degrees of freedom.
pub fn std(a: &Array, ddof: usize, axis: Option<Axis>) -> Result<Array> {
    reduce(a, axis, |lane| lane_variance(lane, ddof).map(f64::sqrt))
}

/// Per-column means of `x`.
pub fn column_means(x: &Array2<f64>) -> Result<Array1<f64>> {
    if x.is_empty() {
        return Err(LearnError::EmptyInput);
    }
    let mut means = vec![0.0; x.ncols()];
    for row in x.rows() {
        for (acc, v) in means.iter_mut().zip(row) {
            *acc += v;
        }
    }
    let n = x.nrows() as f64;
    Ok(means.into_iter().map(|s| s / n).collect())
}

/// Population covariance of the columns of an `n x m` data matrix.
///
/// `cov[i][j]` is the mean over rows of `(x[:, i] - mean_i) * (x[:, j] - mean_j)`.
pub fn covariance(x: &Array2<f64>) -> Result<Array2<f64>> {
    let means = column_means(x)?;
    let m = x.ncols();
    let mut cov = Array2::zeros(m, m);
    for row in x.rows() {
        for i in 0..m {
            let di = row[i] - means[i];
            for j in i..m {
                cov[(i, j)] += di * (row[j] - means[j]);
            }
        }
    }
    let n = x.nrows() as f64;
    for i in 0..m {
        for j in i..m {
            let value = cov[(i, j)] / n;
            cov[(i, j)] = value;
            cov[(j, i)] = value;
        }
    }
    Ok(cov)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Array {
        Array::try_from(vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 9.0]]).unwrap()
    }

    #[test]
    fn mean_along_each_axis() {
        let a = sample();
        assert_eq!(
            mean(&a, Some(Axis(0))).unwrap(),
            Array::from(vec![3.0, 5.0])
        );
        assert_eq!(
            mean(&a, Some(Axis(1))).unwrap(),
            Array::from(vec![1.5, 3.5, 7.0])
        );
        assert_eq!(mean(&a, None).unwrap(), Array::Scalar(4.0));
    }

    #[test]
    fn vector_ignores_axis() {
        let v = Array::from(vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(sum(&v, Some(Axis(1))).unwrap(), Array::Scalar(10.0));
        assert_eq!(variance(&v, 0, None).unwrap(), Array::Scalar(1.25));
        assert_eq!(
            variance(&v, 1, Some(Axis(0))).unwrap(),
            Array::Scalar(5.0 / 3.0)
        );
    }

    #[test]
    fn std_is_sqrt_of_variance() {
        let a = sample();
        let var = variance(&a, 0, Some(Axis(0))).unwrap();
        let sd = std(&a, 0, Some(Axis(0))).unwrap();
        for (v, s) in var.values().iter().zip(sd.values()) {
            assert!((v.sqrt() - s).abs() < 1e-12);
        }
    }

    #[test]
    fn empty_input_is_rejected() {
        let v = Array::from(Vec::<f64>::new());
        assert_eq!(mean(&v, None), Err(LearnError::EmptyInput));
    }

    #[test]
    fn too_many_degrees_of_freedom() {
        let v = Array::from(vec![1.0]);
        assert_eq!(variance(&v, 1, None), Err(LearnError::DivisionByZero));
    }

    #[test]
    fn unknown_axis() {
        assert_eq!(sum(&sample(), Some(Axis(2))), Err(LearnError::UnknownAxis(2)));
    }

    #[test]
    fn covariance_matches_definition() {
        let x = Array2::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 9.0]]).unwrap();
        let cov = covariance(&x).unwrap();
        // column means 3 and 5
        assert!((cov[(0, 0)] - 8.0 / 3.0).abs() < 1e-12);
        assert!((cov[(1, 1)] - 26.0 / 3.0).abs() < 1e-12);
        assert!((cov[(0, 1)] - 14.0 / 3.0).abs() < 1e-12);
        assert_eq!(cov[(0, 1)], cov[(1, 0)]);
    }
}
