use crate::error::{LearnError, Result};
use crate::math::{Array1, Array2};

#[inline]
pub fn sigmoid_scalar(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Elementwise logistic function.
pub fn sigmoid(u: &Array1<f64>) -> Array1<f64> {
    u.mapv(|z| sigmoid_scalar(*z))
}

/// `ln(1 + e^z)` without overflow for large `z`.
#[inline]
pub fn softplus(z: f64) -> f64 {
    z.max(0.0) + (-z.abs()).exp().ln_1p()
}

/// Softmax of a vector, shifted by its maximum for stability.
pub fn softmax(u: &Array1<f64>) -> Result<Array1<f64>> {
    if u.is_empty() {
        return Err(LearnError::EmptyInput);
    }
    Ok(Array1::from_vec(softmax_slice(u.as_slice())))
}

/// Row-wise softmax of a matrix.
pub fn softmax_rows(m: &Array2<f64>) -> Result<Array2<f64>> {
    if m.is_empty() {
        return Err(LearnError::EmptyInput);
    }
    let data = m.rows().flat_map(softmax_slice).collect();
    Array2::from_shape_vec(m.shape(), data)
}

fn softmax_slice(values: &[f64]) -> Vec<f64> {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = values.iter().map(|v| (v - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_is_symmetric_and_bounded() {
        let s = sigmoid(&Array1::from_vec(vec![-800.0, 0.0, 800.0]));
        assert_eq!(s.to_vec(), vec![0.0, 0.5, 1.0]);
        assert!((sigmoid_scalar(2.0) + sigmoid_scalar(-2.0) - 1.0).abs() < 1e-15);
    }

    #[test]
    fn softplus_matches_naive_formula_in_safe_range() {
        for z in [-5.0f64, -0.5, 0.0, 0.5, 5.0] {
            let naive = (1.0f64 + z.exp()).ln();
            assert!((softplus(z) - naive).abs() < 1e-12);
        }
        assert_eq!(softplus(1000.0), 1000.0);
    }

    #[test]
    fn softmax_rows_sum_to_one() {
        let m = Array2::from_rows(vec![vec![1.0, 2.0, 3.0], vec![1000.0, 1000.0, 1000.0]]).unwrap();
        let p = softmax_rows(&m).unwrap();
        for row in p.rows() {
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        }
        assert!((p[(1, 0)] - 1.0 / 3.0).abs() < 1e-12);
    }
}
