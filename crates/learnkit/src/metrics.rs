//! Scoring functions used by the models' `score` methods.

use crate::error::{LearnError, Result};
use crate::math::Array1;

fn check_pair(len_true: usize, len_pred: usize) -> Result<()> {
    if len_true != len_pred {
        return Err(LearnError::mismatch((len_true,), (len_pred,)));
    }
    if len_true == 0 {
        return Err(LearnError::EmptyInput);
    }
    Ok(())
}

pub fn mean_squared_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    check_pair(y_true.len(), y_pred.len())?;
    let total: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p) * (t - p))
        .sum();
    Ok(total / y_true.len() as f64)
}

pub fn mean_absolute_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    check_pair(y_true.len(), y_pred.len())?;
    let total: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).abs())
        .sum();
    Ok(total / y_true.len() as f64)
}

/// Fraction of positions where the labels agree.
pub fn accuracy<T: PartialEq>(y_true: &[T], y_pred: &[T]) -> Result<f64> {
    check_pair(y_true.len(), y_pred.len())?;
    let hits = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    Ok(hits as f64 / y_true.len() as f64)
}
