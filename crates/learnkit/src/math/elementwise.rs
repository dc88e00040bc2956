//! Elementwise arithmetic with numpy-style broadcasting.
//!
//! Broadcast rules, applied symmetrically to both operand orders:
//!
//! - scalar against anything: the scalar is repeated for every element;
//! - vector against vector: lengths must match;
//! - matrix against vector: a vector as long as a row is applied to every
//!   row, otherwise a vector as long as a column is applied to every column
//!   (row alignment wins for square matrices);
//! - matrix against matrix: shapes must match.
//!
//! Anything else is a [`LearnError::DimensionMismatch`].

use crate::error::{LearnError, Result};
use crate::math::{Array, Array1, Array2};

/// Apply `op(a, b)` pairwise after broadcasting `a` and `b` to a common shape.
pub fn elementwise<F>(a: &Array, b: &Array, op: F) -> Result<Array>
where
    F: Fn(f64, f64) -> f64,
{
    match (a, b) {
        (Array::Scalar(x), Array::Scalar(y)) => Ok(Array::Scalar(op(*x, *y))),
        (Array::Scalar(x), other) => Ok(other.mapv(|y| op(*x, y))),
        (other, Array::Scalar(y)) => Ok(other.mapv(|x| op(x, *y))),
        (Array::Vector(u), Array::Vector(v)) => u.zip_map(v, |x, y| op(*x, *y)).map(Array::Vector),
        (Array::Matrix(m), Array::Vector(v)) => {
            broadcast_vector(m, v, |x, y| op(x, y)).map(Array::Matrix)
        }
        (Array::Vector(v), Array::Matrix(m)) => {
            broadcast_vector(m, v, |x, y| op(y, x)).map(Array::Matrix)
        }
        (Array::Matrix(m), Array::Matrix(n)) => {
            if m.shape() != n.shape() {
                return Err(LearnError::mismatch(m.shape(), n.shape()));
            }
            let data = m
                .as_slice()
                .iter()
                .zip(n.as_slice())
                .map(|(x, y)| op(*x, *y))
                .collect();
            Array2::from_shape_vec(m.shape(), data).map(Array::Matrix)
        }
    }
}

/// `op(m[i][j], v[k])` where `k` is `j` for row vectors and `i` for column vectors.
fn broadcast_vector<F>(m: &Array2<f64>, v: &Array1<f64>, op: F) -> Result<Array2<f64>>
where
    F: Fn(f64, f64) -> f64,
{
    let (rows, cols) = m.shape();
    let along_rows = if v.len() == cols {
        true
    } else if v.len() == rows {
        false
    } else {
        return Err(LearnError::mismatch(m.shape(), v.shape()));
    };

    let mut data = Vec::with_capacity(rows * cols);
    for (i, row) in m.rows().enumerate() {
        for (j, &x) in row.iter().enumerate() {
            let y = if along_rows { v[j] } else { v[i] };
            data.push(op(x, y));
        }
    }
    Array2::from_shape_vec((rows, cols), data)
}

pub fn add(a: &Array, b: &Array) -> Result<Array> {
    elementwise(a, b, |x, y| x + y)
}

pub fn subtract(a: &Array, b: &Array) -> Result<Array> {
    elementwise(a, b, |x, y| x - y)
}

pub fn multiply(a: &Array, b: &Array) -> Result<Array> {
    elementwise(a, b, |x, y| x * y)
}

/// Elementwise division; any exact zero in the divisor is an error.
///
/// Shapes are checked first, so an incompatible divisor reports
/// [`LearnError::DimensionMismatch`] even when it also holds a zero.
pub fn divide(a: &Array, b: &Array) -> Result<Array> {
    let quotient = elementwise(a, b, |x, y| x / y)?;
    if b.values().iter().any(|&y| y == 0.0) {
        return Err(LearnError::DivisionByZero);
    }
    Ok(quotient)
}

/// Raise every element to `exponent` (fractional and negative exponents allowed).
pub fn power(a: &Array, exponent: f64) -> Array {
    if exponent.fract() == 0.0 && exponent.abs() <= i32::MAX as f64 {
        let n = exponent as i32;
        a.mapv(|x| x.powi(n))
    } else if exponent == 0.5 {
        a.mapv(f64::sqrt)
    } else {
        a.mapv(|x| x.powf(exponent))
    }
}
