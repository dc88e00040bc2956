use serde::{Deserialize, Serialize};

use crate::error::{LearnError, Result};
use crate::math::{Array1, Array2};

/// Reduction axis for matrices.
///
/// `Axis(0)` walks down the rows and yields one value per column, `Axis(1)`
/// walks across the columns and yields one value per row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Axis(pub usize);

impl Axis {
    pub const COLUMNS: Axis = Axis(0);
    pub const ROWS: Axis = Axis(1);

    pub(crate) fn check(self) -> Result<Self> {
        match self.0 {
            0 | 1 => Ok(self),
            other => Err(LearnError::UnknownAxis(other)),
        }
    }
}

/// Shape-tagged numeric value: scalar, vector or row-major matrix.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Array {
    Scalar(f64),
    Vector(Array1<f64>),
    Matrix(Array2<f64>),
}

impl Array {
    pub fn rank(&self) -> usize {
        match self {
            Array::Scalar(_) => 0,
            Array::Vector(_) => 1,
            Array::Matrix(_) => 2,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Array::Scalar(_) => "scalar",
            Array::Vector(_) => "vector",
            Array::Matrix(_) => "matrix",
        }
    }

    pub fn shape(&self) -> Vec<usize> {
        match self {
            Array::Scalar(_) => vec![],
            Array::Vector(v) => vec![v.len()],
            Array::Matrix(m) => vec![m.nrows(), m.ncols()],
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Array::Scalar(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&Array1<f64>> {
        match self {
            Array::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_matrix(&self) -> Option<&Array2<f64>> {
        match self {
            Array::Matrix(m) => Some(m),
            _ => None,
        }
    }

    pub fn into_vector(self) -> Option<Array1<f64>> {
        match self {
            Array::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_matrix(self) -> Option<Array2<f64>> {
        match self {
            Array::Matrix(m) => Some(m),
            _ => None,
        }
    }

    /// All elements in row-major order.
    pub fn values(&self) -> &[f64] {
        match self {
            Array::Scalar(x) => std::slice::from_ref(x),
            Array::Vector(v) => v.as_slice(),
            Array::Matrix(m) => m.as_slice(),
        }
    }

    pub fn mapv<F>(&self, f: F) -> Array
    where
        F: Fn(f64) -> f64,
    {
        match self {
            Array::Scalar(x) => Array::Scalar(f(*x)),
            Array::Vector(v) => Array::Vector(v.mapv(|x| f(*x))),
            Array::Matrix(m) => Array::Matrix(m.mapv(|x| f(*x))),
        }
    }
}

impl From<f64> for Array {
    fn from(value: f64) -> Self {
        Array::Scalar(value)
    }
}

impl From<Vec<f64>> for Array {
    fn from(value: Vec<f64>) -> Self {
        Array::Vector(Array1::from_vec(value))
    }
}

impl From<Array1<f64>> for Array {
    fn from(value: Array1<f64>) -> Self {
        Array::Vector(value)
    }
}

impl From<Array2<f64>> for Array {
    fn from(value: Array2<f64>) -> Self {
        Array::Matrix(value)
    }
}

impl TryFrom<Vec<Vec<f64>>> for Array {
    type Error = LearnError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self> {
        Array2::from_rows(rows).map(Array::Matrix)
    }
}
