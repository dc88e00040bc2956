//! Array types and the numeric kernels built on them.
//!
//! `Array1` (1D) and `Array2` (2D, row-major) are small contiguous
//! containers; `Array` tags a scalar, vector or matrix so that broadcasting
//! arithmetic can dispatch on rank.
pub mod array;
pub mod distance;
pub mod elementwise;
pub mod linalg;
pub mod matrix;
pub mod normalisers;
pub mod ordering;
pub mod vector;

pub use array::{Array, Axis};
pub use distance::{distance, pairwise_distances, Norm};
pub use elementwise::{add, divide, elementwise, multiply, power, subtract};
pub use linalg::{
    determinant, dot, eigen, least_squares, matmul, matrix_vector, transpose, EigenOptions,
    EigenResult,
};
pub use matrix::Array2;
pub use normalisers::{sigmoid, softmax, softmax_rows};
pub use ordering::{argmax, argmax_axis, argmin, argmin_axis, argsort, argsort_axis, sort, sort_axis};
pub use vector::Array1;
