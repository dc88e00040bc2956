//! Dense linear algebra over [`Array1`] / [`Array2`].
//!
//! Products are dispatched on operand rank through [`dot`]; the typed
//! helpers ([`matrix_vector`], [`matmul`]) are what the optimizer and the
//! models call on hot paths.

use serde::{Deserialize, Serialize};

use crate::error::{LearnError, Result};
use crate::math::vector::dot_slices;
use crate::math::{ordering, Array, Array1, Array2};

/// Largest matrix accepted by [`eigen`]; Jacobi rotations lose accuracy beyond it.
pub const MAX_EIGEN_DIM: usize = 20;

/// Pivots smaller than this (relative to the largest entry) count as zero.
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Rank-dispatched product: vector·vector, matrix·vector or matrix·matrix.
pub fn dot(a: &Array, b: &Array) -> Result<Array> {
    match (a, b) {
        (Array::Vector(u), Array::Vector(v)) => u.dot(v).map(Array::Scalar),
        (Array::Matrix(m), Array::Vector(v)) => matrix_vector(m, v).map(Array::Vector),
        (Array::Matrix(m), Array::Matrix(n)) => matmul(m, n).map(Array::Matrix),
        (lhs, rhs) => Err(LearnError::UnsupportedOperands {
            op: "dot",
            lhs: lhs.kind(),
            rhs: rhs.kind(),
        }),
    }
}

/// Row-wise dot product of `m` with `v`.
pub fn matrix_vector(m: &Array2<f64>, v: &Array1<f64>) -> Result<Array1<f64>> {
    if m.ncols() != v.len() {
        return Err(LearnError::mismatch(m.shape(), v.shape()));
    }
    Ok(m.rows().map(|row| dot_slices(row, v.as_slice())).collect())
}

/// `mᵀ·v` without materialising the transpose.
pub fn transpose_vector(m: &Array2<f64>, v: &Array1<f64>) -> Result<Array1<f64>> {
    if m.nrows() != v.len() {
        return Err(LearnError::mismatch(m.shape(), v.shape()));
    }
    let mut out = vec![0.0; m.ncols()];
    for (row, &w) in m.rows().zip(v.iter()) {
        for (acc, &x) in out.iter_mut().zip(row) {
            *acc += x * w;
        }
    }
    Ok(Array1::from_vec(out))
}

/// Standard matrix product.
pub fn matmul(a: &Array2<f64>, b: &Array2<f64>) -> Result<Array2<f64>> {
    if a.ncols() != b.nrows() {
        return Err(LearnError::mismatch(a.shape(), b.shape()));
    }
    let (n, k, m) = (a.nrows(), a.ncols(), b.ncols());
    let mut out = Array2::zeros(n, m);
    // i-k-j order keeps both inner accesses contiguous.
    for i in 0..n {
        for p in 0..k {
            let aik = a[(i, p)];
            if aik == 0.0 {
                continue;
            }
            let brow = b.row_slice(p);
            let orow = out.row_slice_mut(i);
            for (o, &bv) in orow.iter_mut().zip(brow) {
                *o += aik * bv;
            }
        }
    }
    Ok(out)
}

pub fn transpose(a: &Array2<f64>) -> Array2<f64> {
    a.t()
}

/// Determinant via LU elimination with partial pivoting.
pub fn determinant(a: &Array2<f64>) -> Result<f64> {
    if !a.is_square() {
        return Err(LearnError::NotSquareMatrix {
            rows: a.nrows(),
            cols: a.ncols(),
        });
    }
    if a.is_empty() {
        return Err(LearnError::EmptyInput);
    }

    let n = a.nrows();
    let mut lu = a.clone();
    let mut det = 1.0;
    for col in 0..n {
        let pivot_row = pivot_row(&lu, col);
        if lu[(pivot_row, col)] == 0.0 {
            return Ok(0.0);
        }
        if pivot_row != col {
            swap_rows(&mut lu, pivot_row, col);
            det = -det;
        }
        let pivot = lu[(col, col)];
        det *= pivot;
        for row in col + 1..n {
            let factor = lu[(row, col)] / pivot;
            if factor != 0.0 {
                for k in col..n {
                    lu[(row, k)] -= factor * lu[(col, k)];
                }
            }
        }
    }
    Ok(det)
}

/// Coefficients minimising `‖X·θ - y‖²`, from the normal equations `XᵀX θ = Xᵀy`.
pub fn least_squares(x: &Array2<f64>, y: &Array1<f64>) -> Result<Array1<f64>> {
    if x.is_empty() || y.is_empty() {
        return Err(LearnError::EmptyInput);
    }
    if x.nrows() != y.len() {
        return Err(LearnError::mismatch(x.shape(), y.shape()));
    }
    let xtx = matmul(&x.t(), x)?;
    let xty = transpose_vector(x, y)?;
    solve(&xtx, &xty)
}

/// Solve the square system `a·x = b` by Gaussian elimination with partial pivoting.
pub fn solve(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    if !a.is_square() {
        return Err(LearnError::NotSquareMatrix {
            rows: a.nrows(),
            cols: a.ncols(),
        });
    }
    if a.nrows() != b.len() {
        return Err(LearnError::mismatch(a.shape(), b.shape()));
    }

    let n = a.nrows();
    let scale = a
        .as_slice()
        .iter()
        .fold(0.0_f64, |acc, v| acc.max(v.abs()))
        .max(1.0);
    let tolerance = PIVOT_TOLERANCE * scale;

    let mut m = a.clone();
    let mut rhs = b.clone();
    for col in 0..n {
        let pivot_row = pivot_row(&m, col);
        if m[(pivot_row, col)].abs() <= tolerance {
            return Err(LearnError::SingularMatrix);
        }
        if pivot_row != col {
            swap_rows(&mut m, pivot_row, col);
            rhs.as_mut_slice().swap(pivot_row, col);
        }
        let pivot = m[(col, col)];
        for row in col + 1..n {
            let factor = m[(row, col)] / pivot;
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                m[(row, k)] -= factor * m[(col, k)];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut solution = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| m[(row, k)] * solution[k]).sum();
        solution[row] = (rhs[row] - tail) / m[(row, row)];
    }
    Ok(Array1::from_vec(solution))
}

fn pivot_row(m: &Array2<f64>, col: usize) -> usize {
    let mut best = col;
    for row in col + 1..m.nrows() {
        if m[(row, col)].abs() > m[(best, col)].abs() {
            best = row;
        }
    }
    best
}

fn swap_rows(m: &mut Array2<f64>, a: usize, b: usize) {
    let cols = m.ncols();
    let data = m.as_mut_slice();
    for k in 0..cols {
        data.swap(a * cols + k, b * cols + k);
    }
}

/// Settings for [`eigen`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EigenOptions {
    /// Stop once the sum of squared off-diagonal elements falls below this.
    pub tolerance: f64,
    /// Maximum number of rotations; `0` means `5·n²`.
    pub max_iterations: usize,
    /// Order eigenvalues descending (eigenvectors follow).
    pub sort: bool,
    /// Rescale every eigenvector so that its first coordinate is 1.
    pub normalise: bool,
}

impl Default for EigenOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-9,
            max_iterations: 0,
            sort: false,
            normalise: false,
        }
    }
}

/// Eigenvalues and eigenvectors (as columns) of a symmetric matrix.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EigenResult {
    pub values: Array1<f64>,
    pub vectors: Array2<f64>,
    /// Rotations applied before stopping.
    pub rotations: usize,
}

impl EigenResult {
    pub fn vector(&self, i: usize) -> Array1<f64> {
        self.vectors.column(i)
    }
}

/// Jacobi eigendecomposition of a symmetric matrix.
///
/// The input is assumed symmetric; only the upper triangle drives pivot
/// selection and asymmetric input yields meaningless output. Matrices larger
/// than [`MAX_EIGEN_DIM`] are rejected.
pub fn eigen(s: &Array2<f64>, options: EigenOptions) -> Result<EigenResult> {
    if !s.is_square() {
        return Err(LearnError::NotSquareMatrix {
            rows: s.nrows(),
            cols: s.ncols(),
        });
    }
    let n = s.nrows();
    if n == 0 {
        return Err(LearnError::EmptyInput);
    }
    if n > MAX_EIGEN_DIM {
        return Err(LearnError::DimensionTooLarge {
            dim: n,
            max: MAX_EIGEN_DIM,
        });
    }

    let max_rotations = rotation_limit(n, options.max_iterations);

    let mut a = s.clone();
    let mut v = Array2::<f64>::identity(n);
    let mut rotations = 0;

    while rotations < max_rotations && off_diagonal_norm(&a) >= options.tolerance {
        // already diagonal: nothing left to rotate
        let (p, q) = match largest_off_diagonal(&a) {
            Some(pivot) => pivot,
            None => break,
        };
        rotate(&mut a, &mut v, p, q);
        rotations += 1;
    }
    log::trace!(
        "jacobi finished after {} rotations (off-diagonal = {:e})",
        rotations,
        off_diagonal_norm(&a)
    );

    let mut values: Vec<f64> = (0..n).map(|i| a[(i, i)]).collect();
    if options.sort {
        let order = ordering::argsort(&Array1::from_vec(values.iter().map(|x| -x).collect()));
        let sorted_values = order.iter().map(|&i| values[i]).collect();
        let mut sorted_vectors = Array2::zeros(n, n);
        for (new_col, &old_col) in order.iter().enumerate() {
            for row in 0..n {
                sorted_vectors[(row, new_col)] = v[(row, old_col)];
            }
        }
        values = sorted_values;
        v = sorted_vectors;
    }

    if options.normalise {
        for col in 0..n {
            let head = v[(0, col)];
            if head == 0.0 {
                return Err(LearnError::DivisionByZero);
            }
            for row in 0..n {
                v[(row, col)] /= head;
            }
        }
    }

    Ok(EigenResult {
        values: Array1::from_vec(values),
        vectors: v,
        rotations,
    })
}

fn off_diagonal_norm(a: &Array2<f64>) -> f64 {
    let n = a.nrows();
    let mut total = 0.0;
    for i in 0..n {
        for j in 0..n {
            if i != j {
                total += a[(i, j)] * a[(i, j)];
            }
        }
    }
    total
}

/// Rotation budget for an `n×n` matrix; `0` selects the `5·n²` default.
fn rotation_limit(n: usize, max_iterations: usize) -> usize {
    if max_iterations == 0 {
        5 * n * n
    } else {
        max_iterations
    }
}

/// Position of the largest non-zero entry above the diagonal, if any.
fn largest_off_diagonal(a: &Array2<f64>) -> Option<(usize, usize)> {
    let n = a.nrows();
    let mut pivot = None;
    let mut best = 0.0;
    for i in 0..n {
        for j in i + 1..n {
            let value = a[(i, j)].abs();
            if value > best {
                best = value;
                pivot = Some((i, j));
            }
        }
    }
    pivot
}

/// Apply the plane rotation that zeroes `a[p][q]`: `a ← Jᵀ a J`, `v ← v J`.
fn rotate(a: &mut Array2<f64>, v: &mut Array2<f64>, p: usize, q: usize) {
    let n = a.nrows();
    let apq = a[(p, q)];
    if apq == 0.0 {
        return;
    }
    let theta = (a[(q, q)] - a[(p, p)]) / (2.0 * apq);
    let t = if theta.abs() > 1e150 {
        0.5 / theta
    } else {
        let sign = if theta >= 0.0 { 1.0 } else { -1.0 };
        sign / (theta.abs() + (theta * theta + 1.0).sqrt())
    };
    let c = 1.0 / (t * t + 1.0).sqrt();
    let s = t * c;

    for k in 0..n {
        let akp = a[(k, p)];
        let akq = a[(k, q)];
        a[(k, p)] = c * akp - s * akq;
        a[(k, q)] = s * akp + c * akq;
    }
    for k in 0..n {
        let apk = a[(p, k)];
        let aqk = a[(q, k)];
        a[(p, k)] = c * apk - s * aqk;
        a[(q, k)] = s * apk + c * aqk;
    }
    a[(p, q)] = 0.0;
    a[(q, p)] = 0.0;

    for k in 0..n {
        let vkp = v[(k, p)];
        let vkq = v[(k, q)];
        v[(k, p)] = c * vkp - s * vkq;
        v[(k, q)] = s * vkp + c * vkq;
    }
}
